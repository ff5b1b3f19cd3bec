//! Ristretto255 group backend.
//!
//! Ristretto points have no affine coordinates, so the JSON form carries the
//! canonical 32-byte encoding as a single decimal integer in the `x` slot.
//! The identity encodes to all-zero bytes, which degenerates to the usual
//! `(0, 0)` sentinel.

use crate::{
    errors::{CallerError, Result},
    group::{EcPointRepr, GroupElement},
    serialization::{bytes_to_decimal, decimal_to_bytes},
    utils::random_positive_bn,
};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::{Identity, VartimeMultiscalarMul},
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use std::sync::OnceLock;
use tracing::error;

const FIELD_ORDER_HEX: &str = "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffed";
const GROUP_ORDER_HEX: &str = "1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed";

const POINT_BYTES: usize = 32;

static ORDERS: OnceLock<(BigNumber, BigNumber)> = OnceLock::new();

fn orders() -> &'static (BigNumber, BigNumber) {
    ORDERS.get_or_init(|| {
        let p = BigNumber::from_slice(hex::decode(FIELD_ORDER_HEX).expect("static hex is valid"));
        let n = BigNumber::from_slice(hex::decode(GROUP_ORDER_HEX).expect("static hex is valid"));
        (p, n)
    })
}

/// A Ristretto255 group element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ristretto255(RistrettoPoint);

impl Ristretto255 {
    /// Reduce a [`BigNumber`] into the scalar field.
    fn bn_to_scalar(x: &BigNumber) -> Scalar {
        let reduced = x.nmod(&orders().1);
        let bytes = reduced.to_bytes();
        let mut le = [0u8; 32];
        for (i, byte) in bytes.iter().rev().enumerate() {
            le[i] = *byte;
        }
        Scalar::from_bytes_mod_order(le)
    }
}

impl GroupElement for Ristretto255 {
    const NAME: &'static str = "ristretto255";

    fn field_order() -> BigNumber {
        orders().0.clone()
    }

    fn group_order() -> BigNumber {
        orders().1.clone()
    }

    fn generator() -> Self {
        Self(RISTRETTO_BASEPOINT_POINT)
    }

    fn identity() -> Self {
        Self(RistrettoPoint::identity())
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let r = random_positive_bn(rng, &orders().1);
        Self::base_scale(&r)
    }

    fn map_to_group(seed: &str) -> Result<Self> {
        let digest = Sha512::digest(seed.as_bytes());
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&digest);
        Ok(Self(RistrettoPoint::from_uniform_bytes(&wide)))
    }

    fn add(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    fn negate(&self) -> Self {
        Self(-self.0)
    }

    fn scale(&self, s: &BigNumber) -> Self {
        Self(self.0 * Self::bn_to_scalar(s))
    }

    fn base_scale(s: &BigNumber) -> Self {
        Self(RISTRETTO_BASEPOINT_POINT * Self::bn_to_scalar(s))
    }

    fn is_identity(&self) -> bool {
        self.0 == RistrettoPoint::identity()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.compress().to_bytes().to_vec()
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed = CompressedRistretto::from_slice(bytes).map_err(|_| {
            error!("ristretto encodings are exactly 32 bytes");
            CallerError::DeserializationFailed
        })?;
        let point = compressed.decompress().ok_or_else(|| {
            error!("bytes are not a canonical ristretto encoding");
            CallerError::DeserializationFailed
        })?;
        Ok(Self(point))
    }

    fn multiscalar_mul(bases: &[Self], scalars: &[BigNumber]) -> Result<Self> {
        if bases.len() != scalars.len() {
            Err(CallerError::InvalidLength)?;
        }
        let scalars = scalars.iter().map(Self::bn_to_scalar);
        let points = bases.iter().map(|b| b.0);
        Ok(Self(RistrettoPoint::vartime_multiscalar_mul(
            scalars, points,
        )))
    }
}

impl Serialize for Ristretto255 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let repr = EcPointRepr {
            x: bytes_to_decimal(&self.0.compress().to_bytes()),
            y: "0".into(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ristretto255 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = EcPointRepr::deserialize(deserializer)?;
        if repr.is_identity() {
            return Ok(Self::identity());
        }
        if repr.y != "0" {
            return Err(serde::de::Error::custom(
                "ristretto encodings carry no y coordinate",
            ));
        }
        let bytes = decimal_to_bytes(&repr.x, POINT_BYTES).map_err(serde::de::Error::custom)?;
        Self::try_from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn identity_serializes_to_zero_sentinel() {
        let json = serde_json::to_string(&Ristretto255::identity()).unwrap();
        assert_eq!(json, r#"{"x":"0","y":"0"}"#);
    }

    #[test]
    fn non_canonical_encoding_is_rejected() {
        // The field order itself is not a canonical point encoding.
        let mut bytes = hex::decode(FIELD_ORDER_HEX).unwrap();
        bytes.reverse();
        assert!(Ristretto255::try_from_bytes(&bytes).is_err());
        assert!(Ristretto255::try_from_bytes(&[1u8; 7]).is_err());
    }

    #[test]
    fn vartime_multiscalar_matches_naive() {
        let mut rng = init_testing();
        let bases: Vec<Ristretto255> = (0..8).map(|_| Ristretto255::random(&mut rng)).collect();
        let scalars: Vec<BigNumber> = (0..8)
            .map(|_| BigNumber::from_rng(&Ristretto255::group_order(), &mut rng))
            .collect();
        let naive = bases
            .iter()
            .zip(scalars.iter())
            .fold(Ristretto255::identity(), |acc, (b, s)| acc.add(&b.scale(s)));
        assert_eq!(
            Ristretto255::multiscalar_mul(&bases, &scalars).unwrap(),
            naive
        );
    }
}
