//! NIST P-384 group backend.

use crate::{
    errors::{CallerError, InternalError, Result},
    group::{EcPointRepr, GroupElement},
    serialization::{bytes_to_decimal, decimal_to_bytes},
    utils::random_positive_bn,
};
use generic_array::GenericArray;
use libpaillier::unknown_order::BigNumber;
use p384::{
    elliptic_curve::{
        hash2curve::{ExpandMsgXmd, GroupDigest},
        sec1::{FromEncodedPoint, ToEncodedPoint},
        PrimeField,
    },
    AffinePoint, EncodedPoint, FieldBytes, NistP384, ProjectivePoint, Scalar,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha384;
use std::sync::OnceLock;
use tracing::error;
use zeroize::Zeroizing;

const FIELD_ORDER_HEX: &str = "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe\
                               ffffffff0000000000000000ffffffff";
const GROUP_ORDER_HEX: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf\
                               581a0db248b0a77aecec196accc52973";

/// Domain separation tag for hash-to-curve.
const DST: &[u8] = b"BALLOTPROOF-V01-P384_XMD:SHA-384_SSWU_RO_";

const FIELD_BYTES: usize = 48;

static ORDERS: OnceLock<(BigNumber, BigNumber)> = OnceLock::new();

fn orders() -> &'static (BigNumber, BigNumber) {
    ORDERS.get_or_init(|| {
        let p = BigNumber::from_slice(hex::decode(FIELD_ORDER_HEX).expect("static hex is valid"));
        let n = BigNumber::from_slice(hex::decode(GROUP_ORDER_HEX).expect("static hex is valid"));
        (p, n)
    })
}

/// A point on NIST P-384.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct P384(ProjectivePoint);

impl P384 {
    /// Reduce a [`BigNumber`] into the scalar field.
    fn bn_to_scalar(x: &BigNumber) -> Scalar {
        let reduced = x.nmod(&orders().1);
        let bytes = Zeroizing::new(reduced.to_bytes());
        let mut padded = Zeroizing::new(vec![0u8; FIELD_BYTES - bytes.len()]);
        padded.extend_from_slice(&bytes);
        Option::<Scalar>::from(Scalar::from_repr(GenericArray::clone_from_slice(&padded)))
            .expect("reduced scalar fits the field")
    }
}

impl GroupElement for P384 {
    const NAME: &'static str = "P-384";

    fn field_order() -> BigNumber {
        orders().0.clone()
    }

    fn group_order() -> BigNumber {
        orders().1.clone()
    }

    fn generator() -> Self {
        Self(ProjectivePoint::GENERATOR)
    }

    fn identity() -> Self {
        Self(ProjectivePoint::IDENTITY)
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let r = random_positive_bn(rng, &orders().1);
        Self::base_scale(&r)
    }

    fn map_to_group(seed: &str) -> Result<Self> {
        let point = NistP384::hash_from_bytes::<ExpandMsgXmd<Sha384>>(&[seed.as_bytes()], &[DST])
            .map_err(|_| {
                error!("hash-to-curve failed for P-384");
                InternalError::InternalInvariantFailed
            })?;
        Ok(Self(point))
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
        Self(ProjectivePoint::GENERATOR * Self::bn_to_scalar(s))
    }

    fn is_identity(&self) -> bool {
        self.0 == ProjectivePoint::IDENTITY
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(false).as_bytes().to_vec()
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| {
            error!("failed to parse bytes as a SEC1 point encoding");
            CallerError::DeserializationFailed
        })?;
        let affine =
            Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded)).ok_or_else(
                || {
                    error!("encoded coordinates are not on the P-384 curve");
                    CallerError::DeserializationFailed
                },
            )?;
        Ok(Self(affine.into()))
    }
}

impl Serialize for P384 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let encoded = self.0.to_affine().to_encoded_point(false);
        let repr = match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => EcPointRepr {
                x: bytes_to_decimal(x),
                y: bytes_to_decimal(y),
            },
            _ => EcPointRepr::identity(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for P384 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = EcPointRepr::deserialize(deserializer)?;
        if repr.is_identity() {
            return Ok(Self(ProjectivePoint::IDENTITY));
        }
        let x = decimal_to_bytes(&repr.x, FIELD_BYTES).map_err(serde::de::Error::custom)?;
        let y = decimal_to_bytes(&repr.y, FIELD_BYTES).map_err(serde::de::Error::custom)?;
        let encoded = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| serde::de::Error::custom("coordinates are not on the P-384 curve"))?;
        Ok(Self(affine.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_serializes_to_zero_sentinel() {
        let json = serde_json::to_string(&P384::identity()).unwrap();
        assert_eq!(json, r#"{"x":"0","y":"0"}"#);
    }

    #[test]
    fn off_curve_coordinates_are_rejected() {
        let junk = r#"{"x":"3","y":"7"}"#;
        assert!(serde_json::from_str::<P384>(junk).is_err());
    }
}
