//! The RFC 3526 3072-bit modular exponentiation group.
//!
//! Elements live in the prime-order subgroup of quadratic residues of
//! `(Z/pZ)*` for the safe prime `p = 2q + 1`, written multiplicatively: the
//! group "addition" is modular multiplication, "negation" is modular
//! inversion, and "scaling" is modular exponentiation.

use crate::{
    errors::{CallerError, Result},
    group::GroupElement,
    serialization::{from_decimal, to_decimal},
    utils::{random_positive_bn, CRYPTOGRAPHIC_RETRY_MAX},
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use tracing::error;

/// The RFC 3526 3072-bit MODP prime, transcribed from the RFC.
const MODP3072_PRIME: &str = "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
    29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
    EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
    E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
    EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
    C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
    83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
    670C354E 4ABC9804 F1746C08 CA18217C 32905E46 2E36CE3B
    E39E772C 180E8603 9B2783A2 EC07A28F B5C55DF0 6F4C52C9
    DE2BCBF6 95581718 3995497C EA956AE5 15D22618 98FA0510
    15728E5A 8AAAC42D AD33170D 04507A33 A85521AB DF1CBA64
    ECFB8504 58DBEF0A 8AEA7157 5D060C7D B3970F85 A6E1E4C7
    ABF5AE8C DB0933D7 1E8C94E0 4A25619D CEE3D226 1AD2EE6B
    F12FFA06 D98A0864 D8760273 3EC86A64 521F2B18 177B200C
    BBE11757 7A615D6C 770988C0 BAD946E2 08E24FA0 74E5AB31
    43DB5BFC E0FD108E 4B82D120 A93AD2CA FFFFFFFF FFFFFFFF";

const MODP3072_GENERATOR: u64 = 2;

static ORDERS: OnceLock<(BigNumber, BigNumber)> = OnceLock::new();

/// `(p, q)` where `p` is the field order and `q = (p - 1) / 2` the group
/// order.
fn orders() -> &'static (BigNumber, BigNumber) {
    ORDERS.get_or_init(|| {
        let repr: String = MODP3072_PRIME.split_whitespace().collect();
        let bytes = hex::decode(repr).expect("the RFC 3526 prime is valid hex");
        // The group order of a safe-prime subgroup is q = (p - 1) / 2.
        let halved = num_bigint::BigUint::from_bytes_be(&bytes) >> 1u32;
        let p = BigNumber::from_slice(bytes);
        let q = BigNumber::from_slice(halved.to_bytes_be());
        (p, q)
    })
}

/// An element of the RFC 3526 3072-bit quadratic-residue subgroup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModP3072 {
    val: BigNumber,
}

impl ModP3072 {
    fn from_val(val: BigNumber) -> Self {
        Self { val }
    }

    /// Expand a seed into `len` pseudorandom bytes with counter-mode SHA-256.
    fn expand_seed(seed: &str, counter: u32, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len + 32);
        let mut block: u32 = 0;
        while out.len() < len {
            let mut hasher = Sha256::new();
            hasher.update(seed.as_bytes());
            hasher.update(counter.to_be_bytes());
            hasher.update(block.to_be_bytes());
            out.extend_from_slice(&hasher.finalize());
            block += 1;
        }
        out.truncate(len);
        out
    }
}

impl GroupElement for ModP3072 {
    const NAME: &'static str = "RFC3526ModPGroup3072";

    fn field_order() -> BigNumber {
        orders().0.clone()
    }

    fn group_order() -> BigNumber {
        orders().1.clone()
    }

    fn generator() -> Self {
        Self::from_val(BigNumber::from(MODP3072_GENERATOR))
    }

    fn identity() -> Self {
        Self::from_val(BigNumber::one())
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let r = random_positive_bn(rng, &orders().1);
        Self::base_scale(&r)
    }

    fn map_to_group(seed: &str) -> Result<Self> {
        let (p, _) = orders();
        // Oversample by 128 bits so the reduction mod p is negligibly biased,
        // then square to land in the quadratic-residue subgroup.
        let len = p.to_bytes().len() + 16;
        for counter in 0..CRYPTOGRAPHIC_RETRY_MAX as u32 {
            let raw = BigNumber::from_slice(Self::expand_seed(seed, counter, len)).nmod(p);
            let candidate = raw.modpow(&BigNumber::from(2u64), p);
            if candidate > BigNumber::one() {
                return Ok(Self::from_val(candidate));
            }
        }
        error!("failed to map seed to a non-trivial subgroup element");
        Err(CallerError::RetryFailed)?
    }

    fn add(&self, other: &Self) -> Self {
        let (p, _) = orders();
        Self::from_val((&self.val * &other.val).nmod(p))
    }

    fn negate(&self) -> Self {
        let (p, _) = orders();
        let inv = self
            .val
            .invert(p)
            .expect("nonzero elements of a prime field are invertible");
        Self::from_val(inv)
    }

    fn scale(&self, s: &BigNumber) -> Self {
        let (p, q) = orders();
        Self::from_val(self.val.modpow(&s.nmod(q), p))
    }

    fn base_scale(s: &BigNumber) -> Self {
        let (p, q) = orders();
        Self::from_val(BigNumber::from(MODP3072_GENERATOR).modpow(&s.nmod(q), p))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.val.to_bytes()
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let val = BigNumber::from_slice(bytes);
        let (p, _) = orders();
        if val < BigNumber::one() || &val >= p {
            error!("field element out of range");
            Err(CallerError::DeserializationFailed)?;
        }
        Ok(Self::from_val(val))
    }
}

impl Serialize for ModP3072 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_decimal(&self.val))
    }
}

impl<'de> Deserialize<'de> for ModP3072 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let val = from_decimal(&s).map_err(serde::de::Error::custom)?;
        let (p, _) = orders();
        if val < BigNumber::one() || &val >= p {
            return Err(serde::de::Error::custom("field element out of range"));
        }
        Ok(Self::from_val(val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn group_order_is_half_the_field() {
        let (p, q) = orders();
        assert_eq!(&(q * &BigNumber::from(2u64)) + &BigNumber::one(), *p);
    }

    #[test]
    fn generator_has_subgroup_order() {
        // g^q == 1 confirms the generator lands in the order-q subgroup.
        let g = ModP3072::generator();
        assert!(g.scale(&ModP3072::group_order()).is_identity());
    }

    #[test]
    fn identity_is_one() {
        assert_eq!(to_decimal(&ModP3072::identity().val), "1");
    }

    #[test]
    fn mapped_elements_are_quadratic_residues() {
        let (p, q) = orders();
        let e = ModP3072::map_to_group("some seed").unwrap();
        // A quadratic residue raised to q is 1.
        assert_eq!(e.val.modpow(q, p), BigNumber::one());
    }

    #[test]
    fn decode_rejects_out_of_range() {
        assert!(ModP3072::try_from_bytes(&[]).is_err());
        assert!(ModP3072::try_from_bytes(&ModP3072::field_order().to_bytes()).is_err());
    }

    #[test]
    fn random_elements_differ() {
        let mut rng = init_testing();
        let a = ModP3072::random(&mut rng);
        let b = ModP3072::random(&mut rng);
        assert_ne!(a, b);
    }
}
