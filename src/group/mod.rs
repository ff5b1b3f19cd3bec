//! Prime-order group abstraction.
//!
//! Every protocol in this crate is generic over a prime-order group: the
//! ElGamal layer runs in a multiplicative subgroup of a prime field, the
//! Bulletproofs layer in an elliptic-curve group, and the cross-group sigma
//! protocol straddles one of each. The [`GroupElement`] trait is the single
//! seam: element arithmetic, scalar multiplication, hash-to-element, and the
//! canonical binary and JSON encodings.
//!
//! Elements of different groups are different Rust types, so combining them
//! is a compile error rather than a runtime check.

use crate::errors::Result;
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

pub(crate) mod k256;
pub(crate) mod modp;
pub(crate) mod p256;
pub(crate) mod p384;
pub(crate) mod ristretto;

pub use self::k256::K256;
pub use self::modp::ModP3072;
pub use self::p256::P256;
pub use self::p384::P384;
pub use self::ristretto::Ristretto255;

/// An element of a prime-order group over a prime field.
///
/// Arithmetic is value-producing: operations return fresh elements and never
/// mutate their receivers. Scalars are [`BigNumber`]s and are reduced modulo
/// [`GroupElement::group_order`] before use, so any integer representative is
/// accepted.
pub trait GroupElement:
    'static + Clone + Debug + Eq + PartialEq + Send + Sync + Serialize + DeserializeOwned
{
    /// Human-readable group name, also used as the JSON group identifier.
    const NAME: &'static str;

    /// The order of the field over which the group is defined.
    fn field_order() -> BigNumber;

    /// The order of the group.
    fn group_order() -> BigNumber;

    /// The fixed generator.
    fn generator() -> Self;

    /// The identity element.
    fn identity() -> Self;

    /// A uniformly random element, obtained as `r·G` for random `r`.
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self;

    /// Hash a seed string to a group element whose discrete logarithm with
    /// respect to the generator is not known. Deterministic in the seed.
    fn map_to_group(seed: &str) -> Result<Self>;

    /// `self + other`.
    fn add(&self, other: &Self) -> Self;

    /// `self - other`.
    fn subtract(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    /// The inverse of `self` under the group operation.
    fn negate(&self) -> Self;

    /// `s·self`, with `s` reduced modulo the group order.
    fn scale(&self, s: &BigNumber) -> Self;

    /// `s·G` for the fixed generator `G`.
    fn base_scale(s: &BigNumber) -> Self;

    /// True if `self` is the identity element.
    fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Canonical binary encoding; round-trips through
    /// [`GroupElement::try_from_bytes`].
    fn to_bytes(&self) -> Vec<u8>;

    /// Decode the canonical binary encoding.
    fn try_from_bytes(bytes: &[u8]) -> Result<Self>;

    /// `Σ scalars[i]·bases[i]`.
    ///
    /// Backends with a native multi-scalar multiplication override this; the
    /// default is a plain fold.
    fn multiscalar_mul(bases: &[Self], scalars: &[BigNumber]) -> Result<Self> {
        if bases.len() != scalars.len() {
            Err(crate::errors::CallerError::InvalidLength)?;
        }
        Ok(bases
            .iter()
            .zip(scalars.iter())
            .fold(Self::identity(), |acc, (base, s)| acc.add(&base.scale(s))))
    }
}

/// Affine JSON form of a curve point: decimal `x` and `y` coordinates, with
/// `("0", "0")` as the sentinel for the identity.
#[derive(Serialize, Deserialize)]
pub(crate) struct EcPointRepr {
    pub(crate) x: String,
    pub(crate) y: String,
}

impl EcPointRepr {
    pub(crate) fn identity() -> Self {
        EcPointRepr {
            x: "0".into(),
            y: "0".into(),
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.x == "0" && self.y == "0"
    }
}

/// Description of a prime-order group instance used by a proof system:
/// the generator `G`, an auxiliary element `H` with unknown discrete
/// logarithm relative to `G`, and the group and field orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "G: GroupElement", deserialize = "G: GroupElement"))]
pub struct GroupParams<G: GroupElement> {
    /// Group generator.
    #[serde(rename = "G")]
    pub g: G,
    /// Generator whose logarithm to the base `G` is not known.
    #[serde(rename = "H")]
    pub h: G,
    /// Group order.
    #[serde(rename = "N", with = "crate::serialization::decimal")]
    pub n: BigNumber,
    /// Field order.
    #[serde(rename = "F", with = "crate::serialization::decimal")]
    pub f: BigNumber,
}

impl<G: GroupElement> GroupParams<G> {
    /// Build a descriptor around a caller-supplied auxiliary element, such as
    /// an ElGamal public key.
    pub fn from_auxiliary(h: G) -> Self {
        Self {
            g: G::generator(),
            h,
            n: G::group_order(),
            f: G::field_order(),
        }
    }

    /// Build a descriptor whose auxiliary element is derived from a public
    /// seed via hash-to-element, so its discrete logarithm is unknown to
    /// everyone.
    pub fn hashed(seed: &str) -> Result<Self> {
        Ok(Self::from_auxiliary(G::map_to_group(seed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    fn group_laws<G: GroupElement>() {
        let mut rng = init_testing();
        let a = G::random(&mut rng);
        let b = G::random(&mut rng);
        let c = G::random(&mut rng);

        // Associativity and identity.
        assert_eq!(a.add(&b).add(&c), a.add(&b.add(&c)));
        assert_eq!(a.add(&G::identity()), a);
        assert!(G::identity().is_identity());

        // Inverses.
        assert!(a.negate().add(&a).is_identity());
        assert_eq!(a.subtract(&a), G::identity());

        // Scaling by the group order yields the identity.
        assert!(a.scale(&G::group_order()).is_identity());

        // scale on the generator agrees with base_scale.
        let s = BigNumber::from_rng(&G::group_order(), &mut rng);
        assert_eq!(G::generator().scale(&s), G::base_scale(&s));

        // Doubling via addition agrees with scaling.
        let two = BigNumber::from(2u64);
        assert_eq!(a.add(&a), a.scale(&two));

        // Negative scalars act as inverses.
        let minus_one = -BigNumber::one();
        assert_eq!(a.scale(&minus_one), a.negate());
    }

    fn encodings_round_trip<G: GroupElement>() {
        let mut rng = init_testing();
        for element in [G::random(&mut rng), G::generator(), G::identity()] {
            let bytes = element.to_bytes();
            assert_eq!(G::try_from_bytes(&bytes).unwrap(), element);

            let json = serde_json::to_string(&element).unwrap();
            let back: G = serde_json::from_str(&json).unwrap();
            assert_eq!(back, element);
        }
    }

    fn map_to_group_is_deterministic<G: GroupElement>() {
        let x = G::map_to_group("seed one").unwrap();
        let y = G::map_to_group("seed one").unwrap();
        let z = G::map_to_group("seed two").unwrap();
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert!(!x.is_identity());
    }

    fn multiscalar_matches_fold<G: GroupElement>() {
        let mut rng = init_testing();
        let bases: Vec<G> = (0..4).map(|_| G::random(&mut rng)).collect();
        let scalars: Vec<BigNumber> = (0..4)
            .map(|_| BigNumber::from_rng(&G::group_order(), &mut rng))
            .collect();
        let expected = bases
            .iter()
            .zip(scalars.iter())
            .fold(G::identity(), |acc, (b, s)| acc.add(&b.scale(s)));
        assert_eq!(G::multiscalar_mul(&bases, &scalars).unwrap(), expected);
        assert!(G::multiscalar_mul(&bases, &scalars[..3]).is_err());
    }

    macro_rules! group_test_suite {
        ($name:ident, $group:ty) => {
            mod $name {
                use super::*;

                #[test]
                fn laws_hold() {
                    group_laws::<$group>();
                }

                #[test]
                fn encodings_round_trip_ok() {
                    encodings_round_trip::<$group>();
                }

                #[test]
                fn hash_to_element_deterministic() {
                    map_to_group_is_deterministic::<$group>();
                }

                #[test]
                fn multiscalar_agrees() {
                    multiscalar_matches_fold::<$group>();
                }
            }
        };
    }

    group_test_suite!(modp3072, ModP3072);
    group_test_suite!(nist_p256, P256);
    group_test_suite!(nist_p384, P384);
    group_test_suite!(secp256k1, K256);
    group_test_suite!(ristretto255, Ristretto255);
}
