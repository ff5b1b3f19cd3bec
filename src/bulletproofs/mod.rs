// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Bulletproofs range proofs.
//!
//! Implements the single-value range proof of Bünz et al. (eprint 2017/1066):
//! setup derives all generators from public seeds (no trusted setup), the
//! prover shows that a Pedersen-committed value lies in `[0, 2^N)`, and the
//! logarithmic-size reduction is delegated to the
//! [`inner_product`](crate::bulletproofs::inner_product) argument. The
//! aggregated multi-value variant lives in
//! [`aggregate`](crate::bulletproofs::aggregate).
//!
//! Numbered comments refer to equations in the eprint version of the paper.

pub mod aggregate;
pub mod inner_product;

pub use aggregate::MultiRangeProof;
pub use inner_product::{InnerProductGens, InnerProductProof};

use crate::{
    errors::{CallerError, InternalError, Result},
    group::GroupElement,
    pedersen,
    utils::{is_power_of_two, random_positive_bn},
    vector::{
        compute_a_r, decompose, inner_product, power_of, sample_random_vector, vector_add,
        vector_copy, vector_exp, vector_from_digits, vector_mul, vector_scalar_mul, vector_sub,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::error;

/// Seed for the auxiliary generator `H` and the vectors `g_i`, `h_i`.
pub(crate) const SEEDH: &str = "BulletproofsDoesNotNeedTrustedSetupH";
/// Seed for the inner-product auxiliary generator `u`.
pub(crate) const SEEDU: &str = "BulletproofsDoesNotNeedTrustedSetupU";

/// Largest supported range exponent; ranges run to at most `2^32`.
pub(crate) const MAX_RANGE_BITS: usize = 32;

/// Two Fiat–Shamir challenges from a pair of elements: the SHA-256 digests of
/// the concatenated canonical encodings, in both operand orders.
pub(crate) fn hash_bp<G: GroupElement>(a: &G, b: &G) -> (BigNumber, BigNumber) {
    let mut first = Sha256::new();
    first.update(a.to_bytes());
    first.update(b.to_bytes());

    let mut second = Sha256::new();
    second.update(b.to_bytes());
    second.update(a.to_bytes());

    (
        BigNumber::from_slice(first.finalize()),
        BigNumber::from_slice(second.finalize()),
    )
}

/// Public parameters of the range proof: the bit-length `N` and the
/// seed-derived generators. Regenerable by anyone from the group alone.
#[derive(Debug, Clone)]
pub struct RangeProofParams<G: GroupElement> {
    pub(crate) nbits: usize,
    pub(crate) h: G,
    pub(crate) g_vec: Vec<G>,
    pub(crate) h_vec: Vec<G>,
    pub(crate) u: G,
}

impl<G: GroupElement> RangeProofParams<G> {
    /// Compute the common parameters for proving membership in
    /// `[0, range_end)`. Only works for `range_end = 2^N` where `N` is itself
    /// a power of two and at most [`MAX_RANGE_BITS`].
    pub fn setup(range_end: u64) -> Result<Self> {
        if !is_power_of_two(range_end) {
            error!("range end {range_end} is not a power of two");
            Err(CallerError::NonPowerOfTwo)?;
        }
        let nbits = range_end.trailing_zeros() as usize;
        if !is_power_of_two(nbits as u64) {
            error!("range exponent {nbits} is not a power of two");
            Err(CallerError::NonPowerOfTwo)?;
        }
        if nbits > MAX_RANGE_BITS {
            Err(CallerError::TooLarge)?;
        }

        let h = G::map_to_group(SEEDH)?;
        let mut g_vec = Vec::with_capacity(nbits);
        let mut h_vec = Vec::with_capacity(nbits);
        for i in 0..nbits {
            g_vec.push(G::map_to_group(&format!("{SEEDH}g{i}"))?);
            h_vec.push(G::map_to_group(&format!("{SEEDH}h{i}"))?);
        }
        let u = G::map_to_group(SEEDU)?;

        Ok(Self {
            nbits,
            h,
            g_vec,
            h_vec,
            u,
        })
    }

    /// The bit-length of the range.
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// The auxiliary generator `H` used for every Pedersen commitment of the
    /// proof system.
    pub fn aux_generator(&self) -> &G {
        &self.h
    }

    /// `delta(y, z) = (z - z²)·<1, y^n> - z³·<1, 2^n>`.
    fn delta(&self, y: &BigNumber, z: &BigNumber, order: &BigNumber) -> BigNumber {
        let z_sq = (z * z).nmod(order);
        let z_cu = (&z_sq * z).nmod(order);

        let sum_y = power_of(y, self.nbits, order)
            .iter()
            .fold(BigNumber::zero(), |acc, v| (&acc + v).nmod(order));
        let sum_two = power_of(&BigNumber::from(2u64), self.nbits, order)
            .iter()
            .fold(BigNumber::zero(), |acc, v| (&acc + v).nmod(order));

        let head = (&(z - &z_sq).nmod(order) * &sum_y).nmod(order);
        (&head - &(&z_cu * &sum_two).nmod(order)).nmod(order)
    }
}

/// Switch generators to `h'_i = y^{-i}·h_i`, used by both prover and
/// verifier.                                                            (64)
pub(crate) fn update_generators<G: GroupElement>(
    h_vec: &[G],
    y: &BigNumber,
    order: &BigNumber,
) -> Result<Vec<G>> {
    let y_inv = y.nmod(order).invert(order).ok_or_else(|| {
        error!("challenge y has no inverse");
        InternalError::InternalInvariantFailed
    })?;

    let mut h_prime = Vec::with_capacity(h_vec.len());
    let mut exponent = BigNumber::one();
    for (i, h) in h_vec.iter().enumerate() {
        if i == 0 {
            h_prime.push(h.clone());
        } else {
            exponent = (&exponent * &y_inv).nmod(order);
            h_prime.push(h.scale(&exponent));
        }
    }
    Ok(h_prime)
}

/// A zero-knowledge proof that a committed value lies in `[0, 2^N)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "G: GroupElement", deserialize = "G: GroupElement"))]
pub struct RangeProof<G: GroupElement> {
    /// The Pedersen commitment `V = v·G + γ·H` to the secret.
    #[serde(rename = "V")]
    pub(crate) v: G,
    #[serde(rename = "A")]
    pub(crate) a: G,
    #[serde(rename = "S")]
    pub(crate) s: G,
    #[serde(rename = "T1")]
    pub(crate) t1: G,
    #[serde(rename = "T2")]
    pub(crate) t2: G,
    #[serde(rename = "Taux", with = "crate::serialization::decimal")]
    pub(crate) tau_x: BigNumber,
    #[serde(rename = "Mu", with = "crate::serialization::decimal")]
    pub(crate) mu: BigNumber,
    #[serde(rename = "Tprime", with = "crate::serialization::decimal")]
    pub(crate) t_prime: BigNumber,
    #[serde(rename = "InnerProductProof")]
    pub(crate) ipp: InnerProductProof<G>,
}

impl<G: GroupElement> RangeProof<G> {
    /// The commitment `V` this proof asserts a range for.
    pub fn commitment(&self) -> &G {
        &self.v
    }
}

/// Compute the range proof for `secret ∈ [0, 2^N)`. Returns the proof and
/// the blinding `γ` of the commitment `V`, which the caller needs to open or
/// to link `V` into a larger statement.
pub fn prove<G: GroupElement, R: RngCore + CryptoRng>(
    secret: &BigNumber,
    params: &RangeProofParams<G>,
    rng: &mut R,
) -> Result<(RangeProof<G>, BigNumber)> {
    let order = G::group_order();
    let n = params.nbits;

    // Commitment to v and gamma.
    let gamma = random_positive_bn(rng, &order);
    let v = pedersen::commit(secret, &gamma, &params.h);

    // aL, aR and commitment (A, alpha).                          (41) - (44)
    let a_l_bits = decompose(secret, 2, n);
    let a_r_bits = compute_a_r(&a_l_bits)?;
    let a_l = vector_from_digits(&a_l_bits);
    let a_r = vector_from_digits(&a_r_bits);
    let alpha = random_positive_bn(rng, &order);
    let a = pedersen::commit_vectors(&a_l, &a_r, &alpha, &params.h, &params.g_vec, &params.h_vec)?;

    // sL, sR and commitment (S, rho).                            (45) - (47)
    let s_l = sample_random_vector(n, &order, rng);
    let s_r = sample_random_vector(n, &order, rng);
    let rho = random_positive_bn(rng, &order);
    let s = pedersen::commit_vectors(&s_l, &s_r, &rho, &params.h, &params.g_vec, &params.h_vec)?;

    // Challenges y and z.                                               (49)
    let (y, z) = hash_bp(&a, &s);
    let y = y.nmod(&order);
    let z = z.nmod(&order);

    // t(x) coefficients:
    //   l0 = aL - z·1, l1 = sL
    //   r0 = y^n ⊙ (aR + z·1) + z²·2^n, r1 = y^n ⊙ sR
    //   t1 = <l1, r0> + <l0, r1>, t2 = <l1, r1>
    let vz = vector_copy(&z, n);
    let vy = power_of(&y, n, &order);

    let l0 = vector_sub(&a_l, &vz, &order)?;
    let r1 = vector_mul(&vy, &s_r, &order)?;

    let z_sq = (&z * &z).nmod(&order);
    let two_n = power_of(&BigNumber::from(2u64), n, &order);
    let z2_2n = vector_scalar_mul(&two_n, &z_sq, &order);

    let a_r_plus_z = vector_add(&a_r, &vz, &order)?;
    let r0 = vector_add(&vector_mul(&vy, &a_r_plus_z, &order)?, &z2_2n, &order)?;

    let t1 = (&inner_product(&s_l, &r0, &order)? + &inner_product(&l0, &r1, &order)?).nmod(&order);
    let t2 = inner_product(&s_l, &r1, &order)?;

    // T1, T2 and challenge x.                                    (52) - (56)
    let tau1 = random_positive_bn(rng, &order);
    let tau2 = random_positive_bn(rng, &order);
    let t1_commit = pedersen::commit(&t1, &tau1, &params.h);
    let t2_commit = pedersen::commit(&t2, &tau2, &params.h);

    let (x, _) = hash_bp(&t1_commit, &t2_commit);
    let x = x.nmod(&order);

    // l = l0 + x·l1, r = r0 + x·r1, t' = <l, r>.                 (58) - (60)
    let l_vec = vector_add(&l0, &vector_scalar_mul(&s_l, &x, &order), &order)?;
    let r_vec = vector_add(&r0, &vector_scalar_mul(&r1, &x, &order), &order)?;
    let t_prime = inner_product(&l_vec, &r_vec, &order)?;

    // taux = tau2·x² + tau1·x + z²·gamma; mu = alpha + rho·x.    (61) - (62)
    let x_sq = (&x * &x).nmod(&order);
    let tau_x = (&(&(&tau2 * &x_sq) + &(&tau1 * &x)) + &(&z_sq * &gamma)).nmod(&order);
    let mu = (&alpha + &(&rho * &x)).nmod(&order);

    // Inner product over (g, h', P, t').
    let h_prime = update_generators(&params.h_vec, &y, &order)?;
    let p_ip = vector_exp(&params.g_vec, &l_vec)?.add(&vector_exp(&h_prime, &r_vec)?);
    let gens = InnerProductGens::from_parts(params.u.clone(), params.g_vec.clone(), h_prime);
    let ipp = InnerProductProof::prove(&l_vec, &r_vec, &p_ip, &t_prime, &gens)?;

    Ok((
        RangeProof {
            v,
            a,
            s,
            t1: t1_commit,
            t2: t2_commit,
            tau_x,
            mu,
            t_prime,
            ipp,
        },
        gamma,
    ))
}

impl<G: GroupElement> RangeProof<G> {
    /// Verify the proof against the given setup parameters. Returns `true`
    /// iff all three checks of the protocol hold.
    pub fn verify(&self, params: &RangeProofParams<G>) -> bool {
        let order = G::group_order();
        let n = params.nbits;

        // Recover x, y, z.
        let (x, _) = hash_bp(&self.t1, &self.t2);
        let (y, z) = hash_bp(&self.a, &self.s);
        let x = x.nmod(&order);
        let y = y.nmod(&order);
        let z = z.nmod(&order);

        let h_prime = match update_generators(&params.h_vec, &y, &order) {
            Ok(hp) => hp,
            Err(_) => return false,
        };

        let z_sq = (&z * &z).nmod(&order);
        let x_sq = (&x * &x).nmod(&order);

        // t'·G + taux·H == z²·V + delta(y,z)·G + x·T1 + x²·T2             (65)
        let lhs = pedersen::commit(&self.t_prime, &self.tau_x, &params.h);
        let rhs = self
            .v
            .scale(&z_sq)
            .add(&G::base_scale(&params.delta(&y, &z, &order)))
            .add(&self.t1.scale(&x))
            .add(&self.t2.scale(&x_sq));
        let c65 = lhs == rhs;

        // mu·H + P == A + x·S + (-z)·Σg + (z·y^i + z²·2^i)·Σh'       (66)+(67)
        let minus_z = (&order - &z).nmod(&order);
        let vy = power_of(&y, n, &order);
        let zyn = vector_scalar_mul(&vy, &z, &order);
        let two_n = power_of(&BigNumber::from(2u64), n, &order);
        let z2_2n = vector_scalar_mul(&two_n, &z_sq, &order);

        let lp = {
            let asx = self.a.add(&self.s.scale(&x));
            let g_part = match vector_exp(&params.g_vec, &vector_copy(&minus_z, n)) {
                Ok(e) => e,
                Err(_) => return false,
            };
            let h_exps = match vector_add(&zyn, &z2_2n, &order) {
                Ok(e) => e,
                Err(_) => return false,
            };
            let h_part = match vector_exp(&h_prime, &h_exps) {
                Ok(e) => e,
                Err(_) => return false,
            };
            asx.add(&g_part).add(&h_part)
        };
        let rp = params.h.scale(&self.mu).add(self.ipp.commitment());
        let c67 = rp == lp;

        // The inner-product argument must target t' and verify.
        let c_target = *self.ipp.claimed_product() == self.t_prime.nmod(&order);
        let gens =
            InnerProductGens::from_parts(params.u.clone(), params.g_vec.clone(), h_prime);
        let c_ipp = self.ipp.verify(&gens);

        c65 && c67 && c_target && c_ipp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{group::Ristretto255, utils::testing::init_testing};

    type G = Ristretto255;

    fn params() -> RangeProofParams<G> {
        RangeProofParams::setup(256).unwrap()
    }

    #[test]
    fn setup_validates_the_range_end() {
        assert!(RangeProofParams::<G>::setup(65536).is_ok());
        // 2^5: the exponent is not a power of two.
        assert!(RangeProofParams::<G>::setup(32).is_err());
        assert!(RangeProofParams::<G>::setup(1000).is_err());
        assert!(RangeProofParams::<G>::setup(0).is_err());
        // 2^64 overflows the supported exponent.
        assert!(RangeProofParams::<G>::setup(1u64 << 33).is_err());
    }

    #[test]
    fn honest_proofs_verify() {
        let mut rng = init_testing();
        let params = params();
        for value in [0u64, 1, 127, 255] {
            let (proof, _gamma) =
                prove(&BigNumber::from(value), &params, &mut rng).unwrap();
            assert!(proof.verify(&params), "value {value} must verify");
        }
    }

    #[test]
    fn out_of_range_secret_is_rejected() {
        let mut rng = init_testing();
        let params = params();
        // 300 ≥ 2^8: the bit decomposition truncates, so V no longer matches.
        let (proof, _) = prove(&BigNumber::from(300u64), &params, &mut rng).unwrap();
        assert!(!proof.verify(&params));

        // Same for a negative secret, which decomposes as its residue.
        let (proof, _) = prove(&(-BigNumber::one()), &params, &mut rng).unwrap();
        assert!(!proof.verify(&params));
    }

    #[test]
    fn tampered_proofs_are_rejected() {
        let mut rng = init_testing();
        let params = params();
        let (proof, _) = prove(&BigNumber::from(42u64), &params, &mut rng).unwrap();
        assert!(proof.verify(&params));

        let mut bad = proof.clone();
        bad.v = bad.v.add(&G::generator());
        assert!(!bad.verify(&params));

        let mut bad = proof.clone();
        bad.a = bad.a.add(&G::generator());
        assert!(!bad.verify(&params));

        let mut bad = proof.clone();
        bad.tau_x = (&bad.tau_x + &BigNumber::one()).nmod(&G::group_order());
        assert!(!bad.verify(&params));

        let mut bad = proof.clone();
        bad.t_prime = (&bad.t_prime + &BigNumber::one()).nmod(&G::group_order());
        assert!(!bad.verify(&params));

        let mut bad = proof;
        bad.mu = (&bad.mu + &BigNumber::one()).nmod(&G::group_order());
        assert!(!bad.verify(&params));
    }

    #[test]
    fn proofs_survive_json_round_trip() {
        let mut rng = init_testing();
        let params = params();
        let (proof, _) = prove(&BigNumber::from(200u64), &params, &mut rng).unwrap();

        let json = serde_json::to_string(&proof).unwrap();
        let decoded: RangeProof<G> = serde_json::from_str(&json).unwrap();
        assert!(decoded.verify(&params));
    }
}
