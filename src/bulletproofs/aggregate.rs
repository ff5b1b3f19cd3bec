// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Aggregated range proofs for several values at once.
//!
//! The `N` bits of the setup are split evenly across `m` secrets, so a single
//! proof (with one inner-product argument) asserts `v_j ∈ [0, 2^(N/m))` for
//! every `j`. The per-value terms reuse the single-proof algebra with `z²`
//! generalized to the powers `z^(j+2)`.

use crate::{
    bulletproofs::{hash_bp, update_generators, InnerProductGens, InnerProductProof, RangeProofParams},
    errors::{CallerError, Result},
    group::GroupElement,
    pedersen,
    utils::random_positive_bn,
    vector::{
        compute_a_r, decompose, inner_product, power_of, sample_random_vector, vector_add,
        vector_add_const, vector_copy, vector_exp, vector_from_digits, vector_mul,
        vector_scalar_mul,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// An aggregated proof that each committed value `v_j` lies in
/// `[0, 2^(N/m))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "G: GroupElement", deserialize = "G: GroupElement"))]
pub struct MultiRangeProof<G: GroupElement> {
    /// Pedersen commitments to the secrets, in proving order.
    #[serde(rename = "Vs")]
    pub(crate) vs: Vec<G>,
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

impl<G: GroupElement> MultiRangeProof<G> {
    /// The commitments this proof asserts ranges for.
    pub fn commitments(&self) -> &[G] {
        &self.vs
    }
}

/// The exponent vector packing `2^i` against the per-value powers of `z`:
/// entry `j·nm + i` is `z^(j+2)·2^i`.
fn z_powers_times_two(
    z: &BigNumber,
    m: usize,
    bits_per_value: usize,
    order: &BigNumber,
) -> Vec<BigNumber> {
    let two_pow = power_of(&BigNumber::from(2u64), bits_per_value, order);
    let mut out = Vec::with_capacity(m * bits_per_value);
    let z_sq = (z * z).nmod(order);
    let mut zp = z_sq;
    for _ in 0..m {
        for two_i in &two_pow {
            out.push((&zp * two_i).nmod(order));
        }
        zp = (&zp * z).nmod(order);
    }
    out
}

/// Compute the aggregated range proof for `secrets[j] ∈ [0, 2^(N/m))`.
/// Returns the proof and the blindings of the commitments `V_j`.
pub fn multi_prove<G: GroupElement, R: RngCore + CryptoRng>(
    secrets: &[BigNumber],
    params: &RangeProofParams<G>,
    rng: &mut R,
) -> Result<(MultiRangeProof<G>, Vec<BigNumber>)> {
    let order = G::group_order();
    let n = params.nbits;
    let m = secrets.len();
    if m == 0 || n % m != 0 {
        Err(CallerError::InvalidSize)?;
    }
    let bits_per_value = n / m;

    // Per-value commitments and the concatenated bit decompositions.
    let mut vs = Vec::with_capacity(m);
    let mut gammas = Vec::with_capacity(m);
    let mut a_l_bits = Vec::with_capacity(n);
    for secret in secrets {
        let gamma = random_positive_bn(rng, &order);
        vs.push(pedersen::commit(secret, &gamma, &params.h));
        gammas.push(gamma);
        a_l_bits.extend(decompose(secret, 2, bits_per_value));
    }
    let a_r_bits = compute_a_r(&a_l_bits)?;
    let a_l = vector_from_digits(&a_l_bits);
    let a_r = vector_from_digits(&a_r_bits);

    // Commitments (A, alpha) and (S, rho).
    let alpha = random_positive_bn(rng, &order);
    let a = pedersen::commit_vectors(&a_l, &a_r, &alpha, &params.h, &params.g_vec, &params.h_vec)?;
    let s_l = sample_random_vector(n, &order, rng);
    let s_r = sample_random_vector(n, &order, rng);
    let rho = random_positive_bn(rng, &order);
    let s = pedersen::commit_vectors(&s_l, &s_r, &rho, &params.h, &params.g_vec, &params.h_vec)?;

    let (y, z) = hash_bp(&a, &s);
    let y = y.nmod(&order);
    let z = z.nmod(&order);

    let vy = power_of(&y, n, &order);
    let z_two = z_powers_times_two(&z, m, bits_per_value, &order);

    // l(x) and r(x) coefficients, with z² replaced by the packed powers.
    let minus_z = (&order - &z).nmod(&order);
    let l0 = vector_add_const(&a_l, &minus_z, &order);
    let a_r_plus_z = vector_add_const(&a_r, &z, &order);
    let r0 = vector_add(&vector_mul(&vy, &a_r_plus_z, &order)?, &z_two, &order)?;
    let r1 = vector_mul(&vy, &s_r, &order)?;

    let t1 = (&inner_product(&s_l, &r0, &order)? + &inner_product(&l0, &r1, &order)?).nmod(&order);
    let t2 = inner_product(&s_l, &r1, &order)?;

    let tau1 = random_positive_bn(rng, &order);
    let tau2 = random_positive_bn(rng, &order);
    let t1_commit = pedersen::commit(&t1, &tau1, &params.h);
    let t2_commit = pedersen::commit(&t2, &tau2, &params.h);

    let (x, _) = hash_bp(&t1_commit, &t2_commit);
    let x = x.nmod(&order);
    let x_sq = (&x * &x).nmod(&order);

    let l_vec = vector_add(&l0, &vector_scalar_mul(&s_l, &x, &order), &order)?;
    let r_vec = vector_add(&r0, &vector_scalar_mul(&r1, &x, &order), &order)?;
    let t_prime = inner_product(&l_vec, &r_vec, &order)?;

    // taux folds every blinding against its power of z.
    let mut tau_x = (&(&tau2 * &x_sq) + &(&tau1 * &x)).nmod(&order);
    let z_sq = (&z * &z).nmod(&order);
    let mut zp = z_sq;
    for gamma in &gammas {
        tau_x = (&tau_x + &(&zp * gamma)).nmod(&order);
        zp = (&zp * &z).nmod(&order);
    }
    let mu = (&alpha + &(&rho * &x)).nmod(&order);

    let h_prime = update_generators(&params.h_vec, &y, &order)?;
    let p_ip = vector_exp(&params.g_vec, &l_vec)?.add(&vector_exp(&h_prime, &r_vec)?);
    let gens = InnerProductGens::from_parts(params.u.clone(), params.g_vec.clone(), h_prime);
    let ipp = InnerProductProof::prove(&l_vec, &r_vec, &p_ip, &t_prime, &gens)?;

    Ok((
        MultiRangeProof {
            vs,
            a,
            s,
            t1: t1_commit,
            t2: t2_commit,
            tau_x,
            mu,
            t_prime,
            ipp,
        },
        gammas,
    ))
}

impl<G: GroupElement> MultiRangeProof<G> {
    /// `delta(y, z) = (z - z²)·<1, y^n> - Σ_j z^(j+3)·<1, 2^(n/m)>`.
    fn delta_mul(
        params: &RangeProofParams<G>,
        y: &BigNumber,
        z: &BigNumber,
        m: usize,
        order: &BigNumber,
    ) -> BigNumber {
        let bits_per_value = params.nbits / m;
        let z_sq = (z * z).nmod(order);

        let sum_y = power_of(y, params.nbits, order)
            .iter()
            .fold(BigNumber::zero(), |acc, v| (&acc + v).nmod(order));
        let sum_two = power_of(&BigNumber::from(2u64), bits_per_value, order)
            .iter()
            .fold(BigNumber::zero(), |acc, v| (&acc + v).nmod(order));

        let head = (&(z - &z_sq).nmod(order) * &sum_y).nmod(order);
        let mut tail = BigNumber::zero();
        let mut zp = (&z_sq * z).nmod(order);
        for _ in 0..m {
            tail = (&tail + &(&zp * &sum_two).nmod(order)).nmod(order);
            zp = (&zp * z).nmod(order);
        }
        (&head - &tail).nmod(order)
    }

    /// Verify the aggregated proof against the given setup parameters.
    pub fn verify(&self, params: &RangeProofParams<G>) -> bool {
        let order = G::group_order();
        let n = params.nbits;
        let m = self.vs.len();
        if m == 0 || n % m != 0 {
            return false;
        }
        let bits_per_value = n / m;

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

        // Condition (65), with V_j weighted by z^(j+2).
        let lhs = pedersen::commit(&self.t_prime, &self.tau_x, &params.h);
        let mut rhs = G::base_scale(&Self::delta_mul(params, &y, &z, m, &order))
            .add(&self.t1.scale(&x))
            .add(&self.t2.scale(&x_sq));
        let mut zp = z_sq.clone();
        for v in &self.vs {
            rhs = rhs.add(&v.scale(&zp));
            zp = (&zp * &z).nmod(&order);
        }
        let c65 = lhs == rhs;

        // Conditions (66) + (67), with the packed exponent vector.
        let minus_z = (&order - &z).nmod(&order);
        let vy = power_of(&y, n, &order);
        let zyn = vector_scalar_mul(&vy, &z, &order);
        let z_two = z_powers_times_two(&z, m, bits_per_value, &order);

        let lp = {
            let asx = self.a.add(&self.s.scale(&x));
            let g_part = match vector_exp(&params.g_vec, &vector_copy(&minus_z, n)) {
                Ok(e) => e,
                Err(_) => return false,
            };
            let h_exps = match vector_add(&zyn, &z_two, &order) {
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

        let c_target = *self.ipp.claimed_product() == self.t_prime.nmod(&order);
        let gens = InnerProductGens::from_parts(params.u.clone(), params.g_vec.clone(), h_prime);
        let c_ipp = self.ipp.verify(&gens);

        c65 && c67 && c_target && c_ipp
    }
}
