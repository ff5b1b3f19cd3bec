// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The logarithmic-size inner-product argument.
//!
//! Proves knowledge of vectors `a, b` with `<a, b> = c` and
//! `P = <a, g> + <b, h>` for public generator vectors `g, h`. Each round of
//! the halving recursion emits one `(L, R)` pair, so the proof is
//! `2·log2(N)` elements plus the two collapsed scalars.

use crate::{
    bulletproofs::{hash_bp, SEEDH, SEEDU},
    errors::{CallerError, InternalError, Result},
    group::GroupElement,
    serialization::to_decimal,
    utils::is_power_of_two,
    vector::{inner_product, vector_add, vector_ec_add, vector_exp, vector_scalar_exp, vector_scalar_mul},
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::error;

/// Generators shared by the inner-product prover and verifier: the vectors
/// `g, h` and the auxiliary element `u` absorbing the claimed product.
#[derive(Debug, Clone)]
pub struct InnerProductGens<G: GroupElement> {
    pub(crate) u: G,
    pub(crate) g_vec: Vec<G>,
    pub(crate) h_vec: Vec<G>,
}

impl<G: GroupElement> InnerProductGens<G> {
    /// Derive standalone generators of length `n` from the public seeds.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            Err(CallerError::InvalidSize)?;
        }
        if !is_power_of_two(n as u64) {
            Err(CallerError::InvalidSize)?;
        }
        let mut g_vec = Vec::with_capacity(n);
        let mut h_vec = Vec::with_capacity(n);
        for i in 0..n {
            g_vec.push(G::map_to_group(&format!("{SEEDH}g{i}"))?);
            h_vec.push(G::map_to_group(&format!("{SEEDH}h{i}"))?);
        }
        Ok(Self {
            u: G::map_to_group(SEEDU)?,
            g_vec,
            h_vec,
        })
    }

    /// Wrap generators already derived by a range-proof setup.
    pub(crate) fn from_parts(u: G, g_vec: Vec<G>, h_vec: Vec<G>) -> Self {
        Self { u, g_vec, h_vec }
    }
}

/// The Fiat–Shamir binding of the statement: `x = H(g, h, P, c)`.
fn hash_ip<G: GroupElement>(g_vec: &[G], h_vec: &[G], p: &G, c: &BigNumber) -> BigNumber {
    let mut hasher = Sha256::new();
    hasher.update(p.to_bytes());
    for (g, h) in g_vec.iter().zip(h_vec.iter()) {
        hasher.update(g.to_bytes());
        hasher.update(h.to_bytes());
    }
    hasher.update(to_decimal(c).as_bytes());
    BigNumber::from_slice(hasher.finalize())
}

/// A non-interactive inner-product argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "G: GroupElement", deserialize = "G: GroupElement"))]
pub struct InnerProductProof<G: GroupElement> {
    /// The commitment `P = <a, g> + <b, h>` the argument is run against.
    #[serde(rename = "P")]
    p: G,
    /// The claimed inner product.
    #[serde(rename = "Cc", with = "crate::serialization::decimal")]
    c: BigNumber,
    /// Final collapsed scalar of the `a` vector.
    #[serde(rename = "A", with = "crate::serialization::decimal")]
    a: BigNumber,
    /// Final collapsed scalar of the `b` vector.
    #[serde(rename = "B", with = "crate::serialization::decimal")]
    b: BigNumber,
    /// Left elements of the recursion transcript.
    #[serde(rename = "L")]
    ls: Vec<G>,
    /// Right elements of the recursion transcript.
    #[serde(rename = "R")]
    rs: Vec<G>,
}

impl<G: GroupElement> InnerProductProof<G> {
    pub(crate) fn commitment(&self) -> &G {
        &self.p
    }

    pub(crate) fn claimed_product(&self) -> &BigNumber {
        &self.c
    }

    /// Prove knowledge of `a, b` with `<a, b> = c` and `P = <a, g> + <b, h>`.
    pub fn prove(
        a: &[BigNumber],
        b: &[BigNumber],
        p: &G,
        c: &BigNumber,
        gens: &InnerProductGens<G>,
    ) -> Result<Self> {
        if a.len() != b.len() || a.len() != gens.g_vec.len() || a.len() != gens.h_vec.len() {
            Err(CallerError::InvalidLength)?;
        }
        if a.is_empty() || !is_power_of_two(a.len() as u64) {
            Err(CallerError::InvalidSize)?;
        }

        let order = G::group_order();
        let x = hash_ip(&gens.g_vec, &gens.h_vec, p, c).nmod(&order);
        let u_x = gens.u.scale(&x);
        let mut p_run = p.add(&u_x.scale(c));

        let mut a: Vec<BigNumber> = a.iter().map(|v| v.nmod(&order)).collect();
        let mut b: Vec<BigNumber> = b.iter().map(|v| v.nmod(&order)).collect();
        let mut g = gens.g_vec.clone();
        let mut h = gens.h_vec.clone();
        let mut ls = Vec::new();
        let mut rs = Vec::new();

        while a.len() > 1 {
            let half = a.len() / 2;

            let c_l = inner_product(&a[..half], &b[half..], &order)?;
            let c_r = inner_product(&a[half..], &b[..half], &order)?;

            // L = <a_lo, g_hi> + <b_hi, h_lo> + c_L·u_x
            let l = vector_exp(&g[half..], &a[..half])?
                .add(&vector_exp(&h[..half], &b[half..])?)
                .add(&u_x.scale(&c_l));
            // R = <a_hi, g_lo> + <b_lo, h_hi> + c_R·u_x
            let r = vector_exp(&g[..half], &a[half..])?
                .add(&vector_exp(&h[half..], &b[..half])?)
                .add(&u_x.scale(&c_r));

            let (x_i, _) = hash_bp(&l, &r);
            let x_i = x_i.nmod(&order);
            let x_inv = x_i.invert(&order).ok_or_else(|| {
                error!("round challenge has no inverse");
                InternalError::InternalInvariantFailed
            })?;

            g = vector_ec_add(
                &vector_scalar_exp(&g[..half], &x_inv),
                &vector_scalar_exp(&g[half..], &x_i),
            )?;
            h = vector_ec_add(
                &vector_scalar_exp(&h[..half], &x_i),
                &vector_scalar_exp(&h[half..], &x_inv),
            )?;

            let x_sq = (&x_i * &x_i).nmod(&order);
            let x_sq_inv = (&x_inv * &x_inv).nmod(&order);
            p_run = l.scale(&x_sq).add(&p_run).add(&r.scale(&x_sq_inv));

            a = vector_add(
                &vector_scalar_mul(&a[..half], &x_i, &order),
                &vector_scalar_mul(&a[half..], &x_inv, &order),
                &order,
            )?;
            b = vector_add(
                &vector_scalar_mul(&b[..half], &x_inv, &order),
                &vector_scalar_mul(&b[half..], &x_i, &order),
                &order,
            )?;

            ls.push(l);
            rs.push(r);
        }

        Ok(Self {
            p: p.clone(),
            c: c.nmod(&order),
            a: a.remove(0),
            b: b.remove(0),
            ls,
            rs,
        })
    }

    /// Replay the recursion and check the final collapsed equation.
    pub fn verify(&self, gens: &InnerProductGens<G>) -> bool {
        let n = gens.g_vec.len();
        if n == 0 || gens.h_vec.len() != n {
            return false;
        }
        if self.ls.len() != self.rs.len() || self.ls.len() >= usize::BITS as usize {
            return false;
        }
        if n != 1usize << self.ls.len() {
            return false;
        }

        let order = G::group_order();
        let x = hash_ip(&gens.g_vec, &gens.h_vec, &self.p, &self.c).nmod(&order);
        let u_x = gens.u.scale(&x);
        let mut p_run = self.p.add(&u_x.scale(&self.c));

        let mut g = gens.g_vec.clone();
        let mut h = gens.h_vec.clone();

        for (l, r) in self.ls.iter().zip(self.rs.iter()) {
            let half = g.len() / 2;
            let (x_i, _) = hash_bp(l, r);
            let x_i = x_i.nmod(&order);
            let x_inv = match x_i.invert(&order) {
                Some(inv) => inv,
                None => return false,
            };

            let folded_g = vector_ec_add(
                &vector_scalar_exp(&g[..half], &x_inv),
                &vector_scalar_exp(&g[half..], &x_i),
            );
            let folded_h = vector_ec_add(
                &vector_scalar_exp(&h[..half], &x_i),
                &vector_scalar_exp(&h[half..], &x_inv),
            );
            match (folded_g, folded_h) {
                (Ok(fg), Ok(fh)) => {
                    g = fg;
                    h = fh;
                }
                _ => return false,
            }

            let x_sq = (&x_i * &x_i).nmod(&order);
            let x_sq_inv = (&x_inv * &x_inv).nmod(&order);
            p_run = p_run.add(&l.scale(&x_sq)).add(&r.scale(&x_sq_inv));
        }

        // P_final must equal a·g + b·h + (a·b)·u_x.
        let ab = (&self.a * &self.b).nmod(&order);
        let rhs = g[0]
            .scale(&self.a)
            .add(&h[0].scale(&self.b))
            .add(&u_x.scale(&ab));
        rhs == p_run
    }
}
