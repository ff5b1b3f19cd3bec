// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Pedersen commitments over any [`GroupElement`].

use crate::{
    errors::{CallerError, Result},
    group::GroupElement,
};
use libpaillier::unknown_order::BigNumber;

/// Commit to `v` with blinding `r`: `C = v·G + r·H`.
///
/// Hiding and binding hold as long as the discrete logarithm of `h` with
/// respect to the group generator is unknown.
pub fn commit<G: GroupElement>(v: &BigNumber, r: &BigNumber, h: &G) -> G {
    G::base_scale(v).add(&h.scale(r))
}

/// Commit to the vector pair `(a, b)` with blinding `alpha`:
/// `C = alpha·H + Σ a_i·g_i + Σ b_i·h_i`.
pub(crate) fn commit_vectors<G: GroupElement>(
    a: &[BigNumber],
    b: &[BigNumber],
    alpha: &BigNumber,
    h: &G,
    g_vec: &[G],
    h_vec: &[G],
) -> Result<G> {
    if a.len() != g_vec.len() || b.len() != h_vec.len() {
        Err(CallerError::InvalidLength)?;
    }
    let bound = G::multiscalar_mul(g_vec, a)?;
    let blind = G::multiscalar_mul(h_vec, b)?;
    Ok(h.scale(alpha).add(&bound).add(&blind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{group::Ristretto255, utils::testing::init_testing};

    type G = Ristretto255;

    #[test]
    fn commitment_is_additively_homomorphic() {
        let mut rng = init_testing();
        let h = G::random(&mut rng);
        let order = G::group_order();

        let v1 = BigNumber::from_rng(&order, &mut rng);
        let v2 = BigNumber::from_rng(&order, &mut rng);
        let r1 = BigNumber::from_rng(&order, &mut rng);
        let r2 = BigNumber::from_rng(&order, &mut rng);

        let sum = commit(&(&v1 + &v2).nmod(&order), &(&r1 + &r2).nmod(&order), &h);
        assert_eq!(commit(&v1, &r1, &h).add(&commit(&v2, &r2, &h)), sum);
    }

    #[test]
    fn different_blindings_give_different_commitments() {
        let mut rng = init_testing();
        let h = G::random(&mut rng);
        let order = G::group_order();

        let v = BigNumber::from(42u64);
        let r1 = BigNumber::from_rng(&order, &mut rng);
        let r2 = BigNumber::from_rng(&order, &mut rng);
        assert_ne!(commit(&v, &r1, &h), commit(&v, &r2, &h));
    }

    #[test]
    fn vector_commitment_matches_manual_sum() {
        let mut rng = init_testing();
        let order = G::group_order();
        let h = G::random(&mut rng);
        let g_vec: Vec<G> = (0..4).map(|_| G::random(&mut rng)).collect();
        let h_vec: Vec<G> = (0..4).map(|_| G::random(&mut rng)).collect();
        let a: Vec<BigNumber> = (0..4).map(|_| BigNumber::from_rng(&order, &mut rng)).collect();
        let b: Vec<BigNumber> = (0..4).map(|_| BigNumber::from_rng(&order, &mut rng)).collect();
        let alpha = BigNumber::from_rng(&order, &mut rng);

        let mut expected = h.scale(&alpha);
        for i in 0..4 {
            expected = expected.add(&g_vec[i].scale(&a[i])).add(&h_vec[i].scale(&b[i]));
        }
        assert_eq!(
            commit_vectors(&a, &b, &alpha, &h, &g_vec, &h_vec).unwrap(),
            expected
        );
    }

    #[test]
    fn vector_commitment_length_mismatch_is_rejected() {
        let mut rng = init_testing();
        let h = G::random(&mut rng);
        let g_vec: Vec<G> = (0..4).map(|_| G::random(&mut rng)).collect();
        let h_vec: Vec<G> = (0..3).map(|_| G::random(&mut rng)).collect();
        let a = vec![BigNumber::one(); 4];
        let b = vec![BigNumber::one(); 4];
        assert!(commit_vectors(&a, &b, &BigNumber::one(), &h, &g_vec, &h_vec).is_err());
    }
}
