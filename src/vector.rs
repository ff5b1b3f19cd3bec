// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Scalar-vector and element-vector algebra for the range-proof protocols.
//!
//! Scalar vectors are `Vec<BigNumber>` with componentwise arithmetic reduced
//! modulo the ambient group order; element vectors support componentwise
//! addition, scalar exponentiation, and multi-scalar multiplication through
//! [`GroupElement::multiscalar_mul`].

use crate::{
    errors::{CallerError, Result},
    group::GroupElement,
    utils::{bn_from_i64, random_positive_bn},
};
use libpaillier::unknown_order::BigNumber;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

/// A vector of `n` copies of `a`.
pub(crate) fn vector_copy(a: &BigNumber, n: usize) -> Vec<BigNumber> {
    vec![a.clone(); n]
}

/// Lift small signed digits into scalars.
pub(crate) fn vector_from_digits(digits: &[i64]) -> Vec<BigNumber> {
    digits.iter().map(|d| bn_from_i64(*d)).collect()
}

/// Componentwise `a + b mod m`.
pub(crate) fn vector_add(
    a: &[BigNumber],
    b: &[BigNumber],
    m: &BigNumber,
) -> Result<Vec<BigNumber>> {
    if a.len() != b.len() {
        Err(CallerError::InvalidLength)?;
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x + y).nmod(m))
        .collect())
}

/// Componentwise `a - b mod m`.
pub(crate) fn vector_sub(
    a: &[BigNumber],
    b: &[BigNumber],
    m: &BigNumber,
) -> Result<Vec<BigNumber>> {
    if a.len() != b.len() {
        Err(CallerError::InvalidLength)?;
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).nmod(m))
        .collect())
}

/// Componentwise (Hadamard) product `a ⊙ b mod m`.
pub(crate) fn vector_mul(
    a: &[BigNumber],
    b: &[BigNumber],
    m: &BigNumber,
) -> Result<Vec<BigNumber>> {
    if a.len() != b.len() {
        Err(CallerError::InvalidLength)?;
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x * y).nmod(m))
        .collect())
}

/// Componentwise `a · s mod m`.
pub(crate) fn vector_scalar_mul(a: &[BigNumber], s: &BigNumber, m: &BigNumber) -> Vec<BigNumber> {
    a.iter().map(|x| (x * s).nmod(m)).collect()
}

/// Componentwise `a + c mod m` for a constant `c`.
pub(crate) fn vector_add_const(a: &[BigNumber], c: &BigNumber, m: &BigNumber) -> Vec<BigNumber> {
    a.iter().map(|x| (x + c).nmod(m)).collect()
}

/// The inner product `<a, b> mod m`.
pub(crate) fn inner_product(a: &[BigNumber], b: &[BigNumber], m: &BigNumber) -> Result<BigNumber> {
    if a.len() != b.len() {
        Err(CallerError::InvalidLength)?;
    }
    let mut acc = BigNumber::zero();
    for (x, y) in a.iter().zip(b.iter()) {
        acc = (&acc + &(x * y)).nmod(m);
    }
    Ok(acc)
}

/// The power vector `(s^0, s^1, ..., s^(n-1)) mod m`.
pub(crate) fn power_of(s: &BigNumber, n: usize, m: &BigNumber) -> Vec<BigNumber> {
    let mut result = Vec::with_capacity(n);
    let mut current = BigNumber::one();
    for _ in 0..n {
        result.push(current.clone());
        current = (&current * s).nmod(m);
    }
    result
}

/// The base-`u` decomposition of `x` into `l` digits, least significant
/// first, so that `x ≡ Σ digits[i]·u^i (mod u^l)`.
///
/// Digits are extracted Euclidean-style (always non-negative), so a negative
/// input yields the digits of its residue mod `u^l` rather than an error; an
/// out-of-range secret therefore still decomposes, and the resulting range
/// proof fails verification instead of proving.
pub fn decompose(x: &BigNumber, u: u64, l: usize) -> Vec<i64> {
    let base = BigNumber::from(u);
    let modulus = (0..l).fold(BigNumber::one(), |acc, _| &acc * &base);
    let reduced = x.nmod(&modulus);

    let mut value = BigUint::from_bytes_be(&reduced.to_bytes());
    let big_base = BigUint::from(u);
    let mut digits = Vec::with_capacity(l);
    for _ in 0..l {
        let digit = (&value % &big_base).iter_u64_digits().next().unwrap_or(0);
        digits.push(digit as i64);
        value /= &big_base;
    }
    digits
}

/// `a_R = a_L - 1` for a binary decomposition.
pub(crate) fn compute_a_r(a_l: &[i64]) -> Result<Vec<i64>> {
    a_l.iter()
        .map(|bit| match bit {
            0 => Ok(-1),
            1 => Ok(0),
            _ => Err(CallerError::BadDecomposition.into()),
        })
        .collect()
}

/// A vector of `n` scalars sampled uniformly from `[0, order)`.
pub(crate) fn sample_random_vector<R: RngCore + CryptoRng>(
    n: usize,
    order: &BigNumber,
    rng: &mut R,
) -> Vec<BigNumber> {
    (0..n).map(|_| random_positive_bn(rng, order)).collect()
}

/// Componentwise element addition.
pub(crate) fn vector_ec_add<G: GroupElement>(a: &[G], b: &[G]) -> Result<Vec<G>> {
    if a.len() != b.len() {
        Err(CallerError::InvalidLength)?;
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x.add(y)).collect())
}

/// `(s·a_0, s·a_1, ...)`.
pub(crate) fn vector_scalar_exp<G: GroupElement>(a: &[G], s: &BigNumber) -> Vec<G> {
    a.iter().map(|x| x.scale(s)).collect()
}

/// `Σ b_i·a_i` — the multi-scalar multiplication over an element vector.
pub(crate) fn vector_exp<G: GroupElement>(a: &[G], b: &[BigNumber]) -> Result<G> {
    G::multiscalar_mul(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    fn modulus() -> BigNumber {
        BigNumber::from(1009u64)
    }

    #[test]
    fn componentwise_arithmetic() {
        let m = modulus();
        let a = vector_from_digits(&[1, 2, 3]);
        let b = vector_from_digits(&[5, 7, 11]);

        assert_eq!(vector_add(&a, &b, &m).unwrap(), vector_from_digits(&[6, 9, 14]));
        assert_eq!(
            vector_sub(&b, &a, &m).unwrap(),
            vector_from_digits(&[4, 5, 8])
        );
        assert_eq!(
            vector_mul(&a, &b, &m).unwrap(),
            vector_from_digits(&[5, 14, 33])
        );
        assert_eq!(
            vector_scalar_mul(&a, &BigNumber::from(3u64), &m),
            vector_from_digits(&[3, 6, 9])
        );
        assert_eq!(inner_product(&a, &b, &m).unwrap(), BigNumber::from(52u64));
    }

    #[test]
    fn subtraction_wraps_into_the_field() {
        let m = modulus();
        let a = vector_from_digits(&[0]);
        let b = vector_from_digits(&[1]);
        assert_eq!(
            vector_sub(&a, &b, &m).unwrap(),
            vector_from_digits(&[1008])
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let m = modulus();
        let a = vector_from_digits(&[1, 2]);
        let b = vector_from_digits(&[1]);
        assert!(vector_add(&a, &b, &m).is_err());
        assert!(vector_mul(&a, &b, &m).is_err());
        assert!(inner_product(&a, &b, &m).is_err());
    }

    #[test]
    fn powers_of_two() {
        let m = BigNumber::from(1_000_000u64);
        assert_eq!(
            power_of(&BigNumber::from(2u64), 5, &m),
            vector_from_digits(&[1, 2, 4, 8, 16])
        );
    }

    #[test]
    fn binary_decomposition_recomposes() {
        let x = BigNumber::from(182u64);
        let bits = decompose(&x, 2, 8);
        assert_eq!(bits, vec![0, 1, 1, 0, 1, 1, 0, 1]);
        let recomposed: u64 = bits
            .iter()
            .enumerate()
            .map(|(i, b)| (*b as u64) << i)
            .sum();
        assert_eq!(recomposed, 182);
    }

    #[test]
    fn base_ten_decomposition() {
        let x = BigNumber::from(90_210u64);
        assert_eq!(decompose(&x, 10, 6), vec![0, 1, 2, 0, 9, 0]);
    }

    #[test]
    fn negative_input_decomposes_as_residue() {
        // -1 mod 2^4 = 15 = 0b1111, matching Euclidean digit extraction.
        let x = -BigNumber::one();
        assert_eq!(decompose(&x, 2, 4), vec![1, 1, 1, 1]);
    }

    #[test]
    fn non_binary_digits_fail_complement() {
        assert!(compute_a_r(&[0, 1, 1, 0]).is_ok());
        assert!(compute_a_r(&[0, 2, 1]).is_err());
    }

    #[test]
    fn random_vector_stays_below_order() {
        let mut rng = init_testing();
        let order = modulus();
        for x in sample_random_vector(64, &order, &mut rng) {
            assert!(x < order);
        }
    }
}
