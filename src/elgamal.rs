// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Lifted (exponential) ElGamal encryption.
//!
//! Messages are encrypted in the exponent: `(U, V) = (r·G, m·G + r·PK)`.
//! The scheme is additively homomorphic, and decryption recovers `m·G`; the
//! integer `m` itself comes back out of a bounded exponent search, which is
//! fine for the small vote values this crate deals in.

use crate::{
    errors::{CallerError, Result},
    group::GroupElement,
    utils::random_positive_bn,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::error;

/// An ElGamal ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "F: GroupElement", deserialize = "F: GroupElement"))]
pub struct ElGamalCiphertext<F: GroupElement> {
    /// `r·G` — the masked nonce.
    #[serde(rename = "u")]
    pub u: F,
    /// `m·G + r·PK` — the masked (lifted) message.
    #[serde(rename = "v")]
    pub v: F,
}

/// An ElGamal key pair over the group `F`.
#[derive(Clone)]
pub struct ElGamalKeyPair<F: GroupElement> {
    sk: BigNumber,
    pk: F,
}

impl<F: GroupElement> Debug for ElGamalKeyPair<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElGamalKeyPair")
            .field("sk", &"[redacted]")
            .field("pk", &self.pk)
            .finish()
    }
}

impl<F: GroupElement> ElGamalKeyPair<F> {
    /// Sample a fresh key pair: `sk ← [1, n)`, `pk = sk·G`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let bound = &F::group_order() - &BigNumber::one();
        let sk = &random_positive_bn(rng, &bound) + &BigNumber::one();
        let pk = F::base_scale(&sk);
        Self { sk, pk }
    }

    /// Build a key pair from an existing secret key.
    pub fn from_secret(sk: BigNumber) -> Self {
        let pk = F::base_scale(&sk);
        Self { sk, pk }
    }

    /// The public key `sk·G`.
    pub fn public_key(&self) -> &F {
        &self.pk
    }
}

/// Encrypt `message` under `pk`, returning the ciphertext and the nonce
/// `r ∈ [1, n)`. The nonce is returned because the ballot proofs need it as
/// a witness.
pub fn encrypt<F: GroupElement, R: RngCore + CryptoRng>(
    message: &BigNumber,
    pk: &F,
    rng: &mut R,
) -> (ElGamalCiphertext<F>, BigNumber) {
    let bound = &F::group_order() - &BigNumber::one();
    let nonce = &random_positive_bn(rng, &bound) + &BigNumber::one();

    let ciphertext = ElGamalCiphertext {
        u: F::base_scale(&nonce),
        v: F::base_scale(message).add(&pk.scale(&nonce)),
    };
    (ciphertext, nonce)
}

/// Homomorphically add two ciphertexts: encrypts the sum of the plaintexts.
pub fn add<F: GroupElement>(
    c1: &ElGamalCiphertext<F>,
    c2: &ElGamalCiphertext<F>,
) -> ElGamalCiphertext<F> {
    ElGamalCiphertext {
        u: c1.u.add(&c2.u),
        v: c1.v.add(&c2.v),
    }
}

/// Decrypt a ciphertext, searching for the plaintext exponent in
/// `[0, max_message]`. Fails with `DecryptionFailed` when the plaintext lies
/// outside the search bound.
pub fn decrypt<F: GroupElement>(
    ciphertext: &ElGamalCiphertext<F>,
    keys: &ElGamalKeyPair<F>,
    max_message: u64,
) -> Result<BigNumber> {
    let lifted = ciphertext.v.subtract(&ciphertext.u.scale(&keys.sk));

    let mut candidate = F::identity();
    let generator = F::generator();
    for m in 0..=max_message {
        if candidate == lifted {
            return Ok(BigNumber::from(m));
        }
        candidate = candidate.add(&generator);
    }
    error!("no plaintext found within the search bound {max_message}");
    Err(CallerError::DecryptionFailed)?
}
