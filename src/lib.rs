// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Zero-knowledge proofs of ballot correctness for electronic voting.
//!
//! A voter encrypts a candidate number under exponential ElGamal in a
//! prime-order subgroup of a large prime field and proves, without revealing
//! the number, that it lies in the inclusive candidate range `[lo, hi]`. The
//! bundle a verifier checks consists of:
//!
//! - two [Bulletproofs range proofs](bulletproofs) over an elliptic-curve
//!   group, for `v - lo ∈ [0, 2^N)` and `hi - v ∈ [0, 2^N)`;
//! - a [cross-group sigma protocol](voteproof) proving that the value inside
//!   the ElGamal ciphertext equals the value inside the two curve-side
//!   Pedersen commitments, with a statistical abort protecting the secret.
//!
//! All protocols are generic over the [`group::GroupElement`] abstraction,
//! which is instantiated by the RFC 3526 3072-bit MODP group and by the
//! P-256, P-384, secp256k1, and Ristretto255 curves. The [`ballot`] module
//! composes everything into `cast_vote` / `verify_vote`.
//!
//! This is proof-of-concept code: it is not constant-time and has not been
//! audited. Do not run elections with it.
//!
//! ```
//! use ballotproof::{
//!     ballot::{cast_vote, verify_vote, PublicParameters},
//!     elgamal::ElGamalKeyPair,
//!     group::{ModP3072, Ristretto255},
//! };
//!
//! # fn main() -> ballotproof::errors::Result<()> {
//! let mut rng = rand::rngs::OsRng;
//! let keys = ElGamalKeyPair::<ModP3072>::generate(&mut rng);
//! let pp = PublicParameters::<ModP3072, Ristretto255>::new(101, 2000, keys.public_key().clone())?;
//!
//! let ballot = cast_vote(1500, &pp, &mut rng)?;
//! assert!(verify_vote(&ballot, &pp));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod ballot;
pub mod bulletproofs;
pub mod elgamal;
pub mod errors;
pub mod group;
pub mod pedersen;
pub mod vector;
pub mod voteproof;

pub(crate) mod serialization;
pub(crate) mod utils;

pub use errors::{CallerError, InternalError, Result};
pub use group::{GroupElement, GroupParams};
