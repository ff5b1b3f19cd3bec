// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Error types for the `ballotproof` crate.
//!
//! The error model is two-tiered. [`CallerError`] captures problems the
//! calling application can fix: inconsistent setup parameters, inputs that
//! fall outside the documented bounds, or bytes that do not decode.
//! [`InternalError`] is the crate-wide error type; it wraps caller mistakes
//! and also covers invariant violations that indicate a bug in this library.
//!
//! Verifiers never return errors on proof *content*: a well-formed proof that
//! fails its checks yields `false`, not an `Err`.

use std::fmt;

/// The default result type of the crate.
pub type Result<T> = std::result::Result<T, InternalError>;

/// Errors that indicate a mistake by the calling application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerError {
    /// The requested range end (or its bit-length) is not a power of two.
    NonPowerOfTwo,
    /// The requested range end exceeds `2^32`.
    TooLarge,
    /// The proof-system parameters do not leave a valid abort window, or are
    /// otherwise mutually incompatible.
    InconsistentParameters,
    /// Two vectors that must have equal length do not.
    InvalidLength,
    /// A vector length or aggregation count is unusable (empty, or does not
    /// divide the range bit-length).
    InvalidSize,
    /// A secret did not decompose into digits of the expected base.
    BadDecomposition,
    /// The prover exhausted its rejection-sampling retry budget.
    AbortExhausted,
    /// Bounded-search decryption did not recover a plaintext within the
    /// configured bound.
    DecryptionFailed,
    /// Input bytes could not be decoded into the expected type.
    DeserializationFailed,
    /// Randomized sampling failed to produce an acceptable value within the
    /// retry budget.
    RetryFailed,
}

impl fmt::Display for CallerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CallerError::NonPowerOfTwo => "range end is not a power of two",
            CallerError::TooLarge => "range end cannot be greater than 2^32",
            CallerError::InconsistentParameters => "inconsistent parameter choice",
            CallerError::InvalidLength => "paired vectors have different lengths",
            CallerError::InvalidSize => "vector length is unusable",
            CallerError::BadDecomposition => "input contains a non-binary element",
            CallerError::AbortExhausted => "prover exhausted its abort-retry budget",
            CallerError::DecryptionFailed => "no plaintext found within the search bound",
            CallerError::DeserializationFailed => "encoded input could not be decoded",
            CallerError::RetryFailed => "sampling did not succeed within the retry budget",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for CallerError {}

/// The crate-wide error type.
///
/// Most fallible functions return this via [`Result`]. Use the `?`-friendly
/// conversion from [`CallerError`] to surface caller mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalError {
    /// An invariant that this library is responsible for maintaining was
    /// violated. This indicates a bug in the library.
    InternalInvariantFailed,
    /// The calling application passed invalid input or configuration.
    CallingApplicationMistake(CallerError),
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::InternalInvariantFailed => {
                write!(f, "an internal invariant of the library was violated")
            }
            InternalError::CallingApplicationMistake(e) => {
                write!(f, "the calling application made a mistake: {e}")
            }
        }
    }
}

impl std::error::Error for InternalError {}

impl From<CallerError> for InternalError {
    fn from(e: CallerError) -> Self {
        InternalError::CallingApplicationMistake(e)
    }
}
