// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Wire-format helpers.
//!
//! All big integers cross the wire as decimal strings. JSON has no portable
//! arbitrary-precision number, so the canonical textual form of a scalar or a
//! coordinate is its base-10 representation with no leading zeros.

use crate::errors::{CallerError, Result};
use libpaillier::unknown_order::BigNumber;
use num_bigint::BigUint;

/// Canonical decimal form of a non-negative number.
pub(crate) fn to_decimal(n: &BigNumber) -> String {
    BigUint::from_bytes_be(&n.to_bytes()).to_str_radix(10)
}

/// Parse the canonical decimal form produced by [`to_decimal`].
pub(crate) fn from_decimal(s: &str) -> Result<BigNumber> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        Err(CallerError::DeserializationFailed)?;
    }
    let digits =
        BigUint::parse_bytes(s.as_bytes(), 10).ok_or(CallerError::DeserializationFailed)?;
    Ok(BigNumber::from_slice(digits.to_bytes_be()))
}

/// Decimal form of raw big-endian bytes.
pub(crate) fn bytes_to_decimal(bytes: &[u8]) -> String {
    BigUint::from_bytes_be(bytes).to_str_radix(10)
}

/// Recover big-endian bytes from a decimal string, left-padded to `len`.
pub(crate) fn decimal_to_bytes(s: &str, len: usize) -> Result<Vec<u8>> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        Err(CallerError::DeserializationFailed)?;
    }
    let digits =
        BigUint::parse_bytes(s.as_bytes(), 10).ok_or(CallerError::DeserializationFailed)?;
    let raw = digits.to_bytes_be();
    if raw.len() > len {
        Err(CallerError::DeserializationFailed)?;
    }
    let mut out = vec![0u8; len];
    out[len - raw.len()..].copy_from_slice(&raw);
    Ok(out)
}

/// Serde adapter serializing a [`BigNumber`] as a decimal string.
///
/// Only non-negative values are well-formed on the wire; every scalar a proof
/// carries is normalized with `nmod` (or is non-negative by construction)
/// before it reaches serialization.
pub(crate) mod decimal {
    use super::{from_decimal, to_decimal};
    use libpaillier::unknown_order::BigNumber;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        n: &BigNumber,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_decimal(n))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<BigNumber, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_decimal(&s).map_err(serde::de::Error::custom)
    }
}
