// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Sampling helpers and small shared utilities.

use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};

/// Upper bound on retries for any rejection-sampling loop in the crate,
/// including the sigma protocol's abort loop.
pub(crate) const CRYPTOGRAPHIC_RETRY_MAX: usize = 128;

/// Sample a number uniformly at random from the range `[0, n)`. This can be
/// used for sampling from a prime field `F_p` or the integers modulo `n` (for
/// any `n`).
pub(crate) fn random_positive_bn<R: RngCore + CryptoRng>(rng: &mut R, n: &BigNumber) -> BigNumber {
    BigNumber::from_rng(n, rng)
}

/// Sample a number uniformly at random from the range `[0, 2^bits)`.
pub(crate) fn random_bn_by_size<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> BigNumber {
    let bound = BigNumber::one() << bits;
    BigNumber::from_rng(&bound, rng)
}

pub(crate) fn is_power_of_two(x: u64) -> bool {
    x != 0 && x & (x - 1) == 0
}

/// The bit-length of a non-negative number; zero has bit-length zero.
pub(crate) fn bit_length(n: &BigNumber) -> usize {
    let bytes = n.to_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte != 0 {
            return (bytes.len() - i - 1) * 8 + (8 - byte.leading_zeros() as usize);
        }
    }
    0
}

/// Convert a small signed integer to a [`BigNumber`].
pub(crate) fn bn_from_i64(v: i64) -> BigNumber {
    if v < 0 {
        -BigNumber::from(v.unsigned_abs())
    } else {
        BigNumber::from(v as u64)
    }
}

////////////////////////////
// Test Utility Functions //
////////////////////////////

/// Returns an rng to be used for testing. This will print the rng seed
/// to stderr so that if a test fails, the failing seed can be recovered
/// and used for debugging.
#[cfg(test)]
pub(crate) mod testing {
    use rand::{
        rngs::{OsRng, StdRng},
        Rng, SeedableRng,
    };

    /// Initialize any fields necessary for our tests. This should be called
    /// at the top of all our tests. This function is idempotent.
    pub(crate) fn init_testing() -> StdRng {
        let mut seeder = OsRng;
        let seed = seeder.gen();
        eprintln!(
            "To re-run test with the same randomness, use init_testing_with_seed() with the following seed:"
        );
        eprintln!("\t{seed:?}");
        StdRng::from_seed(seed)
    }

    /// A seeded version of [`init_testing`]. This function can be used when a
    /// test fails unexpectedly, and you want to reproduce the run using a
    /// specific RNG seed.
    ///
    /// **Additionally, turns on logging by default.**
    #[allow(unused)]
    pub(crate) fn init_testing_with_seed(seed: [u8; 32]) -> StdRng {
        use tracing_subscriber::{
            filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
        };

        let logging_level = EnvFilter::from_default_env()
            .max_level_hint()
            .unwrap()
            .into_level()
            .unwrap();

        // Only capture logging events from the ballotproof crate.
        let targets = Targets::new().with_target("ballotproof", logging_level);
        let stdout_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(targets);

        // It's okay if this fails. It just means logging has already been set
        // up for this thread.
        let _ = tracing_subscriber::registry().with(stdout_layer).try_init();

        StdRng::from_seed(seed)
    }
}
