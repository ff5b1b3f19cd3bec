// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Cross-group proof of secret equality.
//!
//! A three-move sigma protocol, made non-interactive with Fiat–Shamir, that
//! proves the value encrypted under ElGamal in the field group `F` equals the
//! value inside two Pedersen commitments in the curve group `Q`. The two
//! groups have different orders, so the masking nonce `k` is sampled over the
//! integers and the response `z = k + e·v` is only released when it falls in
//! a range that statistically hides `v`; otherwise the prover aborts and
//! retries with fresh randomness.
//!
//! The protocol assumes the secret is small (at most `2^bx`); the caller
//! must establish that separately, which is exactly what the two
//! [`RangeProof`](crate::bulletproofs::RangeProof)s of a ballot do.

use crate::{
    errors::{CallerError, Result},
    group::{GroupElement, GroupParams},
    pedersen,
    utils::{bit_length, random_bn_by_size, random_positive_bn, CRYPTOGRAPHIC_RETRY_MAX},
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use tracing::{debug, error};

/// Both group descriptions of the vote correctness proof system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: GroupElement, Q: GroupElement",
    deserialize = "F: GroupElement, Q: GroupElement"
))]
pub struct AlgebraicParams<F: GroupElement, Q: GroupElement> {
    /// The ElGamal group.
    #[serde(rename = "GFF")]
    pub ff: GroupParams<F>,
    /// The Bulletproofs group.
    #[serde(rename = "GEC")]
    pub ec: GroupParams<Q>,
}

/// Parameters of the vote correctness proof system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: GroupElement, Q: GroupElement",
    deserialize = "F: GroupElement, Q: GroupElement"
))]
pub struct ProofParams<F: GroupElement, Q: GroupElement> {
    /// Bit-length of the secret.
    #[serde(rename = "Bx")]
    pub bx: usize,
    /// Bit-length of the challenge.
    #[serde(rename = "Bc")]
    pub bc: usize,
    /// Bit-length of the order of the smaller group.
    #[serde(rename = "Bg")]
    pub bg: usize,
    /// Abort parameter: `bg - 1 - bx - bc`.
    #[serde(rename = "Bb")]
    pub bb: usize,
    /// Inclusive lower bound of the candidate range.
    #[serde(rename = "RangeLo")]
    pub range_lo: u32,
    /// Inclusive upper bound of the candidate range.
    #[serde(rename = "RangeHi")]
    pub range_hi: u32,
    /// Group descriptions.
    #[serde(flatten)]
    pub groups: AlgebraicParams<F, Q>,
}

impl<F: GroupElement, Q: GroupElement> ProofParams<F, Q> {
    /// Fix the common parameters of the proof system.
    ///
    /// Fails with `InconsistentParameters` when the abort window would be
    /// empty (`bg - 1 - bx - bc < 1`), when the challenge length is not a
    /// positive multiple of 8 bytes-worth of bits within a single SHA-256
    /// output, when `bg` overstates the smaller group order, or when the
    /// candidate range is inverted or does not fit in `bx` bits.
    pub fn setup(
        bx: usize,
        bc: usize,
        bg: usize,
        range_lo: u32,
        range_hi: u32,
        groups: AlgebraicParams<F, Q>,
    ) -> Result<Self> {
        if bc == 0 || bc % 8 != 0 || bc > 256 {
            error!("challenge length {bc} must be a positive multiple of 8, at most 256");
            Err(CallerError::InconsistentParameters)?;
        }
        let smaller = bit_length(std::cmp::min(&groups.ff.n, &groups.ec.n));
        if bg > smaller {
            error!("bg={bg} exceeds the bit-length {smaller} of the smaller group order");
            Err(CallerError::InconsistentParameters)?;
        }
        if bg < bx + bc + 2 {
            // bb = bg - 1 - bx - bc must be at least 1.
            error!("no abort window: bg={bg}, bx={bx}, bc={bc}");
            Err(CallerError::InconsistentParameters)?;
        }
        if range_lo > range_hi {
            Err(CallerError::InconsistentParameters)?;
        }
        if bx == 0 || (bx < 32 && u64::from(range_hi) >= 1u64 << bx) {
            error!("candidate range does not fit in {bx} bits");
            Err(CallerError::InconsistentParameters)?;
        }

        Ok(Self {
            bx,
            bc,
            bg,
            bb: bg - 1 - bx - bc,
            range_lo,
            range_hi,
            groups,
        })
    }

    /// Inclusive lower bound of the leak-free response range, `2^(bx+bc)`.
    fn z_lower(&self) -> BigNumber {
        BigNumber::one() << (self.bx + self.bc)
    }

    /// Exclusive upper bound of the leak-free response range,
    /// `2^(bx+bc+bb)`.
    fn z_upper(&self) -> BigNumber {
        BigNumber::one() << (self.bx + self.bc + self.bb)
    }
}

/// The witnesses of the protocol: the voted value and the randomness of its
/// four commitments.
#[derive(Clone)]
pub struct ProverSecret<'a> {
    /// The encrypted (and committed) value.
    pub value: &'a BigNumber,
    /// ElGamal encryption randomness.
    pub rp: &'a BigNumber,
    /// Blinding of the first curve-side Pedersen commitment.
    pub rq1: &'a BigNumber,
    /// Blinding of the second curve-side Pedersen commitment.
    pub rq2: &'a BigNumber,
}

impl Debug for ProverSecret<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProverSecret([redacted])")
    }
}

/// The commitments a verifier checks the proof against: the ElGamal
/// ciphertext `(Y, X_p)` and the two curve-side Pedersen commitments to the
/// same value.
#[derive(Debug, Clone)]
pub struct VerCommitments<F: GroupElement, Q: GroupElement> {
    /// First component of the ElGamal ciphertext, `r_p·G`.
    pub y: F,
    /// Second component of the ElGamal ciphertext, `v·G + r_p·H`.
    pub xp: F,
    /// Pedersen commitment `v·G + r_q1·H` in the curve group.
    pub xq1: Q,
    /// Pedersen commitment `v·G + r_q2·H` in the curve group.
    pub xq2: Q,
}

/// The transcript of the sigma protocol. The proof is not complete without
/// the commitments and the two range proofs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: GroupElement, Q: GroupElement",
    deserialize = "F: GroupElement, Q: GroupElement"
))]
pub struct SigmaProof<F: GroupElement, Q: GroupElement> {
    #[serde(rename = "W")]
    pub(crate) w: F,
    #[serde(rename = "Kp")]
    pub(crate) kp: F,
    #[serde(rename = "Kq1")]
    pub(crate) kq1: Q,
    #[serde(rename = "Kq2")]
    pub(crate) kq2: Q,
    #[serde(rename = "Challenge", with = "crate::serialization::decimal")]
    pub(crate) challenge: BigNumber,
    #[serde(rename = "Z", with = "crate::serialization::decimal")]
    pub(crate) z: BigNumber,
    #[serde(rename = "Sp", with = "crate::serialization::decimal")]
    pub(crate) sp: BigNumber,
    #[serde(rename = "Sq1", with = "crate::serialization::decimal")]
    pub(crate) sq1: BigNumber,
    #[serde(rename = "Sq2", with = "crate::serialization::decimal")]
    pub(crate) sq2: BigNumber,
    #[serde(rename = "Params")]
    pub(crate) params: ProofParams<F, Q>,
}

/// The Fiat–Shamir challenge: SHA-256 over the canonical encodings of the
/// four commitments, truncated to `bc / 8` bytes and read big-endian.
fn fs_challenge<F: GroupElement, Q: GroupElement>(
    w: &F,
    kp: &F,
    kq1: &Q,
    kq2: &Q,
    bc: usize,
) -> BigNumber {
    let mut hasher = Sha256::new();
    hasher.update(w.to_bytes());
    hasher.update(kp.to_bytes());
    hasher.update(kq1.to_bytes());
    hasher.update(kq2.to_bytes());
    let digest = hasher.finalize();
    BigNumber::from_slice(&digest[..bc / 8])
}

/// Check `z·G + s·H == e·X + K` in the group of `X`.
fn sigma_pedersen_check<G: GroupElement>(
    z: &BigNumber,
    s: &BigNumber,
    e: &BigNumber,
    k: &G,
    x: &G,
    h: &G,
) -> bool {
    pedersen::commit(z, s, h) == x.scale(e).add(k)
}

impl<F: GroupElement, Q: GroupElement> SigmaProof<F, Q> {
    /// Prove equality of the committed secret across both groups.
    ///
    /// Retries with fresh randomness whenever the response would leak bits of
    /// the secret; fails with `AbortExhausted` if no attempt within
    /// [`CRYPTOGRAPHIC_RETRY_MAX`] lands in the leak-free range.
    pub fn prove<R: RngCore + CryptoRng>(
        secret: &ProverSecret,
        params: &ProofParams<F, Q>,
        rng: &mut R,
    ) -> Result<Self> {
        let z_lower = params.z_lower();
        let z_upper = params.z_upper();

        for attempt in 0..CRYPTOGRAPHIC_RETRY_MAX {
            // The nonce is sampled over the integers, not a group order: it
            // must mask e·v without wrapping in either group.
            let k = random_bn_by_size(rng, params.bx + params.bc + params.bb);
            let tp = random_positive_bn(rng, &params.groups.ff.n);
            let tq1 = random_positive_bn(rng, &params.groups.ec.n);
            let tq2 = random_positive_bn(rng, &params.groups.ec.n);

            let w = F::base_scale(&tp);
            let kp = pedersen::commit(&k, &tp, &params.groups.ff.h);
            let kq1 = pedersen::commit(&k, &tq1, &params.groups.ec.h);
            let kq2 = pedersen::commit(&k, &tq2, &params.groups.ec.h);

            let challenge = fs_challenge(&w, &kp, &kq1, &kq2, params.bc);

            // z = k + e·v over the integers.
            let z = &k + &(&challenge * secret.value);
            if z < z_lower || z >= z_upper {
                debug!("response outside the leak-free range, aborting attempt {attempt}");
                continue;
            }

            let sp = (&tp + &(&challenge * secret.rp)).nmod(&params.groups.ff.n);
            let sq1 = (&tq1 + &(&challenge * secret.rq1)).nmod(&params.groups.ec.n);
            let sq2 = (&tq2 + &(&challenge * secret.rq2)).nmod(&params.groups.ec.n);

            return Ok(Self {
                w,
                kp,
                kq1,
                kq2,
                challenge,
                z,
                sp,
                sq1,
                sq2,
                params: params.clone(),
            });
        }

        error!("abort loop exhausted after {CRYPTOGRAPHIC_RETRY_MAX} attempts");
        Err(CallerError::AbortExhausted)?
    }

    /// Verify the transcript of the proof of secret equality across groups.
    ///
    /// NB: the range proofs that assert "smallness" of the secret must be
    /// verified separately; this checks the sigma transcript only.
    pub fn verify(&self, comm: &VerCommitments<F, Q>) -> bool {
        let params = &self.params;

        // The response must lie within the safe (no-leak) range.
        if self.z < params.z_lower() || self.z >= params.z_upper() {
            return false;
        }

        // Challenge correctness.
        let expected = fs_challenge(&self.w, &self.kp, &self.kq1, &self.kq2, params.bc);
        if expected != self.challenge {
            return false;
        }

        // The ElGamal nonce commitment: sp·G == e·Y + W.
        let left = F::base_scale(&self.sp);
        let right = comm.y.scale(&self.challenge).add(&self.w);
        if left != right {
            return false;
        }

        // The ElGamal value component.
        if !sigma_pedersen_check(
            &self.z,
            &self.sp,
            &self.challenge,
            &self.kp,
            &comm.xp,
            &params.groups.ff.h,
        ) {
            return false;
        }

        // The two range-proof commitments (the range proofs themselves must
        // have already been verified).
        if !sigma_pedersen_check(
            &self.z,
            &self.sq1,
            &self.challenge,
            &self.kq1,
            &comm.xq1,
            &params.groups.ec.h,
        ) {
            return false;
        }
        sigma_pedersen_check(
            &self.z,
            &self.sq2,
            &self.challenge,
            &self.kq2,
            &comm.xq2,
            &params.groups.ec.h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        group::{ModP3072, Ristretto255},
        utils::testing::init_testing,
    };
    use rand::rngs::StdRng;

    type F = ModP3072;
    type Q = Ristretto255;

    fn algebra() -> AlgebraicParams<F, Q> {
        AlgebraicParams {
            ff: GroupParams::hashed("voteproof test ff aux").unwrap(),
            ec: GroupParams::hashed("voteproof test ec aux").unwrap(),
        }
    }

    fn test_params(bc: usize) -> ProofParams<F, Q> {
        let groups = algebra();
        let bg = bit_length(std::cmp::min(&groups.ff.n, &groups.ec.n));
        ProofParams::setup(16, bc, bg, 101, 2000, groups).unwrap()
    }

    struct Witness {
        value: BigNumber,
        rp: BigNumber,
        rq1: BigNumber,
        rq2: BigNumber,
    }

    fn commitments(
        witness: &Witness,
        params: &ProofParams<F, Q>,
    ) -> VerCommitments<F, Q> {
        VerCommitments {
            y: F::base_scale(&witness.rp),
            xp: pedersen::commit(&witness.value, &witness.rp, &params.groups.ff.h),
            xq1: pedersen::commit(&witness.value, &witness.rq1, &params.groups.ec.h),
            xq2: pedersen::commit(&witness.value, &witness.rq2, &params.groups.ec.h),
        }
    }

    fn random_witness(params: &ProofParams<F, Q>, rng: &mut StdRng) -> Witness {
        Witness {
            value: BigNumber::from(1500u64),
            rp: BigNumber::from_rng(&params.groups.ff.n, rng),
            rq1: BigNumber::from_rng(&params.groups.ec.n, rng),
            rq2: BigNumber::from_rng(&params.groups.ec.n, rng),
        }
    }

    fn prove(
        witness: &Witness,
        params: &ProofParams<F, Q>,
        rng: &mut StdRng,
    ) -> SigmaProof<F, Q> {
        let secret = ProverSecret {
            value: &witness.value,
            rp: &witness.rp,
            rq1: &witness.rq1,
            rq2: &witness.rq2,
        };
        SigmaProof::prove(&secret, params, rng).unwrap()
    }

    #[test]
    fn setup_rejects_inconsistent_parameters() {
        let groups = algebra();
        let bg = bit_length(std::cmp::min(&groups.ff.n, &groups.ec.n));
        // No abort window left.
        assert!(ProofParams::setup(16, 240, bg, 101, 2000, groups.clone()).is_err());
        // Challenge length not a multiple of 8.
        assert!(ProofParams::setup(16, 129, bg, 101, 2000, groups.clone()).is_err());
        // bg larger than the smaller group order.
        assert!(ProofParams::setup(16, 128, bg + 1, 101, 2000, groups.clone()).is_err());
        // Inverted range.
        assert!(ProofParams::setup(16, 128, bg, 2000, 101, groups.clone()).is_err());
        // Range does not fit the secret length.
        assert!(ProofParams::setup(8, 128, bg, 101, 2000, groups).is_err());
    }

    #[test]
    fn honest_proof_verifies() {
        let mut rng = init_testing();
        let params = test_params(128);
        let witness = random_witness(&params, &mut rng);
        let proof = prove(&witness, &params, &mut rng);
        assert!(proof.verify(&commitments(&witness, &params)));
    }

    #[test]
    fn minimal_abort_window_still_proves() {
        let mut rng = init_testing();
        let groups = algebra();
        let bg = bit_length(std::cmp::min(&groups.ff.n, &groups.ec.n));
        // Choose bc so that bb lands on the smallest admissible values.
        let bc = (bg - 2 - 16) / 8 * 8;
        let params = ProofParams::setup(16, bc, bg, 101, 2000, groups).unwrap();
        assert!(params.bb >= 1 && params.bb <= 8);

        // The abort probability per attempt is at most 1/2, so the retry
        // budget makes failure vanishingly unlikely.
        for _ in 0..5 {
            let witness = random_witness(&params, &mut rng);
            let proof = prove(&witness, &params, &mut rng);
            assert!(proof.verify(&commitments(&witness, &params)));
        }
    }

    #[test]
    fn rigged_randomness_exhausts_the_abort_loop() {
        // An all-zeroes rng makes k = 0 on every attempt; with a zero secret
        // the response never reaches the leak-free range.
        struct ZeroRng;
        impl RngCore for ZeroRng {
            fn next_u32(&mut self) -> u32 {
                0
            }
            fn next_u64(&mut self) -> u64 {
                0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                dest.fill(0);
                Ok(())
            }
        }
        impl CryptoRng for ZeroRng {}

        let params = test_params(128);
        let zero = BigNumber::zero();
        let secret = ProverSecret {
            value: &zero,
            rp: &zero,
            rq1: &zero,
            rq2: &zero,
        };
        let result: Result<SigmaProof<F, Q>> = SigmaProof::prove(&secret, &params, &mut ZeroRng);
        assert_eq!(
            result.unwrap_err(),
            crate::errors::InternalError::CallingApplicationMistake(CallerError::AbortExhausted)
        );
    }

    #[test]
    fn out_of_range_response_is_rejected() {
        let mut rng = init_testing();
        let params = test_params(128);
        let witness = random_witness(&params, &mut rng);
        let comm = commitments(&witness, &params);

        let mut proof = prove(&witness, &params, &mut rng);
        proof.z = BigNumber::one();
        assert!(!proof.verify(&comm));

        let mut proof = prove(&witness, &params, &mut rng);
        proof.z = params.z_upper();
        assert!(!proof.verify(&comm));
    }

    #[test]
    fn tampered_proofs_are_rejected() {
        let mut rng = init_testing();
        let params = test_params(128);
        let witness = random_witness(&params, &mut rng);
        let comm = commitments(&witness, &params);
        let proof = prove(&witness, &params, &mut rng);
        assert!(proof.verify(&comm));

        let mut bad = proof.clone();
        bad.w = bad.w.add(&F::generator());
        assert!(!bad.verify(&comm));

        let mut bad = proof.clone();
        bad.kp = bad.kp.add(&F::generator());
        assert!(!bad.verify(&comm));

        let mut bad = proof.clone();
        bad.kq1 = bad.kq1.add(&Q::generator());
        assert!(!bad.verify(&comm));

        let mut bad = proof.clone();
        bad.challenge = (&bad.challenge + &BigNumber::one()).nmod(&params.groups.ec.n);
        assert!(!bad.verify(&comm));

        let mut bad = proof.clone();
        bad.z = &bad.z + &BigNumber::one();
        assert!(!bad.verify(&comm));

        let mut bad = proof.clone();
        bad.sp = (&bad.sp + &BigNumber::one()).nmod(&params.groups.ff.n);
        assert!(!bad.verify(&comm));

        let mut bad = proof;
        bad.sq2 = (&bad.sq2 + &BigNumber::one()).nmod(&params.groups.ec.n);
        assert!(!bad.verify(&comm));
    }

    #[test]
    fn wrong_secret_cannot_satisfy_the_commitments() {
        let mut rng = init_testing();
        let params = test_params(128);
        let witness = random_witness(&params, &mut rng);
        let comm = commitments(&witness, &params);

        let other = Witness {
            value: BigNumber::from(1501u64),
            rp: witness.rp.clone(),
            rq1: witness.rq1.clone(),
            rq2: witness.rq2.clone(),
        };
        let proof = prove(&other, &params, &mut rng);
        assert!(!proof.verify(&comm));
    }

    #[test]
    fn proof_round_trips_through_json() {
        let mut rng = init_testing();
        let params = test_params(128);
        let witness = random_witness(&params, &mut rng);
        let comm = commitments(&witness, &params);
        let proof = prove(&witness, &params, &mut rng);

        let json = serde_json::to_string(&proof).unwrap();
        let decoded: SigmaProof<F, Q> = serde_json::from_str(&json).unwrap();
        assert!(decoded.verify(&comm));
    }
}
