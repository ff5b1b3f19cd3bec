// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Ballot-level composition of the proof systems.
//!
//! A ballot for candidate `v ∈ [lo, hi]` carries the ElGamal encryption of
//! `v`, one range proof for `v - lo`, one for `hi - v`, and a sigma proof
//! tying the ciphertext to the two range-proof commitments. The verifier
//! re-derives the shifted Pedersen commitments
//! `X_q1 = lo·G + V_1` and `X_q2 = hi·G + (-V_2)`, so the prover negates the
//! second blinding to keep the sigma algebra sign-uniform.

use crate::{
    bulletproofs::{self, RangeProof, RangeProofParams},
    elgamal::{self, ElGamalCiphertext},
    errors::Result,
    group::{GroupElement, GroupParams},
    utils::{bit_length, bn_from_i64},
    voteproof::{AlgebraicParams, ProofParams, ProverSecret, SigmaProof, VerCommitments},
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Bit-length of a vote value. Candidate numbers must fit in this width.
pub const CHOICE_LENGTH: usize = 16;

/// Bit-length of the sigma-protocol Fiat–Shamir challenge.
pub const CHALLENGE_LENGTH: usize = 128;

/// Everything both the voter and the verifier need: the two group
/// descriptors, the ElGamal public key, the candidate range, and the setup
/// parameters of both proof systems.
#[derive(Debug, Clone)]
pub struct PublicParameters<F: GroupElement, Q: GroupElement> {
    /// ElGamal public key; also the auxiliary generator of the field group.
    pub eg_public_key: F,
    /// Lowest candidate number.
    pub candidate_min: u32,
    /// Highest candidate number.
    pub candidate_max: u32,
    /// Bulletproofs setup for `[0, 2^CHOICE_LENGTH)`.
    pub bp: RangeProofParams<Q>,
    /// Sigma-protocol parameters.
    pub rp: ProofParams<F, Q>,
}

impl<F: GroupElement, Q: GroupElement> PublicParameters<F, Q> {
    /// Wire up the proof systems for the candidate range `[lo, hi]`.
    ///
    /// The curve group's auxiliary generator is the Bulletproofs `H`, derived
    /// from a public seed; the field group's is the ElGamal public key.
    pub fn new(candidate_min: u32, candidate_max: u32, eg_public_key: F) -> Result<Self> {
        let bp = RangeProofParams::<Q>::setup(1u64 << CHOICE_LENGTH)?;

        let groups = AlgebraicParams {
            ff: GroupParams::from_auxiliary(eg_public_key.clone()),
            ec: GroupParams::from_auxiliary(bp.aux_generator().clone()),
        };
        let bg = bit_length(std::cmp::min(&groups.ff.n, &groups.ec.n));
        let rp = ProofParams::setup(
            CHOICE_LENGTH,
            CHALLENGE_LENGTH,
            bg,
            candidate_min,
            candidate_max,
            groups,
        )?;

        Ok(Self {
            eg_public_key,
            candidate_min,
            candidate_max,
            bp,
            rp,
        })
    }
}

/// The elements that assert the correctness of a vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: GroupElement, Q: GroupElement",
    deserialize = "F: GroupElement, Q: GroupElement"
))]
pub struct BallotData<F: GroupElement, Q: GroupElement> {
    /// The ElGamal ciphertext, i.e. the encrypted ballot.
    #[serde(rename = "ballot")]
    pub ballot: ElGamalCiphertext<F>,
    /// Range proof for the lower bound (`v - lo`).
    #[serde(rename = "lbProof")]
    pub bp_lower: RangeProof<Q>,
    /// Range proof for the upper bound (`hi - v`).
    #[serde(rename = "ubProof")]
    pub bp_upper: RangeProof<Q>,
    /// Proof of vote correctness.
    #[serde(rename = "voteProof")]
    pub vote_proof: SigmaProof<F, Q>,
}

/// Encrypt `choice` and produce the full correctness bundle.
///
/// The choice is not range-checked here: an out-of-range choice yields a
/// bundle that verification rejects, which is the dishonest-voter scenario
/// the system exists to catch.
pub fn cast_vote<F: GroupElement, Q: GroupElement, R: RngCore + CryptoRng>(
    choice: u32,
    pp: &PublicParameters<F, Q>,
    rng: &mut R,
) -> Result<BallotData<F, Q>> {
    let value = BigNumber::from(u64::from(choice));
    let (ballot, rp_nonce) = elgamal::encrypt(&value, &pp.eg_public_key, rng);

    // Prove the lower bound.
    let lower = bn_from_i64(i64::from(choice) - i64::from(pp.candidate_min));
    let (bp_lower, rq1) = bulletproofs::prove(&lower, &pp.bp, rng)?;

    // Prove the upper bound.
    let upper = bn_from_i64(i64::from(pp.candidate_max) - i64::from(choice));
    let (bp_upper, rq2) = bulletproofs::prove(&upper, &pp.bp, rng)?;

    // The verifier reconstructs X_q2 = hi·G - V_2, flipping the sign of the
    // blinding, so hand the sigma prover the negated value.
    let n_ec = &pp.rp.groups.ec.n;
    let rq2_neg = (n_ec - &rq2).nmod(n_ec);

    let secret = ProverSecret {
        value: &value,
        rp: &rp_nonce,
        rq1: &rq1,
        rq2: &rq2_neg,
    };
    let vote_proof = SigmaProof::prove(&secret, &pp.rp, rng)?;

    Ok(BallotData {
        ballot,
        bp_lower,
        bp_upper,
        vote_proof,
    })
}

/// Verify a ballot bundle: both range proofs, then the sigma proof against
/// the re-shifted commitments.
pub fn verify_vote<F: GroupElement, Q: GroupElement>(
    data: &BallotData<F, Q>,
    pp: &PublicParameters<F, Q>,
) -> bool {
    // Vote lower and upper bounds.
    if !data.bp_lower.verify(&pp.bp) {
        return false;
    }
    if !data.bp_upper.verify(&pp.bp) {
        return false;
    }

    // The sigma proof travels with its own parameter block; it must agree
    // with the parameters this election was set up with.
    let embedded = &data.vote_proof.params;
    if embedded.bx != pp.rp.bx
        || embedded.bc != pp.rp.bc
        || embedded.bg != pp.rp.bg
        || embedded.bb != pp.rp.bb
        || embedded.range_lo != pp.rp.range_lo
        || embedded.range_hi != pp.rp.range_hi
        || embedded.groups.ff.g != pp.rp.groups.ff.g
        || embedded.groups.ff.h != pp.rp.groups.ff.h
        || embedded.groups.ec.g != pp.rp.groups.ec.g
        || embedded.groups.ec.h != pp.rp.groups.ec.h
    {
        return false;
    }

    // Shift the range-proof commitments back to commitments to v.
    let lo = BigNumber::from(u64::from(pp.candidate_min));
    let hi = BigNumber::from(u64::from(pp.candidate_max));
    let xq1 = Q::base_scale(&lo).add(data.bp_lower.commitment());
    let xq2 = Q::base_scale(&hi).add(&data.bp_upper.commitment().negate());

    let commitments = VerCommitments {
        y: data.ballot.u.clone(),
        xp: data.ballot.v.clone(),
        xq1,
        xq2,
    };
    data.vote_proof.verify(&commitments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        elgamal::ElGamalKeyPair,
        group::{ModP3072, Ristretto255},
        utils::testing::init_testing,
    };

    type F = ModP3072;
    type Q = Ristretto255;

    fn setup() -> (rand::rngs::StdRng, PublicParameters<F, Q>, ElGamalKeyPair<F>) {
        let mut rng = init_testing();
        let keys = ElGamalKeyPair::<F>::generate(&mut rng);
        let pp = PublicParameters::new(101, 2000, keys.public_key().clone()).unwrap();
        (rng, pp, keys)
    }

    #[test]
    fn honest_ballot_verifies_and_decrypts() {
        let (mut rng, pp, keys) = setup();
        let data = cast_vote(1500, &pp, &mut rng).unwrap();
        assert!(verify_vote(&data, &pp));
        assert_eq!(
            elgamal::decrypt(&data.ballot, &keys, 2000).unwrap(),
            BigNumber::from(1500u64)
        );
    }

    #[test]
    fn out_of_range_ballot_is_rejected() {
        let (mut rng, pp, _keys) = setup();
        // One below the range: the lower-bound proof covers -1.
        let data = cast_vote(100, &pp, &mut rng).unwrap();
        assert!(!verify_vote(&data, &pp));
        // One above the range.
        let data = cast_vote(2001, &pp, &mut rng).unwrap();
        assert!(!verify_vote(&data, &pp));
    }

    #[test]
    fn ballot_for_a_different_election_is_rejected() {
        let (mut rng, pp, keys) = setup();
        let other = PublicParameters::<F, Q>::new(1, 50, keys.public_key().clone()).unwrap();
        let data = cast_vote(25, &other, &mut rng).unwrap();
        assert!(!verify_vote(&data, &pp));
    }

    #[test]
    fn swapped_range_proofs_are_rejected() {
        let (mut rng, pp, _keys) = setup();
        let mut data = cast_vote(700, &pp, &mut rng).unwrap();
        std::mem::swap(&mut data.bp_lower, &mut data.bp_upper);
        assert!(!verify_vote(&data, &pp));
    }
}
