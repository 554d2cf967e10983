//! # Deterministic Proof Stub
//!
//! A stand-in for the identity circuit's prover/verifier pair, for unit
//! tests and local tooling. The "proof" is a keyed BLAKE3 XOF of the
//! public signals:
//!
//! ```text
//! words = XOF("aura.zkp.stub-attestation.v1", nullifier || event_id || message_hash)
//! ```
//!
//! which reproduces the one property the account logic depends on:
//! **binding**. A stub proof verifies against exactly the signals it was
//! produced for — claim a different nullifier, event, or message and
//! verification fails. What it deliberately does not model is soundness:
//! anyone who knows a nullifier can "prove" it. Never wire the stub into
//! anything that holds value.
//!
//! The prover takes the identity keypair (the witness), mirroring the real
//! prover's interface; the verifier sees only proof and signals.

use ark_bn254::Fr;
use anyhow::Result;

use super::proof::{IdentityProof, PublicSignals};
use super::verifier::ProofVerifier;
use crate::config::PROOF_WIRE_LENGTH;
use crate::crypto::hash::field_to_bytes_be;
use crate::identity::{EventId, IdentityKeypair, Nullifier};

const STUB_CONTEXT: &str = "aura.zkp.stub-attestation.v1";

fn attest(nullifier: &Nullifier, event_id: EventId, message_hash: &Fr) -> IdentityProof {
    let mut hasher = blake3::Hasher::new_derive_key(STUB_CONTEXT);
    hasher.update(nullifier.as_bytes());
    hasher.update(&event_id.as_u64().to_be_bytes());
    hasher.update(&field_to_bytes_be(message_hash));

    let mut words = [0u8; PROOF_WIRE_LENGTH];
    hasher.finalize_xof().fill(&mut words);

    IdentityProof::decode(&words).expect("attestation length is exact")
}

// ---------------------------------------------------------------------------
// StubProver
// ---------------------------------------------------------------------------

/// Produces stub proofs from a witness, shaped like the real prover.
pub struct StubProver;

impl StubProver {
    /// Prove that `keypair`'s identity, scoped to `event_id`, authorizes
    /// `message_hash`.
    pub fn prove(
        keypair: &IdentityKeypair,
        event_id: EventId,
        message_hash: &Fr,
    ) -> IdentityProof {
        let nullifier = keypair.nullifier(event_id);
        attest(&nullifier, event_id, message_hash)
    }

    /// Low-level variant for tests that need a proof for an arbitrary
    /// nullifier without holding a secret.
    pub fn prove_for_nullifier(
        nullifier: &Nullifier,
        event_id: EventId,
        message_hash: &Fr,
    ) -> IdentityProof {
        attest(nullifier, event_id, message_hash)
    }
}

// ---------------------------------------------------------------------------
// StubVerifier
// ---------------------------------------------------------------------------

/// Verifies stub proofs by recomputing the attestation from the claimed
/// signals and comparing words.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubVerifier;

impl StubVerifier {
    /// Construct the stub verifier.
    pub fn new() -> Self {
        Self
    }
}

impl ProofVerifier for StubVerifier {
    fn verify(&self, proof: &IdentityProof, signals: &PublicSignals) -> Result<bool> {
        let expected = attest(&signals.nullifier, signals.event_id, &signals.message_hash);
        Ok(*proof == expected)
    }
}
