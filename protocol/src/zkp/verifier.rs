//! # Proof Verification Boundary
//!
//! The account treats proof verification as a capability: anything that
//! can answer "does this proof hold for these public signals?" is
//! acceptable. [`ProofVerifier`] is that capability;
//! [`Groth16IdentityVerifier`] is the production implementation — three
//! pairings and a multi-scalar multiplication against the identity
//! circuit's verification key, constant-time regardless of circuit size.
//!
//! The verification key is circuit-specific and arrives as compressed
//! bytes (from the circuit build pipeline); it is small (~1 KB) and can be
//! embedded or distributed freely.
//!
//! For tests and local tooling, [`super::stub`] provides a deterministic
//! stand-in with the same binding behaviour and none of the pairing cost.

use anyhow::{Context, Result};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;

use super::proof::{IdentityProof, PublicSignals};

/// The verification capability the account consumes.
///
/// Implementations must be pure with respect to their inputs: the same
/// `(proof, signals)` pair always gets the same answer. `Ok(false)` means
/// "checked and rejected"; `Err` is reserved for the verifier itself being
/// broken (corrupt key material, not malformed proofs).
pub trait ProofVerifier: Send + Sync {
    /// Check `proof` against `signals`.
    fn verify(&self, proof: &IdentityProof, signals: &PublicSignals) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Groth16IdentityVerifier
// ---------------------------------------------------------------------------

/// Pairing-based verifier for the identity circuit.
pub struct Groth16IdentityVerifier {
    vk: VerifyingKey<Bn254>,
}

impl Groth16IdentityVerifier {
    /// Wrap an arkworks verification key.
    pub fn new(vk: VerifyingKey<Bn254>) -> Self {
        Self { vk }
    }

    /// Load a verification key from compressed bytes.
    pub fn from_vk_bytes(data: &[u8]) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(data)
            .context("failed to deserialize verification key")?;
        Ok(Self { vk })
    }

    /// Serialize the verification key to compressed bytes.
    pub fn vk_to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.vk
            .serialize_compressed(&mut buf)
            .expect("VK serialization must not fail");
        buf
    }
}

impl ProofVerifier for Groth16IdentityVerifier {
    fn verify(&self, proof: &IdentityProof, signals: &PublicSignals) -> Result<bool> {
        // Words that do not decode to valid curve points are an invalid
        // proof, not a verifier failure.
        let ark_proof = match proof.to_ark_proof() {
            Ok(p) => p,
            Err(_) => return Ok(false),
        };

        let public_inputs = signals.to_field_elements();

        Groth16::<Bn254>::verify(&self.vk, &public_inputs, &ark_proof)
            .context("Groth16 verification algorithm failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{derive_nullifier, EventId};
    use ark_bn254::Fr;

    fn signals() -> PublicSignals {
        PublicSignals {
            nullifier: derive_nullifier(&Fr::from(123u64), EventId::new(5)),
            event_id: EventId::new(5),
            message_hash: Fr::from(42u64),
        }
    }

    #[test]
    fn invalid_vk_bytes_rejected() {
        assert!(Groth16IdentityVerifier::from_vk_bytes(&[0u8; 8]).is_err());
    }

    #[test]
    fn stub_words_do_not_decode_to_curve_points() {
        // A stub-style proof is arbitrary words, not points; the pairing
        // verifier maps this decode failure to a clean `Ok(false)`. The
        // full verify-path version of this check (which needs a real VK)
        // lives in the groth16 integration tests.
        let proof = super::super::stub::StubProver::prove_for_nullifier(
            &signals().nullifier,
            EventId::new(5),
            &Fr::from(42u64),
        );
        assert!(proof.to_ark_proof().is_err());
    }
}
