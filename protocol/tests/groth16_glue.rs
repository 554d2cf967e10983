//! Integration test for the Groth16 verifier plumbing.
//!
//! The identity circuit itself is built out of tree, so this test drives
//! the real pairing path with a minimal stand-in circuit that has the same
//! public-input shape: three signals, `[nullifier, event_id,
//! message_hash]`, with the first bound to a private witness
//! (`nullifier = witness²`). That is enough to prove the glue end to end —
//! key serialization, the wire codec's point round-trip, signal ordering,
//! and rejection of tampered signals — without dragging the Poseidon
//! gadgetry in as a dependency.

use ark_bn254::{Bn254, Fr};
use ark_groth16::Groth16;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::ns;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use aura_protocol::identity::{EventId, Nullifier};
use aura_protocol::zkp::{Groth16IdentityVerifier, IdentityProof, ProofVerifier, PublicSignals};

// ---------------------------------------------------------------------------
// Stand-in circuit
// ---------------------------------------------------------------------------

/// Three public inputs in verifier order; one private witness bound to the
/// first.
#[derive(Clone)]
struct ThreeSignalCircuit {
    witness: Option<Fr>,
    nullifier: Option<Fr>,
    event_id: Option<Fr>,
    message_hash: Option<Fr>,
}

impl ThreeSignalCircuit {
    fn blank() -> Self {
        Self {
            witness: None,
            nullifier: None,
            event_id: None,
            message_hash: None,
        }
    }

    fn new(witness: Fr, event_id: Fr, message_hash: Fr) -> Self {
        Self {
            witness: Some(witness),
            nullifier: Some(witness * witness),
            event_id: Some(event_id),
            message_hash: Some(message_hash),
        }
    }
}

impl ConstraintSynthesizer<Fr> for ThreeSignalCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // Allocation order defines the public input vector — it must match
        // PublicSignals::to_field_elements.
        let nullifier = FpVar::<Fr>::new_input(ns!(cs, "nullifier"), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let event_id = FpVar::<Fr>::new_input(ns!(cs, "event_id"), || {
            self.event_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let message_hash = FpVar::<Fr>::new_input(ns!(cs, "message_hash"), || {
            self.message_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let witness = FpVar::<Fr>::new_witness(ns!(cs, "witness"), || {
            self.witness.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // nullifier = witness^2 binds the first signal to the witness.
        (&witness * &witness).enforce_equal(&nullifier)?;

        // Tie the remaining signals into the constraint system so the
        // verifier's input consumption covers all three.
        let binding = FpVar::<Fr>::new_witness(ns!(cs, "binding"), || {
            let e = self.event_id.ok_or(SynthesisError::AssignmentMissing)?;
            let m = self.message_hash.ok_or(SynthesisError::AssignmentMissing)?;
            Ok(e + m)
        })?;
        (&event_id + &message_hash).enforce_equal(&binding)?;

        Ok(())
    }
}

fn setup_and_prove() -> (Groth16IdentityVerifier, IdentityProof, PublicSignals) {
    let mut rng = StdRng::seed_from_u64(42);

    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(ThreeSignalCircuit::blank(), &mut rng)
        .expect("setup succeeds for a well-formed circuit");

    let event_id = EventId::new(5);
    let message_hash = Fr::from(0xC0FFEEu64);
    let witness = Fr::from(31337u64);

    let circuit = ThreeSignalCircuit::new(witness, event_id.to_field(), message_hash);
    let ark_proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).expect("proving succeeds");

    let signals = PublicSignals {
        nullifier: Nullifier::from_field(&(witness * witness)),
        event_id,
        message_hash,
    };

    // Round-trip the verification key through its byte form, the way a
    // deployment would load it.
    let verifier = Groth16IdentityVerifier::new(vk);
    let verifier = Groth16IdentityVerifier::from_vk_bytes(&verifier.vk_to_bytes())
        .expect("vk bytes round-trip");

    (verifier, IdentityProof::from_ark_proof(&ark_proof), signals)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn valid_proof_verifies_through_wire_format() {
    let (verifier, proof, signals) = setup_and_prove();

    assert!(verifier.verify(&proof, &signals).unwrap());

    // The 256-byte wire round-trip must not disturb verification.
    let rewired = IdentityProof::decode(&proof.encode()).unwrap();
    assert!(verifier.verify(&rewired, &signals).unwrap());
}

#[test]
fn tampered_nullifier_signal_rejected() {
    let (verifier, proof, signals) = setup_and_prove();

    let forged = PublicSignals {
        nullifier: Nullifier::from_field(&Fr::from(1u64)),
        ..signals
    };
    assert!(!verifier.verify(&proof, &forged).unwrap());
}

#[test]
fn tampered_message_signal_rejected() {
    let (verifier, proof, signals) = setup_and_prove();

    let forged = PublicSignals {
        message_hash: signals.message_hash + Fr::from(1u64),
        ..signals
    };
    assert!(!verifier.verify(&proof, &forged).unwrap());
}

#[test]
fn tampered_event_signal_rejected() {
    let (verifier, proof, signals) = setup_and_prove();

    let forged = PublicSignals {
        event_id: EventId::new(6),
        ..signals
    };
    assert!(!verifier.verify(&proof, &forged).unwrap());
}

#[test]
fn mangled_proof_words_reject_cleanly() {
    let (verifier, proof, signals) = setup_and_prove();

    // Flip a coordinate: either the point decode fails (clean false) or
    // the pairing check does. Never an error, never a panic.
    let mut mangled = proof.clone();
    mangled.a[0][31] ^= 0x01;
    assert!(!verifier.verify(&mangled, &signals).unwrap());
}
