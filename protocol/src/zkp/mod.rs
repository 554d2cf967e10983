//! # Zero-Knowledge Proof Boundary
//!
//! AURA consumes succinct proofs; it does not produce them. The identity
//! circuit (out of tree, built with the usual snark tooling) attests that
//! the prover knows a secret whose nullifier derivation and Schnorr
//! signature match the public signals — without revealing the secret or
//! the public key. This module owns everything on the consuming side:
//!
//! ```text
//! proof.rs     — wire format (a/b/c point groups), public-signal ordering
//! verifier.rs  — ProofVerifier capability + Groth16 pairing check
//! stub.rs      — deterministic binding-only test double
//! ```
//!
//! The account never looks inside a proof. It decodes the wire format,
//! assembles the public signals it is willing to vouch for (its own owner
//! nullifier, its event scope, the hash being authorized), and asks the
//! verifier. Binding lives in the signals: the message-hash slot carries
//! the operation hash or the delegate address, so no proof transfers
//! between contexts.

pub mod proof;
pub mod stub;
pub mod verifier;

pub use proof::{IdentityProof, ProofCodecError, PublicSignals};
pub use stub::{StubProver, StubVerifier};
pub use verifier::{Groth16IdentityVerifier, ProofVerifier};
