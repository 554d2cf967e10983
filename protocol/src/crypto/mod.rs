//! # Cryptographic Primitives for AURA
//!
//! Everything security-related flows through here. The module is split by
//! which machine has to agree with the result:
//!
//! - **poseidon** — the circuit's hash. Nullifiers and Schnorr challenges
//!   are re-derived inside the proof constraint system, so they must use
//!   the circom-parameter Poseidon sponge, slow as it is.
//! - **babyjubjub** — the circuit's curve. Twisted Edwards over the BN254
//!   scalar field; identity keys and signatures live here.
//! - **signatures** — Schnorr over Baby Jubjub with a Poseidon challenge,
//!   the scheme the circuit attests to.
//! - **hash** — BLAKE3 for everything no circuit has to re-derive:
//!   operation hashes, addresses, domain-separated derivations.
//! - **keys** — Ed25519 for session delegates and other address-holding
//!   principals.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The curve and pairing arithmetic is arkworks, the sponge is
//! light-poseidon, the delegate signatures are ed25519-dalek. Everything
//! here is a thin, type-safe wrapper around audited implementations.

pub mod babyjubjub;
pub mod hash;
pub mod keys;
pub mod poseidon;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use babyjubjub::derive_public_key;
pub use hash::{blake3_hash, domain_separated_hash, field_from_bytes_be, field_to_bytes_be, hash_to_field};
pub use keys::{AuraKeypair, AuraPublicKey, AuraSignature};
pub use poseidon::{poseidon_hash, poseidon_hash_bytes};
pub use signatures::{sign_raw, verify_raw, IdentitySignature};
