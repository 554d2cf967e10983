//! # Poseidon Hashing
//!
//! Poseidon over the BN254 scalar field with the circom parameter set
//! (t = arity + 1, RF = 8, partial rounds per the reference tables). This is
//! the hash the identity circuit computes natively, which makes it the only
//! hash allowed anywhere a proof must re-derive the value:
//!
//! - nullifier derivation (`Poseidon(secret, Poseidon(secret), event_id)`),
//! - the Schnorr challenge (`Poseidon(R8.x, R8.y, A.x, A.y, m)`).
//!
//! Everything else in AURA hashes with BLAKE3 (see [`super::hash`]) —
//! Poseidon is slow and exists purely for in-circuit efficiency.
//!
//! ## Byte-chunked form
//!
//! [`poseidon_hash_bytes`] hashes a packed byte string by splitting it into
//! 32-byte big-endian chunks and feeding each chunk as one field input. On
//! 32-byte-aligned input this agrees exactly with hashing the corresponding
//! field elements, which is the invariant the nullifier wire format relies
//! on.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};
use thiserror::Error;

use super::hash::field_from_bytes_be;
use crate::config::FIELD_LENGTH;

/// Errors from Poseidon hashing.
#[derive(Debug, Error)]
pub enum PoseidonHashError {
    /// The requested arity is outside the supported circom parameter set.
    #[error("unsupported poseidon arity: {0} inputs")]
    UnsupportedArity(usize),

    /// The underlying permutation rejected the input.
    #[error("poseidon hashing failed: {0}")]
    HashFailed(String),

    /// Attempted to hash an empty input set.
    #[error("poseidon requires at least one input")]
    EmptyInput,
}

/// Hash a fixed set of field elements with circom-parameter Poseidon.
///
/// The arity is taken from the slice length; the circom parameter tables
/// cover 1 through 12 inputs, which is far more than any AURA preimage
/// needs (the widest is the 5-input Schnorr challenge).
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, PoseidonHashError> {
    if inputs.is_empty() {
        return Err(PoseidonHashError::EmptyInput);
    }

    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
        .map_err(|_| PoseidonHashError::UnsupportedArity(inputs.len()))?;

    hasher
        .hash(inputs)
        .map_err(|e| PoseidonHashError::HashFailed(e.to_string()))
}

/// Hash a byte string by splitting it into 32-byte big-endian chunks.
///
/// Each chunk is interpreted as a big-endian integer and reduced into the
/// field; the resulting elements are hashed with [`poseidon_hash`]. A final
/// short chunk is interpreted as a smaller integer (no padding), so callers
/// that need chunk alignment must pack fixed-width words themselves.
pub fn poseidon_hash_bytes(data: &[u8]) -> Result<Fr, PoseidonHashError> {
    if data.is_empty() {
        return Err(PoseidonHashError::EmptyInput);
    }

    let inputs: Vec<Fr> = data.chunks(FIELD_LENGTH).map(field_from_bytes_be).collect();

    poseidon_hash(&inputs)
}
