//! # Hashing Utilities
//!
//! BLAKE3 everywhere it is allowed to be. Operation hashes, deterministic
//! account addresses, and implementation references are AURA-internal data
//! structures with no external compatibility constraint, so they use the
//! fastest proper cryptographic hash available.
//!
//! The one place BLAKE3 is *not* allowed is nullifier and challenge
//! derivation: those values are re-derived inside the proof circuit, and the
//! circuit speaks Poseidon. See [`super::poseidon`].
//!
//! ## hash_to_field
//!
//! Maps arbitrary bytes to a BN254 scalar field element by hashing with
//! BLAKE3 and reducing modulo the field order. The output is 256 bits
//! against a ~254-bit modulus, so the reduction bias is negligible.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. This is the workhorse
/// hash function of AURA — used for operation hashes, address derivation,
/// and anywhere a circuit is not watching.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeding parts sequentially into the hasher produces the same digest as
/// hashing the concatenation, minus the temporary buffer. Used for composite
/// preimages like `(operation_bytes || dispatcher || chain_id)`.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// Cross-context collisions are impossible by construction: the context
/// string selects a distinct internal IV. Address derivation and the proof
/// stub each get their own context so their outputs can never alias.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Hash arbitrary data to a BN254 scalar field element.
///
/// 1. Hash the input with BLAKE3 to get 32 uniformly random bytes.
/// 2. Interpret those bytes as a little-endian integer.
/// 3. Reduce modulo the field order.
///
/// Used to lift operation hashes and delegate addresses into the field so
/// they can serve as proof signals.
pub fn hash_to_field(data: &[u8]) -> Fr {
    let hash = blake3_hash(data);
    Fr::from_le_bytes_mod_order(&hash)
}

/// Serialize a field element to 32 big-endian bytes.
///
/// This is the canonical byte form used on the wire: nullifiers, proof
/// words, and signature components all travel as big-endian field bytes.
pub fn field_to_bytes_be(fe: &Fr) -> [u8; 32] {
    let bytes = fe.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Deserialize a field element from big-endian bytes, reducing modulo the
/// field order. Accepts any length; values above the modulus wrap.
pub fn field_from_bytes_be(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn blake3_deterministic() {
        let a = blake3_hash(b"aura");
        let b = blake3_hash(b"aura");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn blake3_different_inputs() {
        assert_ne!(blake3_hash(b"aura"), blake3_hash(b"Aura"));
    }

    #[test]
    fn hash_multi_matches_concatenation() {
        let multi = blake3_hash_multi(&[b"hello", b" world"]);
        let single = blake3_hash(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn domain_separation_changes_output() {
        let data = b"same data";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
        assert_ne!(a, blake3_hash(data));
    }

    #[test]
    fn hash_to_field_deterministic() {
        assert_eq!(hash_to_field(b"operation"), hash_to_field(b"operation"));
        assert_ne!(hash_to_field(b"op a"), hash_to_field(b"op b"));
    }

    #[test]
    fn field_bytes_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            let fe = Fr::rand(&mut rng);
            let bytes = field_to_bytes_be(&fe);
            assert_eq!(field_from_bytes_be(&bytes), fe);
        }
    }

    #[test]
    fn field_bytes_are_fixed_width() {
        // Small values must still serialize to a full 32-byte word, or the
        // chunked Poseidon preimage would shift.
        let one = Fr::from(1u64);
        let bytes = field_to_bytes_be(&one);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 1);
        assert!(bytes[..31].iter().all(|b| *b == 0));
    }
}
