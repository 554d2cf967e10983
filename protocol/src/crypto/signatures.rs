//! # Identity Signatures
//!
//! Schnorr signatures over Baby Jubjub with a Poseidon challenge — the
//! signature scheme the identity circuit verifies in-circuit.
//!
//! ```text
//! sign(s, m):   r  = m mod n            (n = subgroup order)
//!               R8 = r · Base8
//!               c  = Poseidon(R8.x, R8.y, A.x, A.y, m) mod n
//!               S  = r + c·s mod n
//! verify:       S · Base8 == R8 + c · A
//! ```
//!
//! ## Determinism
//!
//! The ephemeral scalar `r` is derived from the message hash alone — no
//! randomness, no counter. This is a protocol-level decision, not an
//! accident: the circuit re-derives `r` from `m` the same way, and an
//! independent nonce source would desynchronize prover and verifier. The
//! consequence is that signing the same message twice yields byte-identical
//! signatures, and distinct messages are the only source of nonce
//! separation. Callers must never sign the same hash under two different
//! meanings; every signed hash in AURA is domain-bound (operation hashes
//! include the dispatcher and chain id, delegation hashes the delegate
//! address).

use ark_bn254::Fr;
use ark_ec::CurveGroup;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fr as JubjubScalar};
use thiserror::Error;

use super::babyjubjub::{
    base8, mul_base8, point_from_bytes, point_to_bytes, scalar_from_bytes_be, scalar_to_bytes_be,
    to_subgroup_scalar, CurveError,
};
use super::hash::field_to_bytes_be;
use super::poseidon::{poseidon_hash, PoseidonHashError};

/// Errors during identity-signature operations.
///
/// Verification itself returns a boolean, not an error — we don't explain
/// to attackers which part of a forgery fell over. Errors here are for
/// malformed inputs only.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The signature bytes are not `R8.x || R8.y || S`.
    #[error("invalid signature encoding: expected 96 bytes, got {0}")]
    InvalidEncoding(usize),

    /// The embedded commitment point is invalid.
    #[error("invalid commitment point: {0}")]
    InvalidPoint(#[from] CurveError),

    /// Challenge hashing failed (cannot happen for the fixed 5-input arity;
    /// surfaced rather than swallowed on principle).
    #[error("challenge derivation failed: {0}")]
    Challenge(#[from] PoseidonHashError),
}

/// A Schnorr signature over Baby Jubjub: commitment point `R8` and response
/// scalar `S`. Serializes to 96 bytes (`R8.x || R8.y || S`, big-endian).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySignature {
    /// The commitment point `r · Base8`.
    pub r8: EdwardsAffine,
    /// The response scalar `r + c·s mod n`.
    pub s: JubjubScalar,
}

impl IdentitySignature {
    /// Serialize as `R8.x || R8.y || S`, 32 big-endian bytes each.
    pub fn to_bytes(&self) -> [u8; 96] {
        let mut out = [0u8; 96];
        out[..64].copy_from_slice(&point_to_bytes(&self.r8));
        out[64..].copy_from_slice(&scalar_to_bytes_be(&self.s));
        out
    }

    /// Deserialize, validating the commitment point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 96 {
            return Err(SignatureError::InvalidEncoding(bytes.len()));
        }
        let r8 = point_from_bytes(&bytes[..64])?;
        let s = scalar_from_bytes_be(&bytes[64..]);
        Ok(Self { r8, s })
    }
}

/// Compute the Poseidon challenge `c = H(R8.x, R8.y, A.x, A.y, m) mod n`.
fn challenge(
    r8: &EdwardsAffine,
    public: &EdwardsAffine,
    message_hash: &Fr,
) -> Result<JubjubScalar, PoseidonHashError> {
    let c = poseidon_hash(&[r8.x, r8.y, public.x, public.y, *message_hash])?;
    Ok(scalar_from_bytes_be(&field_to_bytes_be(&c)))
}

/// Sign a message hash with an identity secret.
///
/// Deterministic: identical `(secret, message_hash)` pairs always yield the
/// identical signature (see the module docs for why, and for the
/// domain-binding obligation this places on callers).
pub fn sign_raw(secret: &Fr, message_hash: &Fr) -> Result<IdentitySignature, SignatureError> {
    let public = super::babyjubjub::derive_public_key(secret);

    // Message-derived ephemeral scalar.
    let r = to_subgroup_scalar(message_hash);
    let r8 = mul_base8(&r);

    let c = challenge(&r8, &public, message_hash)?;
    let s = r + c * to_subgroup_scalar(secret);

    Ok(IdentitySignature { r8, s })
}

/// Verify a signature against a public key and message hash.
///
/// Returns `false` for any failure — wrong key, tampered message, malformed
/// challenge. No oracle.
pub fn verify_raw(public: &EdwardsAffine, message_hash: &Fr, sig: &IdentitySignature) -> bool {
    let c = match challenge(&sig.r8, public, message_hash) {
        Ok(c) => c,
        Err(_) => return false,
    };

    let lhs = EdwardsProjective::from(base8()) * sig.s;
    let rhs = EdwardsProjective::from(sig.r8) + EdwardsProjective::from(*public) * c;

    lhs.into_affine() == rhs.into_affine()
}
