//! # Protocol Configuration & Constants
//!
//! Every magic number in AURA lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are consensus-critical: the operation hash, the
//! deterministic account addresses, and the gas settlement all depend on
//! them. Changing one after accounts exist orphans every predicted address.

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Chain identifier mixed into every operation hash. Operations signed for
/// one chain are meaningless on another — replay across deployments is a
/// hash mismatch, not a policy question.
pub const CHAIN_ID_LOCAL: u64 = 0x41555241; // "AURA" in ASCII hex. Yes, we're that cute.

/// Default event scope for nullifier derivation. Each event id yields an
/// unlinkable pseudonym for the same secret; deployments that want their
/// own identity namespace configure their factory with a different id.
pub const DEFAULT_EVENT_ID: u64 = 5;

// ---------------------------------------------------------------------------
// Wire Format Lengths
// ---------------------------------------------------------------------------

/// Account addresses are 20 bytes, displayed as `0x`-prefixed hex.
pub const ADDRESS_LENGTH: usize = 20;

/// Nullifiers are field elements serialized as 32 big-endian bytes.
pub const NULLIFIER_LENGTH: usize = 32;

/// BN254 field elements serialize to 32 bytes.
pub const FIELD_LENGTH: usize = 32;

/// A delegate signature payload: 32-byte Ed25519 public key followed by a
/// 64-byte signature over the operation hash.
pub const DELEGATE_PAYLOAD_LENGTH: usize = 96;

/// An identity proof on the wire: eight 32-byte words — `a: [2]`,
/// `b: [2][2]`, `c: [2]`.
pub const PROOF_WIRE_LENGTH: usize = 256;

// ---------------------------------------------------------------------------
// Reference Gas Parameters
// ---------------------------------------------------------------------------

/// Default verification gas limit for client-built operations. Generous on
/// purpose: proof verification is the expensive validation path.
pub const DEFAULT_VERIFICATION_GAS_LIMIT: u128 = 16_777_216;

/// Default call gas limit. Same ceiling as verification — the demo flows
/// never get near either.
pub const DEFAULT_CALL_GAS_LIMIT: u128 = 16_777_216;

/// Default pre-verification gas: the fixed overhead charged before any
/// account code runs (calldata transport, batch bookkeeping).
pub const DEFAULT_PRE_VERIFICATION_GAS: u128 = 16_777_216;

/// Default priority fee per gas unit.
pub const DEFAULT_MAX_PRIORITY_FEE: u128 = 256;

/// Default maximum fee per gas unit. Settlement charges
/// `gas_used * max_fee`.
pub const DEFAULT_MAX_FEE: u128 = 256;

// ---------------------------------------------------------------------------
// Gas Metering Model
// ---------------------------------------------------------------------------
//
// The dispatcher meters deterministically: flat validation cost, flat call
// base, and a per-byte calldata cost, each clamped to the operation's own
// limits. There is no instruction-level metering — operations here are
// single validated calls, not arbitrary programs.

/// Flat gas charged for one validation pass (nonce + signature/proof check).
pub const VERIFICATION_BASE_GAS: u128 = 60_000;

/// Flat gas charged for dispatching the operation's call.
pub const CALL_BASE_GAS: u128 = 21_000;

/// Gas charged per byte of `call_data`.
pub const CALLDATA_GAS_PER_BYTE: u128 = 16;

// ---------------------------------------------------------------------------
// Validation Result Codes
// ---------------------------------------------------------------------------

/// Validation succeeded; the operation is authorized without a time bound.
pub const VALIDATION_OK: u32 = 0;

/// Authentication failed (bad signature, bad proof, unrecognized payload).
/// Reported as a code, not a revert, so the dispatcher can report failed
/// authentication uniformly without aborting the batch.
pub const VALIDATION_SIG_FAILED: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_is_valid_ascii() {
        let bytes = (CHAIN_ID_LOCAL as u32).to_be_bytes();
        assert!(bytes.iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn wire_lengths_are_consistent() {
        // A proof is exactly eight field-sized words; a delegate payload is
        // an Ed25519 key plus a signature. If these drift, the payload
        // decoder's length-based discrimination breaks.
        assert_eq!(PROOF_WIRE_LENGTH, 8 * FIELD_LENGTH);
        assert_eq!(DELEGATE_PAYLOAD_LENGTH, 32 + 64);
        assert_ne!(PROOF_WIRE_LENGTH, DELEGATE_PAYLOAD_LENGTH);
    }

    #[test]
    fn gas_constants_sanity() {
        assert!(VERIFICATION_BASE_GAS < DEFAULT_VERIFICATION_GAS_LIMIT);
        assert!(CALL_BASE_GAS < DEFAULT_CALL_GAS_LIMIT);
        assert!(CALLDATA_GAS_PER_BYTE > 0);
    }

    #[test]
    fn validation_codes_distinct() {
        assert_ne!(VALIDATION_OK, VALIDATION_SIG_FAILED);
    }
}
