//! Core type definitions for AURA operations.
//!
//! An operation is a client-submitted intent to act through a smart
//! account: who is acting (`sender`), in what order (`nonce`), how the
//! account comes into existence if it doesn't yet (`init_code`), what it
//! does (`call_data`), who pays and how much (`gas` fields,
//! `paymaster_and_data`), and the authentication material (`signature`).
//!
//! The operation hash binds everything except the signature to one
//! dispatcher on one chain. It is computed over
//! [`Operation::signable_bytes`], a deterministic canonical encoding —
//! fixed-width little-endian integers and length-prefixed byte fields.
//! Serde is deliberately not used for hashing: field ordering across
//! formats is nobody's consensus rule.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::config::{ADDRESS_LENGTH, FIELD_LENGTH};
use crate::crypto::hash::{blake3_hash_multi, field_from_bytes_be};
use ark_bn254::Fr;
use thiserror::Error;

/// Errors from operation field parsing.
#[derive(Debug, Error)]
pub enum OperationError {
    /// `init_code` is present but shorter than a factory address.
    #[error("init code too short: {0} bytes")]
    InitCodeTooShort(usize),

    /// `paymaster_and_data` is present but shorter than an address.
    #[error("paymaster data too short: {0} bytes")]
    PaymasterDataTooShort(usize),
}

// ---------------------------------------------------------------------------
// Packed gas fields
// ---------------------------------------------------------------------------

/// The two per-account gas limits, packable into one 32-byte word with the
/// verification limit in the high 128 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasLimits {
    /// Gas budget for the validation phase (signature/proof checking).
    pub verification: u128,
    /// Gas budget for executing the operation's call.
    pub call: u128,
}

impl GasLimits {
    /// Pack as `verification || call`, big-endian halves.
    pub fn pack(&self) -> [u8; FIELD_LENGTH] {
        pack_u128_pair(self.verification, self.call)
    }

    /// Unpack from the 32-byte wire word.
    pub fn unpack(word: [u8; FIELD_LENGTH]) -> Self {
        let (verification, call) = unpack_u128_pair(word);
        Self { verification, call }
    }
}

/// The two fee fields, packable the same way: priority fee in the high
/// half, maximum fee in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasFees {
    /// Tip per gas unit offered to the batch submitter.
    pub max_priority_fee: u128,
    /// Ceiling per gas unit; settlement charges `gas_used * max_fee`.
    pub max_fee: u128,
}

impl GasFees {
    /// Pack as `max_priority_fee || max_fee`, big-endian halves.
    pub fn pack(&self) -> [u8; FIELD_LENGTH] {
        pack_u128_pair(self.max_priority_fee, self.max_fee)
    }

    /// Unpack from the 32-byte wire word.
    pub fn unpack(word: [u8; FIELD_LENGTH]) -> Self {
        let (max_priority_fee, max_fee) = unpack_u128_pair(word);
        Self {
            max_priority_fee,
            max_fee,
        }
    }
}

fn pack_u128_pair(high: u128, low: u128) -> [u8; FIELD_LENGTH] {
    let mut out = [0u8; FIELD_LENGTH];
    out[..16].copy_from_slice(&high.to_be_bytes());
    out[16..].copy_from_slice(&low.to_be_bytes());
    out
}

fn unpack_u128_pair(word: [u8; FIELD_LENGTH]) -> (u128, u128) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&word[..16]);
    low.copy_from_slice(&word[16..]);
    (u128::from_be_bytes(high), u128::from_be_bytes(low))
}

// ---------------------------------------------------------------------------
// OpHash
// ---------------------------------------------------------------------------

/// The hash an operation is signed (or proved) over.
///
/// Stable across signing: the signature field is excluded from the
/// preimage, so clients can compute the hash, authenticate it, and attach
/// the result without the hash moving underneath them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpHash([u8; 32]);

impl OpHash {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Reduce into the field for use as a proof signal. Embedding the
    /// operation hash as a public input is what binds a proof to one
    /// specific operation.
    pub fn to_field(&self) -> Fr {
        field_from_bytes_be(&self.0)
    }
}

impl fmt::Display for OpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpHash({})", self)
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A client-submitted intent to act through a smart account, validated and
/// executed atomically by the dispatcher. Transient: nothing persists it
/// beyond the validate→execute→settle cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// The target account address (which may not exist yet — see
    /// `init_code`).
    pub sender: Address,

    /// Must equal the account's stored nonce; accepted operations advance
    /// it by exactly one.
    pub nonce: u64,

    /// Factory call for first-use deployment:
    /// `factory_address || factory_call_bytes`. Empty once the account
    /// exists.
    pub init_code: Vec<u8>,

    /// The call the account executes after validation.
    pub call_data: Vec<u8>,

    /// Verification and call gas limits.
    pub gas_limits: GasLimits,

    /// Fixed overhead charged before any account code runs.
    pub pre_verification_gas: u128,

    /// Fee offer.
    pub gas_fees: GasFees,

    /// Sponsorship: `paymaster_address || sponsor_data`, or empty when the
    /// account pays for itself.
    pub paymaster_and_data: Vec<u8>,

    /// Authentication material: a delegate signature payload or an encoded
    /// identity proof. Excluded from the operation hash.
    pub signature: Vec<u8>,
}

impl Operation {
    /// The canonical byte encoding used for hashing.
    ///
    /// Deterministic concatenation: fixed-width integers (little-endian),
    /// length-prefixed byte fields, packed gas words. Excludes `signature`.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            ADDRESS_LENGTH
                + 8
                + self.init_code.len()
                + self.call_data.len()
                + self.paymaster_and_data.len()
                + 96,
        );

        buf.extend_from_slice(self.sender.as_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());

        buf.extend_from_slice(&(self.init_code.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.init_code);

        buf.extend_from_slice(&(self.call_data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.call_data);

        buf.extend_from_slice(&self.gas_limits.pack());
        buf.extend_from_slice(&self.pre_verification_gas.to_le_bytes());
        buf.extend_from_slice(&self.gas_fees.pack());

        buf.extend_from_slice(&(self.paymaster_and_data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.paymaster_and_data);

        buf
    }

    /// The operation hash, bound to one dispatcher on one chain.
    pub fn hash(&self, dispatcher: &Address, chain_id: u64) -> OpHash {
        OpHash(blake3_hash_multi(&[
            &self.signable_bytes(),
            dispatcher.as_bytes(),
            &chain_id.to_le_bytes(),
        ]))
    }

    /// Parse the paymaster field: `None` when the account pays for itself.
    pub fn paymaster(&self) -> Result<Option<(Address, &[u8])>, OperationError> {
        if self.paymaster_and_data.is_empty() {
            return Ok(None);
        }
        if self.paymaster_and_data.len() < ADDRESS_LENGTH {
            return Err(OperationError::PaymasterDataTooShort(
                self.paymaster_and_data.len(),
            ));
        }
        let address = Address::from_slice(&self.paymaster_and_data[..ADDRESS_LENGTH])
            .expect("slice length checked above");
        Ok(Some((address, &self.paymaster_and_data[ADDRESS_LENGTH..])))
    }

    /// The maximum amount the payer can be charged for this operation:
    /// `(verification + call + pre_verification) * max_fee`, saturating.
    pub fn max_cost(&self) -> u128 {
        self.gas_limits
            .verification
            .saturating_add(self.gas_limits.call)
            .saturating_add(self.pre_verification_gas)
            .saturating_mul(self.gas_fees.max_fee)
    }
}

// ---------------------------------------------------------------------------
// Init code
// ---------------------------------------------------------------------------

/// Encode first-use deployment data: `factory_address || factory_call`.
pub fn encode_init_code(factory: &Address, factory_call: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ADDRESS_LENGTH + factory_call.len());
    out.extend_from_slice(factory.as_bytes());
    out.extend_from_slice(factory_call);
    out
}

/// Split `init_code` into the factory address and its call bytes.
pub fn decode_init_code(init_code: &[u8]) -> Result<(Address, &[u8]), OperationError> {
    if init_code.len() < ADDRESS_LENGTH {
        return Err(OperationError::InitCodeTooShort(init_code.len()));
    }
    let factory = Address::from_slice(&init_code[..ADDRESS_LENGTH])
        .expect("slice length checked above");
    Ok((factory, &init_code[ADDRESS_LENGTH..]))
}
