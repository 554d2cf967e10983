//! # Addresses
//!
//! A 20-byte account identifier, displayed as `0x`-prefixed hex. Three
//! things produce addresses:
//!
//! - hashing an Ed25519 public key (externally-owned principals, session
//!   delegates),
//! - deterministic derivation from a factory salt (smart accounts),
//! - tests, which are allowed to conjure arbitrary ones.
//!
//! Both derivations take the last 20 bytes of a BLAKE3 digest; the factory
//! path additionally domain-separates with a derive-key context so a key
//! hash can never collide with a deployment address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::AuraPublicKey;

/// Errors that can occur when parsing addresses.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string is not `0x` followed by 40 hex characters.
    #[error("invalid address string: {0}")]
    InvalidString(String),

    /// The byte slice has the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Used as a sentinel for "no address yet" in
    /// builders; nothing should ever hold funds here.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Construct from a byte slice of the correct length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Derive the address of an Ed25519 public key: the last 20 bytes of
    /// `BLAKE3(key)`.
    pub fn from_public_key(key: &AuraPublicKey) -> Self {
        Self::truncate(blake3_hash(key.as_bytes()))
    }

    /// Derive an address from a domain-separated digest over `parts`.
    ///
    /// Shared by the factory's predict and deploy paths — determinism of
    /// account provisioning rests on both sides calling exactly this.
    pub fn derive(context: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        for part in parts {
            hasher.update(part);
        }
        Self::truncate(*hasher.finalize().as_bytes())
    }

    fn truncate(digest: [u8; 32]) -> Self {
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
        Self(out)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// `true` for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::InvalidString(s.to_string()))?;
        let bytes =
            hex::decode(hex_part).map_err(|_| AddressError::InvalidString(s.to_string()))?;
        Self::from_slice(&bytes).map_err(|_| AddressError::InvalidString(s.to_string()))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Address::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}
