//! # Nullifiers — Event-Scoped Pseudonyms
//!
//! A nullifier is the public face of a secret, scoped to one event:
//!
//! ```text
//! SecretHash = Poseidon(secret)
//! Nullifier  = Poseidon(secret, SecretHash, event_id)
//! ```
//!
//! Determinism and unlinkability both fall out of the construction: the
//! same `(secret, event_id)` always produces the same nullifier, while the
//! same secret under a different event id produces a value that cannot be
//! correlated with the first without breaking the hash. The nullifier is
//! what a smart account stores as its owner and what the factory uses as a
//! deployment salt — the secret itself never appears anywhere.
//!
//! The proof circuit re-derives this exact chain from the private witness,
//! which is why every step is Poseidon and every operand is a field
//! element.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{DEFAULT_EVENT_ID, NULLIFIER_LENGTH};
use crate::crypto::hash::{field_from_bytes_be, field_to_bytes_be};
use crate::crypto::poseidon::poseidon_hash;

/// Errors when parsing nullifiers from external representations.
#[derive(Debug, Error)]
pub enum NullifierError {
    /// The input is not 32 bytes of hex.
    #[error("invalid nullifier encoding: {0}")]
    InvalidEncoding(String),
}

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// The event scope of a nullifier.
///
/// Two deployments that want disjoint identity namespaces for the same
/// secrets pick different event ids. Small integers are fine; the value is
/// lifted into the field before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Construct an event id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Lift into the field for hashing and proof signals.
    pub fn to_field(&self) -> Fr {
        Fr::from(self.0)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self(DEFAULT_EVENT_ID)
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Nullifier
// ---------------------------------------------------------------------------

/// An event-scoped pseudonym: a field element stored as 32 big-endian
/// bytes.
///
/// This is the persistent owner identifier of a smart account and the
/// factory's deployment salt. It is public by design — what it hides is
/// the secret behind it and the link to the same secret's nullifiers under
/// other events.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullifier([u8; NULLIFIER_LENGTH]);

impl Nullifier {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; NULLIFIER_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Construct from a field element.
    pub fn from_field(fe: &Fr) -> Self {
        Self(field_to_bytes_be(fe))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; NULLIFIER_LENGTH] {
        &self.0
    }

    /// Back into the field, for proof signals.
    pub fn to_field(&self) -> Fr {
        field_from_bytes_be(&self.0)
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({})", self)
    }
}

impl FromStr for Nullifier {
    type Err = NullifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part)
            .map_err(|_| NullifierError::InvalidEncoding(s.to_string()))?;
        let arr: [u8; NULLIFIER_LENGTH] = bytes
            .try_into()
            .map_err(|_| NullifierError::InvalidEncoding(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl Serialize for Nullifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Nullifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Nullifier::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            let arr: [u8; NULLIFIER_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
                serde::de::Error::custom(format!(
                    "expected {} nullifier bytes, got {}",
                    NULLIFIER_LENGTH,
                    bytes.len()
                ))
            })?;
            Ok(Nullifier(arr))
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the nullifier for `(secret, event_id)`.
///
/// Pure and deterministic; no side effects, no randomness. The two-stage
/// construction (hash the secret first, then bind the event) is what the
/// circuit enforces, so it cannot be simplified here without forking the
/// proof system.
pub fn derive_nullifier(secret: &Fr, event_id: EventId) -> Nullifier {
    let secret_hash =
        poseidon_hash(&[*secret]).expect("poseidon arity 1 is always supported");
    let fe = poseidon_hash(&[*secret, secret_hash, event_id.to_field()])
        .expect("poseidon arity 3 is always supported");
    Nullifier::from_field(&fe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let secret = Fr::from(123u64);
        let n1 = derive_nullifier(&secret, EventId::new(5));
        let n2 = derive_nullifier(&secret, EventId::new(5));
        assert_eq!(n1, n2);
    }

    #[test]
    fn event_id_separates_pseudonyms() {
        let secret = Fr::from(123u64);
        let n5 = derive_nullifier(&secret, EventId::new(5));
        let n10 = derive_nullifier(&secret, EventId::new(10));
        assert_ne!(n5, n10);
    }

    #[test]
    fn secret_separates_pseudonyms() {
        let event = EventId::default();
        let n1 = derive_nullifier(&Fr::from(123u64), event);
        let n2 = derive_nullifier(&Fr::from(124u64), event);
        assert_ne!(n1, n2);
    }

    #[test]
    fn matches_explicit_two_stage_formula() {
        let secret = Fr::from(777u64);
        let event = EventId::new(5);

        let secret_hash = poseidon_hash(&[secret]).unwrap();
        let expected =
            poseidon_hash(&[secret, secret_hash, Fr::from(5u64)]).unwrap();

        assert_eq!(
            derive_nullifier(&secret, event),
            Nullifier::from_field(&expected)
        );
    }

    #[test]
    fn field_round_trip() {
        let n = derive_nullifier(&Fr::from(99u64), EventId::default());
        assert_eq!(Nullifier::from_field(&n.to_field()), n);
    }

    #[test]
    fn hex_round_trip() {
        let n = derive_nullifier(&Fr::from(42u64), EventId::default());
        let s = n.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(Nullifier::from_str(&s).unwrap(), n);
    }

    #[test]
    fn serde_round_trips() {
        let n = derive_nullifier(&Fr::from(13u64), EventId::default());
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(serde_json::from_str::<Nullifier>(&json).unwrap(), n);

        let bytes = bincode::serialize(&n).unwrap();
        assert_eq!(bincode::deserialize::<Nullifier>(&bytes).unwrap(), n);
    }

    #[test]
    fn default_event_id_is_five() {
        assert_eq!(EventId::default().as_u64(), 5);
        assert_eq!(EventId::default().to_field(), Fr::from(5u64));
    }
}
