//! # Session Key Management
//!
//! Ed25519 keypairs for session delegates and other address-holding
//! principals. The zk identity scheme (Baby Jubjub, see
//! [`crate::identity`]) authenticates the *owner*; these keys authenticate
//! everything that acts by plain signature — above all the hot session key
//! an owner authorizes so it doesn't have to generate a proof per
//! operation.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses the OS RNG. If your OS RNG is broken, you have
//!   bigger problems than AURA.
//! - Key bytes are never logged. If you add logging to this module, you
//!   will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// An Ed25519 keypair for an address-holding principal.
///
/// Intentionally does NOT implement `Serialize`/`Deserialize`. Serializing
/// private keys should be a deliberate act, not something that happens
/// because a keypair ended up inside a JSON response.
pub struct AuraKeypair {
    signing_key: SigningKey,
}

/// The public half, safe to share. 32 bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a message. Always 64 bytes; anything else
/// simply fails verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraSignature {
    bytes: Vec<u8>,
}

impl AuraKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// Useful for tests and for deriving session keys from a KDF. A weak
    /// seed makes a weak key; use a proper CSPRNG or KDF.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_seed(&arr))
    }

    /// Sign a message, producing a 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> AuraSignature {
        AuraSignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Verify a signature produced by this keypair.
    pub fn verify(&self, message: &[u8], signature: &AuraSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> AuraPublicKey {
        AuraPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl Clone for AuraKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl AuraPublicKey {
    /// Construct from raw bytes. Validity is checked lazily at verification
    /// time; an invalid point simply never verifies anything.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this key. Returns `false` for any
    /// failure — invalid key bytes, wrong length, bad signature. No oracle.
    pub fn verify(&self, message: &[u8], signature: &AuraSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.bytes.as_slice()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for AuraPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuraPublicKey({})", hex::encode(self.bytes))
    }
}

impl AuraSignature {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fixed-size form, if the signature has the canonical 64-byte length.
    pub fn to_array(&self) -> Option<[u8; 64]> {
        self.bytes.as_slice().try_into().ok()
    }
}

impl fmt::Debug for AuraSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuraSignature({})", hex::encode(&self.bytes))
    }
}

/// Verify a signature from raw byte components.
///
/// The "I got these bytes off the wire and need to check them" variant,
/// used by the account's delegate-payload path.
pub fn verify_raw_ed25519(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8; 64],
) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key_bytes) else {
        return false;
    };
    let sig = DalekSignature::from_bytes(signature_bytes);
    verifying_key.verify(message, &sig).is_ok()
}
