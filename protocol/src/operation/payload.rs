//! Signature-field payloads.
//!
//! The `signature` field of an operation carries one of two encodings,
//! discriminated by length:
//!
//! ```text
//! 96 bytes   delegate payload:  ed25519_public_key (32) || signature (64)
//! 256 bytes  identity proof:    the wire form of IdentityProof
//! ```
//!
//! Any other length is an unrecognized encoding. The account maps decode
//! failures to its signature-failure validation code rather than a revert,
//! so a malformed payload costs its submitter gas, not the batch.

use thiserror::Error;

use crate::config::{DELEGATE_PAYLOAD_LENGTH, PROOF_WIRE_LENGTH};
use crate::crypto::keys::AuraKeypair;
use crate::operation::types::OpHash;
use crate::zkp::proof::{IdentityProof, ProofCodecError};

/// Errors from payload decoding.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload length matches neither encoding.
    #[error("unrecognized signature payload length: {0} bytes")]
    UnrecognizedLength(usize),

    /// The payload claimed to be a proof but failed the wire codec.
    #[error("invalid proof payload: {0}")]
    InvalidProof(#[from] ProofCodecError),
}

/// A decoded signature payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignaturePayload {
    /// A plain signature by an address-holding principal (session delegate
    /// or address owner) over the operation hash.
    Delegate {
        /// The signer's Ed25519 public key; its address is derived from
        /// this and checked against the account's expectations.
        public_key: [u8; 32],
        /// The Ed25519 signature over the operation hash bytes.
        signature: [u8; 64],
    },
    /// An encoded identity proof, checked against the account's owner
    /// nullifier by the external verifier.
    Proof(IdentityProof),
}

impl SignaturePayload {
    /// Decode a signature field by length.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        match bytes.len() {
            DELEGATE_PAYLOAD_LENGTH => {
                let public_key: [u8; 32] =
                    bytes[..32].try_into().expect("length checked above");
                let signature: [u8; 64] =
                    bytes[32..].try_into().expect("length checked above");
                Ok(Self::Delegate {
                    public_key,
                    signature,
                })
            }
            PROOF_WIRE_LENGTH => Ok(Self::Proof(IdentityProof::decode(bytes)?)),
            other => Err(PayloadError::UnrecognizedLength(other)),
        }
    }

    /// Encode back to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Delegate {
                public_key,
                signature,
            } => {
                let mut out = Vec::with_capacity(DELEGATE_PAYLOAD_LENGTH);
                out.extend_from_slice(public_key);
                out.extend_from_slice(signature);
                out
            }
            Self::Proof(proof) => proof.encode(),
        }
    }

    /// Build a delegate payload: sign the operation hash with `keypair`.
    pub fn delegate(keypair: &AuraKeypair, op_hash: &OpHash) -> Self {
        let signature = keypair.sign(op_hash.as_bytes());
        Self::Delegate {
            public_key: keypair.public_key_bytes(),
            signature: signature
                .to_array()
                .expect("ed25519 signatures are 64 bytes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegate_payload_round_trip() {
        let kp = AuraKeypair::from_seed(&[5u8; 32]);
        let op_hash = OpHash::from_bytes([9u8; 32]);

        let payload = SignaturePayload::delegate(&kp, &op_hash);
        let bytes = payload.encode();
        assert_eq!(bytes.len(), DELEGATE_PAYLOAD_LENGTH);
        assert_eq!(SignaturePayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn proof_payload_round_trip() {
        let proof = IdentityProof::decode(&[0x42u8; PROOF_WIRE_LENGTH]).unwrap();
        let payload = SignaturePayload::Proof(proof);
        let bytes = payload.encode();
        assert_eq!(bytes.len(), PROOF_WIRE_LENGTH);
        assert_eq!(SignaturePayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn unrecognized_lengths_rejected() {
        for len in [0usize, 64, 95, 97, 128, 255, 257] {
            assert!(
                matches!(
                    SignaturePayload::decode(&vec![0u8; len]),
                    Err(PayloadError::UnrecognizedLength(l)) if l == len
                ),
                "length {} should be unrecognized",
                len
            );
        }
    }

    #[test]
    fn delegate_signature_actually_covers_op_hash() {
        use crate::crypto::keys::verify_raw_ed25519;

        let kp = AuraKeypair::from_seed(&[6u8; 32]);
        let op_hash = OpHash::from_bytes([1u8; 32]);
        let SignaturePayload::Delegate {
            public_key,
            signature,
        } = SignaturePayload::delegate(&kp, &op_hash)
        else {
            panic!("delegate constructor produced a proof");
        };

        assert!(verify_raw_ed25519(&public_key, op_hash.as_bytes(), &signature));
        assert!(!verify_raw_ed25519(
            &public_key,
            OpHash::from_bytes([2u8; 32]).as_bytes(),
            &signature
        ));
    }
}
