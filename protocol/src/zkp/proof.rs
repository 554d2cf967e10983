//! # Identity Proof Wire Format
//!
//! A succinct proof travels as eight 32-byte big-endian words — the three
//! point groups of a Groth16 proof:
//!
//! ```text
//! a: [2]       G1  (x, y)
//! b: [2][2]    G2  ((x.c1, x.c0), (y.c1, y.c0))
//! c: [2]       G1  (x, y)
//! ```
//!
//! Fq2 coefficients are carried in `(c1, c0)` order, matching the
//! convention the common snark tooling emits. The 256-byte encoding is
//! bit-exact: encode∘decode is the identity on well-formed input.
//!
//! Decoding validates only the length. Interpreting the words as curve
//! points (with canonicality, on-curve, and subgroup checks) happens in
//! [`IdentityProof::to_ark_proof`], used by the pairing verifier; a proof
//! whose words are not valid points is simply an invalid proof, not a
//! protocol error.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use ark_bn254::Fr;

use crate::config::{FIELD_LENGTH, PROOF_WIRE_LENGTH};
use crate::identity::{EventId, Nullifier};

/// Errors from proof (de)coding and point interpretation.
#[derive(Debug, Error)]
pub enum ProofCodecError {
    /// The wire blob is not exactly eight words.
    #[error("invalid proof encoding length: expected {PROOF_WIRE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),

    /// A coordinate word is not a canonical field element (>= modulus).
    #[error("non-canonical field coordinate in proof")]
    NonCanonicalCoordinate,

    /// A decoded point does not satisfy its curve equation.
    #[error("proof point is not on the curve")]
    PointNotOnCurve,

    /// A decoded point is outside the expected prime-order subgroup.
    #[error("proof point is not in the prime-order subgroup")]
    PointNotInSubgroup,
}

// ---------------------------------------------------------------------------
// IdentityProof
// ---------------------------------------------------------------------------

/// The wire form of a succinct identity proof.
///
/// Stored as raw words rather than curve points: the account only ever
/// forwards proofs to a verifier, and the deterministic test double (see
/// [`super::stub`]) produces words that are deliberately not points.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProof {
    /// First G1 group: `(x, y)`.
    pub a: [[u8; FIELD_LENGTH]; 2],
    /// The G2 group: `((x.c1, x.c0), (y.c1, y.c0))`.
    pub b: [[[u8; FIELD_LENGTH]; 2]; 2],
    /// Second G1 group: `(x, y)`.
    pub c: [[u8; FIELD_LENGTH]; 2],
}

impl IdentityProof {
    /// Serialize to the 256-byte wire blob.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROOF_WIRE_LENGTH);
        out.extend_from_slice(&self.a[0]);
        out.extend_from_slice(&self.a[1]);
        out.extend_from_slice(&self.b[0][0]);
        out.extend_from_slice(&self.b[0][1]);
        out.extend_from_slice(&self.b[1][0]);
        out.extend_from_slice(&self.b[1][1]);
        out.extend_from_slice(&self.c[0]);
        out.extend_from_slice(&self.c[1]);
        out
    }

    /// Deserialize from the wire blob. Validates length only.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProofCodecError> {
        if bytes.len() != PROOF_WIRE_LENGTH {
            return Err(ProofCodecError::InvalidLength(bytes.len()));
        }

        let word = |i: usize| -> [u8; FIELD_LENGTH] {
            bytes[i * FIELD_LENGTH..(i + 1) * FIELD_LENGTH]
                .try_into()
                .expect("length checked above")
        };

        Ok(Self {
            a: [word(0), word(1)],
            b: [[word(2), word(3)], [word(4), word(5)]],
            c: [word(6), word(7)],
        })
    }

    /// Interpret the words as an arkworks Groth16 proof, with full point
    /// validation.
    pub fn to_ark_proof(&self) -> Result<ark_groth16::Proof<ark_bn254::Bn254>, ProofCodecError> {
        Ok(ark_groth16::Proof {
            a: g1_from_words(&self.a)?,
            b: g2_from_words(&self.b)?,
            c: g1_from_words(&self.c)?,
        })
    }

    /// Build the wire form from an arkworks Groth16 proof.
    pub fn from_ark_proof(proof: &ark_groth16::Proof<ark_bn254::Bn254>) -> Self {
        Self {
            a: [fq_to_be(&proof.a.x), fq_to_be(&proof.a.y)],
            b: [
                [fq_to_be(&proof.b.x.c1), fq_to_be(&proof.b.x.c0)],
                [fq_to_be(&proof.b.y.c1), fq_to_be(&proof.b.y.c0)],
            ],
            c: [fq_to_be(&proof.c.x), fq_to_be(&proof.c.y)],
        }
    }
}

impl fmt::Debug for IdentityProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 256 bytes of hex helps nobody; a digest identifies the proof.
        let digest = crate::crypto::hash::blake3_hash(&self.encode());
        write!(f, "IdentityProof(0x{}…)", hex::encode(&digest[..8]))
    }
}

// ---------------------------------------------------------------------------
// Point interpretation helpers
// ---------------------------------------------------------------------------

fn fq_to_be(fe: &Fq) -> [u8; FIELD_LENGTH] {
    let bytes = fe.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_LENGTH];
    out[FIELD_LENGTH - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Strict canonical decode: the word must be the unique minimal encoding
/// of a field element.
fn fq_from_be_strict(word: &[u8; FIELD_LENGTH]) -> Result<Fq, ProofCodecError> {
    let fe = Fq::from_be_bytes_mod_order(word);
    if &fq_to_be(&fe) != word {
        return Err(ProofCodecError::NonCanonicalCoordinate);
    }
    Ok(fe)
}

fn g1_from_words(words: &[[u8; FIELD_LENGTH]; 2]) -> Result<G1Affine, ProofCodecError> {
    let x = fq_from_be_strict(&words[0])?;
    let y = fq_from_be_strict(&words[1])?;
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(ProofCodecError::PointNotOnCurve);
    }
    // G1 on BN254 has cofactor 1; on-curve implies in-subgroup.
    Ok(point)
}

fn g2_from_words(words: &[[[u8; FIELD_LENGTH]; 2]; 2]) -> Result<G2Affine, ProofCodecError> {
    let x = Fq2::new(fq_from_be_strict(&words[0][1])?, fq_from_be_strict(&words[0][0])?);
    let y = Fq2::new(fq_from_be_strict(&words[1][1])?, fq_from_be_strict(&words[1][0])?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(ProofCodecError::PointNotOnCurve);
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProofCodecError::PointNotInSubgroup);
    }
    Ok(point)
}

// ---------------------------------------------------------------------------
// PublicSignals
// ---------------------------------------------------------------------------

/// The public inputs an identity proof is checked against, in circuit
/// order: `[nullifier, event_id, message_hash]`.
///
/// The message hash is the binding slot: operation authentication puts the
/// operation hash there, delegation puts the delegate address there. A
/// proof therefore never transfers between contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSignals {
    /// The pseudonym the prover claims.
    pub nullifier: Nullifier,
    /// The event scope the nullifier was derived under.
    pub event_id: EventId,
    /// The message the proof is bound to.
    pub message_hash: Fr,
}

impl PublicSignals {
    /// The field-element vector in the order the verifier consumes it.
    pub fn to_field_elements(&self) -> [Fr; 3] {
        [
            self.nullifier.to_field(),
            self.event_id.to_field(),
            self.message_hash,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    fn sample_proof() -> IdentityProof {
        let mut words = [[0u8; FIELD_LENGTH]; 8];
        for (i, w) in words.iter_mut().enumerate() {
            w[31] = i as u8 + 1;
        }
        IdentityProof {
            a: [words[0], words[1]],
            b: [[words[2], words[3]], [words[4], words[5]]],
            c: [words[6], words[7]],
        }
    }

    #[test]
    fn wire_round_trip_is_bit_exact() {
        let proof = sample_proof();
        let encoded = proof.encode();
        assert_eq!(encoded.len(), PROOF_WIRE_LENGTH);
        assert_eq!(IdentityProof::decode(&encoded).unwrap(), proof);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!(
            IdentityProof::decode(&[0u8; 255]),
            Err(ProofCodecError::InvalidLength(255))
        ));
        assert!(matches!(
            IdentityProof::decode(&[0u8; 257]),
            Err(ProofCodecError::InvalidLength(257))
        ));
    }

    #[test]
    fn word_order_is_documented_layout() {
        let proof = sample_proof();
        let encoded = proof.encode();
        // a.x is the first word, c.y the last.
        assert_eq!(encoded[31], 1);
        assert_eq!(encoded[255], 8);
    }

    #[test]
    fn garbage_words_are_not_points() {
        let proof = sample_proof();
        assert!(proof.to_ark_proof().is_err());
    }

    #[test]
    fn generator_based_proof_round_trips_through_ark() {
        // Build a structurally valid proof from the curve generators and
        // check wire -> ark -> wire is the identity.
        let g1 = ark_bn254::G1Affine::generator();
        let g2 = ark_bn254::G2Affine::generator();
        let ark_proof = ark_groth16::Proof {
            a: g1,
            b: g2,
            c: g1,
        };

        let wire = IdentityProof::from_ark_proof(&ark_proof);
        let restored = wire.to_ark_proof().unwrap();
        assert_eq!(restored.a, ark_proof.a);
        assert_eq!(restored.b, ark_proof.b);
        assert_eq!(restored.c, ark_proof.c);
    }

    #[test]
    fn non_canonical_coordinate_rejected() {
        let g1 = ark_bn254::G1Affine::generator();
        let g2 = ark_bn254::G2Affine::generator();
        let mut wire = IdentityProof::from_ark_proof(&ark_groth16::Proof {
            a: g1,
            b: g2,
            c: g1,
        });
        // The BN254 base-field modulus starts 0x30...; an all-0xFF word is
        // above it and must be rejected as non-canonical.
        wire.a[0] = [0xFF; FIELD_LENGTH];
        assert!(matches!(
            wire.to_ark_proof(),
            Err(ProofCodecError::NonCanonicalCoordinate)
        ));
    }

    #[test]
    fn signals_field_order() {
        let kp_secret = Fr::from(123u64);
        let nullifier = crate::identity::derive_nullifier(&kp_secret, EventId::new(5));
        let signals = PublicSignals {
            nullifier,
            event_id: EventId::new(5),
            message_hash: Fr::from(99u64),
        };
        let fes = signals.to_field_elements();
        assert_eq!(fes[0], nullifier.to_field());
        assert_eq!(fes[1], Fr::from(5u64));
        assert_eq!(fes[2], Fr::from(99u64));
    }
}
