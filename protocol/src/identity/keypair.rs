//! # Identity Keypairs
//!
//! The Baby Jubjub keypair behind a nullifier identity. The secret is a
//! BN254 field element (that is what Poseidon hashes and what the circuit
//! takes as its private witness); the public key is `secret · Base8`.
//!
//! Secrets produced here are squeezed through Poseidon and halved, which
//! guarantees they fit the bit-width the circuit allocates for the witness.
//! Externally supplied secrets (via [`IdentityKeypair::from_secret`]) skip
//! that squeeze — test vectors and migrations need exact values.

use ark_bn254::Fr;
use ark_ed_on_bn254::EdwardsAffine;
use ark_ff::{BigInteger, PrimeField};
use rand::RngCore;

use super::nullifier::{derive_nullifier, EventId, Nullifier};
use crate::crypto::babyjubjub::derive_public_key;
use crate::crypto::hash::field_from_bytes_be;
use crate::crypto::poseidon::poseidon_hash;
use crate::crypto::signatures::{sign_raw, verify_raw, IdentitySignature, SignatureError};

/// A Baby Jubjub identity keypair.
///
/// Does not implement `Serialize` — the secret is the identity. Exporting
/// it is a deliberate act via [`secret`](Self::secret), not a side effect
/// of serialization.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityKeypair {
    secret: Fr,
    public: EdwardsAffine,
}

impl IdentityKeypair {
    /// Generate a fresh identity from the given RNG.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Derive an identity deterministically from 32 bytes of seed material.
    ///
    /// The seed is lifted into the field, squeezed through Poseidon, and
    /// halved. Same seed, same identity — suitable for KDF-derived and
    /// test identities alike.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_secret(squeeze_secret(field_from_bytes_be(seed)))
    }

    /// Wrap an exact secret value without the squeeze-and-halve step.
    pub fn from_secret(secret: Fr) -> Self {
        let public = derive_public_key(&secret);
        Self { secret, public }
    }

    /// The secret field element. Handle with the respect it deserves.
    pub fn secret(&self) -> &Fr {
        &self.secret
    }

    /// The public key point.
    pub fn public(&self) -> &EdwardsAffine {
        &self.public
    }

    /// Sign a message hash with this identity's secret.
    pub fn sign(&self, message_hash: &Fr) -> Result<IdentitySignature, SignatureError> {
        sign_raw(&self.secret, message_hash)
    }

    /// Verify a signature against this identity's public key.
    pub fn verify(&self, message_hash: &Fr, signature: &IdentitySignature) -> bool {
        verify_raw(&self.public, message_hash, signature)
    }

    /// The nullifier this identity presents under `event_id`.
    pub fn nullifier(&self, event_id: EventId) -> Nullifier {
        derive_nullifier(&self.secret, event_id)
    }
}

impl std::fmt::Debug for IdentityKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The public key identifies the pair; the secret stays out of logs.
        write!(f, "IdentityKeypair(pub = ({}, {}))", self.public.x, self.public.y)
    }
}

/// Squeeze seed material into a circuit-sized secret:
/// `Poseidon(material) >> 1`.
///
/// Halving keeps the value strictly below half the modulus, one bit of
/// headroom under the witness bit-width the circuit allocates.
fn squeeze_secret(material: Fr) -> Fr {
    let hashed = poseidon_hash(&[material]).expect("poseidon arity 1 is always supported");
    let mut bigint = hashed.into_bigint();
    bigint.div2();
    Fr::from_bigint(bigint).expect("halved value is below the modulus")
}
