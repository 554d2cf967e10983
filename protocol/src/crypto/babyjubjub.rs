//! # Baby Jubjub Curve Operations
//!
//! Baby Jubjub is the twisted Edwards curve whose base field is the BN254
//! scalar field — which is exactly why it's here: point arithmetic on this
//! curve is cheap *inside* a BN254 circuit, so the identity scheme's keys
//! and signatures live on it.
//!
//! The fixed generator is `Base8`, the cofactor-cleared generator of the
//! prime-order subgroup (order ~2^251, cofactor 8). All secret scalars are
//! reduced into the subgroup order before use; points deserialized from the
//! wire are checked for curve and subgroup membership.
//!
//! Coordinates are BN254 `Fr` elements and serialize as 32 big-endian bytes
//! each, matching the Poseidon input encoding in [`super::poseidon`].

use ark_bn254::Fr;
use ark_ec::CurveGroup;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fr as JubjubScalar};
use ark_ff::{BigInteger, MontFp, PrimeField};
use thiserror::Error;

use super::hash::{field_from_bytes_be, field_to_bytes_be};
use crate::config::FIELD_LENGTH;

/// x-coordinate of `Base8`, the prime-subgroup generator.
pub const BASE8_X: Fr =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");

/// y-coordinate of `Base8`.
pub const BASE8_Y: Fr =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// Errors from point deserialization.
#[derive(Debug, Error)]
pub enum CurveError {
    /// The byte slice is not two field-sized coordinates.
    #[error("invalid point encoding length: expected 64 bytes, got {0}")]
    InvalidLength(usize),

    /// The coordinates do not satisfy the curve equation.
    #[error("point is not on the curve")]
    NotOnCurve,

    /// The point is on the curve but outside the prime-order subgroup.
    /// Small-order components enable key-substitution games; we reject them
    /// at the boundary.
    #[error("point is not in the prime-order subgroup")]
    NotInSubgroup,
}

/// The fixed generator of the prime-order subgroup.
pub fn base8() -> EdwardsAffine {
    EdwardsAffine::new_unchecked(BASE8_X, BASE8_Y)
}

/// Multiply the generator by a subgroup scalar.
pub fn mul_base8(scalar: &JubjubScalar) -> EdwardsAffine {
    (EdwardsProjective::from(base8()) * *scalar).into_affine()
}

/// Derive the public key for a secret.
///
/// The secret is a base-field element (that is what Poseidon hashes); it is
/// reduced into the subgroup order for the scalar multiplication. Since
/// `Base8` has prime order, the reduction changes nothing observable.
pub fn derive_public_key(secret: &Fr) -> EdwardsAffine {
    mul_base8(&to_subgroup_scalar(secret))
}

/// Reduce a base-field element into the subgroup scalar field.
///
/// Round-trips through the canonical big-endian byte form, so the result is
/// the integer value of `fe` taken modulo the subgroup order.
pub fn to_subgroup_scalar(fe: &Fr) -> JubjubScalar {
    JubjubScalar::from_be_bytes_mod_order(&field_to_bytes_be(fe))
}

/// Serialize a subgroup scalar to 32 big-endian bytes.
pub fn scalar_to_bytes_be(scalar: &JubjubScalar) -> [u8; 32] {
    let bytes = scalar.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Deserialize a subgroup scalar from big-endian bytes (reduced mod order).
pub fn scalar_from_bytes_be(bytes: &[u8]) -> JubjubScalar {
    JubjubScalar::from_be_bytes_mod_order(bytes)
}

/// Serialize a point as `x || y`, 32 big-endian bytes each.
pub fn point_to_bytes(point: &EdwardsAffine) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..FIELD_LENGTH].copy_from_slice(&field_to_bytes_be(&point.x));
    out[FIELD_LENGTH..].copy_from_slice(&field_to_bytes_be(&point.y));
    out
}

/// Deserialize a point from `x || y`, validating curve and subgroup
/// membership.
pub fn point_from_bytes(bytes: &[u8]) -> Result<EdwardsAffine, CurveError> {
    if bytes.len() != 2 * FIELD_LENGTH {
        return Err(CurveError::InvalidLength(bytes.len()));
    }

    let x = field_from_bytes_be(&bytes[..FIELD_LENGTH]);
    let y = field_from_bytes_be(&bytes[FIELD_LENGTH..]);
    let point = EdwardsAffine::new_unchecked(x, y);

    if !point.is_on_curve() {
        return Err(CurveError::NotOnCurve);
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(CurveError::NotInSubgroup);
    }

    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::Group;
    use ark_ff::Zero;

    #[test]
    fn base8_is_on_curve_and_in_subgroup() {
        let g = base8();
        assert!(g.is_on_curve());
        assert!(g.is_in_correct_subgroup_assuming_on_curve());
    }

    #[test]
    fn base8_has_prime_subgroup_order() {
        // Multiplying by the subgroup order must land on the identity.
        let g = EdwardsProjective::from(base8());
        let annihilated = g.mul_bigint(JubjubScalar::MODULUS);
        assert!(annihilated.is_zero());
    }

    #[test]
    fn public_key_derivation_deterministic() {
        let secret = Fr::from(123456789u64);
        assert_eq!(derive_public_key(&secret), derive_public_key(&secret));
        assert_ne!(
            derive_public_key(&secret),
            derive_public_key(&Fr::from(987654321u64))
        );
    }

    #[test]
    fn point_bytes_round_trip() {
        let p = derive_public_key(&Fr::from(42u64));
        let bytes = point_to_bytes(&p);
        let restored = point_from_bytes(&bytes).unwrap();
        assert_eq!(p, restored);
    }

    #[test]
    fn garbage_point_rejected() {
        let mut bytes = [0u8; 64];
        bytes[31] = 7;
        bytes[63] = 9;
        assert!(matches!(
            point_from_bytes(&bytes),
            Err(CurveError::NotOnCurve)
        ));
    }

    #[test]
    fn short_encoding_rejected() {
        assert!(matches!(
            point_from_bytes(&[0u8; 63]),
            Err(CurveError::InvalidLength(63))
        ));
    }

    #[test]
    fn scalar_reduction_is_stable() {
        let fe = Fr::from(31337u64);
        // Values below the subgroup order pass through unchanged.
        assert_eq!(to_subgroup_scalar(&fe), JubjubScalar::from(31337u64));
    }

    #[test]
    fn scalar_bytes_round_trip() {
        let s = JubjubScalar::from(0xDEADBEEFu64);
        let bytes = scalar_to_bytes_be(&s);
        assert_eq!(scalar_from_bytes_be(&bytes), s);
    }
}
