// Signing & verification benchmarks for the AURA protocol.
//
// Covers identity keypair derivation, Poseidon-Schnorr signing and
// verification on Baby Jubjub, and the Ed25519 session-key path for
// comparison — the cost gap between the two is the whole argument for
// session delegation.

use criterion::{criterion_group, criterion_main, Criterion};

use ark_bn254::Fr;

use aura_protocol::crypto::keys::AuraKeypair;
use aura_protocol::crypto::signatures::{sign_raw, verify_raw};
use aura_protocol::identity::IdentityKeypair;

fn bench_identity_keypair_from_seed(c: &mut Criterion) {
    c.bench_function("identity/keypair_from_seed", |b| {
        b.iter(|| IdentityKeypair::from_seed(&[0x42; 32]));
    });
}

fn bench_schnorr_sign(c: &mut Criterion) {
    let kp = IdentityKeypair::from_seed(&[0x42; 32]);
    let message = Fr::from(0xC0FFEEu64);

    c.bench_function("identity/schnorr_sign", |b| {
        b.iter(|| sign_raw(kp.secret(), &message).unwrap());
    });
}

fn bench_schnorr_verify(c: &mut Criterion) {
    let kp = IdentityKeypair::from_seed(&[0x42; 32]);
    let message = Fr::from(0xC0FFEEu64);
    let sig = sign_raw(kp.secret(), &message).unwrap();

    c.bench_function("identity/schnorr_verify", |b| {
        b.iter(|| verify_raw(kp.public(), &message, &sig));
    });
}

fn bench_ed25519_session_sign(c: &mut Criterion) {
    let kp = AuraKeypair::from_seed(&[0x42; 32]);
    let message = [0xABu8; 32];

    c.bench_function("session/ed25519_sign", |b| {
        b.iter(|| kp.sign(&message));
    });
}

fn bench_ed25519_session_verify(c: &mut Criterion) {
    let kp = AuraKeypair::from_seed(&[0x42; 32]);
    let message = [0xABu8; 32];
    let sig = kp.sign(&message);
    let pk = kp.public_key();

    c.bench_function("session/ed25519_verify", |b| {
        b.iter(|| pk.verify(&message, &sig));
    });
}

criterion_group!(
    benches,
    bench_identity_keypair_from_seed,
    bench_schnorr_sign,
    bench_schnorr_verify,
    bench_ed25519_session_sign,
    bench_ed25519_session_verify,
);
criterion_main!(benches);
