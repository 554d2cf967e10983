// Nullifier derivation and hashing benchmarks.
//
// Poseidon is the deliberate bottleneck (it is priced for circuits, not
// CPUs); the BLAKE3 operation hash is here as the off-circuit baseline.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ark_bn254::Fr;

use aura_protocol::address::Address;
use aura_protocol::crypto::poseidon::poseidon_hash;
use aura_protocol::identity::{derive_nullifier, EventId};
use aura_protocol::operation::OperationBuilder;

fn bench_derive_nullifier(c: &mut Criterion) {
    let secret = Fr::from(123456789u64);

    c.bench_function("nullifier/derive", |b| {
        b.iter(|| derive_nullifier(&secret, EventId::new(5)));
    });
}

fn bench_poseidon_arities(c: &mut Criterion) {
    let mut group = c.benchmark_group("poseidon/hash");
    for arity in [1usize, 3, 5] {
        let inputs: Vec<Fr> = (0..arity as u64).map(Fr::from).collect();
        group.bench_with_input(BenchmarkId::from_parameter(arity), &inputs, |b, inputs| {
            b.iter(|| poseidon_hash(inputs).unwrap());
        });
    }
    group.finish();
}

fn bench_operation_hash(c: &mut Criterion) {
    let dispatcher = Address::from_bytes([0xD1; 20]);
    let op = OperationBuilder::new()
        .sender(Address::from_bytes([0x02; 20]))
        .nonce(7)
        .call_data(vec![0xAB; 512])
        .build();

    c.bench_function("operation/hash", |b| {
        b.iter(|| op.hash(&dispatcher, 0x41555241));
    });
}

criterion_group!(
    benches,
    bench_derive_nullifier,
    bench_poseidon_arities,
    bench_operation_hash,
);
criterion_main!(benches);
