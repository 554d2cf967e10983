// Copyright (c) 2026 Meridian Systems. MIT License.
// See LICENSE for details.

//! # AURA Protocol — Core Library
//!
//! AURA binds smart-contract wallets ("accounts") to zero-knowledge-provable
//! identities. The holder of a secret presents a different, unlinkable
//! pseudonym — a *nullifier* — per event scope; each nullifier owns exactly
//! one deterministically provisioned account; and the account authenticates
//! operations either by succinct proof or through a proof-authorized session
//! key.
//!
//! This crate is the protocol's foundation: everything that must be
//! bit-for-bit agreed upon between clients, accounts, and the circuit.
//!
//! ## Architecture
//!
//! - **crypto** — Poseidon (the circuit's hash), Baby Jubjub (the circuit's
//!   curve), Schnorr signatures over it, BLAKE3 for everything off-circuit,
//!   Ed25519 for session keys.
//! - **identity** — secrets, keypairs, and nullifier derivation.
//! - **address** — 20-byte account identifiers and their derivations.
//! - **operation** — the account-abstraction operation record, its canonical
//!   hash, and the signature-field payloads.
//! - **zkp** — the proof wire format and the verifier capability boundary.
//! - **ledger** — the injected world-state collaborator (balances,
//!   snapshots).
//! - **config** — protocol constants and the gas model.
//!
//! ## Design Philosophy
//!
//! 1. The circuit is the source of truth: anything it re-derives (hashes,
//!    curve points, signal ordering) is fixed here and tested against known
//!    vectors.
//! 2. No hidden globals — world state is a passed-in capability.
//! 3. If it touches authentication or money, it has tests. Plural.

pub mod address;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod ledger;
pub mod operation;
pub mod zkp;
