//! # Identity Module
//!
//! The nullifier identity scheme. A participant holds one secret — a field
//! element — and presents a different, unlinkable pseudonym (the nullifier)
//! per event scope. The stack is layered:
//!
//! 1. **Keypair** — Baby Jubjub secret/public pair. Signs things the
//!    circuit can check.
//! 2. **Nullifier** — `Poseidon(secret, Poseidon(secret), event_id)`. The
//!    public, per-event face of the secret; owner id and factory salt for
//!    smart accounts.
//! 3. **EventId** — the scope selector. Same secret, different event,
//!    uncorrelatable nullifier.
//!
//! The secret never leaves the client. On-chain components only ever see
//! nullifiers, signatures, and proofs about them.

pub mod keypair;
pub mod nullifier;

pub use keypair::IdentityKeypair;
pub use nullifier::{derive_nullifier, EventId, Nullifier, NullifierError};
