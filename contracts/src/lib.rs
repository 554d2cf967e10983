//! # AURA Contract Layer
//!
//! The stateful half of the protocol: the contracts a deployment actually
//! runs, plus the chain harness that routes calls between them.
//!
//! - **account** — the per-identity smart account: initialize-once
//!   ownership, nonce-ordered validation, three-path authentication,
//!   proof-gated session delegation, self-administered upgrade.
//! - **factory** — deterministic, idempotent account provisioning keyed by
//!   the owner's nullifier (or address).
//! - **paymaster** — escrow-backed gas sponsorship with a deliberately
//!   minimal accept-everything policy.
//! - **dispatcher** — the reference batch processor: deployment from
//!   `init_code`, prefund accounting, validation, execution, settlement.
//! - **token** — a demo fungible token for end-to-end flows.
//! - **chain** — the world-state harness: ledger, contract registry,
//!   implementation indirection, atomic calls, event log.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — wrapping arithmetic and
//!    money do not mix.
//! 2. Authorization failures are named, discriminated errors carrying the
//!    offending caller; authentication failures are codes, not reverts.
//! 3. Every state transition is atomic: it lands entirely or rolls back
//!    entirely, with earned gas as the single deliberate exception.

pub mod account;
pub mod chain;
pub mod dispatcher;
pub mod events;
pub mod factory;
pub mod paymaster;
pub mod token;

pub use account::{AccountCall, AccountError, AccountOwner, SmartAccount, ValidationOutcome};
pub use chain::{CallContext, Chain, ChainError, CodeRef, ContractKind, Revert};
pub use dispatcher::{Dispatcher, DispatcherError, OpOutcome};
pub use events::ChainEvent;
pub use factory::{AccountFactory, FactoryCall, FactoryError};
pub use paymaster::{Paymaster, PaymasterContext, PaymasterError};
pub use token::{DemoToken, TokenCall, TokenError};
