//! # Smart Account
//!
//! The per-identity state machine. An account is initialized exactly once
//! with its owner — a nullifier for proof-gated identities, or a plain
//! address — and then cycles indefinitely through validate → (execute) →
//! settle under the dispatcher's direction. There is no terminal state:
//! upgrade swaps the logic revision, the identity persists.
//!
//! ## Authentication priority
//!
//! Validation tries authentication paths in a fixed order:
//!
//! 1. **Session delegate** — a plain signature by the currently authorized
//!    session key. The cheap path: one Ed25519 verify.
//! 2. **Owner address** — a plain signature by the owner, when the owner
//!    is an address.
//! 3. **Identity proof** — a succinct proof whose claimed nullifier must
//!    equal the stored owner nullifier, checked by the external verifier
//!    with the operation hash as the bound message.
//!
//! A payload that decodes as none of these, or fails its check, is a
//! signature *failure code*, not a revert — the dispatcher reports it
//! uniformly without aborting the batch.
//!
//! ## Session delegation
//!
//! `set_session_account` is the privilege-escalation path: one fresh proof
//! over the delegate's address authorizes a hot key to act on every
//! subsequent operation. Proof generation cost is paid once per delegate,
//! not per operation — while the invariant stands that delegation itself
//! always requires a proof naming that exact delegate.

use std::sync::Arc;

use ark_bn254::Fr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aura_protocol::address::Address;
use aura_protocol::config::{VALIDATION_OK, VALIDATION_SIG_FAILED};
use aura_protocol::crypto::hash::hash_to_field;
use aura_protocol::crypto::keys::{verify_raw_ed25519, AuraPublicKey};
use aura_protocol::identity::{EventId, Nullifier};
use aura_protocol::ledger::WorldState;
use aura_protocol::operation::{OpHash, Operation, SignaturePayload};
use aura_protocol::zkp::{IdentityProof, ProofVerifier, PublicSignals};

use crate::chain::{CallContext, Chain, CodeRef, Revert};
use crate::events::ChainEvent;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Hard failures of the account state machine. Each names its offender
/// where there is one — diagnosability beats terseness when funds are on
/// the line.
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    /// Validation entry point called by anyone but the dispatcher.
    #[error("not from dispatcher: called by {caller}")]
    NotFromDispatcher {
        /// The offending caller.
        caller: Address,
    },

    /// `execute` called by a principal with no standing.
    #[error("not from owner, session account, or dispatcher: called by {caller}")]
    NotFromOwnerOrDispatcher {
        /// The offending caller.
        caller: Address,
    },

    /// A self-only entry point (upgrade) reached from outside.
    #[error("not from this account: called by {caller}")]
    NotFromThis {
        /// The offending caller.
        caller: Address,
    },

    /// A delegation proof that does not verify for this account's owner.
    #[error("invalid identity proof")]
    InvalidProof,

    /// The executed call reverted; carries the callee's return data
    /// verbatim.
    #[error("call failed: 0x{}", hex::encode(.0))]
    CallFailed(Vec<u8>),

    /// Second initialization attempt.
    #[error("already initialized")]
    AlreadyInitialized,

    /// Operation flow against an account that was never initialized.
    #[error("account not initialized")]
    NotInitialized,

    /// The operation's nonce does not match the account's. The stored
    /// nonce does not advance on this failure.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce {
        /// The account's stored nonce.
        expected: u64,
        /// The nonce the operation claimed.
        got: u64,
    },

    /// The account cannot cover the prefund the dispatcher asked for.
    #[error("insufficient prefund: have {balance}, need {needed}")]
    InsufficientPrefund {
        /// The account's current balance.
        balance: u128,
        /// The missing-funds amount requested.
        needed: u128,
    },

    /// The routed payload did not decode to an account call.
    #[error("undecodable account call data")]
    InvalidCallData,

    /// Upgrade target is not a registered logic revision.
    #[error("unknown implementation: {implementation}")]
    UnknownImplementation {
        /// The rejected revision reference.
        implementation: CodeRef,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The account's owner, set exactly once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountOwner {
    /// A plain address owner; authenticates by Ed25519 signature.
    Address(Address),
    /// A nullifier owner; authenticates by identity proof (and, after
    /// delegation, by session signature).
    Nullifier(Nullifier),
}

impl AccountOwner {
    /// The salt bytes this owner contributes to deterministic deployment.
    pub fn salt_bytes(&self) -> Vec<u8> {
        match self {
            Self::Address(address) => address.as_bytes().to_vec(),
            Self::Nullifier(nullifier) => nullifier.as_bytes().to_vec(),
        }
    }
}

/// The routed entry points of the account, carried as bincode in
/// operation `call_data` (and in nested self-calls).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCall {
    /// Perform a call to `target` with `value` and `data`.
    Execute {
        /// Call target.
        target: Address,
        /// Attached value.
        value: u128,
        /// Callee payload.
        data: Vec<u8>,
    },
    /// Authorize `delegate` as the session account, gated by an identity
    /// proof over the delegate's address.
    SetSessionAccount {
        /// The delegate to authorize.
        delegate: Address,
        /// Wire-encoded identity proof.
        proof: Vec<u8>,
    },
    /// Swap the account's logic revision. Only reachable through the
    /// account's own `execute` targeting itself.
    UpgradeImplementation {
        /// The revision to switch to.
        implementation: CodeRef,
    },
}

impl AccountCall {
    /// Wire-encode for use as operation `call_data`.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("account calls always serialize")
    }
}

/// One executed call, as recorded in the account's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Call target.
    pub target: Address,
    /// Attached value.
    pub value: u128,
    /// The payload that was sent.
    pub data: Vec<u8>,
    /// Wall-clock time of execution.
    pub executed_at: DateTime<Utc>,
}

/// Validation result reported to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Authorized, time-unbounded.
    Accepted,
    /// Authentication failed; the operation must not execute.
    SignatureFailure,
}

impl ValidationOutcome {
    /// The numeric validation code (0 = ok, 1 = signature failure).
    pub fn code(&self) -> u32 {
        match self {
            Self::Accepted => VALIDATION_OK,
            Self::SignatureFailure => VALIDATION_SIG_FAILED,
        }
    }
}

/// The message hash a delegation proof must be bound to: the delegate's
/// address lifted into the field. Clients and the account must agree on
/// this byte-for-byte.
pub fn delegation_message_hash(delegate: &Address) -> Fr {
    hash_to_field(delegate.as_bytes())
}

// ---------------------------------------------------------------------------
// SmartAccount
// ---------------------------------------------------------------------------

/// A per-identity smart account.
#[derive(Clone)]
pub struct SmartAccount {
    address: Address,
    dispatcher: Address,
    verifier: Arc<dyn ProofVerifier>,
    implementation: CodeRef,
    event_id: EventId,
    owner: Option<AccountOwner>,
    session_account: Option<Address>,
    nonce: u64,
    history: Vec<CallRecord>,
}

impl SmartAccount {
    /// Construct an uninitialized account wired to its dispatcher and
    /// verifier. The factory calls this; tests may too.
    pub fn new(
        address: Address,
        dispatcher: Address,
        verifier: Arc<dyn ProofVerifier>,
        implementation: CodeRef,
        event_id: EventId,
    ) -> Self {
        Self {
            address,
            dispatcher,
            verifier,
            implementation,
            event_id,
            owner: None,
            session_account: None,
            nonce: 0,
            history: Vec::new(),
        }
    }

    /// One-time initializer. A second call is a hard failure — allowing it
    /// would let an attacker reset ownership.
    pub fn initialize(&mut self, owner: AccountOwner) -> Result<(), AccountError> {
        if self.owner.is_some() {
            return Err(AccountError::AlreadyInitialized);
        }
        self.owner = Some(owner);
        Ok(())
    }

    /// This account's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The owner, if initialized.
    pub fn owner(&self) -> Option<&AccountOwner> {
        self.owner.as_ref()
    }

    /// The currently authorized session delegate.
    pub fn session_account(&self) -> Option<Address> {
        self.session_account
    }

    /// The next expected operation nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The logic revision this account runs.
    pub fn implementation(&self) -> &CodeRef {
        &self.implementation
    }

    /// The event scope proofs are checked under.
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// The append-only log of executed calls.
    pub fn history(&self) -> &[CallRecord] {
        &self.history
    }

    // -- Validation ---------------------------------------------------------

    /// Validate an operation on the dispatcher's behalf.
    ///
    /// Checks, in order: caller is the dispatcher (hard failure),
    /// initialization, nonce equality (hard failure, nonce untouched),
    /// authentication (soft failure via [`ValidationOutcome`]), and the
    /// missing-funds prefund transfer (hard failure if the balance cannot
    /// cover it).
    ///
    /// The nonce increments as soon as the nonce check passes. The
    /// dispatcher discards all validation state when it rejects an
    /// operation, so externally the nonce advances exactly once per
    /// *accepted* operation.
    pub fn validate_operation(
        &mut self,
        chain: &mut Chain,
        ctx: &CallContext,
        op: &Operation,
        op_hash: &OpHash,
        missing_funds: u128,
    ) -> Result<ValidationOutcome, AccountError> {
        if ctx.caller != self.dispatcher {
            return Err(AccountError::NotFromDispatcher { caller: ctx.caller });
        }
        if self.owner.is_none() {
            return Err(AccountError::NotInitialized);
        }

        if op.nonce != self.nonce {
            return Err(AccountError::InvalidNonce {
                expected: self.nonce,
                got: op.nonce,
            });
        }
        self.nonce += 1;

        if !self.authenticate(op_hash, &op.signature) {
            tracing::debug!(account = %self.address, op_hash = %op_hash, "authentication failed");
            return Ok(ValidationOutcome::SignatureFailure);
        }

        if missing_funds > 0 {
            let balance = chain.ledger().balance(&self.address);
            chain
                .ledger_mut()
                .transfer(&self.address, &self.dispatcher, missing_funds)
                .map_err(|_| AccountError::InsufficientPrefund {
                    balance,
                    needed: missing_funds,
                })?;
        }

        Ok(ValidationOutcome::Accepted)
    }

    /// Try the authentication paths in priority order. Returns a plain
    /// boolean: every failure mode maps to the same signature-failure code.
    fn authenticate(&self, op_hash: &OpHash, signature: &[u8]) -> bool {
        match SignaturePayload::decode(signature) {
            Ok(SignaturePayload::Delegate {
                public_key,
                signature,
            }) => {
                if !verify_raw_ed25519(&public_key, op_hash.as_bytes(), &signature) {
                    return false;
                }
                let signer =
                    Address::from_public_key(&AuraPublicKey::from_bytes(public_key));
                if self.session_account == Some(signer) {
                    return true;
                }
                matches!(self.owner, Some(AccountOwner::Address(owner)) if owner == signer)
            }
            Ok(SignaturePayload::Proof(proof)) => {
                let Some(AccountOwner::Nullifier(nullifier)) = self.owner else {
                    return false;
                };
                let signals = PublicSignals {
                    nullifier,
                    event_id: self.event_id,
                    message_hash: op_hash.to_field(),
                };
                // A verifier error is an authentication failure, not a
                // revert: the dispatcher reports both identically.
                self.verifier.verify(&proof, &signals).unwrap_or(false)
            }
            Err(_) => false,
        }
    }

    // -- Routed entry points ------------------------------------------------

    /// Dispatch a routed call into this account.
    pub(crate) fn handle(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        data: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        let call: AccountCall = bincode::deserialize(data)
            .map_err(|_| Revert::from_error(&AccountError::InvalidCallData))?;

        match call {
            AccountCall::Execute {
                target,
                value,
                data,
            } => self.execute(chain, &ctx, target, value, data).map_err(|e| {
                // CallFailed surfaces the callee's return data verbatim;
                // everything else reverts with its own description.
                match e {
                    AccountError::CallFailed(data) => {
                        Revert::with_data("call failed", data)
                    }
                    other => Revert::from_error(&other),
                }
            }),
            AccountCall::SetSessionAccount { delegate, proof } => self
                .set_session_account(chain, delegate, &proof)
                .map(|_| Vec::new())
                .map_err(|e| Revert::from_error(&e)),
            AccountCall::UpgradeImplementation { implementation } => self
                .upgrade_implementation(chain, &ctx, implementation)
                .map(|_| Vec::new())
                .map_err(|e| Revert::from_error(&e)),
        }
    }

    /// Perform a call on the account's behalf.
    ///
    /// Callable by the dispatcher (post-validation), the owner address, or
    /// the active session delegate. On success the call is appended to the
    /// history; on failure the callee's return data is surfaced verbatim
    /// in [`AccountError::CallFailed`] and nothing is recorded.
    fn execute(
        &mut self,
        chain: &mut Chain,
        ctx: &CallContext,
        target: Address,
        value: u128,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, AccountError> {
        let authorized = ctx.caller == self.dispatcher
            || self.session_account == Some(ctx.caller)
            || matches!(self.owner, Some(AccountOwner::Address(owner)) if owner == ctx.caller);
        if !authorized {
            return Err(AccountError::NotFromOwnerOrDispatcher { caller: ctx.caller });
        }

        let return_data = if target == self.address {
            // Self-call: route back into our own entry points without
            // leaving this call frame (the registry holds no second copy
            // of this account while it executes).
            let inner_ctx = CallContext {
                caller: self.address,
                self_address: self.address,
                value,
            };
            self.handle(chain, inner_ctx, &data)
                .map_err(|revert| AccountError::CallFailed(revert.data))?
        } else {
            chain
                .call(self.address, target, value, &data)
                .map_err(|revert| AccountError::CallFailed(revert.data))?
        };

        self.history.push(CallRecord {
            target,
            value,
            data,
            executed_at: Utc::now(),
        });

        Ok(return_data)
    }

    /// Authorize a session delegate.
    ///
    /// Open to any caller — authority comes from the proof, which must
    /// verify for this account's owner nullifier with the delegate address
    /// as the bound message. Replaces any prior delegate.
    fn set_session_account(
        &mut self,
        chain: &mut Chain,
        delegate: Address,
        proof_bytes: &[u8],
    ) -> Result<(), AccountError> {
        let Some(AccountOwner::Nullifier(nullifier)) = self.owner else {
            // Address-owned accounts have no proof-gated delegation.
            return Err(AccountError::InvalidProof);
        };

        let proof =
            IdentityProof::decode(proof_bytes).map_err(|_| AccountError::InvalidProof)?;
        let signals = PublicSignals {
            nullifier,
            event_id: self.event_id,
            message_hash: delegation_message_hash(&delegate),
        };
        if !self.verifier.verify(&proof, &signals).unwrap_or(false) {
            return Err(AccountError::InvalidProof);
        }

        let previous = self.session_account.replace(delegate);
        tracing::info!(account = %self.address, %delegate, "session account changed");
        chain.emit(ChainEvent::SessionAccountChanged {
            account: self.address,
            previous,
            delegate,
        });
        Ok(())
    }

    /// Swap the logic revision. Only reachable from the account's own
    /// address, i.e. through an authenticated `execute` targeting self.
    fn upgrade_implementation(
        &mut self,
        chain: &mut Chain,
        ctx: &CallContext,
        implementation: CodeRef,
    ) -> Result<(), AccountError> {
        if ctx.caller != self.address {
            return Err(AccountError::NotFromThis { caller: ctx.caller });
        }
        if !chain.implementation_registered(&implementation) {
            return Err(AccountError::UnknownImplementation { implementation });
        }

        self.implementation = implementation;
        tracing::info!(account = %self.address, %implementation, "implementation upgraded");
        chain.emit(ChainEvent::ImplementationUpgraded {
            account: self.address,
            implementation,
        });
        Ok(())
    }
}

impl std::fmt::Debug for SmartAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccount")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("session_account", &self.session_account)
            .field("nonce", &self.nonce)
            .field("implementation", &self.implementation)
            .finish()
    }
}
