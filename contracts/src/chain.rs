//! # Chain Harness
//!
//! The execution environment the contracts live in: one ledger, one
//! registry of contract instances, one registry of account implementation
//! references, one event log. World state is an explicit collaborator —
//! components receive it as an argument and never touch a hidden global.
//!
//! ## Call semantics
//!
//! [`Chain::call`] is atomic at every boundary: value transfer, dispatch,
//! and everything the callee does either all land or all roll back. Reverts
//! carry a reason string and raw return data; callers that need the data
//! verbatim (the account's `CallFailed`) forward `Revert::data` untouched.
//!
//! While a contract executes it is temporarily out of the registry, so
//! reentering the same address mid-call reverts with "no contract code".
//! That is deliberate: operations are strictly sequential and atomic, and
//! nothing in the protocol requires reentrancy. The one self-call the
//! account state machine needs (upgrade via its own `execute`) is routed
//! inside the account's call frame and never comes back through here.
//!
//! ## Implementation indirection
//!
//! Accounts carry a [`CodeRef`] — a content-style reference to the logic
//! revision they run. The harness resolves the ref once per inbound call
//! and refuses to dispatch into an unregistered revision. Upgrading an
//! account is an atomic pointer swap guarded by the account itself.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use aura_protocol::address::Address;
use aura_protocol::crypto::hash::domain_separated_hash;
use aura_protocol::ledger::{InMemoryLedger, LedgerSnapshot, WorldState};

use crate::account::SmartAccount;
use crate::events::ChainEvent;
use crate::factory::AccountFactory;
use crate::paymaster::Paymaster;
use crate::token::DemoToken;

/// Domain context for deriving implementation references.
const CODE_REF_CONTEXT: &str = "aura.contracts.code-ref.v1";

// ---------------------------------------------------------------------------
// CodeRef
// ---------------------------------------------------------------------------

/// A 32-byte reference to an account logic revision.
///
/// Revisions are registered with the chain at setup; account dispatch
/// resolves the account's stored ref against that registry. The indirection
/// is what makes `upgrade` a pointer swap instead of a migration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeRef([u8; 32]);

impl CodeRef {
    /// Derive a reference from a human-readable revision tag.
    pub fn from_tag(tag: &str) -> Self {
        Self(domain_separated_hash(CODE_REF_CONTEXT, tag.as_bytes()))
    }

    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw reference bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for CodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeRef({})", self)
    }
}

// ---------------------------------------------------------------------------
// Call plumbing
// ---------------------------------------------------------------------------

/// Who is calling whom, with how much attached value.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    /// The immediate caller's address.
    pub caller: Address,
    /// The callee's own address.
    pub self_address: Address,
    /// Value moved with the call (already transferred when the callee
    /// runs).
    pub value: u128,
}

/// A reverted call: human-readable reason plus raw return data.
///
/// For reverts raised directly from an error, `data` is the UTF-8 of the
/// reason. Wrapping errors (the account's `CallFailed`) substitute the
/// inner call's data verbatim.
#[derive(Debug, Clone, Error)]
#[error("reverted: {reason}")]
pub struct Revert {
    /// Human-readable failure description.
    pub reason: String,
    /// Raw return data, surfaced verbatim to the caller.
    pub data: Vec<u8>,
}

impl Revert {
    /// Revert with a reason; data is the reason's bytes.
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let data = reason.clone().into_bytes();
        Self { reason, data }
    }

    /// Revert with an explicit data payload.
    pub fn with_data(reason: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            reason: reason.into(),
            data,
        }
    }

    /// Revert from any displayable error.
    pub fn from_error<E: fmt::Display>(err: &E) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors from registry management (not call execution — that reverts).
#[derive(Debug, Error)]
pub enum ChainError {
    /// Attempted to install a contract over an existing one.
    #[error("address already occupied: {0}")]
    AddressOccupied(Address),

    /// The address does not hold the expected contract kind.
    #[error("no smart account at {0}")]
    NotAnAccount(Address),

    /// The address does not hold a factory.
    #[error("no account factory at {0}")]
    NotAFactory(Address),
}

// ---------------------------------------------------------------------------
// ContractKind
// ---------------------------------------------------------------------------

/// The closed set of contract kinds this deployment routes calls to.
#[derive(Clone)]
pub enum ContractKind {
    /// A per-identity smart account.
    Account(SmartAccount),
    /// The account factory.
    Factory(AccountFactory),
    /// A gas-sponsoring paymaster. Has no routed entry points — the
    /// dispatcher talks to it through its typed interface.
    Paymaster(Paymaster),
    /// The demo fungible token.
    Token(DemoToken),
}

impl fmt::Debug for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Account(a) => write!(f, "Account({})", a.address()),
            ContractKind::Factory(_) => write!(f, "Factory"),
            ContractKind::Paymaster(_) => write!(f, "Paymaster"),
            ContractKind::Token(_) => write!(f, "Token"),
        }
    }
}

impl ContractKind {
    fn handle(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        data: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        match self {
            ContractKind::Account(account) => account.handle(chain, ctx, data),
            ContractKind::Factory(factory) => factory.handle(chain, ctx, data),
            ContractKind::Token(token) => token.handle(ctx, data),
            ContractKind::Paymaster(_) => {
                Err(Revert::new("paymaster has no routed entry points"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Opaque handle to a point-in-time chain state.
#[derive(Debug)]
pub struct ChainSnapshot {
    ledger: LedgerSnapshot,
    contracts: HashMap<Address, ContractKind>,
    events_len: usize,
}

/// The execution environment: ledger, contract registry, implementation
/// registry, event log.
pub struct Chain {
    chain_id: u64,
    ledger: InMemoryLedger,
    contracts: HashMap<Address, ContractKind>,
    implementations: HashSet<CodeRef>,
    events: Vec<ChainEvent>,
}

impl Chain {
    /// Create an empty chain with the given id.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ledger: InMemoryLedger::new(),
            contracts: HashMap::new(),
            implementations: HashSet::new(),
            events: Vec::new(),
        }
    }

    /// The chain id operations are hashed against.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Mutable access to the ledger (dispatcher settlement, genesis
    /// funding, tests).
    pub fn ledger_mut(&mut self) -> &mut InMemoryLedger {
        &mut self.ledger
    }

    // -- Implementation registry --------------------------------------------

    /// Register an account logic revision.
    pub fn register_implementation(&mut self, code_ref: CodeRef) {
        self.implementations.insert(code_ref);
    }

    /// Whether a revision is registered.
    pub fn implementation_registered(&self, code_ref: &CodeRef) -> bool {
        self.implementations.contains(code_ref)
    }

    // -- Contract registry --------------------------------------------------

    /// Install a contract at an address. Fails if occupied — deployments
    /// are never silently overwritten.
    pub fn install(&mut self, address: Address, contract: ContractKind) -> Result<(), ChainError> {
        if self.contracts.contains_key(&address) {
            return Err(ChainError::AddressOccupied(address));
        }
        self.contracts.insert(address, contract);
        Ok(())
    }

    /// Whether any contract lives at `address`.
    pub fn has_contract(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// The smart account at `address`, if that is what lives there.
    pub fn account(&self, address: &Address) -> Option<&SmartAccount> {
        match self.contracts.get(address) {
            Some(ContractKind::Account(account)) => Some(account),
            _ => None,
        }
    }

    /// The paymaster at `address`, if that is what lives there.
    pub fn paymaster(&self, address: &Address) -> Option<&Paymaster> {
        match self.contracts.get(address) {
            Some(ContractKind::Paymaster(paymaster)) => Some(paymaster),
            _ => None,
        }
    }

    /// Mutable access to the paymaster at `address` (for the dispatcher's
    /// post-operation hook).
    pub fn paymaster_mut(&mut self, address: &Address) -> Option<&mut Paymaster> {
        match self.contracts.get_mut(address) {
            Some(ContractKind::Paymaster(paymaster)) => Some(paymaster),
            _ => None,
        }
    }

    /// The demo token at `address`, if that is what lives there.
    pub fn token(&self, address: &Address) -> Option<&DemoToken> {
        match self.contracts.get(address) {
            Some(ContractKind::Token(token)) => Some(token),
            _ => None,
        }
    }

    /// The factory at `address`, if that is what lives there.
    pub fn factory(&self, address: &Address) -> Option<&AccountFactory> {
        match self.contracts.get(address) {
            Some(ContractKind::Factory(factory)) => Some(factory),
            _ => None,
        }
    }

    /// Run `f` against the factory at `address` with the chain available
    /// for nested effects.
    pub fn with_factory<R>(
        &mut self,
        address: &Address,
        f: impl FnOnce(&mut AccountFactory, &mut Chain) -> R,
    ) -> Result<R, ChainError> {
        match self.contracts.remove(address) {
            Some(ContractKind::Factory(mut factory)) => {
                let result = f(&mut factory, self);
                self.contracts.insert(*address, ContractKind::Factory(factory));
                Ok(result)
            }
            Some(other) => {
                self.contracts.insert(*address, other);
                Err(ChainError::NotAFactory(*address))
            }
            None => Err(ChainError::NotAFactory(*address)),
        }
    }

    /// Run `f` against the smart account at `address` with the chain
    /// available for nested effects. The account is out of the registry
    /// for the duration (same rule as routed calls).
    pub fn with_account<R>(
        &mut self,
        address: &Address,
        f: impl FnOnce(&mut SmartAccount, &mut Chain) -> R,
    ) -> Result<R, ChainError> {
        match self.contracts.remove(address) {
            Some(ContractKind::Account(mut account)) => {
                let result = f(&mut account, self);
                self.contracts.insert(*address, ContractKind::Account(account));
                Ok(result)
            }
            Some(other) => {
                self.contracts.insert(*address, other);
                Err(ChainError::NotAnAccount(*address))
            }
            None => Err(ChainError::NotAnAccount(*address)),
        }
    }

    // -- Events -------------------------------------------------------------

    /// Append an event to the log.
    pub fn emit(&mut self, event: ChainEvent) {
        tracing::info!(event = %event, "chain event");
        self.events.push(event);
    }

    /// The event log, oldest first.
    pub fn events(&self) -> &[ChainEvent] {
        &self.events
    }

    // -- Snapshots ----------------------------------------------------------

    /// Capture the full chain state (ledger, contracts, event log length).
    pub fn snapshot(&mut self) -> ChainSnapshot {
        ChainSnapshot {
            ledger: self.ledger.snapshot(),
            contracts: self.contracts.clone(),
            events_len: self.events.len(),
        }
    }

    /// Restore a snapshot, discarding everything since.
    pub fn rollback(&mut self, snapshot: ChainSnapshot) {
        self.ledger
            .rollback(snapshot.ledger)
            .expect("snapshot stack discipline is maintained by construction");
        self.contracts = snapshot.contracts;
        self.events.truncate(snapshot.events_len);
    }

    /// Discard a snapshot, keeping current state.
    pub fn commit(&mut self, snapshot: ChainSnapshot) {
        self.ledger
            .commit(snapshot.ledger)
            .expect("snapshot stack discipline is maintained by construction");
    }

    // -- Calls --------------------------------------------------------------

    /// Execute a call atomically: transfer `value`, dispatch `data` to the
    /// contract at `target`, roll everything back on revert.
    ///
    /// A call to an address with no contract is a plain transfer and
    /// requires empty `data`.
    pub fn call(
        &mut self,
        caller: Address,
        target: Address,
        value: u128,
        data: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        let snapshot = self.snapshot();
        match self.call_inner(caller, target, value, data) {
            Ok(ret) => {
                self.commit(snapshot);
                Ok(ret)
            }
            Err(revert) => {
                self.rollback(snapshot);
                Err(revert)
            }
        }
    }

    fn call_inner(
        &mut self,
        caller: Address,
        target: Address,
        value: u128,
        data: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        if value > 0 {
            self.ledger
                .transfer(&caller, &target, value)
                .map_err(|e| Revert::from_error(&e))?;
        }

        let Some(mut contract) = self.contracts.remove(&target) else {
            return if data.is_empty() {
                Ok(Vec::new())
            } else {
                Err(Revert::new(format!("no contract code at {}", target)))
            };
        };

        // Resolve the implementation pointer before dispatching into an
        // account. Unregistered revisions do not run.
        if let ContractKind::Account(account) = &contract {
            if !self.implementations.contains(account.implementation()) {
                let msg = format!(
                    "unregistered account implementation {}",
                    account.implementation()
                );
                self.contracts.insert(target, contract);
                return Err(Revert::new(msg));
            }
        }

        let ctx = CallContext {
            caller,
            self_address: target,
            value,
        };
        let result = contract.handle(self, ctx, data);
        self.contracts.insert(target, contract);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn code_ref_derivation_is_stable_and_tagged() {
        let v1 = CodeRef::from_tag("smart-account/v1");
        assert_eq!(v1, CodeRef::from_tag("smart-account/v1"));
        assert_ne!(v1, CodeRef::from_tag("smart-account/v2"));
    }

    #[test]
    fn plain_transfer_to_empty_address() {
        let mut chain = Chain::new(1);
        chain.ledger_mut().set_balance(addr(1), 1000);

        chain.call(addr(1), addr(2), 400, &[]).unwrap();
        assert_eq!(chain.ledger().balance(&addr(2)), 400);
        assert_eq!(chain.ledger().balance(&addr(1)), 600);
    }

    #[test]
    fn data_call_to_empty_address_reverts_and_rolls_back() {
        let mut chain = Chain::new(1);
        chain.ledger_mut().set_balance(addr(1), 1000);

        let err = chain.call(addr(1), addr(2), 400, &[0xAA]).unwrap_err();
        assert!(err.reason.contains("no contract code"));
        // The value transfer rolled back with the revert.
        assert_eq!(chain.ledger().balance(&addr(1)), 1000);
        assert_eq!(chain.ledger().balance(&addr(2)), 0);
    }

    #[test]
    fn transfer_beyond_balance_reverts() {
        let mut chain = Chain::new(1);
        chain.ledger_mut().set_balance(addr(1), 10);
        assert!(chain.call(addr(1), addr(2), 100, &[]).is_err());
        assert_eq!(chain.ledger().balance(&addr(1)), 10);
    }

    #[test]
    fn install_refuses_occupied_address() {
        let mut chain = Chain::new(1);
        let token = DemoToken::new(addr(9), "Some Token", "ST", 18);
        chain
            .install(addr(9), ContractKind::Token(token.clone()))
            .unwrap();
        assert!(matches!(
            chain.install(addr(9), ContractKind::Token(token)),
            Err(ChainError::AddressOccupied(_))
        ));
    }

    #[test]
    fn snapshot_rollback_covers_contracts_and_events() {
        let mut chain = Chain::new(1);
        let snap = chain.snapshot();

        let token = DemoToken::new(addr(9), "Some Token", "ST", 18);
        chain.install(addr(9), ContractKind::Token(token)).unwrap();
        chain.emit(ChainEvent::AccountDeployed { account: addr(3) });
        assert!(chain.has_contract(&addr(9)));
        assert_eq!(chain.events().len(), 1);

        chain.rollback(snap);
        assert!(!chain.has_contract(&addr(9)));
        assert!(chain.events().is_empty());
    }

    #[test]
    fn with_account_on_non_account_is_an_error() {
        let mut chain = Chain::new(1);
        let token = DemoToken::new(addr(9), "Some Token", "ST", 18);
        chain.install(addr(9), ContractKind::Token(token)).unwrap();

        let result = chain.with_account(&addr(9), |_, _| ());
        assert!(matches!(result, Err(ChainError::NotAnAccount(_))));
        // The token is back in the registry after the failed lookup.
        assert!(chain.has_contract(&addr(9)));
    }
}
