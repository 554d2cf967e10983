//! # World State
//!
//! The execution ledger's only shared mutable resource: balances keyed by
//! address. Components never reach into a hidden global — whoever needs to
//! move value gets a `&mut dyn WorldState` handed to them, which is what
//! makes the contract layer testable against an in-memory fake that is
//! also the production implementation for this crate.
//!
//! Operations execute atomically: the harness takes a snapshot before each
//! risky region and rolls back on failure. Snapshots nest (they form a
//! stack), matching nested call frames.

use std::collections::HashMap;
use thiserror::Error;

use crate::address::Address;

/// Errors from ledger mutations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit or transfer exceeding the source balance.
    #[error("insufficient balance at {address}: have {balance}, need {needed}")]
    InsufficientBalance {
        /// The account that came up short.
        address: Address,
        /// Its current balance.
        balance: u128,
        /// The amount the operation needed.
        needed: u128,
    },

    /// Credit that would overflow the destination balance.
    #[error("balance overflow at {address}")]
    BalanceOverflow {
        /// The account whose balance would overflow.
        address: Address,
    },

    /// Rollback/commit against a snapshot that does not exist (stack
    /// discipline violated).
    #[error("no such snapshot: {0}")]
    NoSuchSnapshot(usize),
}

/// The world-state capability injected into every component that moves
/// value.
pub trait WorldState {
    /// Current balance of an address (0 if never touched).
    fn balance(&self, address: &Address) -> u128;

    /// Add to a balance, overflow-checked.
    fn credit(&mut self, address: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Remove from a balance, underflow-checked.
    fn debit(&mut self, address: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Atomically move value between two addresses.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError>;
}

/// Opaque handle to a point-in-time ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot(usize);

/// In-memory world state with a snapshot stack.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, u128>,
    snapshots: Vec<HashMap<Address, u128>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a snapshot and return its handle.
    pub fn snapshot(&mut self) -> LedgerSnapshot {
        self.snapshots.push(self.balances.clone());
        LedgerSnapshot(self.snapshots.len() - 1)
    }

    /// Restore the state captured by `snapshot`, discarding it and
    /// anything pushed after it.
    pub fn rollback(&mut self, snapshot: LedgerSnapshot) -> Result<(), LedgerError> {
        if snapshot.0 >= self.snapshots.len() {
            return Err(LedgerError::NoSuchSnapshot(snapshot.0));
        }
        self.balances = self.snapshots[snapshot.0].clone();
        self.snapshots.truncate(snapshot.0);
        Ok(())
    }

    /// Discard `snapshot` (and anything pushed after it), keeping current
    /// state.
    pub fn commit(&mut self, snapshot: LedgerSnapshot) -> Result<(), LedgerError> {
        if snapshot.0 >= self.snapshots.len() {
            return Err(LedgerError::NoSuchSnapshot(snapshot.0));
        }
        self.snapshots.truncate(snapshot.0);
        Ok(())
    }

    /// Set a balance directly. Faucet for genesis state and tests; real
    /// value movement goes through [`WorldState`].
    pub fn set_balance(&mut self, address: Address, amount: u128) {
        self.balances.insert(address, amount);
    }

    /// Number of addresses with recorded balances.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// `true` if no balances are recorded.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all balances. Conservation checks in tests lean on this.
    pub fn total_supply(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl WorldState for InMemoryLedger {
    fn balance(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn credit(&mut self, address: &Address, amount: u128) -> Result<(), LedgerError> {
        let balance = self.balance(address);
        let updated = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { address: *address })?;
        self.balances.insert(*address, updated);
        Ok(())
    }

    fn debit(&mut self, address: &Address, amount: u128) -> Result<(), LedgerError> {
        let balance = self.balance(address);
        let updated = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                address: *address,
                balance,
                needed: amount,
            })?;
        self.balances.insert(*address, updated);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        // Debit first: it is the usual failure, and it must leave the
        // destination untouched.
        self.debit(from, amount)?;
        if let Err(e) = self.credit(to, amount) {
            // Destination would overflow; undo the debit so the failed
            // transfer has no side effects. The re-credit cannot overflow:
            // the amount was just debited from this balance.
            let restored = self.balance(from) + amount;
            self.balances.insert(*from, restored);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn fresh_addresses_have_zero_balance() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance(&addr(1)), 0);
    }

    #[test]
    fn credit_debit_transfer() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(&addr(1), 1000).unwrap();
        ledger.transfer(&addr(1), &addr(2), 400).unwrap();
        ledger.debit(&addr(2), 100).unwrap();

        assert_eq!(ledger.balance(&addr(1)), 600);
        assert_eq!(ledger.balance(&addr(2)), 300);
    }

    #[test]
    fn insufficient_balance_rejected_without_side_effects() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 100);

        let err = ledger.transfer(&addr(1), &addr(2), 500).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { needed: 500, .. }));
        assert_eq!(ledger.balance(&addr(1)), 100);
        assert_eq!(ledger.balance(&addr(2)), 0);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), u128::MAX);
        assert!(matches!(
            ledger.credit(&addr(1), 1),
            Err(LedgerError::BalanceOverflow { .. })
        ));
    }

    #[test]
    fn transfer_into_overflowing_destination_has_no_side_effects() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 500);
        ledger.set_balance(addr(2), u128::MAX);

        let err = ledger.transfer(&addr(1), &addr(2), 100).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
        assert_eq!(ledger.balance(&addr(1)), 500);
        assert_eq!(ledger.balance(&addr(2)), u128::MAX);
    }

    #[test]
    fn snapshot_rollback_restores_state() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 1000);

        let snap = ledger.snapshot();
        ledger.transfer(&addr(1), &addr(2), 999).unwrap();
        assert_eq!(ledger.balance(&addr(2)), 999);

        ledger.rollback(snap).unwrap();
        assert_eq!(ledger.balance(&addr(1)), 1000);
        assert_eq!(ledger.balance(&addr(2)), 0);
    }

    #[test]
    fn snapshots_nest() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 100);

        let outer = ledger.snapshot();
        ledger.debit(&addr(1), 10).unwrap();

        let inner = ledger.snapshot();
        ledger.debit(&addr(1), 20).unwrap();
        ledger.rollback(inner).unwrap();
        assert_eq!(ledger.balance(&addr(1)), 90);

        ledger.rollback(outer).unwrap();
        assert_eq!(ledger.balance(&addr(1)), 100);
    }

    #[test]
    fn commit_keeps_changes() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 100);

        let snap = ledger.snapshot();
        ledger.debit(&addr(1), 30).unwrap();
        ledger.commit(snap).unwrap();

        assert_eq!(ledger.balance(&addr(1)), 70);
        // The snapshot is gone; rolling back to it is an error.
        assert!(ledger.rollback(snap).is_err());
    }

    #[test]
    fn transfers_conserve_supply() {
        let mut ledger = InMemoryLedger::new();
        ledger.set_balance(addr(1), 500);
        ledger.set_balance(addr(2), 500);
        let before = ledger.total_supply();

        ledger.transfer(&addr(1), &addr(2), 123).unwrap();
        ledger.transfer(&addr(2), &addr(3), 456).unwrap();

        assert_eq!(ledger.total_supply(), before);
    }
}
