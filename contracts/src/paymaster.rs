//! # Paymaster
//!
//! Escrow-backed gas sponsorship. The paymaster deposits funds with the
//! dispatcher (see [`crate::dispatcher`]); operations that name it in
//! `paymaster_and_data` are funded from that deposit instead of the
//! account's.
//!
//! The reference sponsorship policy is deliberately minimal: any operation
//! naming this paymaster is sponsored, no allow-lists, no fee
//! withholding. Deployments with opinions extend
//! [`Paymaster::validate_paymaster_operation`]; the dispatcher only cares
//! that it gets a context back or an error.
//!
//! The post-operation hook exists and does nothing — no refund logic runs.
//! That is documented behaviour, not an omission: settlement already
//! deducts only the actual cost, so "refund" would have nothing to move.

use thiserror::Error;

use aura_protocol::address::Address;
use aura_protocol::operation::{OpHash, Operation};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Paymaster failures.
#[derive(Debug, Clone, Error)]
pub enum PaymasterError {
    /// Validation or post-op called by anyone but the dispatcher.
    #[error("not from dispatcher: called by {caller}")]
    NotFromDispatcher {
        /// The offending caller.
        caller: Address,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Context returned by validation and handed back to the post-operation
/// hook after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterContext {
    /// The operation this sponsorship covers.
    pub op_hash: OpHash,
    /// The maximum cost accepted at validation time.
    pub max_cost: u128,
}

// ---------------------------------------------------------------------------
// Paymaster
// ---------------------------------------------------------------------------

/// The reference sponsor-everything paymaster.
#[derive(Debug, Clone)]
pub struct Paymaster {
    address: Address,
    dispatcher: Address,
}

impl Paymaster {
    /// Construct a paymaster wired to its dispatcher.
    pub fn new(address: Address, dispatcher: Address) -> Self {
        Self {
            address,
            dispatcher,
        }
    }

    /// This paymaster's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Approve sponsorship of an operation up to `max_cost`.
    ///
    /// The reference policy performs no authorization beyond the caller
    /// check — any operation naming this paymaster is sponsored.
    pub fn validate_paymaster_operation(
        &self,
        caller: Address,
        _op: &Operation,
        op_hash: OpHash,
        max_cost: u128,
    ) -> Result<PaymasterContext, PaymasterError> {
        if caller != self.dispatcher {
            return Err(PaymasterError::NotFromDispatcher { caller });
        }
        tracing::debug!(paymaster = %self.address, %op_hash, max_cost, "sponsoring operation");
        Ok(PaymasterContext { op_hash, max_cost })
    }

    /// Post-operation hook. Intentionally a no-op (see module docs).
    pub fn post_op(
        &mut self,
        caller: Address,
        _context: &PaymasterContext,
        _actual_cost: u128,
    ) -> Result<(), PaymasterError> {
        if caller != self.dispatcher {
            return Err(PaymasterError::NotFromDispatcher { caller });
        }
        Ok(())
    }
}
