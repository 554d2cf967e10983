//! # Chain Events
//!
//! The contract layer's produced events, collected in order on the chain's
//! event log and mirrored to `tracing`. Consumers (indexers, tests) read
//! the log; nothing in the protocol itself depends on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use aura_protocol::address::Address;

use crate::chain::CodeRef;

/// Everything the contract layer announces to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// The factory provisioned a new smart account.
    AccountDeployed {
        /// The deployed account's address.
        account: Address,
    },

    /// An account replaced its session delegate.
    SessionAccountChanged {
        /// The account whose delegate changed.
        account: Address,
        /// The delegate being replaced, if any.
        previous: Option<Address>,
        /// The newly authorized delegate.
        delegate: Address,
    },

    /// An account swapped its logic revision.
    ImplementationUpgraded {
        /// The upgraded account.
        account: Address,
        /// The revision it now runs.
        implementation: CodeRef,
    },
}

impl fmt::Display for ChainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountDeployed { account } => {
                write!(f, "AccountDeployed({})", account)
            }
            Self::SessionAccountChanged {
                account, delegate, ..
            } => {
                write!(f, "SessionAccountChanged({} -> {})", account, delegate)
            }
            Self::ImplementationUpgraded {
                account,
                implementation,
            } => {
                write!(f, "ImplementationUpgraded({} -> {})", account, implementation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_compact() {
        let event = ChainEvent::AccountDeployed {
            account: Address::from_bytes([1u8; 20]),
        };
        let s = event.to_string();
        assert!(s.starts_with("AccountDeployed(0x"));
    }

    #[test]
    fn serde_round_trip() {
        let event = ChainEvent::SessionAccountChanged {
            account: Address::from_bytes([1u8; 20]),
            previous: None,
            delegate: Address::from_bytes([2u8; 20]),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<ChainEvent>(&json).unwrap(), event);
    }
}
