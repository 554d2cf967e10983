//! # Demo Token
//!
//! A minimal fungible token for exercising the account flow end to end:
//! open mint (anyone can conjure supply — it is a demo), transfer, burn.
//! Balances and supply are overflow-checked; wrapping arithmetic and
//! money do not mix, even in fixtures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use aura_protocol::address::Address;

use crate::chain::{CallContext, Revert};

/// Token failures.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// Mint that would push supply or a balance past `u128::MAX`.
    #[error("supply overflow: minting {amount}")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: u128,
    },

    /// Transfer or burn beyond the holder's balance.
    #[error("insufficient token balance: have {balance}, need {amount}")]
    InsufficientBalance {
        /// The holder's current balance.
        balance: u128,
        /// The amount the operation needed.
        amount: u128,
    },
}

/// The token's routed entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenCall {
    /// Mint `amount` to `to`. Unrestricted by design.
    Mint {
        /// Recipient.
        to: Address,
        /// Amount in the smallest denomination.
        amount: u128,
    },
    /// Move `amount` from the caller to `to`.
    Transfer {
        /// Recipient.
        to: Address,
        /// Amount to move.
        amount: u128,
    },
    /// Destroy `amount` of the caller's balance.
    Burn {
        /// Amount to destroy.
        amount: u128,
    },
}

impl TokenCall {
    /// Wire-encode for use as call data.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("token calls always serialize")
    }
}

/// The demo fungible token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoToken {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: u128,
    balances: HashMap<Address, u128>,
}

impl DemoToken {
    /// Create a token with zero supply.
    pub fn new(address: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
        }
    }

    /// This token's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Balance of `holder`, 0 if never touched.
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn mint(&mut self, to: Address, amount: u128) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        let from_balance = self.balance_of(&from);
        let updated_from =
            from_balance
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientBalance {
                    balance: from_balance,
                    amount,
                })?;
        // Total supply fits u128, so the recipient side cannot overflow.
        self.balances.insert(from, updated_from);
        let updated_to = self.balance_of(&to) + amount;
        self.balances.insert(to, updated_to);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: u128) -> Result<(), TokenError> {
        let balance = self.balance_of(&from);
        let updated = balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance { balance, amount })?;
        self.balances.insert(from, updated);
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }

    /// Routed dispatch.
    pub(crate) fn handle(&mut self, ctx: CallContext, data: &[u8]) -> Result<Vec<u8>, Revert> {
        let call: TokenCall = bincode::deserialize(data)
            .map_err(|_| Revert::new("undecodable token call data"))?;

        let result = match call {
            TokenCall::Mint { to, amount } => self.mint(to, amount),
            TokenCall::Transfer { to, amount } => self.transfer(ctx.caller, to, amount),
            TokenCall::Burn { amount } => self.burn(ctx.caller, amount),
        };

        result.map(|_| Vec::new()).map_err(|e| Revert::from_error(&e))
    }
}
