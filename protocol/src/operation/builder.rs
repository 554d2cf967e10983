//! Operation construction via the builder pattern.
//!
//! The builder starts from the reference gas parameters in
//! [`crate::config`] and lets clients override the fields they care about.
//! It does not authenticate — signatures and proofs are attached after the
//! operation hash is known, which by construction the builder cannot know
//! (the hash depends on the dispatcher and chain).

use crate::address::Address;
use crate::config::{
    DEFAULT_CALL_GAS_LIMIT, DEFAULT_MAX_FEE, DEFAULT_MAX_PRIORITY_FEE,
    DEFAULT_PRE_VERIFICATION_GAS, DEFAULT_VERIFICATION_GAS_LIMIT,
};

use super::types::{GasFees, GasLimits, Operation};

/// Builder for [`Operation`].
///
/// # Examples
///
/// ```
/// use aura_protocol::address::Address;
/// use aura_protocol::operation::OperationBuilder;
///
/// let op = OperationBuilder::new()
///     .sender(Address::from_bytes([2u8; 20]))
///     .nonce(0)
///     .call_data(vec![0xAA])
///     .build();
/// assert_eq!(op.nonce, 0);
/// assert!(op.signature.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    op: Operation,
}

impl OperationBuilder {
    /// Start from an empty operation with reference gas defaults.
    pub fn new() -> Self {
        Self {
            op: Operation {
                sender: Address::ZERO,
                nonce: 0,
                init_code: Vec::new(),
                call_data: Vec::new(),
                gas_limits: GasLimits {
                    verification: DEFAULT_VERIFICATION_GAS_LIMIT,
                    call: DEFAULT_CALL_GAS_LIMIT,
                },
                pre_verification_gas: DEFAULT_PRE_VERIFICATION_GAS,
                gas_fees: GasFees {
                    max_priority_fee: DEFAULT_MAX_PRIORITY_FEE,
                    max_fee: DEFAULT_MAX_FEE,
                },
                paymaster_and_data: Vec::new(),
                signature: Vec::new(),
            },
        }
    }

    /// Set the target account address.
    pub fn sender(mut self, sender: Address) -> Self {
        self.op.sender = sender;
        self
    }

    /// Set the account nonce this operation claims.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.op.nonce = nonce;
        self
    }

    /// Attach first-use deployment data.
    pub fn init_code(mut self, init_code: Vec<u8>) -> Self {
        self.op.init_code = init_code;
        self
    }

    /// Set the call the account should execute.
    pub fn call_data(mut self, call_data: Vec<u8>) -> Self {
        self.op.call_data = call_data;
        self
    }

    /// Override the gas limits.
    pub fn gas_limits(mut self, gas_limits: GasLimits) -> Self {
        self.op.gas_limits = gas_limits;
        self
    }

    /// Override the pre-verification gas.
    pub fn pre_verification_gas(mut self, gas: u128) -> Self {
        self.op.pre_verification_gas = gas;
        self
    }

    /// Override the fee offer.
    pub fn gas_fees(mut self, gas_fees: GasFees) -> Self {
        self.op.gas_fees = gas_fees;
        self
    }

    /// Name a paymaster (with optional sponsorship data) to fund this
    /// operation.
    pub fn paymaster_and_data(mut self, data: Vec<u8>) -> Self {
        self.op.paymaster_and_data = data;
        self
    }

    /// Attach pre-computed authentication material. Usually done after
    /// `build()` via the payload helpers, once the hash is known.
    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.op.signature = signature;
        self
    }

    /// Finalize the operation.
    pub fn build(self) -> Operation {
        self.op
    }
}

impl Default for OperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let op = OperationBuilder::new().build();
        assert_eq!(op.gas_limits.verification, DEFAULT_VERIFICATION_GAS_LIMIT);
        assert_eq!(op.gas_limits.call, DEFAULT_CALL_GAS_LIMIT);
        assert_eq!(op.pre_verification_gas, DEFAULT_PRE_VERIFICATION_GAS);
        assert_eq!(op.gas_fees.max_fee, DEFAULT_MAX_FEE);
        assert_eq!(op.sender, Address::ZERO);
        assert!(op.init_code.is_empty());
        assert!(op.signature.is_empty());
    }

    #[test]
    fn setters_apply() {
        let sender = Address::from_bytes([9u8; 20]);
        let op = OperationBuilder::new()
            .sender(sender)
            .nonce(42)
            .call_data(vec![1, 2, 3])
            .pre_verification_gas(1000)
            .build();
        assert_eq!(op.sender, sender);
        assert_eq!(op.nonce, 42);
        assert_eq!(op.call_data, vec![1, 2, 3]);
        assert_eq!(op.pre_verification_gas, 1000);
    }
}
