//! # Dispatcher
//!
//! The batch processor every account trusts as its single authorized
//! validation caller. For each operation in a batch the dispatcher runs
//! the full cycle — first-use deployment from `init_code`, prefund
//! accounting, account validation, execution, settlement — atomically:
//! a failed operation rolls back everything it touched except the gas
//! that was already earned, and the batch continues with the next
//! operation.
//!
//! ## Deposits
//!
//! The dispatcher escrows funds per beneficiary (`deposit_to` /
//! `withdraw_to`). Paymasters prefund sponsorships here; accounts are
//! topped up automatically during validation via the missing-funds
//! transfer. Settlement deducts only the actual cost — unused prefund
//! simply stays on deposit (there is no refund transfer to make, which is
//! also why the paymaster's post-op hook has nothing to do).
//!
//! Every deposit is backed 1:1 by ledger balance held at the dispatcher's
//! address; collected fees are paid out to the batch beneficiary at the
//! end of `handle_operations`.
//!
//! ## Gas model
//!
//! Deterministic metering (see [`aura_protocol::config`]): a flat
//! verification cost and a base-plus-per-byte call cost, each clamped to
//! the operation's own limits, plus the operation's declared
//! pre-verification gas. `actual_cost = gas_used * max_fee`, which the
//! prefund `(limits + pre_verification) * max_fee` covers by
//! construction.

use std::collections::HashMap;

use thiserror::Error;

use aura_protocol::address::Address;
use aura_protocol::config::{CALL_BASE_GAS, CALLDATA_GAS_PER_BYTE, VERIFICATION_BASE_GAS};
use aura_protocol::ledger::{LedgerError, WorldState};
use aura_protocol::operation::{decode_init_code, OpHash, Operation};

use crate::account::ValidationOutcome;
use crate::chain::{CallContext, Chain};

// ---------------------------------------------------------------------------
// Errors & outcomes
// ---------------------------------------------------------------------------

/// Dispatcher-level failures (the batch machinery itself, not individual
/// operations — those report through [`OpOutcome`]).
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Funding a deposit failed in the ledger.
    #[error("deposit transfer failed: {0}")]
    Deposit(#[from] LedgerError),

    /// A deposit would overflow its balance.
    #[error("deposit overflow for {0}")]
    DepositOverflow(Address),

    /// Withdrawal beyond the caller's escrowed balance.
    #[error("withdrawal exceeds deposit: have {balance}, need {needed}")]
    WithdrawalExceedsDeposit {
        /// The caller's escrowed balance.
        balance: u128,
        /// The requested amount.
        needed: u128,
    },

    /// Paying the batch beneficiary failed.
    #[error("beneficiary payout failed: {0}")]
    Payout(LedgerError),
}

/// Per-operation result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// Validated, executed, and settled.
    Executed {
        /// The operation's hash.
        op_hash: OpHash,
        /// Metered gas.
        gas_used: u128,
        /// Amount charged to the payer.
        actual_cost: u128,
    },
    /// Rejected before execution (bad nonce, bad signature, missing
    /// account, underfunded sponsor, ...). State rolled back; the
    /// pre-accounted charge stands.
    ValidationFailed {
        /// The operation's hash.
        op_hash: OpHash,
        /// Human-readable rejection reason.
        reason: String,
        /// Amount actually charged (capped by what the payer had).
        charged: u128,
    },
    /// Validation passed but the call reverted. State rolled back; gas
    /// charged.
    ExecutionReverted {
        /// The operation's hash.
        op_hash: OpHash,
        /// The callee's return data, verbatim.
        revert_data: Vec<u8>,
        /// Amount charged to the payer.
        actual_cost: u128,
    },
}

impl OpOutcome {
    /// The hash of the operation this outcome describes.
    pub fn op_hash(&self) -> &OpHash {
        match self {
            Self::Executed { op_hash, .. }
            | Self::ValidationFailed { op_hash, .. }
            | Self::ExecutionReverted { op_hash, .. } => op_hash,
        }
    }

    /// Whether the operation executed successfully.
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }

    fn charged(&self) -> u128 {
        match self {
            Self::Executed { actual_cost, .. } => *actual_cost,
            Self::ValidationFailed { charged, .. } => *charged,
            Self::ExecutionReverted { actual_cost, .. } => *actual_cost,
        }
    }
}

/// Internal failure carrier: what went wrong, who pays, how much.
enum OpFailure {
    Validation {
        reason: String,
        payer: Option<Address>,
        charge: u128,
    },
    Execution {
        revert_data: Vec<u8>,
        payer: Address,
        charge: u128,
    },
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The reference batch dispatcher.
pub struct Dispatcher {
    address: Address,
    chain_id: u64,
    deposits: HashMap<Address, u128>,
}

impl Dispatcher {
    /// Construct a dispatcher for `chain`.
    pub fn new(chain: &Chain, address: Address) -> Self {
        Self {
            address,
            chain_id: chain.chain_id(),
            deposits: HashMap::new(),
        }
    }

    /// This dispatcher's address — the value every account and paymaster
    /// must be wired with as their authorized caller.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The hash operations against this dispatcher must authenticate.
    pub fn get_operation_hash(&self, op: &Operation) -> OpHash {
        op.hash(&self.address, self.chain_id)
    }

    // -- Deposits -----------------------------------------------------------

    /// Escrowed balance of `beneficiary`.
    pub fn deposit_of(&self, beneficiary: &Address) -> u128 {
        self.deposits.get(beneficiary).copied().unwrap_or(0)
    }

    /// Move `amount` from `from`'s ledger balance into `beneficiary`'s
    /// escrow.
    pub fn deposit_to(
        &mut self,
        chain: &mut Chain,
        from: Address,
        beneficiary: Address,
        amount: u128,
    ) -> Result<(), DispatcherError> {
        let updated = self
            .deposit_of(&beneficiary)
            .checked_add(amount)
            .ok_or(DispatcherError::DepositOverflow(beneficiary))?;
        chain.ledger_mut().transfer(&from, &self.address, amount)?;
        self.deposits.insert(beneficiary, updated);
        Ok(())
    }

    /// Move `amount` out of `caller`'s escrow to `to`'s ledger balance.
    pub fn withdraw_to(
        &mut self,
        chain: &mut Chain,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), DispatcherError> {
        let balance = self.deposit_of(&caller);
        if balance < amount {
            return Err(DispatcherError::WithdrawalExceedsDeposit {
                balance,
                needed: amount,
            });
        }
        chain
            .ledger_mut()
            .transfer(&self.address, &to, amount)
            .map_err(DispatcherError::Payout)?;
        self.deposits.insert(caller, balance - amount);
        Ok(())
    }

    // -- Batch processing ---------------------------------------------------

    /// Process a batch. Operations are independent: a failure affects only
    /// its own outcome entry. Collected fees go to `beneficiary` at the
    /// end.
    pub fn handle_operations(
        &mut self,
        chain: &mut Chain,
        ops: &[Operation],
        beneficiary: Address,
    ) -> Result<Vec<OpOutcome>, DispatcherError> {
        let mut outcomes = Vec::with_capacity(ops.len());
        let mut total_fees: u128 = 0;

        for op in ops {
            let outcome = self.process_operation(chain, op);
            total_fees = total_fees.saturating_add(outcome.charged());
            outcomes.push(outcome);
        }

        if total_fees > 0 {
            chain
                .ledger_mut()
                .transfer(&self.address, &beneficiary, total_fees)
                .map_err(DispatcherError::Payout)?;
        }

        tracing::info!(
            ops = ops.len(),
            executed = outcomes.iter().filter(|o| o.is_executed()).count(),
            fees = total_fees,
            "batch settled"
        );

        Ok(outcomes)
    }

    fn process_operation(&mut self, chain: &mut Chain, op: &Operation) -> OpOutcome {
        let op_hash = self.get_operation_hash(op);
        let snapshot = chain.snapshot();
        let deposits_before = self.deposits.clone();

        match self.run_operation(chain, op, &op_hash) {
            Ok((payer, gas_used)) => {
                let actual_cost = self.charge_capped(payer, gas_used.saturating_mul(op.gas_fees.max_fee));
                chain.commit(snapshot);
                OpOutcome::Executed {
                    op_hash,
                    gas_used,
                    actual_cost,
                }
            }
            Err(failure) => {
                // Roll back every tentative state change; the charge is the
                // one thing that survives, taken from whatever the payer
                // still has escrowed or holds.
                chain.rollback(snapshot);
                self.deposits = deposits_before;

                match failure {
                    OpFailure::Validation {
                        reason,
                        payer,
                        charge,
                    } => {
                        let charged = payer
                            .map(|p| self.charge_failure(chain, p, charge))
                            .unwrap_or(0);
                        tracing::debug!(%op_hash, %reason, charged, "operation rejected");
                        OpOutcome::ValidationFailed {
                            op_hash,
                            reason,
                            charged,
                        }
                    }
                    OpFailure::Execution {
                        revert_data,
                        payer,
                        charge,
                    } => {
                        let charged = self.charge_failure(chain, payer, charge);
                        tracing::debug!(%op_hash, charged, "operation reverted during execution");
                        OpOutcome::ExecutionReverted {
                            op_hash,
                            revert_data,
                            actual_cost: charged,
                        }
                    }
                }
            }
        }
    }

    /// The full per-operation pipeline. Returns the payer and metered gas
    /// on success.
    fn run_operation(
        &mut self,
        chain: &mut Chain,
        op: &Operation,
        op_hash: &OpHash,
    ) -> Result<(Address, u128), OpFailure> {
        let penalty = op.pre_verification_gas.saturating_mul(op.gas_fees.max_fee);
        let reject = |reason: String, payer: Option<Address>| OpFailure::Validation {
            reason,
            payer,
            charge: penalty,
        };

        // 1. First-use deployment. The factory must materialize the account
        //    at exactly the operation's sender address.
        if !chain.has_contract(&op.sender) {
            if op.init_code.is_empty() {
                return Err(reject(
                    "sender account does not exist and no init code supplied".into(),
                    Some(op.sender),
                ));
            }
            let (factory, factory_call) = decode_init_code(&op.init_code)
                .map_err(|e| reject(e.to_string(), Some(op.sender)))?;
            chain
                .call(self.address, factory, 0, factory_call)
                .map_err(|revert| {
                    reject(
                        format!("account deployment failed: {}", revert.reason),
                        Some(op.sender),
                    )
                })?;
            if chain.account(&op.sender).is_none() {
                return Err(reject(
                    "init code did not materialize the sender account".into(),
                    Some(op.sender),
                ));
            }
        }

        // 2. Funding path: paymaster escrow or the account's own.
        let prefund = op.max_cost();
        let paymaster = op
            .paymaster()
            .map_err(|e| reject(e.to_string(), Some(op.sender)))?;

        let (payer, missing_funds, pm_context) = match paymaster {
            Some((pm_address, _sponsor_data)) => {
                let Some(pm) = chain.paymaster(&pm_address) else {
                    return Err(reject(
                        format!("no paymaster at {}", pm_address),
                        Some(op.sender),
                    ));
                };
                let context = pm
                    .validate_paymaster_operation(self.address, op, *op_hash, prefund)
                    .map_err(|e| reject(e.to_string(), Some(pm_address)))?;
                if self.deposit_of(&pm_address) < prefund {
                    return Err(reject(
                        format!(
                            "paymaster deposit {} below required prefund {}",
                            self.deposit_of(&pm_address),
                            prefund
                        ),
                        Some(pm_address),
                    ));
                }
                (pm_address, 0u128, Some((pm_address, context)))
            }
            None => (
                op.sender,
                prefund.saturating_sub(self.deposit_of(&op.sender)),
                None,
            ),
        };

        // 3. Account validation.
        let ctx = CallContext {
            caller: self.address,
            self_address: op.sender,
            value: 0,
        };
        let validation = chain
            .with_account(&op.sender, |account, chain| {
                account.validate_operation(chain, &ctx, op, op_hash, missing_funds)
            })
            .map_err(|e| reject(e.to_string(), Some(payer)))?
            .map_err(|e| reject(e.to_string(), Some(payer)))?;

        match validation {
            ValidationOutcome::Accepted => {}
            ValidationOutcome::SignatureFailure => {
                return Err(reject(
                    format!("signature validation failed (code {})", validation.code()),
                    Some(payer),
                ));
            }
        }

        // The account's missing-funds transfer landed on our ledger
        // balance; mirror it into its escrow entry.
        if missing_funds > 0 {
            let updated = self.deposit_of(&op.sender).saturating_add(missing_funds);
            self.deposits.insert(op.sender, updated);
        }

        // 4. Deterministic metering, clamped to the operation's limits.
        let verification_gas = VERIFICATION_BASE_GAS.min(op.gas_limits.verification);
        let call_gas = CALL_BASE_GAS
            .saturating_add(CALLDATA_GAS_PER_BYTE.saturating_mul(op.call_data.len() as u128))
            .min(op.gas_limits.call);
        let gas_used = op
            .pre_verification_gas
            .saturating_add(verification_gas)
            .saturating_add(call_gas);
        let actual_cost = gas_used.saturating_mul(op.gas_fees.max_fee);

        // 5. Execution. An empty call is a validated no-op (nonce burn).
        if !op.call_data.is_empty() {
            chain
                .call(self.address, op.sender, 0, &op.call_data)
                .map_err(|revert| OpFailure::Execution {
                    revert_data: revert.data,
                    payer,
                    charge: actual_cost,
                })?;
        }

        // 6. Post-operation hook for sponsored operations.
        if let Some((pm_address, context)) = pm_context {
            if let Some(pm) = chain.paymaster_mut(&pm_address) {
                pm.post_op(self.address, &context, actual_cost)
                    .map_err(|e| OpFailure::Execution {
                        revert_data: e.to_string().into_bytes(),
                        payer,
                        charge: actual_cost,
                    })?;
            }
        }

        Ok((payer, gas_used))
    }

    /// Deduct up to `amount` from `payer`'s escrow; returns what was
    /// actually taken.
    fn charge_capped(&mut self, payer: Address, amount: u128) -> u128 {
        let balance = self.deposit_of(&payer);
        let charged = balance.min(amount);
        self.deposits.insert(payer, balance - charged);
        charged
    }

    /// Charge a failed operation after rollback: escrow first, then the
    /// payer's remaining ledger balance. This is the "pre-charged
    /// resources survive the rollback" rule made concrete.
    fn charge_failure(&mut self, chain: &mut Chain, payer: Address, amount: u128) -> u128 {
        let from_deposit = self.charge_capped(payer, amount);
        let remainder = amount - from_deposit;
        if remainder == 0 {
            return from_deposit;
        }

        let from_balance = chain.ledger().balance(&payer).min(remainder);
        if from_balance > 0 {
            chain
                .ledger_mut()
                .transfer(&payer, &self.address, from_balance)
                .expect("amount capped by the payer's balance");
        }
        from_deposit + from_balance
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("depositors", &self.deposits.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn setup() -> (Chain, Dispatcher) {
        let chain = Chain::new(1);
        let dispatcher = Dispatcher::new(&chain, addr(0xD1));
        (chain, dispatcher)
    }

    #[test]
    fn deposits_are_backed_by_ledger_balance() {
        let (mut chain, mut dispatcher) = setup();
        chain.ledger_mut().set_balance(addr(1), 1000);

        dispatcher
            .deposit_to(&mut chain, addr(1), addr(2), 700)
            .unwrap();

        assert_eq!(dispatcher.deposit_of(&addr(2)), 700);
        assert_eq!(chain.ledger().balance(&dispatcher.address()), 700);
        assert_eq!(chain.ledger().balance(&addr(1)), 300);
    }

    #[test]
    fn deposit_beyond_balance_fails_cleanly() {
        let (mut chain, mut dispatcher) = setup();
        chain.ledger_mut().set_balance(addr(1), 10);

        assert!(dispatcher
            .deposit_to(&mut chain, addr(1), addr(2), 100)
            .is_err());
        assert_eq!(dispatcher.deposit_of(&addr(2)), 0);
        assert_eq!(chain.ledger().balance(&addr(1)), 10);
    }

    #[test]
    fn withdraw_is_bounded_by_escrow() {
        let (mut chain, mut dispatcher) = setup();
        chain.ledger_mut().set_balance(addr(1), 1000);
        dispatcher
            .deposit_to(&mut chain, addr(1), addr(1), 600)
            .unwrap();

        let err = dispatcher
            .withdraw_to(&mut chain, addr(1), addr(3), 601)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatcherError::WithdrawalExceedsDeposit {
                balance: 600,
                needed: 601
            }
        ));

        dispatcher
            .withdraw_to(&mut chain, addr(1), addr(3), 600)
            .unwrap();
        assert_eq!(dispatcher.deposit_of(&addr(1)), 0);
        assert_eq!(chain.ledger().balance(&addr(3)), 600);
    }

    #[test]
    fn operation_hash_is_dispatcher_bound() {
        let (chain, dispatcher) = setup();
        let other = Dispatcher::new(&chain, addr(0xD2));
        let op = aura_protocol::operation::OperationBuilder::new()
            .sender(addr(5))
            .build();
        assert_ne!(dispatcher.get_operation_hash(&op), other.get_operation_hash(&op));
    }
}
