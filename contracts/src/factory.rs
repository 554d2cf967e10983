//! # Account Factory
//!
//! Deterministic, idempotent account provisioning. One owner (nullifier or
//! address), one account, at an address computable before deployment:
//!
//! ```text
//! address = derive("aura.factory.smart-account.v1",
//!                  factory_address || owner_salt || implementation_ref)
//! ```
//!
//! Predict and deploy share that derivation, which is the whole trick —
//! clients fund and reference accounts that do not exist yet, and the
//! first operation carries the factory call in its `init_code`.
//!
//! Redeploying an existing owner is a no-op returning the same address.
//! The factory's `init_code` role demands this: every first-use operation
//! races against every other, and only one of them can be first.
//!
//! The admin can point the factory at a new account implementation; this
//! affects *future* deployments only. Deployed accounts own their own
//! implementation pointer and upgrade themselves.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use aura_protocol::address::Address;
use aura_protocol::identity::EventId;
use aura_protocol::zkp::ProofVerifier;

use crate::account::{AccountOwner, SmartAccount};
use crate::chain::{CallContext, Chain, CodeRef, ContractKind, Revert};
use crate::events::ChainEvent;

/// Domain context shared by the predict and deploy paths.
const ACCOUNT_ADDRESS_CONTEXT: &str = "aura.factory.smart-account.v1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Factory failures.
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    /// Second initialization attempt.
    #[error("already initialized")]
    AlreadyInitialized,

    /// Operation before the one-time initializer ran.
    #[error("factory not initialized")]
    NotInitialized,

    /// Implementation change attempted by anyone but the admin.
    #[error("not the factory admin: called by {caller}")]
    NotAdmin {
        /// The offending caller.
        caller: Address,
    },

    /// The named implementation is not registered with the chain.
    #[error("unknown implementation: {implementation}")]
    UnknownImplementation {
        /// The rejected revision reference.
        implementation: CodeRef,
    },

    /// The predicted address is occupied by something that is not a smart
    /// account. Cannot happen through this factory; guards against foreign
    /// installs.
    #[error("address collision at {address}")]
    AddressCollision {
        /// The colliding address.
        address: Address,
    },
}

/// The factory's routed entry points (for the `init_code` path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryCall {
    /// Deploy (or return) the smart account for `owner`.
    DeploySmartAccount {
        /// The account owner.
        owner: AccountOwner,
    },
}

impl FactoryCall {
    /// Wire-encode for use inside operation `init_code`.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("factory calls always serialize")
    }
}

// ---------------------------------------------------------------------------
// AccountFactory
// ---------------------------------------------------------------------------

/// Deterministic smart-account factory.
#[derive(Clone)]
pub struct AccountFactory {
    address: Address,
    admin: Address,
    dispatcher: Address,
    verifier: Arc<dyn ProofVerifier>,
    event_id: EventId,
    implementation: Option<CodeRef>,
    deployed: HashMap<AccountOwner, Address>,
}

impl AccountFactory {
    /// Construct an uninitialized factory. `admin` controls future
    /// implementation changes; `dispatcher`, `verifier`, and `event_id`
    /// are wired into every account it deploys.
    pub fn new(
        address: Address,
        admin: Address,
        dispatcher: Address,
        verifier: Arc<dyn ProofVerifier>,
        event_id: EventId,
    ) -> Self {
        Self {
            address,
            admin,
            dispatcher,
            verifier,
            event_id,
            implementation: None,
            deployed: HashMap::new(),
        }
    }

    /// One-time initializer: set the implementation used for deployments.
    pub fn initialize(&mut self, implementation: CodeRef) -> Result<(), FactoryError> {
        if self.implementation.is_some() {
            return Err(FactoryError::AlreadyInitialized);
        }
        self.implementation = Some(implementation);
        Ok(())
    }

    /// This factory's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The implementation new deployments will receive.
    pub fn implementation(&self) -> Option<&CodeRef> {
        self.implementation.as_ref()
    }

    /// Point future deployments at a new implementation. Admin only;
    /// existing accounts keep their own pointer.
    pub fn set_smart_account_implementation(
        &mut self,
        chain: &Chain,
        caller: Address,
        implementation: CodeRef,
    ) -> Result<(), FactoryError> {
        if caller != self.admin {
            return Err(FactoryError::NotAdmin { caller });
        }
        if !chain.implementation_registered(&implementation) {
            return Err(FactoryError::UnknownImplementation { implementation });
        }
        if self.implementation.is_none() {
            return Err(FactoryError::NotInitialized);
        }
        self.implementation = Some(implementation);
        Ok(())
    }

    /// Pure address prediction — no deployment, no state change.
    pub fn predict_smart_account_address(
        &self,
        owner: &AccountOwner,
    ) -> Result<Address, FactoryError> {
        let implementation = self.implementation.ok_or(FactoryError::NotInitialized)?;
        Ok(Address::derive(
            ACCOUNT_ADDRESS_CONTEXT,
            &[
                self.address.as_bytes(),
                &owner.salt_bytes(),
                implementation.as_bytes(),
            ],
        ))
    }

    /// The deployed account for `owner`, if any.
    pub fn get_smart_account(&self, owner: &AccountOwner) -> Option<Address> {
        self.deployed.get(owner).copied()
    }

    /// Deploy the smart account for `owner`, or return the existing one.
    ///
    /// The idempotent path matters: `init_code` is re-submitted by every
    /// client that raced on first use, and all of them must converge on
    /// the same address without error.
    pub fn deploy_smart_account(
        &mut self,
        chain: &mut Chain,
        owner: AccountOwner,
    ) -> Result<Address, FactoryError> {
        let address = self.predict_smart_account_address(&owner)?;
        let implementation = self.implementation.expect("checked by prediction");

        if chain.has_contract(&address) {
            if chain.account(&address).is_none() {
                return Err(FactoryError::AddressCollision { address });
            }
            self.deployed.entry(owner).or_insert(address);
            return Ok(address);
        }

        let mut account = SmartAccount::new(
            address,
            self.dispatcher,
            Arc::clone(&self.verifier),
            implementation,
            self.event_id,
        );
        account
            .initialize(owner)
            .expect("fresh accounts initialize exactly once");

        chain
            .install(address, ContractKind::Account(account))
            .expect("absence checked above");
        self.deployed.insert(owner, address);

        tracing::info!(account = %address, "smart account deployed");
        chain.emit(ChainEvent::AccountDeployed { account: address });

        Ok(address)
    }

    /// Routed dispatch (the `init_code` path). Returns the account
    /// address as 20 raw bytes.
    pub(crate) fn handle(
        &mut self,
        chain: &mut Chain,
        _ctx: CallContext,
        data: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        let call: FactoryCall = bincode::deserialize(data)
            .map_err(|_| Revert::new("undecodable factory call data"))?;

        match call {
            FactoryCall::DeploySmartAccount { owner } => self
                .deploy_smart_account(chain, owner)
                .map(|address| address.as_bytes().to_vec())
                .map_err(|e| Revert::from_error(&e)),
        }
    }
}

impl std::fmt::Debug for AccountFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountFactory")
            .field("address", &self.address)
            .field("admin", &self.admin)
            .field("implementation", &self.implementation)
            .field("deployed", &self.deployed.len())
            .finish()
    }
}
