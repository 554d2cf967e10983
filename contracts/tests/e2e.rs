//! End-to-end lifecycle test: identity to minted tokens.
//!
//! The canonical flow, exercised exactly as a client would drive it:
//! derive a nullifier from a secret, predict the account address, submit a
//! first-use operation whose `init_code` deploys the account and whose
//! call mints tokens to it, then graduate to a proof-authorized session
//! key for cheap follow-up operations.

use std::sync::Arc;

use ark_bn254::Fr;

use aura_protocol::address::Address;
use aura_protocol::config::CHAIN_ID_LOCAL;
use aura_protocol::crypto::keys::AuraKeypair;
use aura_protocol::identity::{derive_nullifier, EventId, IdentityKeypair};
use aura_protocol::ledger::WorldState;
use aura_protocol::operation::{encode_init_code, OperationBuilder, SignaturePayload};
use aura_protocol::zkp::{StubProver, StubVerifier};

use aura_contracts::account::{delegation_message_hash, AccountCall, AccountOwner};
use aura_contracts::chain::{Chain, CodeRef, ContractKind};
use aura_contracts::dispatcher::Dispatcher;
use aura_contracts::events::ChainEvent;
use aura_contracts::factory::{AccountFactory, FactoryCall};
use aura_contracts::token::{DemoToken, TokenCall};

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

#[test]
fn full_account_lifecycle() {
    // -- Infrastructure ----------------------------------------------------
    let mut chain = Chain::new(CHAIN_ID_LOCAL);
    let mut dispatcher = Dispatcher::new(&chain, addr(0xD1));

    let implementation = CodeRef::from_tag("smart-account/v1");
    chain.register_implementation(implementation);

    let factory_addr = addr(0xFA);
    let mut factory = AccountFactory::new(
        factory_addr,
        addr(0xAD),
        dispatcher.address(),
        Arc::new(StubVerifier::new()),
        EventId::new(5),
    );
    factory.initialize(implementation).unwrap();
    chain
        .install(factory_addr, ContractKind::Factory(factory))
        .unwrap();

    let token_addr = addr(0xEE);
    chain
        .install(
            token_addr,
            ContractKind::Token(DemoToken::new(token_addr, "Some Token", "ST", 18)),
        )
        .unwrap();

    // -- Identity ------------------------------------------------------------
    // The holder's secret never leaves the client; the chain only ever sees
    // the event-scoped nullifier.
    let secret = Fr::from(123u64);
    let identity = IdentityKeypair::from_secret(secret);
    let event = EventId::new(5);
    let nullifier = derive_nullifier(&secret, event);
    assert_eq!(identity.nullifier(event), nullifier);

    let owner = AccountOwner::Nullifier(nullifier);
    let predicted = chain
        .factory(&factory_addr)
        .unwrap()
        .predict_smart_account_address(&owner)
        .unwrap();

    // Fund the not-yet-existing account so it can prefund its own gas.
    chain
        .ledger_mut()
        .set_balance(predicted, 100_000_000_000_000);

    // -- First-use operation: deploy + mint ----------------------------------
    let init_code = encode_init_code(
        &factory_addr,
        &FactoryCall::DeploySmartAccount { owner }.encode(),
    );
    let call_data = AccountCall::Execute {
        target: token_addr,
        value: 0,
        data: TokenCall::Mint {
            to: predicted,
            amount: 1000,
        }
        .encode(),
    }
    .encode();

    let mut op = OperationBuilder::new()
        .sender(predicted)
        .nonce(0)
        .init_code(init_code)
        .call_data(call_data)
        .build();
    let op_hash = dispatcher.get_operation_hash(&op);
    op.signature = StubProver::prove(&identity, event, &op_hash.to_field()).encode();

    let beneficiary = addr(0xBE);
    let outcomes = dispatcher
        .handle_operations(&mut chain, &[op], beneficiary)
        .unwrap();
    assert!(outcomes[0].is_executed(), "outcome: {:?}", outcomes[0]);

    // Post-state: account exists at the predicted address, owns the minted
    // tokens, and consumed exactly one nonce.
    let account = chain.account(&predicted).expect("account deployed");
    assert_eq!(account.owner(), Some(&owner));
    assert_eq!(account.nonce(), 1);
    assert_eq!(account.history().len(), 1);
    assert_eq!(
        chain.token(&token_addr).unwrap().balance_of(&predicted),
        1000
    );
    assert!(chain
        .events()
        .contains(&ChainEvent::AccountDeployed { account: predicted }));
    assert!(chain.ledger().balance(&beneficiary) > 0);

    // -- Delegate a session key ----------------------------------------------
    // One proof authorizes the hot key; every later operation is a cheap
    // signature instead of a fresh proof.
    let session_key = AuraKeypair::from_seed(&[0x11; 32]);
    let delegate = Address::from_public_key(&session_key.public_key());

    let delegation_proof =
        StubProver::prove(&identity, event, &delegation_message_hash(&delegate));
    let mut op = OperationBuilder::new()
        .sender(predicted)
        .nonce(1)
        .call_data(
            AccountCall::SetSessionAccount {
                delegate,
                proof: delegation_proof.encode(),
            }
            .encode(),
        )
        .build();
    let op_hash = dispatcher.get_operation_hash(&op);
    op.signature = StubProver::prove(&identity, event, &op_hash.to_field()).encode();

    let outcomes = dispatcher
        .handle_operations(&mut chain, &[op], beneficiary)
        .unwrap();
    assert!(outcomes[0].is_executed(), "outcome: {:?}", outcomes[0]);
    assert_eq!(
        chain.account(&predicted).unwrap().session_account(),
        Some(delegate)
    );

    // -- Operate through the session key -------------------------------------
    let mut op = OperationBuilder::new()
        .sender(predicted)
        .nonce(2)
        .call_data(
            AccountCall::Execute {
                target: token_addr,
                value: 0,
                data: TokenCall::Mint {
                    to: predicted,
                    amount: 500,
                }
                .encode(),
            }
            .encode(),
        )
        .build();
    let op_hash = dispatcher.get_operation_hash(&op);
    op.signature = SignaturePayload::delegate(&session_key, &op_hash).encode();

    let outcomes = dispatcher
        .handle_operations(&mut chain, &[op], beneficiary)
        .unwrap();
    assert!(outcomes[0].is_executed(), "outcome: {:?}", outcomes[0]);

    assert_eq!(
        chain.token(&token_addr).unwrap().balance_of(&predicted),
        1500
    );
    assert_eq!(chain.account(&predicted).unwrap().nonce(), 3);
    assert_eq!(chain.account(&predicted).unwrap().history().len(), 2);

    // -- Global accounting ----------------------------------------------------
    // Escrow stays backed by the dispatcher's ledger balance.
    assert_eq!(
        chain.ledger().balance(&dispatcher.address()),
        dispatcher.deposit_of(&predicted)
    );
}
