//! Walkthrough of the full AURA account lifecycle.
//!
//! Derives a nullifier identity, predicts and deploys a smart account
//! through a first-use operation, mints demo tokens, authorizes a session
//! key with one proof, and operates through the session key afterwards.
//! Proofs use the deterministic stub (binding-only); swap in the Groth16
//! verifier and a real prover for the production pipeline.
//!
//! Run with:
//!   cargo run --example demo --release

use std::sync::Arc;

use ark_bn254::Fr;

use aura_protocol::address::Address;
use aura_protocol::config::CHAIN_ID_LOCAL;
use aura_protocol::crypto::keys::AuraKeypair;
use aura_protocol::identity::{EventId, IdentityKeypair};
use aura_protocol::ledger::WorldState;
use aura_protocol::operation::{encode_init_code, OperationBuilder, SignaturePayload};
use aura_protocol::zkp::{StubProver, StubVerifier};

use aura_contracts::account::{delegation_message_hash, AccountCall, AccountOwner};
use aura_contracts::chain::{Chain, CodeRef, ContractKind};
use aura_contracts::dispatcher::Dispatcher;
use aura_contracts::factory::{AccountFactory, FactoryCall};
use aura_contracts::token::{DemoToken, TokenCall};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[ Step {num} ]==========================================={RESET}");
    println!("{BOLD}  {title}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("  {BOLD}{label}:{RESET} {value}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn main() {
    // -----------------------------------------------------------------------
    section(1, "Infrastructure: chain, dispatcher, factory, token");
    // -----------------------------------------------------------------------

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
    factory
        .initialize(implementation)
        .expect("fresh factory initializes");
    chain
        .install(factory_addr, ContractKind::Factory(factory))
        .expect("factory address is free");

    let token_addr = addr(0xEE);
    chain
        .install(
            token_addr,
            ContractKind::Token(DemoToken::new(token_addr, "Some Token", "ST", 18)),
        )
        .expect("token address is free");

    info("Dispatcher", &dispatcher.address().to_string());
    info("Factory", &factory_addr.to_string());
    info("Token", &token_addr.to_string());
    success("Stack deployed");

    // -----------------------------------------------------------------------
    section(2, "Identity: secret -> event-scoped nullifier");
    // -----------------------------------------------------------------------

    let identity = IdentityKeypair::from_secret(Fr::from(123u64));
    let event = EventId::new(5);
    let nullifier = identity.nullifier(event);

    info("Event id", &event.to_string());
    info("Nullifier", &nullifier.to_string());
    println!("{DIM}  (the secret itself never leaves this process){RESET}");

    let owner = AccountOwner::Nullifier(nullifier);
    let predicted = chain
        .factory(&factory_addr)
        .expect("factory installed")
        .predict_smart_account_address(&owner)
        .expect("factory initialized");
    info("Predicted account", &predicted.to_string());

    // Fund the future account so it can prefund its own gas.
    chain
        .ledger_mut()
        .set_balance(predicted, 100_000_000_000_000);
    success("Account prefunded at its predicted address");

    // -----------------------------------------------------------------------
    section(3, "First-use operation: deploy via init code + mint 1000 ST");
    // -----------------------------------------------------------------------

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
    info("Operation hash", &op_hash.to_string());

    let outcomes = dispatcher
        .handle_operations(&mut chain, &[op], addr(0xBE))
        .expect("batch settles");
    assert!(outcomes[0].is_executed());

    let account = chain.account(&predicted).expect("account deployed");
    info("Account nonce", &account.nonce().to_string());
    info(
        "Token balance",
        &chain
            .token(&token_addr)
            .expect("token installed")
            .balance_of(&predicted)
            .to_string(),
    );
    success("Account exists at the predicted address and holds its mint");

    // -----------------------------------------------------------------------
    section(4, "Session delegation: one proof, then cheap signatures");
    // -----------------------------------------------------------------------

    let session_key = AuraKeypair::generate();
    let delegate = Address::from_public_key(&session_key.public_key());
    info("Session delegate", &delegate.to_string());

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
        .handle_operations(&mut chain, &[op], addr(0xBE))
        .expect("batch settles");
    assert!(outcomes[0].is_executed());
    success("Delegate authorized by a proof bound to its address");

    // Operate through the session key: no proof anywhere in sight.
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
        .handle_operations(&mut chain, &[op], addr(0xBE))
        .expect("batch settles");
    assert!(outcomes[0].is_executed());
    success("Session-signed operation executed");

    // -----------------------------------------------------------------------
    section(5, "Final state");
    // -----------------------------------------------------------------------

    let account = chain.account(&predicted).expect("account exists");
    info("Nonce", &account.nonce().to_string());
    info("History entries", &account.history().len().to_string());
    info(
        "Token balance",
        &chain
            .token(&token_addr)
            .expect("token installed")
            .balance_of(&predicted)
            .to_string(),
    );
    info(
        "Beneficiary fees",
        &chain.ledger().balance(&addr(0xBE)).to_string(),
    );
    info("Events", &chain.events().len().to_string());
    println!();
    success("Lifecycle complete");
}
