//! # Operations
//!
//! The transaction protocol's unit of intent. A client builds an
//! [`Operation`], computes its dispatcher-bound hash, authenticates that
//! hash (delegate signature or identity proof), and submits. The operation
//! exists only for one validate→execute→settle cycle; nothing persists it.
//!
//! ```text
//! types.rs    — Operation record, packed gas fields, OpHash, init-code codec
//! builder.rs  — construction with reference gas defaults
//! payload.rs  — the signature field's two encodings
//! ```

pub mod builder;
pub mod payload;
pub mod types;

pub use builder::OperationBuilder;
pub use payload::{PayloadError, SignaturePayload};
pub use types::{
    decode_init_code, encode_init_code, GasFees, GasLimits, OpHash, Operation, OperationError,
};
