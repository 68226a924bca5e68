pub mod client;
pub mod config;
pub mod contracts;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod operation;
pub mod prover;
pub mod recovery;
pub mod resolver;
pub mod session;
pub mod signer;
