#![forbid(unsafe_code)]

/// Ledger v1. Changing transition behavior requires a new version,
/// since the version is part of every canonical state hash.
pub const LEDGER_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod domain;
pub mod account;
pub mod store;
pub mod codec;
pub mod registry;
pub mod bank;
pub mod symbol;
pub mod requests;
pub mod transitions;
pub mod querier;
pub mod genesis;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use domain::{Address, Coins, LedgerParams, Receipt, Token};
pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use genesis::GenesisState;
pub use requests::{Request, RequestEnvelope};
