//! Runtime error type.
//!
//! Wraps I/O, ledger, configuration, snapshot and request log failures.
//! Non-fatal ledger outcomes are not errors at this layer; they are
//! returned as request outcomes and persisted like successes.

use std::io;
use std::path::PathBuf;

use asset_ledger_kernel::error::LedgerError;
use thiserror::Error;

use crate::snapshot_codec::SnapshotError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Request log frames that cannot be trusted
    #[error("request log corrupted at byte {offset}: {reason}")]
    LogCorruption { offset: u64, reason: String },

    #[error("request log sequence violation: expected {expected}, got {got}")]
    LogSequence { expected: u64, got: u64 },

    #[error("determinism failure: run 1 hash {first}, run 2 hash {second}")]
    Determinism { first: String, second: String },

    #[error("session lock poisoned")]
    LockPoisoned,
}

impl RuntimeError {
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RuntimeError::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
