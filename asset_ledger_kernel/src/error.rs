//! Asset Ledger: Error Types
//!
//! Every handled request yields exactly one outcome: a receipt or one of
//! these errors. Fatal errors mean the persisted state or the process
//! setup is corrupt; the caller must stop delivering requests.

use std::fmt;

use thiserror::Error;

/// Why an amount was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountIssue {
    Zero,
    Negative,
    Unparseable(String),
    Overflow,
}

impl fmt::Display for AmountIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountIssue::Zero => write!(f, "amount must be greater than zero"),
            AmountIssue::Negative => write!(f, "amount cannot be negative"),
            AmountIssue::Unparseable(raw) => write!(f, "amount {:?} is not a base-10 integer", raw),
            AmountIssue::Overflow => write!(f, "amount overflows u64"),
        }
    }
}

/// Error type for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No registry entry for the symbol
    #[error("could not find token for symbol '{0}'")]
    NotFound(String),

    /// A token record without an owner cannot be stored
    #[error("unable to store token because owner for symbol '{symbol}' is empty")]
    InvalidOwner { symbol: String },

    #[error("incorrect owner: expected '{expected_owner}', got '{actual_signer}'")]
    Unauthorized {
        expected_owner: String,
        actual_signer: String,
    },

    #[error("invalid amount: {0}")]
    InvalidAmount(AmountIssue),

    #[error("insufficient balance of '{symbol}' for '{address}': have {available}, need {requested}")]
    InsufficientBalance {
        address: String,
        symbol: String,
        available: u64,
        requested: u64,
    },

    #[error("insufficient frozen balance of '{symbol}' for '{address}': have {available}, need {requested}")]
    InsufficientFrozenBalance {
        address: String,
        symbol: String,
        available: u64,
        requested: u64,
    },

    #[error("could not derive a unique symbol from '{requested}' after {attempts} attempts")]
    DuplicateOrFailedSymbolGeneration { requested: String, attempts: u32 },

    #[error("token '{0}' is not mintable")]
    NotMintable(String),

    /// Stateless request validation failure
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unrecognized assetmanagement request: {0}")]
    UnknownRequest(String),

    /// Stored bytes could not be decoded or a record could not be encoded
    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    #[error("invalid genesis record ({tag}): missing {field}")]
    InvalidGenesis { tag: String, field: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersion { expected: u32, got: u32 },

    #[error("ledger not initialized: {0}")]
    NotInitialized(String),
}

impl LedgerError {
    /// Fatal errors indicate corrupted state or misconfiguration.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::SerializationFailure(_)
                | LedgerError::InvalidGenesis { .. }
                | LedgerError::InvariantViolation(_)
                | LedgerError::SequenceViolation { .. }
                | LedgerError::SchemaVersion { .. }
                | LedgerError::NotInitialized(_)
        )
    }

    /// Stable numeric code for receipts and logs.
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::NotFound(_) => 101,
            LedgerError::InvalidOwner { .. } => 102,
            LedgerError::Unauthorized { .. } => 103,
            LedgerError::InvalidAmount(_) => 104,
            LedgerError::InsufficientBalance { .. } => 105,
            LedgerError::InsufficientFrozenBalance { .. } => 106,
            LedgerError::DuplicateOrFailedSymbolGeneration { .. } => 107,
            LedgerError::NotMintable(_) => 108,
            LedgerError::InvalidRequest(_) => 109,
            LedgerError::UnknownRequest(_) => 110,
            LedgerError::SerializationFailure(_) => 201,
            LedgerError::InvalidGenesis { .. } => 202,
            LedgerError::InvariantViolation(_) => 203,
            LedgerError::SequenceViolation { .. } => 204,
            LedgerError::SchemaVersion { .. } => 205,
            LedgerError::NotInitialized(_) => 206,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_are_not_fatal() {
        assert!(!LedgerError::NotFound("ZAP-001".into()).is_fatal());
        assert!(!LedgerError::InvalidAmount(AmountIssue::Zero).is_fatal());
        assert!(LedgerError::SerializationFailure("bad".into()).is_fatal());
    }

    #[test]
    fn messages_are_human_readable() {
        let err = LedgerError::Unauthorized {
            expected_owner: "alice".into(),
            actual_signer: "bob".into(),
        };
        assert_eq!(err.to_string(), "incorrect owner: expected 'alice', got 'bob'");
        assert_eq!(err.code(), 103);
    }
}
