//! Snapshot Codec: deterministic ledger-state encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_snapshot`:  GenesisState → canonical JSON string
//! - `decode_snapshot`:  JSON string → GenesisState (strict, no defaults)
//! - `restore_snapshot`: decode + genesis validation + invariants
//! - `export_snapshot_to_file` / `import_snapshot_from_file`: file I/O
//! - `snapshot_hash`:    SHA-256 of canonical JSON (lowercase hex)
//!
//! The encoding is the kernel's canonical form, so `snapshot_hash` equals
//! the kernel state hash and the SHA-256 of an exported file.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use asset_ledger_kernel::bank::AccountKeeper;
use asset_ledger_kernel::codec::JsonCodec;
use asset_ledger_kernel::genesis::{init_genesis, validate_genesis, GenesisState};
use asset_ledger_kernel::hashing::{canonical_hash, canonical_serialize};
use asset_ledger_kernel::invariants::try_validate_invariants;
use asset_ledger_kernel::registry::TokenRegistry;
use asset_ledger_kernel::store::LedgerStore;
use asset_ledger_kernel::LEDGER_VERSION;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// All possible snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    SerializationError(String),

    /// Malformed JSON, missing fields, unknown fields.
    #[error("DeserializationError: {0}")]
    DeserializationError(String),

    #[error("VersionMismatch: expected ledger version {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u64 },

    /// Records fail structural genesis validation.
    #[error("InvalidGenesis: {0}")]
    InvalidGenesis(String),

    /// Loaded state violates ledger invariants.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),

    #[error("HashMismatch: recorded {recorded}, computed {computed}")]
    HashMismatch { recorded: String, computed: String },

    #[error("IoError: {0}")]
    IoError(String),
}

impl From<io::Error> for SnapshotError {
    fn from(err: io::Error) -> Self {
        SnapshotError::IoError(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a ledger state to its canonical JSON string.
pub fn encode_snapshot(state: &GenesisState) -> Result<String, SnapshotError> {
    let bytes = canonical_serialize(state)
        .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SnapshotError::SerializationError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode a JSON document into a ledger state.
///
/// Accepts the canonical form, or a plain genesis document without
/// `ledger_version`. A present version must match. Unknown fields are
/// rejected. No validation; use `restore_snapshot` for validated loading.
pub fn decode_snapshot(json: &str) -> Result<GenesisState, SnapshotError> {
    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| SnapshotError::DeserializationError(e.to_string()))?;

    if let Value::Object(map) = &mut value {
        if let Some(version) = map.remove("ledger_version") {
            let got = version.as_u64().ok_or_else(|| {
                SnapshotError::DeserializationError("ledger_version must be an integer".into())
            })?;
            if got != u64::from(LEDGER_VERSION) {
                return Err(SnapshotError::VersionMismatch {
                    expected: LEDGER_VERSION,
                    got,
                });
            }
        }
    }

    serde_json::from_value(value).map_err(|e| SnapshotError::DeserializationError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Restore (decode + validate)
// ---------------------------------------------------------------------------

/// Decode a JSON document and validate it immediately.
///
/// This is the safe entry point for loading state from untrusted sources:
/// genesis validation, then a trial load into a scratch store followed by
/// the full invariant check.
pub fn restore_snapshot(json: &str) -> Result<GenesisState, SnapshotError> {
    let state = decode_snapshot(json)?;
    validate_state(&state)?;
    Ok(state)
}

/// Genesis validation plus invariants of the loaded state.
pub fn validate_state(state: &GenesisState) -> Result<(), SnapshotError> {
    validate_genesis(state).map_err(|e| SnapshotError::InvalidGenesis(e.to_string()))?;

    let codec = Arc::new(JsonCodec);
    let registry = TokenRegistry::new(codec.clone());
    let accounts = AccountKeeper::new(codec);
    let mut store = LedgerStore::new();
    init_genesis(&registry, &accounts, &mut store, state)
        .map_err(|e| SnapshotError::InvalidGenesis(e.to_string()))?;
    try_validate_invariants(&registry, &accounts, &store.tokens, &store.accounts)
        .map_err(SnapshotError::InvariantViolation)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Export a ledger state to a file as canonical JSON.
///
/// Creates parent directories if needed. Byte-for-byte identical across
/// identical states.
pub fn export_snapshot_to_file(state: &GenesisState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_snapshot(state)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, json.as_bytes())?;
    Ok(())
}

/// Import a ledger state from a JSON file, validating it.
pub fn import_snapshot_from_file(path: &Path) -> Result<GenesisState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_snapshot(&content)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of the canonical JSON encoding. Lowercase hex string.
pub fn snapshot_hash(state: &GenesisState) -> Result<String, SnapshotError> {
    canonical_hash(state).map_err(|e| SnapshotError::SerializationError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
