//! Asset Ledger: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing of exported
//! ledger state. Produces byte-identical output across platforms and
//! across record codecs, since it hashes decoded records.
//!
//! Rules:
//!   - ledger_version first, then token_records, then accounts
//!   - token records sorted by symbol, accounts by address (UTF-8 byte order)
//!   - every object's keys sorted
//!   - UTF-8 JSON, no whitespace, integers only

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;
use crate::genesis::GenesisState;
use crate::LEDGER_VERSION;

/// Recursively sort object keys. Arrays keep their order.
pub fn sorted_json(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, sorted_json(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_json).collect()),
        other => other,
    }
}

/// Lowercase hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonical serialization of a ledger state to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &GenesisState) -> Result<Vec<u8>, LedgerError> {
    let root = build_canonical_value(state)?;
    Ok(serde_json::to_vec(&root)?)
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &GenesisState) -> Result<String, LedgerError> {
    Ok(sha256_hex(&canonical_serialize(state)?))
}

fn build_canonical_value(state: &GenesisState) -> Result<Value, LedgerError> {
    let mut tokens = state.token_records.clone();
    tokens.sort_by(|a, b| a.symbol.as_bytes().cmp(b.symbol.as_bytes()));
    let mut accounts = state.accounts.clone();
    accounts.sort_by(|a, b| a.address().as_bytes().cmp(b.address().as_bytes()));

    // ledger_version stays first: it binds the hash to the transition rules.
    let mut root = Map::new();
    root.insert("ledger_version".to_string(), Value::from(LEDGER_VERSION));
    root.insert(
        "token_records".to_string(),
        sorted_json(serde_json::to_value(&tokens)?),
    );
    root.insert(
        "accounts".to_string(),
        sorted_json(serde_json::to_value(&accounts)?),
    );
    Ok(Value::Object(root))
}
