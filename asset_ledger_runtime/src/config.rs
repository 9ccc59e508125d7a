//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Unknown fields are rejected.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use asset_ledger_kernel::codec::{JsonCodec, RecordCodec};
use asset_ledger_kernel::domain::LedgerParams;
use asset_ledger_kernel::engine::LedgerEngine;
use asset_ledger_kernel::symbol::DigestSymbolGenerator;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};
use crate::proto_bridge::ProtoCodec;

/// Encoding of stored registry and account records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Proto,
    Json,
}

impl CodecKind {
    /// The codec instance handed to the keepers at setup.
    pub fn register(self) -> Arc<dyn RecordCodec> {
        match self {
            CodecKind::Proto => Arc::new(ProtoCodec),
            CodecKind::Json => Arc::new(JsonCodec),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Root directory for sessions (request logs, snapshots, genesis).
    pub data_dir: PathBuf,

    /// Snapshot every N sequence numbers. 0 disables snapshots.
    pub snapshot_interval: u64,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,

    pub codec: CodecKind,

    /// Seed of the symbol generator. Replicas must agree on it.
    pub symbol_seed: u64,

    pub ledger: LedgerParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("ledger_data"),
            snapshot_interval: 100,
            log_filter: "info".to_string(),
            codec: CodecKind::Proto,
            symbol_seed: 0,
            ledger: LedgerParams::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.log_filter.trim().is_empty() {
            return Err("log_filter must not be empty".into());
        }
        if self.ledger.symbol_suffix_len == 0 || self.ledger.symbol_suffix_len > 64 {
            return Err("ledger.symbol_suffix_len must be between 1 and 64".into());
        }
        if self.ledger.max_symbol_attempts == 0 {
            return Err("ledger.max_symbol_attempts must be > 0".into());
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, String> {
        let cfg: RuntimeConfig = toml::from_str(contents).map_err(|e| e.to_string())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// A fresh, uninitialized engine wired from this configuration.
    pub fn build_engine(&self) -> LedgerEngine {
        let generator = DigestSymbolGenerator::new(self.symbol_seed, self.ledger.symbol_suffix_len);
        LedgerEngine::new(self.codec.register(), Box::new(generator), self.ledger.clone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RuntimeConfig::default()`.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    if !path.exists() {
        return Ok(RuntimeConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    RuntimeConfig::from_toml_str(&contents).map_err(|reason| RuntimeError::config(path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let path = std::env::temp_dir().join("asset_ledger_missing_config.toml");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let cfg = RuntimeConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/ledger"
            snapshot_interval = 10
            log_filter = "asset_ledger_kernel=debug"
            codec = "json"
            symbol_seed = 7

            [ledger]
            symbol_suffix_len = 4
            enforce_mintable = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/ledger"));
        assert_eq!(cfg.snapshot_interval, 10);
        assert_eq!(cfg.codec, CodecKind::Json);
        assert_eq!(cfg.symbol_seed, 7);
        assert_eq!(cfg.ledger.symbol_suffix_len, 4);
        assert_eq!(cfg.ledger.max_symbol_attempts, 8);
        assert!(cfg.ledger.enforce_mintable);
        assert_eq!(cfg.build_engine().codec_name(), "json");
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(RuntimeConfig::from_toml_str("snapshot_every = 3").is_err());
        assert!(RuntimeConfig::from_toml_str("codec = \"xml\"").is_err());
        assert!(RuntimeConfig::from_toml_str("[ledger]\nmax_symbol_attempts = 0").is_err());
        assert!(RuntimeConfig::from_toml_str("log_filter = \" \"").is_err());
    }
}
