//! Replay orchestrator: rebuild a ledger from genesis plus a request stream.
//!
//! Delegates all domain logic to the kernel. No shortcuts, no cached state.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use asset_ledger_kernel::domain::Receipt;
use asset_ledger_kernel::engine::LedgerEngine;
use asset_ledger_kernel::error::LedgerError;
use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_kernel::requests::RequestEnvelope;

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};

/// Outcome of one delivered request.
pub type RequestOutcome = std::result::Result<Receipt, LedgerError>;

/// Read a JSON array of request envelopes.
pub fn load_requests_file(path: &Path) -> Result<Vec<RequestEnvelope>> {
    let data = fs::read_to_string(path)?;
    let values: Vec<Value> = serde_json::from_str(&data)
        .map_err(|e| LedgerError::InvalidRequest(format!("malformed request stream: {}", e)))?;
    values
        .iter()
        .map(|v| RequestEnvelope::from_value(v).map_err(RuntimeError::from))
        .collect()
}

/// Rebuild a ledger from `genesis` and `envelopes`.
///
/// 1. Build a fresh engine from `config`
/// 2. Load genesis
/// 3. Deliver each envelope in order; a fatal error aborts the replay
/// 4. Return the engine, the per-request outcomes and the canonical hash
pub fn rebuild(
    config: &RuntimeConfig,
    genesis: &GenesisState,
    envelopes: &[RequestEnvelope],
) -> Result<(LedgerEngine, Vec<RequestOutcome>, String)> {
    let mut engine = config.build_engine();
    engine.init_genesis(genesis)?;
    let outcomes = engine.deliver_all(envelopes)?;
    let hash = engine.state_hash()?;
    info!(
        requests = envelopes.len(),
        sequence = engine.last_sequence(),
        hash = %hash,
        "replay complete"
    );
    Ok((engine, outcomes, hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(
    config: &RuntimeConfig,
    genesis: &GenesisState,
    envelopes: &[RequestEnvelope],
) -> Result<String> {
    let (_, _, hash) = rebuild(config, genesis, envelopes)?;
    Ok(hash)
}
