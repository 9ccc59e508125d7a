//! Drift detection: determinism verification and state comparison.
//!
//! All amounts are integers. Supply deltas are i128 so the difference of
//! two u64 supplies never overflows.

use std::collections::{BTreeMap, BTreeSet};

use asset_ledger_kernel::account::CustomAccount;
use asset_ledger_kernel::domain::Token;
use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_kernel::requests::RequestEnvelope;

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::replay;

/// Replay the same stream twice on fresh engines and require identical
/// hashes. Returns the agreed hash.
pub fn verify_determinism(
    config: &RuntimeConfig,
    genesis: &GenesisState,
    envelopes: &[RequestEnvelope],
) -> Result<String> {
    let first = replay::rebuild_hash(config, genesis, envelopes)?;
    let second = replay::rebuild_hash(config, genesis, envelopes)?;
    if first != second {
        return Err(RuntimeError::Determinism { first, second });
    }
    Ok(first)
}

/// Supply of one token in both states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyChange {
    pub symbol: String,
    pub supply_a: u64,
    pub supply_b: u64,
    pub delta: i128,
}

/// Structured drift report between two ledger states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub token_count_a: usize,
    pub token_count_b: usize,
    pub token_count_delta: i64,
    pub added_tokens: Vec<String>,
    pub removed_tokens: Vec<String>,
    pub supply_changes: Vec<SupplyChange>,
    /// Symbols whose owner differs.
    pub owner_changes: Vec<String>,
    pub account_count_a: usize,
    pub account_count_b: usize,
    /// Addresses present in either state whose balances differ.
    pub changed_accounts: Vec<String>,
}

impl DriftReport {
    pub fn is_empty(&self) -> bool {
        self.added_tokens.is_empty()
            && self.removed_tokens.is_empty()
            && self.supply_changes.is_empty()
            && self.owner_changes.is_empty()
            && self.changed_accounts.is_empty()
    }
}

/// Compare two exported states record by record.
pub fn compare_states(state_a: &GenesisState, state_b: &GenesisState) -> DriftReport {
    let tokens_a: BTreeMap<&str, &Token> =
        state_a.token_records.iter().map(|t| (t.symbol.as_str(), t)).collect();
    let tokens_b: BTreeMap<&str, &Token> =
        state_b.token_records.iter().map(|t| (t.symbol.as_str(), t)).collect();

    let ids_a: BTreeSet<&str> = tokens_a.keys().copied().collect();
    let ids_b: BTreeSet<&str> = tokens_b.keys().copied().collect();

    let added_tokens = ids_b.difference(&ids_a).map(|s| s.to_string()).collect();
    let removed_tokens = ids_a.difference(&ids_b).map(|s| s.to_string()).collect();

    let mut supply_changes = Vec::new();
    let mut owner_changes = Vec::new();
    for symbol in ids_a.intersection(&ids_b) {
        let (a, b) = (tokens_a[symbol], tokens_b[symbol]);
        if a.supply() != b.supply() {
            supply_changes.push(SupplyChange {
                symbol: symbol.to_string(),
                supply_a: a.supply(),
                supply_b: b.supply(),
                delta: i128::from(b.supply()) - i128::from(a.supply()),
            });
        }
        if a.owner != b.owner {
            owner_changes.push(symbol.to_string());
        }
    }

    let accounts_a: BTreeMap<&str, &CustomAccount> =
        state_a.accounts.iter().map(|a| (a.address().as_str(), a)).collect();
    let accounts_b: BTreeMap<&str, &CustomAccount> =
        state_b.accounts.iter().map(|a| (a.address().as_str(), a)).collect();
    let addresses: BTreeSet<&str> = accounts_a.keys().chain(accounts_b.keys()).copied().collect();
    let changed_accounts = addresses
        .into_iter()
        .filter(|addr| accounts_a.get(addr) != accounts_b.get(addr))
        .map(|addr| addr.to_string())
        .collect();

    DriftReport {
        token_count_a: tokens_a.len(),
        token_count_b: tokens_b.len(),
        token_count_delta: tokens_b.len() as i64 - tokens_a.len() as i64,
        added_tokens,
        removed_tokens,
        supply_changes,
        owner_changes,
        account_count_a: accounts_a.len(),
        account_count_b: accounts_b.len(),
        changed_accounts,
    }
}
