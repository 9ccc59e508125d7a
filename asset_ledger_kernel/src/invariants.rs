//! Asset Ledger: Invariant Checks
//!
//! Hard validation of ledger state, run after every transition (against
//! the pending scope) and on every restore. A violation is fatal.

use crate::bank::AccountKeeper;
use crate::error::LedgerError;
use crate::registry::TokenRegistry;
use crate::store::KvStore;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Returns the first violation.
pub fn validate_invariants(
    registry: &TokenRegistry,
    accounts: &AccountKeeper,
    tokens: &dyn KvStore,
    account_store: &dyn KvStore,
) -> Result<(), LedgerError> {
    check_registry(registry, tokens)?;
    check_accounts(accounts, account_store)?;
    Ok(())
}

/// Non-failing-type variant of `validate_invariants`: `Err(message)` on
/// the first problem. Used by snapshot restore to reject a document.
pub fn try_validate_invariants(
    registry: &TokenRegistry,
    accounts: &AccountKeeper,
    tokens: &dyn KvStore,
    account_store: &dyn KvStore,
) -> Result<(), String> {
    validate_invariants(registry, accounts, tokens, account_store).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn violation(msg: String) -> LedgerError {
    LedgerError::InvariantViolation(msg)
}

fn check_registry(registry: &TokenRegistry, tokens: &dyn KvStore) -> Result<(), LedgerError> {
    for (key, token) in registry.iterate(tokens)? {
        if key != token.symbol {
            return Err(violation(format!(
                "[registry_key] key {:?} holds token with symbol {:?}",
                key, token.symbol
            )));
        }
        if token.owner.is_empty() {
            return Err(violation(format!("[owner] token {:?} has no owner", key)));
        }
        if token.name.is_empty() {
            return Err(violation(format!("[name] token {:?} has no name", key)));
        }
        if token.original_symbol.is_empty() {
            return Err(violation(format!(
                "[original_symbol] token {:?} has no original symbol",
                key
            )));
        }
        if !token.total_supply.contains(&token.symbol) {
            return Err(violation(format!(
                "[total_supply] token {:?} has no supply entry in its own denomination",
                key
            )));
        }
    }
    Ok(())
}

fn check_accounts(accounts: &AccountKeeper, store: &dyn KvStore) -> Result<(), LedgerError> {
    for (key, account) in accounts.entries(store)? {
        let address = String::from_utf8_lossy(&key).into_owned();
        if account.address().as_bytes() != key.as_slice() {
            return Err(violation(format!(
                "[account_key] key {:?} holds account {:?}",
                address,
                account.address().as_str()
            )));
        }
        if account.base.coins.has_zero_entry() || account.frozen.coins.has_zero_entry() {
            return Err(violation(format!("[zero_entry] account {:?} stores a zero amount", address)));
        }
        if account.is_empty() {
            return Err(violation(format!("[empty_account] account {:?} is stored but empty", address)));
        }
    }
    Ok(())
}
