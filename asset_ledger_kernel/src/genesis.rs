//! Asset Ledger: Genesis
//!
//! Load and export of the full ledger state as a record list.
//! A failure while loading genesis is fatal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::account::CustomAccount;
use crate::bank::AccountKeeper;
use crate::domain::Token;
use crate::error::LedgerError;
use crate::registry::TokenRegistry;
use crate::store::{LedgerStore, ScopedWrites};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisState {
    pub token_records: Vec<Token>,
    #[serde(default)]
    pub accounts: Vec<CustomAccount>,
}

impl GenesisState {
    pub fn new(token_records: Vec<Token>, accounts: Vec<CustomAccount>) -> Self {
        Self {
            token_records,
            accounts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token_records.is_empty() && self.accounts.is_empty()
    }
}

fn missing(tag: String, field: &str) -> LedgerError {
    LedgerError::InvalidGenesis {
        tag,
        field: field.to_string(),
    }
}

/// Structural check of every record. The first failure names the
/// missing field, tagged by symbol (or by owner when the symbol is missing).
pub fn validate_genesis(state: &GenesisState) -> Result<(), LedgerError> {
    let mut seen = BTreeSet::new();
    for record in &state.token_records {
        if record.owner.is_empty() {
            return Err(missing(format!("symbol {}", record.symbol), "owner"));
        }
        if record.symbol.is_empty() {
            return Err(missing(format!("owner {}", record.owner), "symbol"));
        }
        if record.total_supply.is_empty() {
            return Err(missing(format!("symbol {}", record.symbol), "total supply"));
        }
        if record.name.is_empty() {
            return Err(missing(format!("symbol {}", record.symbol), "name"));
        }
        if record.original_symbol.is_empty() {
            return Err(missing(format!("symbol {}", record.symbol), "original symbol"));
        }
        if !seen.insert(record.symbol.as_str()) {
            return Err(missing(format!("symbol {}", record.symbol), "unique symbol"));
        }
    }

    let mut addresses = BTreeSet::new();
    for account in &state.accounts {
        let address = account.address();
        if address.is_empty() {
            return Err(missing("account".to_string(), "address"));
        }
        if account.base.coins.has_zero_entry() || account.frozen.coins.has_zero_entry() {
            return Err(missing(format!("address {}", address), "non-zero coin amounts"));
        }
        if !addresses.insert(address.as_str()) {
            return Err(missing(format!("address {}", address), "unique address"));
        }
    }
    Ok(())
}

/// Write every record into `store`. Runs inside one write scope, so a
/// failure leaves the store untouched; the error is always fatal.
pub fn init_genesis(
    registry: &TokenRegistry,
    accounts: &AccountKeeper,
    store: &mut LedgerStore,
    state: &GenesisState,
) -> Result<(), LedgerError> {
    validate_genesis(state).map_err(|e| {
        error!(error = %e, "genesis validation failed");
        e
    })?;

    let mut scope = store.begin();
    let outcome = load_records(registry, accounts, &mut scope, state);
    scope.commit_or_discard(outcome).map_err(|e| {
        error!(error = %e, "failed to load genesis");
        if e.is_fatal() {
            e
        } else {
            LedgerError::InvalidGenesis {
                tag: "load".to_string(),
                field: e.to_string(),
            }
        }
    })?;

    info!(
        tokens = state.token_records.len(),
        accounts = state.accounts.len(),
        "genesis loaded"
    );
    Ok(())
}

fn load_records(
    registry: &TokenRegistry,
    accounts: &AccountKeeper,
    scope: &mut ScopedWrites<'_>,
    state: &GenesisState,
) -> Result<(), LedgerError> {
    for record in &state.token_records {
        registry.set(&mut scope.tokens, &record.symbol, record)?;
    }
    for account in &state.accounts {
        accounts.set_account(&mut scope.accounts, account)?;
    }
    Ok(())
}

/// Full enumeration of the committed stores, in key byte order.
pub fn export_genesis(
    registry: &TokenRegistry,
    accounts: &AccountKeeper,
    store: &LedgerStore,
) -> Result<GenesisState, LedgerError> {
    let token_records = registry
        .iterate(&store.tokens)?
        .into_iter()
        .map(|(_, token)| token)
        .collect();
    let accounts = accounts.accounts(&store.accounts)?;
    Ok(GenesisState {
        token_records,
        accounts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::JsonCodec;
    use crate::domain::{Address, Coins};

    fn keepers() -> (TokenRegistry, AccountKeeper) {
        let codec = Arc::new(JsonCodec);
        (TokenRegistry::new(codec.clone()), AccountKeeper::new(codec))
    }

    fn zap() -> Token {
        Token::new("Zap", "ZAP-001", "ZAP", 10, Address::from("alice"), true)
    }

    #[test]
    fn default_genesis_is_empty_and_valid() {
        let state = GenesisState::default();
        assert!(state.is_empty());
        assert!(validate_genesis(&state).is_ok());
    }

    #[test]
    fn validation_names_the_missing_field() {
        let cases: [(fn(&mut Token), &str); 5] = [
            (|t| t.owner = Address::default(), "owner"),
            (|t| t.symbol.clear(), "symbol"),
            (|t| t.total_supply = Coins::new(), "total supply"),
            (|t| t.name.clear(), "name"),
            (|t| t.original_symbol.clear(), "original symbol"),
        ];
        for (mutate, field) in cases {
            let mut token = zap();
            mutate(&mut token);
            let err = validate_genesis(&GenesisState::new(vec![token], vec![])).unwrap_err();
            match err {
                LedgerError::InvalidGenesis { field: f, .. } => assert_eq!(f, field),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let state = GenesisState::new(vec![zap(), zap()], vec![]);
        assert!(matches!(validate_genesis(&state), Err(LedgerError::InvalidGenesis { .. })));
    }

    #[test]
    fn load_then_export_returns_the_records() {
        let (registry, accounts) = keepers();
        let mut store = LedgerStore::new();
        let holder = CustomAccount::with_balances(
            Address::from("alice"),
            Coins::single("ZAP-001", 6),
            Coins::single("ZAP-001", 4),
        );
        let state = GenesisState::new(vec![zap()], vec![holder]);
        init_genesis(&registry, &accounts, &mut store, &state).unwrap();
        assert_eq!(export_genesis(&registry, &accounts, &store).unwrap(), state);
    }

    #[test]
    fn invalid_genesis_writes_nothing() {
        let (registry, accounts) = keepers();
        let mut store = LedgerStore::new();
        let mut bad = zap();
        bad.name.clear();
        let state = GenesisState::new(vec![zap(), bad], vec![]);
        assert!(init_genesis(&registry, &accounts, &mut store, &state).is_err());
        assert_eq!(store, LedgerStore::new());
    }

    #[test]
    fn genesis_without_accounts_field_parses() {
        let json = r#"{"token_records":[]}"#;
        let state: GenesisState = serde_json::from_str(json).unwrap();
        assert!(state.is_empty());
    }
}
