//! Asset Ledger: Query Service
//!
//! Read-only lookups over the registry. Responses are pretty JSON.

use serde::Serialize;

use crate::domain::Token;
use crate::error::LedgerError;
use crate::registry::TokenRegistry;
use crate::store::KvStore;

pub const QUERY_FIND: &str = "find";
pub const QUERY_SYMBOLS: &str = "symbols";
pub const QUERY_TOKENS: &str = "tokens";

/// Response of the `symbols` path.
pub type QueryResultSymbols = Vec<String>;

/// Response of the `tokens` path.
pub type QueryResultTokens = Vec<Token>;

/// Route a query path such as `["find", "ZAP-001"]`.
pub fn query(registry: &TokenRegistry, tokens: &dyn KvStore, path: &[&str]) -> Result<Vec<u8>, LedgerError> {
    match path {
        [QUERY_FIND, symbol] => to_json(&find_token(registry, tokens, symbol)?),
        [QUERY_SYMBOLS] => to_json(&list_symbols(registry, tokens)?),
        [QUERY_TOKENS] => to_json(&list_tokens(registry, tokens)?),
        _ => Err(LedgerError::UnknownRequest(format!(
            "unknown assetmanagement query endpoint: {}",
            path.join("/")
        ))),
    }
}

pub fn find_token(registry: &TokenRegistry, tokens: &dyn KvStore, symbol: &str) -> Result<Token, LedgerError> {
    registry.get(tokens, symbol)
}

/// Every registered symbol in key order. Empty registry: empty list.
pub fn list_symbols(registry: &TokenRegistry, tokens: &dyn KvStore) -> Result<QueryResultSymbols, LedgerError> {
    Ok(registry.iterate(tokens)?.into_iter().map(|(symbol, _)| symbol).collect())
}

pub fn list_tokens(registry: &TokenRegistry, tokens: &dyn KvStore) -> Result<QueryResultTokens, LedgerError> {
    Ok(registry.iterate(tokens)?.into_iter().map(|(_, token)| token).collect())
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    Ok(serde_json::to_vec_pretty(value)?)
}
