//! Asset Ledger: Token Registry
//!
//! Single source of truth for token ownership and nominal supply.
//! One entry per symbol: key = raw symbol bytes, value = encoded `Token`.
//!
//! The registry holds no state of its own. Every call names the store it
//! acts on, so the same registry serves committed reads (queries, export)
//! and buffered writes (request handlers).

use std::sync::Arc;

use crate::codec::RecordCodec;
use crate::domain::{Address, Coins, Token};
use crate::error::LedgerError;
use crate::store::KvStore;

#[derive(Clone)]
pub struct TokenRegistry {
    codec: Arc<dyn RecordCodec>,
}

impl TokenRegistry {
    pub fn new(codec: Arc<dyn RecordCodec>) -> Self {
        Self { codec }
    }

    /// Point lookup.
    pub fn get(&self, store: &dyn KvStore, symbol: &str) -> Result<Token, LedgerError> {
        let bytes = store
            .get(symbol.as_bytes())
            .ok_or_else(|| LedgerError::NotFound(symbol.to_string()))?;
        self.codec.decode_token(&bytes)
    }

    /// Create or overwrite the record for `symbol`. The owner must be set.
    pub fn set(
        &self,
        store: &mut dyn KvStore,
        symbol: &str,
        token: &Token,
    ) -> Result<(), LedgerError> {
        if token.owner.is_empty() {
            return Err(LedgerError::InvalidOwner {
                symbol: symbol.to_string(),
            });
        }
        let bytes = self.codec.encode_token(token)?;
        store.set(symbol.as_bytes(), bytes);
        Ok(())
    }

    /// Unconditional removal. Administrative only; no request reaches it.
    pub fn delete(&self, store: &mut dyn KvStore, symbol: &str) {
        store.delete(symbol.as_bytes());
    }

    pub fn exists(&self, store: &dyn KvStore, symbol: &str) -> bool {
        store.has(symbol.as_bytes())
    }

    pub fn resolve_name(&self, store: &dyn KvStore, symbol: &str) -> Result<String, LedgerError> {
        Ok(self.get(store, symbol)?.name)
    }

    pub fn set_name(
        &self,
        store: &mut dyn KvStore,
        symbol: &str,
        name: &str,
    ) -> Result<(), LedgerError> {
        self.update(store, symbol, |token| token.name = name.to_string())
    }

    pub fn has_owner(&self, store: &dyn KvStore, symbol: &str) -> Result<bool, LedgerError> {
        Ok(!self.get(store, symbol)?.owner.is_empty())
    }

    pub fn get_owner(&self, store: &dyn KvStore, symbol: &str) -> Result<Address, LedgerError> {
        Ok(self.get(store, symbol)?.owner)
    }

    pub fn set_owner(
        &self,
        store: &mut dyn KvStore,
        symbol: &str,
        owner: &Address,
    ) -> Result<(), LedgerError> {
        self.update(store, symbol, |token| token.owner = owner.clone())
    }

    pub fn get_total_supply(&self, store: &dyn KvStore, symbol: &str) -> Result<Coins, LedgerError> {
        Ok(self.get(store, symbol)?.total_supply)
    }

    pub fn set_total_supply(
        &self,
        store: &mut dyn KvStore,
        symbol: &str,
        supply: Coins,
    ) -> Result<(), LedgerError> {
        self.update(store, symbol, |token| token.total_supply = supply)
    }

    /// Every record in raw key byte order, from one snapshot of `store`.
    pub fn iterate(&self, store: &dyn KvStore) -> Result<Vec<(String, Token)>, LedgerError> {
        store
            .entries()
            .into_iter()
            .map(|(key, value)| {
                let symbol = String::from_utf8(key).map_err(|e| {
                    LedgerError::SerializationFailure(format!("non-UTF-8 registry key: {}", e))
                })?;
                let token = self.codec.decode_token(&value)?;
                Ok((symbol, token))
            })
            .collect()
    }

    /// Read-modify-write on top of get/set. Propagates NotFound.
    fn update<F>(&self, store: &mut dyn KvStore, symbol: &str, mutate: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut Token),
    {
        let mut token = self.get(store, symbol)?;
        mutate(&mut token);
        self.set(store, symbol, &token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::store::MemStore;

    fn registry() -> TokenRegistry {
        TokenRegistry::new(Arc::new(JsonCodec))
    }

    fn zap(owner: &str) -> Token {
        Token::new("Zap", "ZAP-001", "ZAP", 1, Address::from(owner), false)
    }

    #[test]
    fn get_missing_symbol_is_not_found() {
        let store = MemStore::new();
        assert_eq!(
            registry().get(&store, "ZAP-001"),
            Err(LedgerError::NotFound("ZAP-001".into()))
        );
    }

    #[test]
    fn set_rejects_empty_owner() {
        let mut store = MemStore::new();
        let err = registry().set(&mut store, "ZAP-001", &zap("")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOwner { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn accessors_read_modify_write() {
        let reg = registry();
        let mut store = MemStore::new();
        reg.set(&mut store, "ZAP-001", &zap("alice")).unwrap();

        reg.set_name(&mut store, "ZAP-001", "Zapper").unwrap();
        reg.set_owner(&mut store, "ZAP-001", &Address::from("bob")).unwrap();
        reg.set_total_supply(&mut store, "ZAP-001", Coins::single("ZAP-001", 42)).unwrap();

        assert_eq!(reg.resolve_name(&store, "ZAP-001").unwrap(), "Zapper");
        assert_eq!(reg.get_owner(&store, "ZAP-001").unwrap(), Address::from("bob"));
        assert!(reg.has_owner(&store, "ZAP-001").unwrap());
        assert_eq!(reg.get_total_supply(&store, "ZAP-001").unwrap().amount_of("ZAP-001"), 42);
    }

    #[test]
    fn accessors_propagate_not_found() {
        let reg = registry();
        let mut store = MemStore::new();
        assert!(matches!(reg.set_name(&mut store, "NOPE", "x"), Err(LedgerError::NotFound(_))));
        assert!(matches!(reg.get_owner(&store, "NOPE"), Err(LedgerError::NotFound(_))));
        assert!(matches!(reg.get_total_supply(&store, "NOPE"), Err(LedgerError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn set_owner_to_empty_is_refused() {
        let reg = registry();
        let mut store = MemStore::new();
        reg.set(&mut store, "ZAP-001", &zap("alice")).unwrap();
        let err = reg.set_owner(&mut store, "ZAP-001", &Address::default()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOwner { .. }));
        assert_eq!(reg.get_owner(&store, "ZAP-001").unwrap(), Address::from("alice"));
    }

    #[test]
    fn iterate_is_ordered_and_delete_removes() {
        let reg = registry();
        let mut store = MemStore::new();
        for symbol in ["ZAP-002", "ABC-001", "ZAP-001"] {
            let mut token = zap("alice");
            token.symbol = symbol.to_string();
            reg.set(&mut store, symbol, &token).unwrap();
        }
        let symbols: Vec<String> = reg.iterate(&store).unwrap().into_iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec!["ABC-001", "ZAP-001", "ZAP-002"]);

        reg.delete(&mut store, "ZAP-001");
        assert!(!reg.exists(&store, "ZAP-001"));
        assert_eq!(reg.iterate(&store).unwrap().len(), 2);
    }
}
