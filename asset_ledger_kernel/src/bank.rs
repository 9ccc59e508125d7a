//! Asset Ledger: Account Keeper
//!
//! Balance store (credit / debit of unfrozen coins) and account-partition
//! store (read / write of both buckets) over the accounts store.
//! Key = raw address bytes, value = encoded `CustomAccount`.
//! Accounts whose buckets are both empty are deleted rather than stored.

use std::sync::Arc;

use crate::account::CustomAccount;
use crate::arithmetic::{checked_sub, Amount};
use crate::codec::RecordCodec;
use crate::domain::Address;
use crate::error::LedgerError;
use crate::store::KvStore;

#[derive(Clone)]
pub struct AccountKeeper {
    codec: Arc<dyn RecordCodec>,
}

impl AccountKeeper {
    pub fn new(codec: Arc<dyn RecordCodec>) -> Self {
        Self { codec }
    }

    /// Load an account; unknown addresses read as empty accounts.
    pub fn account(&self, store: &dyn KvStore, address: &Address) -> Result<CustomAccount, LedgerError> {
        match store.get(address.as_bytes()) {
            Some(bytes) => self.codec.decode_account(&bytes),
            None => Ok(CustomAccount::new(address.clone())),
        }
    }

    pub fn set_account(&self, store: &mut dyn KvStore, account: &CustomAccount) -> Result<(), LedgerError> {
        let key = account.address().as_bytes();
        if account.is_empty() {
            store.delete(key);
            return Ok(());
        }
        let bytes = self.codec.encode_account(account)?;
        store.set(key, bytes);
        Ok(())
    }

    /// Every stored account in raw address byte order.
    pub fn accounts(&self, store: &dyn KvStore) -> Result<Vec<CustomAccount>, LedgerError> {
        Ok(self.entries(store)?.into_iter().map(|(_, account)| account).collect())
    }

    /// Stored accounts paired with their raw keys.
    pub fn entries(&self, store: &dyn KvStore) -> Result<Vec<(Vec<u8>, CustomAccount)>, LedgerError> {
        store
            .entries()
            .into_iter()
            .map(|(key, value)| Ok((key, self.codec.decode_account(&value)?)))
            .collect()
    }

    // ── Balance store ──────────────────────────────────────────────

    /// Unfrozen balance of `symbol`.
    pub fn balance(&self, store: &dyn KvStore, address: &Address, symbol: &str) -> Result<Amount, LedgerError> {
        Ok(self.account(store, address)?.unfrozen(symbol))
    }

    /// Add to the unfrozen balance; returns the new balance.
    pub fn credit(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let mut account = self.account(store, address)?;
        let balance = account.base.coins.add_amount(symbol, amount)?;
        self.set_account(store, &account)?;
        Ok(balance)
    }

    /// Subtract from the unfrozen balance; returns the new balance.
    pub fn debit(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let mut account = self.account(store, address)?;
        let available = account.unfrozen(symbol);
        let balance = checked_sub(available, amount).ok_or_else(|| LedgerError::InsufficientBalance {
            address: address.to_string(),
            symbol: symbol.to_string(),
            available,
            requested: amount,
        })?;
        account.set_unfrozen(symbol, balance);
        self.set_account(store, &account)?;
        Ok(balance)
    }

    // ── Partition store ────────────────────────────────────────────

    pub fn unfrozen(&self, store: &dyn KvStore, address: &Address, symbol: &str) -> Result<Amount, LedgerError> {
        self.balance(store, address, symbol)
    }

    pub fn set_unfrozen(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut account = self.account(store, address)?;
        account.set_unfrozen(symbol, amount);
        self.set_account(store, &account)
    }

    pub fn frozen(&self, store: &dyn KvStore, address: &Address, symbol: &str) -> Result<Amount, LedgerError> {
        Ok(self.account(store, address)?.frozen(symbol))
    }

    pub fn set_frozen(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut account = self.account(store, address)?;
        account.set_frozen(symbol, amount);
        self.set_account(store, &account)
    }

    /// Freeze and persist as a single account write. Returns (unfrozen, frozen).
    pub fn freeze(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(Amount, Amount), LedgerError> {
        let mut account = self.account(store, address)?;
        account.freeze(symbol, amount)?;
        self.set_account(store, &account)?;
        Ok((account.unfrozen(symbol), account.frozen(symbol)))
    }

    /// Unfreeze and persist as a single account write. Returns (unfrozen, frozen).
    pub fn unfreeze(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        symbol: &str,
        amount: Amount,
    ) -> Result<(Amount, Amount), LedgerError> {
        let mut account = self.account(store, address)?;
        account.unfreeze(symbol, amount)?;
        self.set_account(store, &account)?;
        Ok((account.unfrozen(symbol), account.frozen(symbol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::store::MemStore;

    fn keeper() -> AccountKeeper {
        AccountKeeper::new(Arc::new(JsonCodec))
    }

    #[test]
    fn credit_then_debit() {
        let bank = keeper();
        let mut store = MemStore::new();
        let alice = Address::from("alice");
        assert_eq!(bank.credit(&mut store, &alice, "ZAP-001", 10).unwrap(), 10);
        assert_eq!(bank.debit(&mut store, &alice, "ZAP-001", 4).unwrap(), 6);
        assert_eq!(bank.balance(&store, &alice, "ZAP-001").unwrap(), 6);
    }

    #[test]
    fn debit_below_zero_fails_without_writing() {
        let bank = keeper();
        let mut store = MemStore::new();
        let alice = Address::from("alice");
        bank.credit(&mut store, &alice, "ZAP-001", 3).unwrap();
        let before = store.clone();
        let err = bank.debit(&mut store, &alice, "ZAP-001", 4).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { available: 3, requested: 4, .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn empty_accounts_are_not_stored() {
        let bank = keeper();
        let mut store = MemStore::new();
        let alice = Address::from("alice");
        bank.credit(&mut store, &alice, "ZAP-001", 3).unwrap();
        bank.debit(&mut store, &alice, "ZAP-001", 3).unwrap();
        assert!(store.is_empty());
        bank.credit(&mut store, &alice, "ZAP-001", 0).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn partition_setters_are_independent() {
        let bank = keeper();
        let mut store = MemStore::new();
        let alice = Address::from("alice");
        bank.set_unfrozen(&mut store, &alice, "ZAP-001", 7).unwrap();
        bank.set_frozen(&mut store, &alice, "ZAP-001", 2).unwrap();
        assert_eq!(bank.unfrozen(&store, &alice, "ZAP-001").unwrap(), 7);
        assert_eq!(bank.frozen(&store, &alice, "ZAP-001").unwrap(), 2);
        assert_eq!(bank.freeze(&mut store, &alice, "ZAP-001", 7).unwrap(), (0, 9));
        assert_eq!(bank.unfreeze(&mut store, &alice, "ZAP-001", 9).unwrap(), (9, 0));
    }
}
