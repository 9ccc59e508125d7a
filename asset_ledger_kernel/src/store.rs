//! Asset Ledger: Key-Value Store and Scoped Writes
//!
//! The ledger keeps two stores: tokens (key = raw symbol bytes) and
//! accounts (key = raw address bytes). Values are opaque codec bytes.
//!
//! A request runs against a `ScopedWrites` that buffers every write.
//! The buffer is flushed to the parent stores only on `commit`; dropping
//! or discarding it leaves the parents untouched.

use std::collections::BTreeMap;

use tracing::debug;

/// Ordered byte-keyed store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// All entries in raw key byte order, materialized at call time.
    fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// In-memory store backed by a BTreeMap (byte-order iteration).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn has(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.data.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Write buffer over a parent store. `None` marks a pending delete.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush buffered writes into the parent.
    pub fn write(self) {
        for (key, value) in self.pending {
            match value {
                Some(v) => self.parent.set(&key, v),
                None => self.parent.delete(&key),
            }
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn has(&self, key: &[u8]) -> bool {
        match self.pending.get(key) {
            Some(value) => value.is_some(),
            None => self.parent.has(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.pending.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.entries().into_iter().collect();
        for (key, value) in &self.pending {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Ledger store: the two named stores plus their transaction scope
// ---------------------------------------------------------------------------

/// Committed ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStore {
    pub tokens: MemStore,
    pub accounts: MemStore,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a write scope over both stores.
    pub fn begin(&mut self) -> ScopedWrites<'_> {
        ScopedWrites {
            tokens: CacheStore::new(&mut self.tokens),
            accounts: CacheStore::new(&mut self.accounts),
        }
    }
}

/// Buffered writes of one request.
pub struct ScopedWrites<'a> {
    pub tokens: CacheStore<'a>,
    pub accounts: CacheStore<'a>,
}

impl ScopedWrites<'_> {
    pub fn commit(self) {
        debug!(
            token_writes = self.tokens.pending_len(),
            account_writes = self.accounts.pending_len(),
            "committing scoped writes"
        );
        self.tokens.write();
        self.accounts.write();
    }

    pub fn discard(self) {
        debug!(
            token_writes = self.tokens.pending_len(),
            account_writes = self.accounts.pending_len(),
            "discarding scoped writes"
        );
    }

    /// Commit when `outcome` is Ok, discard otherwise, and pass it through.
    pub fn commit_or_discard<T, E>(self, outcome: Result<T, E>) -> Result<T, E> {
        match outcome {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.discard();
                Err(err)
            }
        }
    }
}
