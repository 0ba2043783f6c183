//! An in-memory, `BTreeMap`-backed [`Transaction`] used by BundleDB's own
//! test suite (spec §6 scopes real backend adapters out; this is the one
//! reference implementation the crate ships so its tests have something
//! concrete to drive). Modeled on
//! `storage_engine::memory_engine::MemoryEngine`, adapted from a `HashMap`
//! of pre-collected iterator snapshots to an ordered `BTreeMap` because
//! BundleDB's shard lookup depends on iteration order (see `DESIGN.md`).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::backend::{KvIterator, Transaction};
use crate::error::{BundleError, BundleResult};

#[derive(Default)]
struct Store {
    rows: BTreeMap<Vec<u8>, Bytes>,
}

/// Shared, thread-unsafe-by-design in-memory store. A `MemoryTransaction`
/// borrows the same map; there is no isolation between concurrently open
/// transactions, matching the spec's delegation of MVCC/conflict detection
/// to the backend (out of scope here, spec §1).
pub struct MemoryDatabase {
    store: Arc<Mutex<Store>>,
    shard_seq: AtomicU64,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        MemoryDatabase {
            store: Arc::new(Mutex::new(Store::default())),
            shard_seq: AtomicU64::new(1),
        }
    }

    /// Opens a transaction. `write` mirrors the backend's `CanWrite()`.
    pub fn transaction(&self, write: bool) -> MemoryTransaction {
        MemoryTransaction {
            store: Arc::clone(&self.store),
            write,
            shard_seq: &self.shard_seq,
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MemoryTransaction<'a> {
    store: Arc<Mutex<Store>>,
    write: bool,
    shard_seq: &'a AtomicU64,
}

impl<'a> Transaction for MemoryTransaction<'a> {
    type Iter = MemoryIterator;

    fn get(&self, key: &[u8]) -> BundleResult<Option<Bytes>> {
        let guard = self.store.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.rows.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> BundleResult<()> {
        if !self.write {
            return Err(BundleError::ReadOnlyViolation);
        }
        let mut guard = self.store.lock().unwrap_or_else(|e| e.into_inner());
        guard.rows.insert(key.to_vec(), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> BundleResult<()> {
        if !self.write {
            return Err(BundleError::ReadOnlyViolation);
        }
        let mut guard = self.store.lock().unwrap_or_else(|e| e.into_inner());
        guard.rows.remove(key);
        Ok(())
    }

    fn new_prefix_iterator(&self, prefix: &[u8]) -> BundleResult<Self::Iter> {
        let guard = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let items: Vec<(Vec<u8>, Bytes)> = guard
            .rows
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k[prefix.len()..].to_vec(), v.clone()))
            .collect();
        Ok(MemoryIterator {
            items,
            index: 0,
        })
    }

    fn can_write(&self) -> bool {
        self.write
    }

    fn next_shard_seq(&self) -> [u8; 8] {
        let seq = self.shard_seq.fetch_add(1, Ordering::SeqCst);
        seq.to_be_bytes()
    }
}

pub struct MemoryIterator {
    items: Vec<(Vec<u8>, Bytes)>,
    index: usize,
}

impl KvIterator for MemoryIterator {
    fn valid(&self) -> bool {
        self.index < self.items.len()
    }

    fn seek(&mut self, suffix: &[u8]) {
        self.index = match self.items.binary_search_by(|(k, _)| k.as_slice().cmp(suffix)) {
            Ok(i) => i,
            Err(i) => i,
        };
    }

    fn next(&mut self) {
        self.index += 1;
    }

    fn key(&self) -> &[u8] {
        &self.items[self.index].0
    }

    fn value(&self) -> BundleResult<Bytes> {
        Ok(self.items[self.index].1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_read_delete_round_trip() {
        let db = MemoryDatabase::new();
        let txn = db.transaction(true);
        txn.set(b"foo", b"bar").unwrap();
        assert_eq!(txn.get(b"foo").unwrap().as_deref(), Some(&b"bar"[..]));
        txn.delete(b"foo").unwrap();
        assert_eq!(txn.get(b"foo").unwrap(), None);
    }

    #[test]
    fn read_only_rejects_writes() {
        let db = MemoryDatabase::new();
        let txn = db.transaction(false);
        assert!(matches!(
            txn.set(b"foo", b"bar"),
            Err(BundleError::ReadOnlyViolation)
        ));
    }

    #[test]
    fn prefix_iterator_orders_by_suffix() {
        let db = MemoryDatabase::new();
        let txn = db.transaction(true);
        txn.set(b"p\x00\x00\x00\x00\x00\x00\x00\x02", b"two").unwrap();
        txn.set(b"p\x00\x00\x00\x00\x00\x00\x00\x01", b"one").unwrap();
        txn.set(b"q\x00\x00\x00\x00\x00\x00\x00\x09", b"other").unwrap();

        let mut it = txn.new_prefix_iterator(b"p").unwrap();
        it.seek(b"");
        let mut out = Vec::new();
        while it.valid() {
            out.push(it.value().unwrap());
            it.next();
        }
        assert_eq!(out, vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]);
    }
}
