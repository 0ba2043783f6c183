//! A pointer-backed collection: a primitive whose shards live as separate
//! backing rows under `table_byte || shard_family_id || anchor_key`
//! (spec §4.4). Holds the family id, a prefix-scoped backend iterator
//! over shard anchors, a cache of loaded shard primitives, and a
//! search-key memo so repeated lookups for the same key skip the
//! backend seek.

use std::collections::HashMap;

use bytes::Bytes;

use crate::backend::{KvIterator, Transaction};
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};
use crate::iter::BundleIter;
use crate::key::Key;
use crate::primitive::{PrimKind, Primitive};

pub struct ShardedBundle<T: Transaction> {
    kind: PrimKind,
    table_byte: u8,
    shard_family_id: [u8; 8],
    iter: T::Iter,
    cache: HashMap<Key, Primitive>,
    search_memo: HashMap<Key, Key>,
    current: Option<Key>,
    writable: bool,
    iter_keys: Vec<Key>,
    iter_idx: usize,
    iter_loaded: bool,
}

fn prefix_for(table_byte: u8, shard_family_id: [u8; 8]) -> Vec<u8> {
    let mut p = Vec::with_capacity(9);
    p.push(table_byte);
    p.extend_from_slice(&shard_family_id);
    p
}

impl<T: Transaction> ShardedBundle<T> {
    pub fn open(
        txn: &T,
        kind: PrimKind,
        table_byte: u8,
        shard_family_id: [u8; 8],
    ) -> BundleResult<Self> {
        let prefix = prefix_for(table_byte, shard_family_id);
        let iter = txn.new_prefix_iterator(&prefix)?;
        Ok(ShardedBundle {
            kind,
            table_byte,
            shard_family_id,
            iter,
            cache: HashMap::new(),
            search_memo: HashMap::new(),
            current: None,
            writable: txn.can_write(),
            iter_keys: Vec::new(),
            iter_idx: 0,
            iter_loaded: false,
        })
    }

    /// Resolves (loading from the backend if necessary) the anchor of the
    /// shard covering `key`, per the lookup algorithm in spec §4.4.
    pub fn lookup_shard(&mut self, txn: &T, key: Key) -> BundleResult<Key> {
        if let Some(anchor) = self.current {
            if self.cache.get(&anchor).map_or(false, |p| p.in_range(key)) {
                return Ok(anchor);
            }
        }
        for (&anchor, prim) in self.cache.iter() {
            if prim.in_range(key) {
                self.current = Some(anchor);
                return Ok(anchor);
            }
        }
        if let Some(&anchor) = self.search_memo.get(&key) {
            if self.cache.contains_key(&anchor) {
                self.current = Some(anchor);
                return Ok(anchor);
            }
        }

        log::warn!("shard lookup for key {} missed cache and memo, falling back to a backend seek", key);
        self.iter.seek(&key.to_be_bytes());
        if !self.iter.valid() {
            return Err(BundleError::corrupt(
                "shard iterator exhausted seeking a key above the open-top shard",
            ));
        }
        let anchor = Key::from_be_slice(self.iter.key());
        if key > anchor {
            return Err(BundleError::corrupt(format!(
                "shard anchor {} is below sought key {}",
                anchor, key
            )));
        }
        if !self.cache.contains_key(&anchor) {
            let raw = self.iter.value()?;
            let prim = if self.writable {
                self.kind.decode(&raw, true)?
            } else {
                self.kind.decode(&raw, false)?
            };
            self.cache.insert(anchor, prim);
        }
        self.search_memo.insert(key, anchor);
        self.search_memo.insert(anchor, anchor);
        self.current = Some(anchor);
        Ok(anchor)
    }

    fn primitive_mut(&mut self, txn: &T, key: Key) -> BundleResult<&mut Primitive> {
        let anchor = self.lookup_shard(txn, key)?;
        Ok(self.cache_mut(anchor))
    }

    /// Direct access to an already-loaded shard by its anchor key. Panics
    /// if `anchor` was never resolved via [`lookup_shard`](Self::lookup_shard) —
    /// callers (`Bundle::commit`'s child write-back step) always resolve
    /// the anchor first.
    pub fn cache_mut(&mut self, anchor: Key) -> &mut Primitive {
        self.cache.get_mut(&anchor).expect("anchor must already be loaded")
    }

    pub fn read(&mut self, txn: &T, key: Key) -> BundleResult<(Option<Bytes>, bool)> {
        Ok(self.primitive_mut(txn, key)?.read(key))
    }

    pub fn write(&mut self, txn: &T, key: Key, value: Bytes) -> BundleResult<bool> {
        Ok(self.primitive_mut(txn, key)?.write(key, value))
    }

    pub fn delete(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        Ok(self.primitive_mut(txn, key)?.delete(key))
    }

    /// Commits every dirty cached shard (spec §4.2 step 1). A sharded
    /// bundle never bubbles a value back up to its parent — it is already
    /// externalized behind an unchanged pointer.
    pub fn commit(&mut self, txn: &T, cfg: &BundleConfig) -> BundleResult<()> {
        if !txn.can_write() {
            return Ok(());
        }
        let prefix = prefix_for(self.table_byte, self.shard_family_id);
        let dirty_anchors: Vec<Key> = self
            .cache
            .iter()
            .filter(|(_, p)| p.is_dirty())
            .map(|(&k, _)| k)
            .collect();
        for anchor in dirty_anchors {
            let prim = self.cache.remove(&anchor).expect("dirty anchor in cache");
            commit_shard(txn, prim, &prefix, anchor, cfg)?;
        }
        Ok(())
    }

    /// Borrows `self` and the transaction for a single ascending traversal
    /// of every data key across the family's shards (spec §4.4, "Shard
    /// iteration").
    pub fn key_iter<'t>(&'t mut self, txn: &'t T) -> ShardKeyIter<'t, T> {
        ShardKeyIter { sb: self, txn }
    }
}

pub fn shard_row_key(prefix: &[u8], key: Key) -> Vec<u8> {
    let mut k = prefix.to_vec();
    k.extend_from_slice(&key.to_be_bytes());
    k
}

/// The postorder shard-commit recursion (spec §4.2 step 1 / source's
/// `commitShard`): delete an emptied non-top shard, split an oversized
/// one and commit both halves, or serialize-and-set otherwise.
pub fn commit_shard<T: Transaction>(
    txn: &T,
    mut prim: Primitive,
    prefix: &[u8],
    key: Key,
    cfg: &BundleConfig,
) -> BundleResult<()> {
    if prim.can_delete() && key != crate::key::MAX_KEY {
        return txn.delete(&shard_row_key(prefix, key));
    }
    if prim.can_split_shard(cfg) {
        let lower = prim.split();
        let lower_anchor = lower.max();
        log::debug!("shard at anchor {} split, lower half anchored at {}", key, lower_anchor);
        commit_shard(txn, prim, prefix, key, cfg)?;
        return commit_shard(txn, lower, prefix, lower_anchor, cfg);
    }
    let bytes = prim.serialize();
    txn.set(&shard_row_key(prefix, key), &bytes)
}

/// Walks shard anchors in ascending order, yielding each shard's data
/// keys in turn (spec §4.4, "Shard iteration"). Resolving shard
/// boundaries can hit the same structural-corruption conditions as
/// `lookup_shard`; since [`BundleIter`] has no fallible surface (it
/// mirrors the source's `BundleIterator`, which panics in this exact
/// spot), we do the same here rather than silently truncating iteration.
pub struct ShardKeyIter<'t, T: Transaction> {
    sb: &'t mut ShardedBundle<T>,
    txn: &'t T,
}

impl<'t, T: Transaction> ShardKeyIter<'t, T> {
    fn load_shard_for(&mut self, key: Key) {
        let anchor = self
            .sb
            .lookup_shard(self.txn, key)
            .expect("shard lookup during iteration must not fail under correct usage");
        let mut keys = self.sb.cache.get(&anchor).expect("just loaded").keys();
        keys.sort();
        self.sb.iter_keys = keys;
        self.sb.iter_loaded = true;
        self.sb.iter_idx = 0;
    }
}

impl<'t, T: Transaction> BundleIter for ShardKeyIter<'t, T> {
    fn valid(&self) -> bool {
        self.sb.iter_loaded && self.sb.iter_idx < self.sb.iter_keys.len()
    }

    fn key(&self) -> Key {
        self.sb.iter_keys[self.sb.iter_idx]
    }

    fn next(&mut self) {
        self.sb.iter_idx += 1;
        if self.sb.iter_idx >= self.sb.iter_keys.len() {
            if let Some(&last) = self.sb.iter_keys.last() {
                let probe = last.next();
                if probe > last {
                    self.load_shard_for(probe);
                }
            }
        }
    }

    fn seek(&mut self, k: Key) {
        if self.sb.iter_loaded {
            if let (Some(&first), Some(&last)) =
                (self.sb.iter_keys.first(), self.sb.iter_keys.last())
            {
                if k >= first && k <= last {
                    self.sb.iter_idx = match self.sb.iter_keys.binary_search(&k) {
                        Ok(i) => i,
                        Err(i) => i,
                    };
                    return;
                }
            }
        }
        self.load_shard_for(k);
        self.sb.iter_idx = match self.sb.iter_keys.binary_search(&k) {
            Ok(i) => i,
            Err(i) => i,
        };
    }
}
