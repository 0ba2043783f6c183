//! A [`Bundle`] wraps one primitive (embedded or sharded) plus a
//! write-through cache of child bundles keyed by the parent key that
//! produced them (spec §4.3). Parent bundles own their children outright;
//! there is no back-pointer and no cycle in the logical graph (spec §9).

use std::collections::HashMap;

use bytes::Bytes;

use crate::backend::Transaction;
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};
use crate::iter::BundleIter;
use crate::key::Key;
use crate::primitive::{PrimKind, Primitive};
use crate::sharded::{commit_shard, ShardedBundle};
use crate::value::{header_byte, make_pointer, StoredValue};

enum BundleRepr<T: Transaction> {
    Embedded(Primitive),
    Sharded(ShardedBundle<T>),
}

pub struct Bundle<T: Transaction> {
    kind: PrimKind,
    repr: BundleRepr<T>,
    cache: HashMap<Key, Box<Bundle<T>>>,
    config: BundleConfig,
}

impl<T: Transaction> Bundle<T> {
    /// Constructs a bundle of `kind` seeded from `data` — empty for a
    /// fresh collection, a pointer's 9 bytes to open a `ShardedBundle`,
    /// or embedded primitive bytes to decode in place.
    pub fn new(txn: &T, kind: PrimKind, config: BundleConfig, data: &StoredValue) -> BundleResult<Self> {
        let repr = match (kind.pointer_header(), kind.table_byte(), header_byte(data)) {
            (Some(ptr_header), Some(table_byte), Some(found)) if found == ptr_header => {
                let shard_id = crate::value::pointer_shard_id(data);
                BundleRepr::Sharded(ShardedBundle::open(txn, kind, table_byte, shard_id)?)
            }
            _ => BundleRepr::Embedded(kind.decode(data, txn.can_write())?),
        };
        Ok(Bundle {
            kind,
            repr,
            cache: HashMap::new(),
            config,
        })
    }

    pub fn kind(&self) -> PrimKind {
        self.kind
    }

    /// The primitive covering `key`, resolving a shard lookup if needed.
    fn primitive_mut(&mut self, txn: &T, key: Key) -> BundleResult<&mut Primitive> {
        match &mut self.repr {
            BundleRepr::Embedded(p) => Ok(p),
            BundleRepr::Sharded(sb) => {
                let anchor = sb.lookup_shard(txn, key)?;
                Ok(sb.cache_mut(anchor))
            }
        }
    }

    pub fn read(&mut self, txn: &T, key: Key) -> BundleResult<(Option<Bytes>, bool)> {
        match &mut self.repr {
            BundleRepr::Embedded(p) => Ok(p.read(key)),
            BundleRepr::Sharded(sb) => sb.read(txn, key),
        }
    }

    pub fn write(&mut self, txn: &T, key: Key, value: Bytes) -> BundleResult<bool> {
        if !txn.can_write() {
            return Err(BundleError::ReadOnlyViolation);
        }
        match &mut self.repr {
            BundleRepr::Embedded(p) => Ok(p.write(key, value)),
            BundleRepr::Sharded(sb) => sb.write(txn, key, value),
        }
    }

    pub fn delete(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        if !txn.can_write() {
            return Err(BundleError::ReadOnlyViolation);
        }
        match &mut self.repr {
            BundleRepr::Embedded(p) => Ok(p.delete(key)),
            BundleRepr::Sharded(sb) => sb.delete(txn, key),
        }
    }

    /// An iterator over every logical data key in ascending order.
    pub fn iterator<'t>(&'t mut self, txn: &'t T) -> Box<dyn BundleIter + 't> {
        match &mut self.repr {
            BundleRepr::Embedded(p) => {
                let mut keys = p.keys();
                keys.sort();
                Box::new(crate::iter::ListIter::new(keys))
            }
            BundleRepr::Sharded(sb) => Box::new(sb.key_iter(txn)),
        }
    }

    /// Traverses `keys` from `self`, assuming the cycle of intermediate
    /// decoders `cycle` for every step but the last, which uses `final_kind`
    /// (spec §4.3). The child cache makes repeat traversals idempotent:
    /// the same path returns the same `Bundle`, so mutations accumulate.
    pub fn find_bundle_with_cycle(
        &mut self,
        txn: &T,
        final_kind: PrimKind,
        cycle: &[PrimKind],
        keys: &[Key],
    ) -> BundleResult<&mut Bundle<T>> {
        let mut current = self;
        for (i, &k) in keys.iter().enumerate() {
            let target = if i == keys.len() - 1 {
                final_kind
            } else {
                cycle[i % cycle.len()]
            };
            let (state, _) = current.primitive_mut(txn, k)?.read(k);
            let config = current.config;
            if !current.cache.contains_key(&k) {
                let seed = state.unwrap_or_default();
                let child = Bundle::new(txn, target, config, &seed)?;
                current.cache.insert(k, Box::new(child));
            }
            current = &mut **current.cache.get_mut(&k).expect("just inserted");
        }
        Ok(current)
    }

    pub fn find_bundle(&mut self, txn: &T, final_kind: PrimKind, keys: &[Key]) -> BundleResult<&mut Bundle<T>> {
        self.find_bundle_with_cycle(txn, final_kind, &[PrimKind::Map], keys)
    }

    /// Postorder commit (spec §4.5): children commit first; if a child
    /// surfaces a new inline value (serialized embedded bytes, or a
    /// freshly issued pointer after pop-embed), the parent writes it back
    /// into its own primitive before committing itself.
    pub fn commit(&mut self, txn: &T) -> BundleResult<Option<StoredValue>> {
        let mut to_write = Vec::new();
        for (&key, child) in self.cache.iter_mut() {
            if let Some(new_state) = child.commit(txn)? {
                to_write.push((key, new_state));
            }
        }
        for (key, new_state) in to_write {
            self.primitive_mut(txn, key)?.write(key, new_state);
        }

        match &mut self.repr {
            BundleRepr::Embedded(p) => {
                if !p.is_dirty() {
                    return Ok(None);
                }
                if p.can_pop_embed(&self.config) {
                    let table_byte = self
                        .kind
                        .table_byte()
                        .expect("only pop-embeddable kinds report can_pop_embed");
                    let shard_id = txn.next_shard_seq();
                    let prefix = {
                        let mut v = vec![table_byte];
                        v.extend_from_slice(&shard_id);
                        v
                    };
                    let moved = std::mem::replace(p, self.kind.new_primitive());
                    log::debug!(
                        "{:?} bundle popped out of its parent embedding into shard family {:?}",
                        self.kind,
                        shard_id
                    );
                    commit_shard(txn, moved, &prefix, crate::key::MAX_KEY, &self.config)?;
                    let pointer_header = self.kind.pointer_header().expect("checked above");
                    Ok(Some(make_pointer(pointer_header, shard_id)))
                } else {
                    let bytes = p.serialize();
                    p.mark_clean();
                    Ok(Some(bytes))
                }
            }
            BundleRepr::Sharded(sb) => {
                sb.commit(txn, &self.config)?;
                Ok(None)
            }
        }
    }
}
