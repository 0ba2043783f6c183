//! The backend contract BundleDB consumes (spec §6). A production adapter
//! over a real transactional KV store is out of scope for this crate (spec
//! §1); BundleDB only depends on these traits, plus the single in-memory
//! reference implementation under [`memory`] used by its own test suite.

use bytes::Bytes;

use crate::error::BundleResult;

/// An ordered cursor over a single key range, scoped to whatever prefix the
/// [`Transaction::new_prefix_iterator`] call that produced it was given.
/// `seek`/`key` operate on the *suffix* past that prefix, mirroring how
/// `ShardedBundle` only ever cares about the anchor-key tail of a shard row.
pub trait KvIterator {
    /// True if the cursor currently points at an entry inside its prefix.
    fn valid(&self) -> bool;

    /// Positions the cursor at the first entry whose suffix is `>= suffix`.
    fn seek(&mut self, suffix: &[u8]);

    /// Advances to the next entry in ascending order.
    fn next(&mut self);

    /// The suffix (key with the iterator's prefix stripped) the cursor
    /// currently points at. Only meaningful while [`valid`](Self::valid).
    fn key(&self) -> &[u8];

    /// The value at the cursor's current position.
    fn value(&self) -> BundleResult<Bytes>;
}

/// The transactional operations the bundle engine drives: point
/// `get`/`set`/`delete` plus prefix-ordered iteration (spec §6).
pub trait Transaction {
    type Iter: KvIterator;

    /// Point read. `Ok(None)` is the documented miss (spec's
    /// `ErrKeyNotFound`); anything else is a genuine backend error.
    fn get(&self, key: &[u8]) -> BundleResult<Option<Bytes>>;

    /// Point write. Must return [`crate::error::BundleError::ReadOnlyViolation`]
    /// if `!self.can_write()`.
    fn set(&self, key: &[u8], value: &[u8]) -> BundleResult<()>;

    /// Point delete. Same read-only contract as [`set`](Self::set).
    fn delete(&self, key: &[u8]) -> BundleResult<()>;

    /// Opens an ordered cursor over every key starting with `prefix`.
    fn new_prefix_iterator(&self, prefix: &[u8]) -> BundleResult<Self::Iter>;

    /// Whether this transaction may `set`/`delete`.
    fn can_write(&self) -> bool;

    /// A monotone-unique 8-byte token for naming a freshly externalized
    /// shard family (spec §4.2, §9). Any source unique per externalization
    /// event within the database's lifetime is acceptable.
    fn next_shard_seq(&self) -> [u8; 8];
}

pub mod memory;
