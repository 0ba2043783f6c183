//! [`Root`]: a top-level [`Bundle`] bound to a backend row
//! `TABLE_TOP_LEVEL || root-key` (spec §4, §6). Driving `Commit` walks the
//! whole tree postorder and, if the root's own primitive produced a new
//! inline value, writes it back under that row.

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::config::BundleConfig;
use crate::error::BundleResult;
use crate::key::Key;
use crate::primitive::PrimKind;
use crate::value::TABLE_TOP_LEVEL;

fn root_row_key(root_key: Key) -> Vec<u8> {
    let mut k = vec![TABLE_TOP_LEVEL];
    k.extend_from_slice(&root_key.to_be_bytes());
    k
}

pub struct Root<T: Transaction> {
    key: Key,
    bundle: Bundle<T>,
}

impl<T: Transaction> Root<T> {
    /// Opens (or initializes) the root bound to `key`, declaring its
    /// top-level shape as `kind`.
    pub fn open(txn: &T, key: Key, kind: PrimKind, config: BundleConfig) -> BundleResult<Self> {
        let state = txn.get(&root_row_key(key))?.unwrap_or_default();
        let bundle = Bundle::new(txn, kind, config, &state)?;
        Ok(Root { key, bundle })
    }

    pub fn bundle(&mut self) -> &mut Bundle<T> {
        &mut self.bundle
    }

    pub fn find_bundle(&mut self, txn: &T, final_kind: PrimKind, keys: &[Key]) -> BundleResult<&mut Bundle<T>> {
        self.bundle.find_bundle(txn, final_kind, keys)
    }

    pub fn find_bundle_with_cycle(
        &mut self,
        txn: &T,
        final_kind: PrimKind,
        cycle: &[PrimKind],
        keys: &[Key],
    ) -> BundleResult<&mut Bundle<T>> {
        self.bundle.find_bundle_with_cycle(txn, final_kind, cycle, keys)
    }

    /// Walks the bundle tree postorder and, if the top-level primitive
    /// produced a new inline value, persists it under this root's row.
    pub fn commit(&mut self, txn: &T) -> BundleResult<()> {
        if let Some(new_state) = self.bundle.commit(txn)? {
            txn.set(&root_row_key(self.key), &new_state)?;
        }
        Ok(())
    }

    /// Releases this root's resources. A no-op beyond dropping caches and
    /// backend iterators, which Rust's ownership already guarantees on
    /// drop; kept as an explicit call so call sites read the same as the
    /// source's every-exit-path `Close()`.
    pub fn close(self) {
        drop(self);
    }
}
