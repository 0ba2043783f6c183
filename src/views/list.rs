//! `ListView`: a double-ended queue built on the List primitive's
//! `LEFT`/`RIGHT` counters plus an inner Map bundle at `TREE` holding the
//! payloads keyed by absolute index (spec §4.6). `LPush` decrements `LEFT`
//! before writing; `RPush` writes before incrementing `RIGHT`; the queue is
//! empty iff `LEFT == RIGHT`.

use bytes::Bytes;

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::error::BundleResult;
use crate::iter::BundleIter;
use crate::key::Key;
use crate::primitive::{PrimKind, LIST_LEFT, LIST_RIGHT, LIST_START, LIST_TREE};
use crate::value::{strip_header, wrap_user};

pub struct ListView<'b, T: Transaction> {
    bundle: &'b mut Bundle<T>,
}

impl<'b, T: Transaction> ListView<'b, T> {
    pub fn new(bundle: &'b mut Bundle<T>) -> Self {
        ListView { bundle }
    }

    fn left_right(&mut self, txn: &T) -> BundleResult<(Key, Key)> {
        let (l, _) = self.bundle.read(txn, LIST_LEFT)?;
        let (r, _) = self.bundle.read(txn, LIST_RIGHT)?;
        let l = l.map(|b| Key::from_be_slice(&b)).unwrap_or(LIST_START);
        let r = r.map(|b| Key::from_be_slice(&b)).unwrap_or(LIST_START);
        Ok((l, r))
    }

    fn tree_bundle(&mut self, txn: &T) -> BundleResult<&mut Bundle<T>> {
        self.bundle.find_bundle(txn, PrimKind::Map, &[LIST_TREE])
    }

    pub fn is_empty(&mut self, txn: &T) -> BundleResult<bool> {
        let (l, r) = self.left_right(txn)?;
        Ok(l == r)
    }

    pub fn len(&mut self, txn: &T) -> BundleResult<u64> {
        let (l, r) = self.left_right(txn)?;
        Ok(r - l)
    }

    pub fn lpush(&mut self, txn: &T, payload: &[u8]) -> BundleResult<()> {
        let (l, _r) = self.left_right(txn)?;
        let new_left = l.prev();
        self.tree_bundle(txn)?.write(txn, new_left, wrap_user(payload))?;
        self.bundle
            .write(txn, LIST_LEFT, Bytes::copy_from_slice(&new_left.to_be_bytes()))?;
        Ok(())
    }

    pub fn rpush(&mut self, txn: &T, payload: &[u8]) -> BundleResult<()> {
        let (_l, r) = self.left_right(txn)?;
        self.tree_bundle(txn)?.write(txn, r, wrap_user(payload))?;
        let new_right = r.next();
        self.bundle
            .write(txn, LIST_RIGHT, Bytes::copy_from_slice(&new_right.to_be_bytes()))?;
        Ok(())
    }

    pub fn lpop(&mut self, txn: &T) -> BundleResult<(Option<Bytes>, bool)> {
        let (l, r) = self.left_right(txn)?;
        if l >= r {
            return Ok((None, false));
        }
        let (val, _) = self.tree_bundle(txn)?.read(txn, l)?;
        self.tree_bundle(txn)?.delete(txn, l)?;
        let new_left = l.next();
        self.bundle
            .write(txn, LIST_LEFT, Bytes::copy_from_slice(&new_left.to_be_bytes()))?;
        Ok((val.map(|v| strip_header(&v)), true))
    }

    pub fn rpop(&mut self, txn: &T) -> BundleResult<(Option<Bytes>, bool)> {
        let (l, r) = self.left_right(txn)?;
        if l >= r {
            return Ok((None, false));
        }
        let k = r.prev();
        let (val, _) = self.tree_bundle(txn)?.read(txn, k)?;
        self.tree_bundle(txn)?.delete(txn, k)?;
        self.bundle
            .write(txn, LIST_RIGHT, Bytes::copy_from_slice(&k.to_be_bytes()))?;
        Ok((val.map(|v| strip_header(&v)), true))
    }

    pub fn lpeek(&mut self, txn: &T, index: u64) -> BundleResult<(Option<Bytes>, bool)> {
        let (l, r) = self.left_right(txn)?;
        if index >= r - l {
            return Ok((None, false));
        }
        let (val, existed) = self.tree_bundle(txn)?.read(txn, l + index)?;
        Ok((val.map(|v| strip_header(&v)), existed))
    }

    pub fn rpeek(&mut self, txn: &T, index: u64) -> BundleResult<(Option<Bytes>, bool)> {
        let (l, r) = self.left_right(txn)?;
        if index >= r - l {
            return Ok((None, false));
        }
        let (val, existed) = self.tree_bundle(txn)?.read(txn, r - (index + 1))?;
        Ok((val.map(|v| strip_header(&v)), existed))
    }

    /// Iterates live elements left-to-right, re-basing the inner Map's
    /// absolute index keys so the first yielded key is `0`.
    pub fn iterator<'t>(&'t mut self, txn: &'t T) -> BundleResult<ListIndexIter<'t>> {
        let (l, _r) = self.left_right(txn)?;
        let inner = self.tree_bundle(txn)?.iterator(txn);
        Ok(ListIndexIter { inner, base: l })
    }
}

pub struct ListIndexIter<'t> {
    inner: Box<dyn BundleIter + 't>,
    base: Key,
}

impl<'t> BundleIter for ListIndexIter<'t> {
    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn key(&self) -> Key {
        Key::new(self.inner.key().0 - self.base.0)
    }

    fn next(&mut self) {
        self.inner.next();
    }

    fn seek(&mut self, k: Key) {
        self.inner.seek(Key::new(self.base.0 + k.0));
    }
}
