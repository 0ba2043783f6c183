//! `SetView`: membership over a `Bundle<T>` of
//! [`PrimKind::Set`](crate::primitive::PrimKind::Set). Sets carry no
//! payload — `Add`/`Contains` only ever move a key in or out of the
//! underlying shard's key list.

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::error::BundleResult;
use crate::iter::BundleIter;
use crate::key::Key;
use crate::value::StoredValue;

pub struct SetView<'b, T: Transaction> {
    bundle: &'b mut Bundle<T>,
}

impl<'b, T: Transaction> SetView<'b, T> {
    pub fn new(bundle: &'b mut Bundle<T>) -> Self {
        SetView { bundle }
    }

    pub fn contains(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        let (_, existed) = self.bundle.read(txn, key)?;
        Ok(existed)
    }

    /// Returns whether `key` was already a member.
    pub fn add(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        self.bundle.write(txn, key, StoredValue::new())
    }

    pub fn remove(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        self.bundle.delete(txn, key)
    }

    pub fn iterator<'t>(&'t mut self, txn: &'t T) -> Box<dyn BundleIter + 't> {
        self.bundle.iterator(txn)
    }
}
