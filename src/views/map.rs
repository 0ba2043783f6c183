//! `MapView`: the ordinary key/value map surface over a `Bundle<T>` of
//! [`PrimKind::Map`](crate::primitive::PrimKind::Map). Payloads are wrapped
//! with [`HEADER_USER`](crate::value::HEADER_USER) on write and stripped
//! back to the caller's raw bytes on read, so `Lookup` never leaks the
//! header byte.

use bytes::Bytes;

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::error::BundleResult;
use crate::iter::BundleIter;
use crate::key::Key;
use crate::value::{strip_header, wrap_user};

pub struct MapView<'b, T: Transaction> {
    bundle: &'b mut Bundle<T>,
}

impl<'b, T: Transaction> MapView<'b, T> {
    pub fn new(bundle: &'b mut Bundle<T>) -> Self {
        MapView { bundle }
    }

    /// Looks up `key`, returning the caller's original bytes with the
    /// header stripped.
    pub fn lookup(&mut self, txn: &T, key: Key) -> BundleResult<(Option<Bytes>, bool)> {
        let (value, existed) = self.bundle.read(txn, key)?;
        Ok((value.map(|v| strip_header(&v)), existed))
    }

    /// Writes `payload` at `key`, returning whether `key` was already
    /// present.
    pub fn insert(&mut self, txn: &T, key: Key, payload: &[u8]) -> BundleResult<bool> {
        self.bundle.write(txn, key, wrap_user(payload))
    }

    pub fn remove(&mut self, txn: &T, key: Key) -> BundleResult<bool> {
        self.bundle.delete(txn, key)
    }

    pub fn iterator<'t>(&'t mut self, txn: &'t T) -> Box<dyn BundleIter + 't> {
        self.bundle.iterator(txn)
    }
}
