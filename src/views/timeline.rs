//! `TimelineView`: an append-mostly history over the Timeline primitive's
//! `CURRENT`/`CURRENT_KEY`/`PAST` slots (spec §3, §4.6). Setting a key
//! higher than the current one demotes the prior current value into the
//! past map; setting the current key overwrites in place; setting a lower
//! key writes straight into the past map without touching current.

use bytes::Bytes;

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::error::BundleResult;
use crate::iter::{BundleIter, Chain, ListIter};
use crate::key::Key;
use crate::primitive::{PrimKind, TIMELINE_CURRENT, TIMELINE_CURRENT_KEY, TIMELINE_PAST};
use crate::value::{strip_header, wrap_user};

pub struct TimelineView<'b, T: Transaction> {
    bundle: &'b mut Bundle<T>,
}

impl<'b, T: Transaction> TimelineView<'b, T> {
    pub fn new(bundle: &'b mut Bundle<T>) -> Self {
        TimelineView { bundle }
    }

    fn current_key(&mut self, txn: &T) -> BundleResult<Key> {
        let (v, _) = self.bundle.read(txn, TIMELINE_CURRENT_KEY)?;
        Ok(v.map(|b| Key::from_be_slice(&b)).unwrap_or(TIMELINE_CURRENT))
    }

    fn current_val_raw(&mut self, txn: &T) -> BundleResult<Option<Bytes>> {
        let (v, _) = self.bundle.read(txn, TIMELINE_CURRENT)?;
        Ok(v)
    }

    fn past_bundle(&mut self, txn: &T) -> BundleResult<&mut Bundle<T>> {
        self.bundle.find_bundle(txn, PrimKind::Map, &[TIMELINE_PAST])
    }

    pub fn current(&mut self, txn: &T) -> BundleResult<(Option<Bytes>, Key)> {
        let key = self.current_key(txn)?;
        let val = self.current_val_raw(txn)?.map(|v| strip_header(&v));
        Ok((val, key))
    }

    pub fn past(&mut self, txn: &T, key: Key) -> BundleResult<(Option<Bytes>, bool)> {
        let current_key = self.current_key(txn)?;
        if current_key == key {
            let val = self.current_val_raw(txn)?.map(|v| strip_header(&v));
            return Ok((val, true));
        }
        let (val, existed) = self.past_bundle(txn)?.read(txn, key)?;
        Ok((val.map(|v| strip_header(&v)), existed))
    }

    /// Writes `payload` at `key`. Returns whether `key` became (or
    /// remained) the current slot.
    pub fn set(&mut self, txn: &T, key: Key, payload: &[u8]) -> BundleResult<bool> {
        let current_key = self.current_key(txn)?;
        if key > current_key {
            let prior = self.current_val_raw(txn)?;
            if let Some(prior) = &prior {
                if !strip_header(prior).is_empty() {
                    self.past_bundle(txn)?.write(txn, current_key, prior.clone())?;
                }
            }
            self.bundle.write(txn, TIMELINE_CURRENT, wrap_user(payload))?;
            self.bundle
                .write(txn, TIMELINE_CURRENT_KEY, Bytes::copy_from_slice(&key.to_be_bytes()))?;
            return Ok(true);
        }
        if key == current_key {
            self.bundle.write(txn, TIMELINE_CURRENT, wrap_user(payload))?;
            return Ok(true);
        }
        self.past_bundle(txn)?.write(txn, key, wrap_user(payload))?;
        Ok(false)
    }

    /// Appends after the current slot: writes at `currentKey + 1` if
    /// current holds a value, else fills the still-empty current slot.
    pub fn set_next(&mut self, txn: &T, payload: &[u8]) -> BundleResult<bool> {
        let current_key = self.current_key(txn)?;
        let current_val = self.current_val_raw(txn)?;
        if current_val.as_ref().map_or(true, |v| strip_header(v).is_empty()) {
            self.set(txn, current_key, payload)
        } else {
            self.set(txn, current_key.next(), payload)
        }
    }

    pub fn set_latest(&mut self, txn: &T, payload: &[u8]) -> BundleResult<bool> {
        let current_key = self.current_key(txn)?;
        self.set(txn, current_key, payload)
    }

    /// The past map's iterator followed by a singleton for the current key.
    pub fn iterator<'t>(&'t mut self, txn: &'t T) -> BundleResult<Chain<'t>> {
        let current_key = self.current_key(txn)?;
        let past_iter = self.past_bundle(txn)?.iterator(txn);
        let singleton: Box<dyn BundleIter + 't> = Box::new(ListIter::new(vec![current_key]));
        Ok(Chain::new(vec![past_iter, singleton]))
    }
}
