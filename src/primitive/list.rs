//! The List primitive: a three-slot deque head. `LEFT`/`RIGHT` hold raw
//! 8-byte key counters (not header-tagged values); `TREE` holds whatever
//! bytes the inner payload Map currently serializes to (embedded bytes or
//! a pointer, opaque to this primitive). Never splits, never pops embed —
//! it is fixed-size metadata; the Map under `TREE` is what grows.

use bytes::Bytes;

use crate::error::BundleResult;
use crate::key::{Key, KEY_LENGTH, MAX_KEY};
use crate::value::HEADER_LIST;

pub const LIST_LEFT: Key = Key(0);
pub const LIST_RIGHT: Key = Key(1);
pub const LIST_TREE: Key = Key(2);

/// The deque's initial midpoint, leaving headroom to push in either
/// direction before keys would need to wrap.
pub const LIST_START: Key = Key(u64::MAX / 2);

#[derive(Debug, Clone)]
pub struct ListPrimitive {
    left: Option<Bytes>,
    right: Option<Bytes>,
    tree: Option<Bytes>,
    dirty: bool,
}

impl ListPrimitive {
    pub fn empty() -> Self {
        let mut p = ListPrimitive {
            left: None,
            right: None,
            tree: None,
            dirty: false,
        };
        p.reset();
        p
    }

    fn reset(&mut self) {
        self.left = Some(Bytes::copy_from_slice(&LIST_START.to_be_bytes()));
        self.right = Some(Bytes::copy_from_slice(&LIST_START.to_be_bytes()));
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn read(&self, key: Key) -> Option<Bytes> {
        match key {
            LIST_LEFT => self.left.clone(),
            LIST_RIGHT => self.right.clone(),
            LIST_TREE => self.tree.clone(),
            _ => None,
        }
    }

    pub fn write(&mut self, key: Key, value: Bytes) -> bool {
        self.dirty = true;
        match key {
            LIST_LEFT => self.left.replace(value).is_some(),
            LIST_RIGHT => self.right.replace(value).is_some(),
            LIST_TREE => self.tree.replace(value).is_some(),
            _ => false,
        }
    }

    pub fn delete(&mut self, key: Key) -> bool {
        self.dirty = true;
        match key {
            LIST_LEFT => self.left.take().is_some(),
            LIST_RIGHT => self.right.take().is_some(),
            LIST_TREE => self.tree.take().is_some(),
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        vec![LIST_LEFT, LIST_RIGHT, LIST_TREE]
    }

    pub fn max(&self) -> Key {
        MAX_KEY
    }

    pub fn in_range(&self, _k: Key) -> bool {
        true
    }

    pub fn can_delete(&self) -> bool {
        false
    }

    pub fn can_pop_embed(&self) -> bool {
        false
    }

    pub fn can_split_shard(&self) -> bool {
        false
    }

    pub fn serialize(&self) -> Bytes {
        let left = self
            .left
            .clone()
            .unwrap_or_else(|| Bytes::copy_from_slice(&LIST_START.to_be_bytes()));
        let right = self
            .right
            .clone()
            .unwrap_or_else(|| Bytes::copy_from_slice(&LIST_START.to_be_bytes()));
        let tree = self.tree.clone().unwrap_or_default();
        let mut buf = Vec::with_capacity(1 + 2 * KEY_LENGTH + tree.len());
        buf.push(HEADER_LIST);
        buf.extend_from_slice(&left);
        buf.extend_from_slice(&right);
        buf.extend_from_slice(&tree);
        Bytes::from(buf)
    }

    pub fn from_bytes_read_only(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, false)
    }

    pub fn from_bytes_writable(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, true)
    }

    fn decode(data: &Bytes, owned: bool) -> BundleResult<Self> {
        if data.is_empty() {
            return Ok(ListPrimitive::empty());
        }
        // Skip the header byte (caller has already routed on it).
        let rest = &data[1..];
        let left_raw = &rest[..KEY_LENGTH];
        let right_raw = &rest[KEY_LENGTH..2 * KEY_LENGTH];
        let tree_raw = &rest[2 * KEY_LENGTH..];
        let wrap = |s: &[u8]| -> Bytes {
            if owned {
                Bytes::copy_from_slice(s)
            } else {
                data.slice_ref(s)
            }
        };
        Ok(ListPrimitive {
            left: Some(wrap(left_raw)),
            right: Some(wrap(right_raw)),
            tree: if tree_raw.is_empty() {
                None
            } else {
                Some(wrap(tree_raw))
            },
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_centered() {
        let p = ListPrimitive::empty();
        assert_eq!(p.read(LIST_LEFT), Some(Bytes::copy_from_slice(&LIST_START.to_be_bytes())));
        assert_eq!(p.read(LIST_RIGHT), Some(Bytes::copy_from_slice(&LIST_START.to_be_bytes())));
        assert_eq!(p.read(LIST_TREE), None);
    }

    #[test]
    fn write_read_round_trip_through_serialize() {
        let mut p = ListPrimitive::empty();
        p.write(LIST_LEFT, Bytes::copy_from_slice(&(LIST_START - 1).to_be_bytes()));
        p.write(LIST_TREE, Bytes::from_static(b"\x1e\x01deadbeef"));
        let bytes = p.serialize();
        let decoded = ListPrimitive::from_bytes_writable(&bytes).unwrap();
        assert_eq!(decoded.read(LIST_LEFT), Some(Bytes::copy_from_slice(&(LIST_START - 1).to_be_bytes())));
        assert_eq!(decoded.read(LIST_TREE), Some(Bytes::from_static(b"\x1e\x01deadbeef")));
    }

    #[test]
    fn empty_bytes_resets() {
        let decoded = ListPrimitive::from_bytes_read_only(&Bytes::new()).unwrap();
        assert_eq!(decoded.read(LIST_LEFT), Some(Bytes::copy_from_slice(&LIST_START.to_be_bytes())));
    }

    #[test]
    fn never_pops_or_splits() {
        let p = ListPrimitive::empty();
        assert!(!p.can_pop_embed());
        assert!(!p.can_split_shard());
        assert!(!p.can_delete());
    }
}
