//! The Set primitive: a sorted key list plus `open_min`, no payloads.

use bytes::Bytes;

use crate::codec::{write_bool, write_key, Cursor};
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};
use crate::key::{Key, MAX_KEY};
use crate::value::HEADER_SET_EMBED;

#[derive(Debug, Clone)]
pub struct SetPrimitive {
    keys: Vec<Key>,
    open_min: bool,
    dirty: bool,
}

impl SetPrimitive {
    pub fn empty(open_min: bool) -> Self {
        SetPrimitive {
            keys: Vec::new(),
            open_min,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn open_min(&self) -> bool {
        self.open_min
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn contains(&self, key: Key) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    /// Returns whether `key` was already present.
    pub fn add(&mut self, key: Key) -> bool {
        self.dirty = true;
        match self.keys.binary_search(&key) {
            Ok(_) => true,
            Err(i) => {
                self.keys.insert(i, key);
                false
            }
        }
    }

    pub fn delete(&mut self, key: Key) -> bool {
        match self.keys.binary_search(&key) {
            Ok(i) => {
                self.keys.remove(i);
                self.dirty = true;
                true
            }
            Err(_) => false,
        }
    }

    pub fn max(&self) -> Key {
        self.keys.last().copied().unwrap_or(MAX_KEY)
    }

    pub fn in_range(&self, k: Key) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        if self.open_min {
            k <= self.max()
        } else {
            self.keys.first().map_or(false, |&min| k >= min) && k <= self.max()
        }
    }

    pub fn can_delete(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn can_pop_embed(&self, cfg: &BundleConfig) -> bool {
        self.keys.len() > cfg.max_embedded_set_size
    }

    pub fn can_split_shard(&self, cfg: &BundleConfig) -> bool {
        self.keys.len() > cfg.max_shard_set_size
    }

    pub fn split(&mut self) -> SetPrimitive {
        let mid = self.keys.len() / 2;
        let lower_keys = self.keys.drain(..mid).collect();
        let lower = SetPrimitive {
            keys: lower_keys,
            open_min: self.open_min,
            dirty: true,
        };
        self.open_min = false;
        self.dirty = true;
        lower
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = Vec::with_capacity(2 + self.keys.len() * 8);
        buf.push(HEADER_SET_EMBED);
        write_bool(&mut buf, self.open_min);
        for &k in &self.keys {
            write_key(&mut buf, k);
        }
        Bytes::from(buf)
    }

    pub fn from_bytes_read_only(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data)
    }

    pub fn from_bytes_writable(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data)
    }

    fn decode(data: &Bytes) -> BundleResult<Self> {
        let mut cursor = Cursor::new(data);
        let header = cursor.read_u8()?;
        if header != HEADER_SET_EMBED {
            return Err(BundleError::InvalidHeader {
                expected: "embedded set",
                found: header,
            });
        }
        let open_min = cursor.read_bool()?;
        if cursor.remaining() % 8 != 0 {
            return Err(BundleError::corrupt("set key bytes not a multiple of 8"));
        }
        let count = cursor.remaining() / 8;
        let keys = (0..count)
            .map(|_| cursor.read_key())
            .collect::<BundleResult<_>>()?;
        Ok(SetPrimitive {
            keys,
            open_min,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_contains_delete_round_trip() {
        let mut s = SetPrimitive::empty(true);
        assert_eq!(s.add(Key::new(3)), false);
        assert!(s.contains(Key::new(3)));
        assert_eq!(s.add(Key::new(3)), true);
        assert_eq!(s.delete(Key::new(3)), true);
        assert!(!s.contains(Key::new(3)));
    }

    #[test]
    fn serialize_round_trips() {
        let mut s = SetPrimitive::empty(false);
        s.add(Key::new(7));
        s.add(Key::new(1));
        s.add(Key::new(4));
        let bytes = s.serialize();
        let decoded = SetPrimitive::from_bytes_read_only(&bytes).unwrap();
        assert_eq!(decoded.keys(), &[Key::new(1), Key::new(4), Key::new(7)]);
        assert_eq!(decoded.open_min(), false);
    }

    #[test]
    fn split_halves_by_count() {
        let mut s = SetPrimitive::empty(true);
        for i in 1..=10u64 {
            s.add(Key::new(i));
        }
        let lower = s.split();
        assert_eq!(lower.len(), 5);
        assert_eq!(s.len(), 5);
        assert!(lower.open_min());
        assert!(!s.open_min());
    }

    #[test]
    fn threshold_policy_bits() {
        let cfg = BundleConfig::default();
        let mut s = SetPrimitive::empty(true);
        for i in 1..=5u64 {
            s.add(Key::new(i));
        }
        assert!(!s.can_pop_embed(&cfg));
        s.add(Key::new(6));
        assert!(s.can_pop_embed(&cfg));
        for i in 7..=11u64 {
            s.add(Key::new(i));
        }
        assert!(s.can_split_shard(&cfg));
    }
}
