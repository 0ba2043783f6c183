//! The Map primitive: sorted parallel `keys`/`values` arrays with an
//! `open_min` flag, two on-disk encodings (sparse and dense), and
//! binary-searched read/write/delete.

use bytes::Bytes;

use crate::codec::{write_bool, write_key, write_u16_le, Cursor};
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};
use crate::key::{Key, MAX_KEY};
use crate::value::{HEADER_MAP_DENSE, HEADER_MAP_SPARSE};

#[derive(Debug, Clone)]
pub struct MapPrimitive {
    keys: Vec<Key>,
    values: Vec<Bytes>,
    open_min: bool,
    dirty: bool,
}

impl MapPrimitive {
    /// A freshly allocated, empty Map. `open_min` is true for the lowest
    /// (and, until a split happens, only) shard of a family.
    pub fn empty(open_min: bool) -> Self {
        MapPrimitive {
            keys: Vec::new(),
            values: Vec::new(),
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

    /// Logical data keys, ascending.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn search(&self, key: Key) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    pub fn read(&self, key: Key) -> Option<Bytes> {
        self.search(key).ok().map(|i| self.values[i].clone())
    }

    /// Returns whether `key` was already present.
    pub fn write(&mut self, key: Key, value: Bytes) -> bool {
        self.dirty = true;
        match self.search(key) {
            Ok(i) => {
                self.values[i] = value;
                true
            }
            Err(i) => {
                self.keys.insert(i, key);
                self.values.insert(i, value);
                false
            }
        }
    }

    pub fn delete(&mut self, key: Key) -> bool {
        match self.search(key) {
            Ok(i) => {
                self.keys.remove(i);
                self.values.remove(i);
                self.dirty = true;
                true
            }
            Err(_) => false,
        }
    }

    /// Highest key currently present, or [`MAX_KEY`] when empty — the
    /// sentinel the shard-commit recursion reads as "the unbounded upper
    /// shard".
    pub fn max(&self) -> Key {
        self.keys.last().copied().unwrap_or(MAX_KEY)
    }

    /// Whether `k` falls within this shard's covered range. `open_min`
    /// shards cover everything up to and including `max()`.
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
        self.keys.len() > cfg.max_embedded_map_size || self.encoded_len() > cfg.max_embedded_map_bytes
    }

    pub fn can_split_shard(&self, cfg: &BundleConfig) -> bool {
        self.keys.len() > cfg.max_shard_map_size
    }

    fn is_dense(&self) -> bool {
        match (self.keys.first(), self.keys.last()) {
            (Some(&min), Some(&max)) => (max - min) as usize == self.keys.len() - 1,
            _ => false,
        }
    }

    fn encoded_len(&self) -> usize {
        self.serialize().len()
    }

    /// Splits in place: the receiver keeps the *upper* half (and becomes
    /// `open_min = false`), returning a new primitive holding the *lower*
    /// half (which inherits the receiver's original `open_min`).
    pub fn split(&mut self) -> MapPrimitive {
        let mid = self.keys.len() / 2;
        let lower_keys = self.keys.drain(..mid).collect();
        let lower_values = self.values.drain(..mid).collect();
        let lower = MapPrimitive {
            keys: lower_keys,
            values: lower_values,
            open_min: self.open_min,
            dirty: true,
        };
        self.open_min = false;
        self.dirty = true;
        lower
    }

    pub fn serialize(&self) -> Bytes {
        let dense = self.is_dense();
        let mut buf = Vec::new();
        buf.push(if dense { HEADER_MAP_DENSE } else { HEADER_MAP_SPARSE });
        write_bool(&mut buf, self.open_min);
        write_u16_le(&mut buf, self.keys.len() as u16);

        if dense {
            let start = self.keys.first().copied().unwrap_or(Key::new(0));
            write_key(&mut buf, start);
        } else {
            for &k in &self.keys {
                write_key(&mut buf, k);
            }
        }

        let mut sizes = Vec::with_capacity(self.values.len());
        for v in &self.values {
            buf.extend_from_slice(v);
            sizes.push(v.len() as u16);
        }
        for size in sizes {
            write_u16_le(&mut buf, size);
        }
        Bytes::from(buf)
    }

    /// Read-only decode: value payloads alias `data` via `Bytes::slice`, so
    /// `data` must outlive the returned primitive (backed by the
    /// transaction's buffer).
    pub fn from_bytes_read_only(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, false)
    }

    /// Writable decode: value payloads are independently copied out of
    /// `data`, so the result has no lingering borrow on it.
    pub fn from_bytes_writable(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, true)
    }

    fn decode(data: &Bytes, owned: bool) -> BundleResult<Self> {
        let mut cursor = Cursor::new(data);
        let header = cursor.read_u8()?;
        let dense = match header {
            HEADER_MAP_DENSE => true,
            HEADER_MAP_SPARSE => false,
            found => {
                return Err(BundleError::InvalidHeader {
                    expected: "map (sparse or dense)",
                    found,
                })
            }
        };
        let open_min = cursor.read_bool()?;
        let count = cursor.read_u16_le()? as usize;

        let keys: Vec<Key> = if dense {
            let start = cursor.read_key()?;
            (0..count as u64).map(|i| start + i).collect()
        } else {
            (0..count)
                .map(|_| cursor.read_key())
                .collect::<BundleResult<_>>()?
        };

        let payload = cursor.read_until_tail(count * 2)?;
        let sizes: Vec<u16> = (0..count)
            .map(|_| cursor.read_u16_le())
            .collect::<BundleResult<_>>()?;

        let mut values = Vec::with_capacity(count);
        let mut offset = 0usize;
        for size in sizes {
            let size = size as usize;
            if offset + size > payload.len() {
                return Err(BundleError::corrupt("map value payload overruns buffer"));
            }
            let slice = &payload[offset..offset + size];
            values.push(if owned {
                Bytes::copy_from_slice(slice)
            } else {
                data.slice_ref(slice)
            });
            offset += size;
        }

        Ok(MapPrimitive {
            keys,
            values,
            open_min,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn write_read_delete_round_trip() {
        let mut m = MapPrimitive::empty(true);
        assert_eq!(m.write(Key::new(1), v("a")), false);
        assert_eq!(m.read(Key::new(1)), Some(v("a")));
        assert_eq!(m.delete(Key::new(1)), true);
        assert_eq!(m.read(Key::new(1)), None);
        assert_eq!(m.delete(Key::new(1)), false);
    }

    #[test]
    fn write_returns_previous_presence() {
        let mut m = MapPrimitive::empty(true);
        assert_eq!(m.write(Key::new(5), v("a")), false);
        assert_eq!(m.write(Key::new(5), v("b")), true);
        assert_eq!(m.read(Key::new(5)), Some(v("b")));
    }

    #[test]
    fn sparse_round_trips() {
        let mut m = MapPrimitive::empty(false);
        m.write(Key::new(10), v("x"));
        m.write(Key::new(30), v("yy"));
        let bytes = m.serialize();
        let decoded = MapPrimitive::from_bytes_writable(&bytes).unwrap();
        assert_eq!(decoded.keys(), &[Key::new(10), Key::new(30)]);
        assert_eq!(decoded.read(Key::new(10)), Some(v("x")));
        assert_eq!(decoded.read(Key::new(30)), Some(v("yy")));
        assert_eq!(decoded.open_min(), false);
    }

    #[test]
    fn dense_round_trips() {
        let mut m = MapPrimitive::empty(true);
        m.write(Key::new(4), v("a"));
        m.write(Key::new(5), v("b"));
        m.write(Key::new(6), v("c"));
        assert!(m.is_dense());
        let bytes = m.serialize();
        assert_eq!(bytes[0], HEADER_MAP_DENSE);
        let decoded = MapPrimitive::from_bytes_read_only(&bytes).unwrap();
        assert_eq!(decoded.keys(), &[Key::new(4), Key::new(5), Key::new(6)]);
        assert_eq!(decoded.read(Key::new(5)), Some(v("b")));
    }

    #[test]
    fn max_is_sentinel_on_empty() {
        let m = MapPrimitive::empty(true);
        assert_eq!(m.max(), MAX_KEY);
    }

    #[test]
    fn split_halves_by_count() {
        let mut m = MapPrimitive::empty(true);
        for i in 1..=10u64 {
            m.write(Key::new(i), v("x"));
        }
        let lower = m.split();
        assert_eq!(lower.len(), 5);
        assert_eq!(m.len(), 5);
        assert_eq!(lower.open_min(), true);
        assert_eq!(m.open_min(), false);
        assert!(lower.max() < m.max());
    }

    #[test]
    fn threshold_policy_bits() {
        let cfg = BundleConfig::default();
        let mut m = MapPrimitive::empty(true);
        for i in 1..=5u64 {
            m.write(Key::new(i), v("x"));
        }
        assert!(!m.can_pop_embed(&cfg));
        m.write(Key::new(6), v("x"));
        assert!(m.can_pop_embed(&cfg));
        for i in 7..=11u64 {
            m.write(Key::new(i), v("x"));
        }
        assert!(m.can_split_shard(&cfg));
    }

    #[test]
    fn in_range_respects_open_min() {
        let mut low = MapPrimitive::empty(true);
        low.write(Key::new(5), v("a"));
        assert!(low.in_range(Key::new(0)));
        assert!(low.in_range(Key::new(5)));
        assert!(!low.in_range(Key::new(6)));

        let mut high = MapPrimitive::empty(false);
        high.write(Key::new(10), v("a"));
        high.write(Key::new(20), v("b"));
        assert!(!high.in_range(Key::new(9)));
        assert!(high.in_range(Key::new(10)));
        assert!(high.in_range(Key::new(20)));
        assert!(!high.in_range(Key::new(21)));
    }
}
