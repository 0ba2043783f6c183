//! The Tuple primitive: a fixed two-slot node used by the variable-length
//! byte-key overlay to distinguish "value at this prefix" (`LEFT`) from
//! "subtree at this prefix" (`RIGHT`). Tuples are fixed-size metadata: they
//! never split and never pop out of embedding.

use bytes::Bytes;

use crate::codec::{write_u16_le, Cursor};
use crate::error::{BundleError, BundleResult};
use crate::key::{Key, MAX_KEY};
use crate::value::HEADER_TUPLE;

pub const TUPLE_LEFT: Key = Key(0);
pub const TUPLE_RIGHT: Key = Key(1);

#[derive(Debug, Clone, Default)]
pub struct TuplePrimitive {
    left: Option<Bytes>,
    right: Option<Bytes>,
    dirty: bool,
}

impl TuplePrimitive {
    pub fn empty() -> Self {
        TuplePrimitive::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn slot(&self, key: Key) -> Option<&Option<Bytes>> {
        if key == TUPLE_LEFT {
            Some(&self.left)
        } else if key == TUPLE_RIGHT {
            Some(&self.right)
        } else {
            None
        }
    }

    pub fn read(&self, key: Key) -> Option<Bytes> {
        self.slot(key).and_then(|s| s.clone())
    }

    pub fn write(&mut self, key: Key, value: Bytes) -> bool {
        self.dirty = true;
        let slot = if key == TUPLE_LEFT {
            &mut self.left
        } else if key == TUPLE_RIGHT {
            &mut self.right
        } else {
            return false;
        };
        slot.replace(value).is_some()
    }

    pub fn delete(&mut self, key: Key) -> bool {
        let slot = if key == TUPLE_LEFT {
            &mut self.left
        } else if key == TUPLE_RIGHT {
            &mut self.right
        } else {
            return false;
        };
        self.dirty = true;
        slot.take().is_some()
    }

    pub fn keys(&self) -> Vec<Key> {
        let mut out = Vec::new();
        if self.left.is_some() {
            out.push(TUPLE_LEFT);
        }
        if self.right.is_some() {
            out.push(TUPLE_RIGHT);
        }
        out
    }

    /// Tuples never shard, so this sentinel is never used as a real anchor.
    pub fn max(&self) -> Key {
        MAX_KEY
    }

    pub fn in_range(&self, _k: Key) -> bool {
        true
    }

    pub fn can_delete(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn can_pop_embed(&self) -> bool {
        false
    }

    pub fn can_split_shard(&self) -> bool {
        false
    }

    pub fn serialize(&self) -> Bytes {
        let left = self.left.clone().unwrap_or_default();
        let right = self.right.clone().unwrap_or_default();
        let mut buf = Vec::with_capacity(3 + left.len() + right.len());
        buf.push(HEADER_TUPLE);
        buf.extend_from_slice(&left);
        buf.extend_from_slice(&right);
        write_u16_le(&mut buf, left.len() as u16);
        Bytes::from(buf)
    }

    pub fn from_bytes_read_only(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, false)
    }

    pub fn from_bytes_writable(data: &Bytes) -> BundleResult<Self> {
        Self::decode(data, true)
    }

    fn decode(data: &Bytes, owned: bool) -> BundleResult<Self> {
        let mut cursor = Cursor::new(data);
        let header = cursor.read_u8()?;
        if header != HEADER_TUPLE {
            return Err(BundleError::InvalidHeader {
                expected: "tuple",
                found: header,
            });
        }
        let left_len = {
            let trailer = cursor.tail(2)?;
            u16::from_le_bytes([trailer[0], trailer[1]]) as usize
        };
        let body = cursor.read_until_tail(2)?;
        if left_len > body.len() {
            return Err(BundleError::corrupt("tuple left length exceeds body"));
        }
        let (left_raw, right_raw) = body.split_at(left_len);
        let wrap = |s: &[u8]| -> Option<Bytes> {
            if s.is_empty() {
                None
            } else if owned {
                Some(Bytes::copy_from_slice(s))
            } else {
                Some(data.slice_ref(s))
            }
        };
        Ok(TuplePrimitive {
            left: wrap(left_raw),
            right: wrap(right_raw),
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_delete_round_trip() {
        let mut t = TuplePrimitive::empty();
        assert_eq!(t.write(TUPLE_LEFT, Bytes::from_static(b"x")), false);
        assert_eq!(t.read(TUPLE_LEFT), Some(Bytes::from_static(b"x")));
        assert_eq!(t.read(TUPLE_RIGHT), None);
        assert_eq!(t.delete(TUPLE_LEFT), true);
        assert_eq!(t.read(TUPLE_LEFT), None);
    }

    #[test]
    fn serialize_round_trips_both_slots() {
        let mut t = TuplePrimitive::empty();
        t.write(TUPLE_LEFT, Bytes::from_static(b"hello"));
        t.write(TUPLE_RIGHT, Bytes::from_static(b"world!"));
        let bytes = t.serialize();
        let decoded = TuplePrimitive::from_bytes_writable(&bytes).unwrap();
        assert_eq!(decoded.read(TUPLE_LEFT), Some(Bytes::from_static(b"hello")));
        assert_eq!(decoded.read(TUPLE_RIGHT), Some(Bytes::from_static(b"world!")));
    }

    #[test]
    fn serialize_round_trips_left_only() {
        let mut t = TuplePrimitive::empty();
        t.write(TUPLE_LEFT, Bytes::from_static(b"only"));
        let bytes = t.serialize();
        let decoded = TuplePrimitive::from_bytes_read_only(&bytes).unwrap();
        assert_eq!(decoded.read(TUPLE_LEFT), Some(Bytes::from_static(b"only")));
        assert_eq!(decoded.read(TUPLE_RIGHT), None);
    }

    #[test]
    fn never_pops_or_splits() {
        let mut t = TuplePrimitive::empty();
        t.write(TUPLE_LEFT, Bytes::from_static(&[0u8; 4096]));
        assert!(!t.can_pop_embed());
        assert!(!t.can_split_shard());
    }
}
