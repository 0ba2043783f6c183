//! The Timeline primitive: an append-mostly history. `CURRENT` holds the
//! latest value's raw (header-tagged) bytes, `CURRENT_KEY` the key it was
//! set at (readable but not a serialized slot — see `Keys()`), and `PAST`
//! the bytes of the inner Map holding every demoted (key, value) pair.
//! Never splits, never pops embed.

use bytes::Bytes;

use crate::codec::write_u16_le;
use crate::error::BundleResult;
use crate::key::{Key, KEY_LENGTH, MAX_KEY};
use crate::value::HEADER_TIMELINE;

pub const TIMELINE_CURRENT: Key = Key(0);
pub const TIMELINE_PAST: Key = Key(1);
pub const TIMELINE_CURRENT_KEY: Key = Key(2);

#[derive(Debug, Clone)]
pub struct TimelinePrimitive {
    current_key: Key,
    current_val: Option<Bytes>,
    past: Option<Bytes>,
    dirty: bool,
}

impl TimelinePrimitive {
    pub fn empty() -> Self {
        TimelinePrimitive {
            current_key: TIMELINE_CURRENT,
            current_val: None,
            past: None,
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn read(&self, key: Key) -> Option<Bytes> {
        match key {
            TIMELINE_CURRENT => self.current_val.clone(),
            TIMELINE_CURRENT_KEY => Some(Bytes::copy_from_slice(&self.current_key.to_be_bytes())),
            TIMELINE_PAST => self.past.clone(),
            _ => None,
        }
    }

    pub fn write(&mut self, key: Key, value: Bytes) -> bool {
        self.dirty = true;
        match key {
            TIMELINE_CURRENT => self.current_val.replace(value).is_some(),
            TIMELINE_CURRENT_KEY => {
                self.current_key = Key::from_be_slice(&value);
                true
            }
            TIMELINE_PAST => self.past.replace(value).is_some(),
            _ => false,
        }
    }

    /// `Delete(TIMELINE_CURRENT)` clears both the current key and value;
    /// `Delete(TIMELINE_PAST)` clears the inner map, leaving it to be
    /// recreated empty on next access.
    pub fn delete(&mut self, key: Key) -> bool {
        self.dirty = true;
        match key {
            TIMELINE_CURRENT => {
                let had = self.current_val.is_some();
                self.current_val = None;
                self.current_key = TIMELINE_CURRENT;
                had
            }
            TIMELINE_PAST => self.past.take().is_some(),
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        vec![TIMELINE_CURRENT, TIMELINE_PAST]
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
        let current_val = self.current_val.clone().unwrap_or_default();
        let past = self.past.clone().unwrap_or_default();
        let mut buf = Vec::with_capacity(1 + current_val.len() + KEY_LENGTH + past.len() + 2);
        buf.push(HEADER_TIMELINE);
        buf.extend_from_slice(&current_val);
        buf.extend_from_slice(&self.current_key.to_be_bytes());
        buf.extend_from_slice(&past);
        write_u16_le(&mut buf, current_val.len() as u16);
        Bytes::from(buf)
    }

    pub fn from_bytes_read_only(data: &Bytes) -> BundleResult<Self> {
        Ok(Self::decode(data, false))
    }

    pub fn from_bytes_writable(data: &Bytes) -> BundleResult<Self> {
        Ok(Self::decode(data, true))
    }

    fn decode(data: &Bytes, owned: bool) -> Self {
        if data.is_empty() {
            return TimelinePrimitive::empty();
        }
        let trailer = &data[data.len() - 2..];
        let current_len = u16::from_le_bytes([trailer[0], trailer[1]]) as usize;

        let body = &data[1..data.len() - 2];
        let current_raw = &body[..current_len];
        let current_key_raw = &body[current_len..current_len + KEY_LENGTH];
        let past_raw = &body[current_len + KEY_LENGTH..];

        let wrap = |s: &[u8]| -> Option<Bytes> {
            if s.is_empty() {
                None
            } else if owned {
                Some(Bytes::copy_from_slice(s))
            } else {
                Some(data.slice_ref(s))
            }
        };

        TimelinePrimitive {
            current_key: Key::from_be_slice(current_key_raw),
            current_val: wrap(current_raw),
            past: wrap(past_raw),
            dirty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_at_zero() {
        let t = TimelinePrimitive::empty();
        assert_eq!(t.read(TIMELINE_CURRENT_KEY), Some(Bytes::copy_from_slice(&TIMELINE_CURRENT.to_be_bytes())));
        assert_eq!(t.read(TIMELINE_CURRENT), None);
    }

    #[test]
    fn write_delete_current_clears_both_fields() {
        let mut t = TimelinePrimitive::empty();
        t.write(TIMELINE_CURRENT, Bytes::from_static(b"\x00v1"));
        t.write(TIMELINE_CURRENT_KEY, Bytes::copy_from_slice(&Key::new(5).to_be_bytes()));
        assert!(t.delete(TIMELINE_CURRENT));
        assert_eq!(t.read(TIMELINE_CURRENT), None);
        assert_eq!(t.read(TIMELINE_CURRENT_KEY), Some(Bytes::copy_from_slice(&TIMELINE_CURRENT.to_be_bytes())));
    }

    #[test]
    fn serialize_round_trips() {
        let mut t = TimelinePrimitive::empty();
        t.write(TIMELINE_CURRENT, Bytes::from_static(b"\x00hi"));
        t.write(TIMELINE_CURRENT_KEY, Bytes::copy_from_slice(&Key::new(9).to_be_bytes()));
        t.write(TIMELINE_PAST, Bytes::from_static(b"\x14\x00"));
        let bytes = t.serialize();
        let decoded = TimelinePrimitive::from_bytes_writable(&bytes).unwrap();
        assert_eq!(decoded.read(TIMELINE_CURRENT), Some(Bytes::from_static(b"\x00hi")));
        assert_eq!(
            decoded.read(TIMELINE_CURRENT_KEY),
            Some(Bytes::copy_from_slice(&Key::new(9).to_be_bytes()))
        );
        assert_eq!(decoded.read(TIMELINE_PAST), Some(Bytes::from_static(b"\x14\x00")));
    }

    #[test]
    fn empty_bytes_resets() {
        let t = TimelinePrimitive::from_bytes_read_only(&Bytes::new()).unwrap();
        assert_eq!(t.read(TIMELINE_CURRENT), None);
    }
}
