//! Header-tagged values. Every byte sequence BundleDB stores, embeds, or
//! hands to a caller starts with a one-byte header identifying what kind of
//! thing it is (spec §3). Payloads themselves are `bytes::Bytes`: a cheap,
//! reference-counted, immutable buffer that lets read-only decodes slice
//! into the backend's returned buffer without copying, while writable
//! decodes still get their own independent copy (see `DESIGN.md`, "Zero-copy
//! vs writable decode").

use bytes::Bytes;

pub const HEADER_USER: u8 = 0x00;
pub const HEADER_SET_EMBED: u8 = 0x14;
pub const HEADER_SET_POINTER: u8 = 0x15;
pub const HEADER_MAP_SPARSE: u8 = 0x1E;
pub const HEADER_MAP_POINTER: u8 = 0x1F;
pub const HEADER_MAP_DENSE: u8 = 0x20;
pub const HEADER_TUPLE: u8 = 0x28;
pub const HEADER_LIST: u8 = 0x32;
pub const HEADER_TIMELINE: u8 = 0x3C;

/// Row-key table bytes (spec §6): a distinct namespace from the header
/// bytes above. `TABLE_TOP_LEVEL` prefixes every Root's own row;
/// `TABLE_MAP`/`TABLE_SET` prefix shard rows belonging to a Map or Set
/// family. Exact values are an implementation constant the spec only
/// requires be reserved and distinct.
pub const TABLE_TOP_LEVEL: u8 = 0x01;
pub const TABLE_MAP: u8 = 0x02;
pub const TABLE_SET: u8 = 0x03;

/// An opaque stored value: a primitive's serialized bytes, a pointer
/// (`header || shard-family-id`), or a user payload wrapped with
/// [`HEADER_USER`]. BundleDB never interprets these beyond the header byte;
/// everything after it is caller- or primitive-defined payload.
pub type StoredValue = Bytes;

/// Wraps caller-supplied bytes as a user value (spec §3 header `0x00`).
pub fn wrap_user(payload: &[u8]) -> StoredValue {
    let mut buf = Vec::with_capacity(1 + payload.len());
    buf.push(HEADER_USER);
    buf.extend_from_slice(payload);
    Bytes::from(buf)
}

/// Strips the one-byte header off a stored value, returning the payload.
/// Zero-copy: slices the shared buffer rather than allocating.
pub fn strip_header(value: &StoredValue) -> Bytes {
    value.slice(1..)
}

pub fn header_byte(value: &StoredValue) -> Option<u8> {
    value.first().copied()
}

/// Builds a pointer value: `header || shard_family_id` (spec §3, §4.2).
pub fn make_pointer(header: u8, shard_family_id: [u8; 8]) -> StoredValue {
    let mut buf = Vec::with_capacity(9);
    buf.push(header);
    buf.extend_from_slice(&shard_family_id);
    Bytes::from(buf)
}

/// Reads the 8-byte shard-family id out of a pointer value (bytes 1..=8).
pub fn pointer_shard_id(value: &StoredValue) -> [u8; 8] {
    let mut id = [0u8; 8];
    id.copy_from_slice(&value[1..9]);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_and_strip_round_trips() {
        let wrapped = wrap_user(b"hello");
        assert_eq!(header_byte(&wrapped), Some(HEADER_USER));
        assert_eq!(&strip_header(&wrapped)[..], b"hello");
    }

    #[test]
    fn pointer_round_trips_shard_id() {
        let id = [1, 2, 3, 4, 5, 6, 7, 8];
        let ptr = make_pointer(HEADER_MAP_POINTER, id);
        assert_eq!(header_byte(&ptr), Some(HEADER_MAP_POINTER));
        assert_eq!(pointer_shard_id(&ptr), id);
    }
}
