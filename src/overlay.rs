//! The variable-length byte-key overlay (spec §4.6, last bullet): chunks an
//! arbitrary-length byte string into 8-byte [`Key`]s and walks `{Tuple,
//! Map}` alternately so that keys sharing a prefix (`"abcdefgh"` and
//! `"abcdefgh12345678"`) land in different slots — `TupleLeft` holds "the
//! value at this exact length", `TupleRight` descends into a Map of
//! continuations keyed by the next chunk. Fixed-length keys skip the Tuple
//! indictation entirely and walk a plain `{Map}` cycle.
//!
//! The chunk-consuming loop here differs from a literal transliteration of
//! the source: the retrieved Go implementation's `SplitKey` iterates
//! `chunks[:len(chunks)-2]`, silently dropping the second-to-last chunk for
//! any key spanning exactly two or three 8-byte chunks (two keys differing
//! only in that chunk would collide). The module doc's own description —
//! full alternating traversal with no gaps — implies every chunk should
//! contribute to the path; this implementation does that (`chunks[:n-1]`).

use bytes::Bytes;

use crate::backend::Transaction;
use crate::bundle::Bundle;
use crate::config::BundleConfig;
use crate::error::BundleResult;
use crate::key::{Key, KEY_LENGTH};
use crate::primitive::{PrimKind, TUPLE_LEFT, TUPLE_RIGHT};
use crate::root::Root;
use crate::value::{strip_header, wrap_user};

fn chunk_bytes(key: &[u8]) -> Vec<Key> {
    if key.is_empty() {
        return vec![Key::from_bytes(&[])];
    }
    key.chunks(KEY_LENGTH).map(Key::from_bytes).collect()
}

/// Splits `full_key` into a traversal path plus a final lookup key. For
/// `dynamic` trees every non-final chunk contributes a `(TupleRight,
/// chunk)` pair and the path ends with `TupleLeft`; for fixed-length trees
/// the non-final chunks are used directly as successive Map keys.
pub fn split_key(full_key: &[u8], dynamic: bool) -> (Vec<Key>, Key) {
    let chunks = chunk_bytes(full_key);
    let n = chunks.len();
    let mut path = Vec::new();
    if dynamic {
        for &chunk in &chunks[..n - 1] {
            path.push(TUPLE_RIGHT);
            path.push(chunk);
        }
        path.push(TUPLE_LEFT);
    } else {
        path.extend_from_slice(&chunks[..n - 1]);
    }
    (path, chunks[n - 1])
}

/// A `Root` bound to an arbitrary-length-byte-key collection, plus the
/// cycle of intermediate decoders a lookup walks before reaching the final
/// Map or Set.
pub struct ByteTree<T: Transaction> {
    root: Root<T>,
    cycle: Vec<PrimKind>,
    dynamic: bool,
}

impl<T: Transaction> ByteTree<T> {
    pub fn open(
        txn: &T,
        root_key: Key,
        root_kind: PrimKind,
        config: BundleConfig,
        dynamic: bool,
    ) -> BundleResult<Self> {
        let root = Root::open(txn, root_key, root_kind, config)?;
        let cycle = if dynamic {
            vec![PrimKind::Tuple, PrimKind::Map]
        } else {
            vec![PrimKind::Map]
        };
        Ok(ByteTree { root, cycle, dynamic })
    }

    fn locate(&mut self, txn: &T, final_kind: PrimKind, full_key: &[u8]) -> BundleResult<(Key, &mut Bundle<T>)> {
        let (path, key) = split_key(full_key, self.dynamic);
        let bundle = self.root.find_bundle_with_cycle(txn, final_kind, &self.cycle, &path)?;
        Ok((key, bundle))
    }

    pub fn read(&mut self, txn: &T, final_kind: PrimKind, full_key: &[u8]) -> BundleResult<(Option<Bytes>, bool)> {
        let (key, bundle) = self.locate(txn, final_kind, full_key)?;
        bundle.read(txn, key)
    }

    pub fn write(&mut self, txn: &T, final_kind: PrimKind, full_key: &[u8], value: Bytes) -> BundleResult<bool> {
        let (key, bundle) = self.locate(txn, final_kind, full_key)?;
        bundle.write(txn, key, value)
    }

    pub fn delete(&mut self, txn: &T, final_kind: PrimKind, full_key: &[u8]) -> BundleResult<bool> {
        let (key, bundle) = self.locate(txn, final_kind, full_key)?;
        bundle.delete(txn, key)
    }

    pub fn commit(&mut self, txn: &T) -> BundleResult<()> {
        self.root.commit(txn)
    }
}

/// A map keyed by arbitrary-length byte strings.
pub struct ByteMap<T: Transaction> {
    tree: ByteTree<T>,
}

impl<T: Transaction> ByteMap<T> {
    pub fn open(txn: &T, root_key: Key, config: BundleConfig) -> BundleResult<Self> {
        let tree = ByteTree::open(txn, root_key, PrimKind::Tuple, config, true)?;
        Ok(ByteMap { tree })
    }

    /// A map restricted to keys that fit in a single 8-byte chunk, skipping
    /// the Tuple indirection entirely.
    pub fn open_fixed(txn: &T, root_key: Key, config: BundleConfig) -> BundleResult<Self> {
        let tree = ByteTree::open(txn, root_key, PrimKind::Map, config, false)?;
        Ok(ByteMap { tree })
    }

    pub fn lookup(&mut self, txn: &T, full_key: &[u8]) -> BundleResult<(Option<Bytes>, bool)> {
        let (value, existed) = self.tree.read(txn, PrimKind::Map, full_key)?;
        Ok((value.map(|v| strip_header(&v)), existed))
    }

    pub fn insert(&mut self, txn: &T, full_key: &[u8], payload: &[u8]) -> BundleResult<bool> {
        self.tree.write(txn, PrimKind::Map, full_key, wrap_user(payload))
    }

    pub fn remove(&mut self, txn: &T, full_key: &[u8]) -> BundleResult<bool> {
        self.tree.delete(txn, PrimKind::Map, full_key)
    }

    pub fn commit(&mut self, txn: &T) -> BundleResult<()> {
        self.tree.commit(txn)
    }
}

/// A set of arbitrary-length byte strings.
pub struct ByteSet<T: Transaction> {
    tree: ByteTree<T>,
}

impl<T: Transaction> ByteSet<T> {
    pub fn open(txn: &T, root_key: Key, config: BundleConfig) -> BundleResult<Self> {
        let tree = ByteTree::open(txn, root_key, PrimKind::Tuple, config, true)?;
        Ok(ByteSet { tree })
    }

    /// A set restricted to keys that fit in a single 8-byte chunk (a Set
    /// cannot itself carry the intermediate pointer payload a multi-chunk
    /// fixed-length walk would need).
    pub fn open_fixed(txn: &T, root_key: Key, config: BundleConfig) -> BundleResult<Self> {
        let tree = ByteTree::open(txn, root_key, PrimKind::Set, config, false)?;
        Ok(ByteSet { tree })
    }

    pub fn contains(&mut self, txn: &T, full_key: &[u8]) -> BundleResult<bool> {
        let (_, existed) = self.tree.read(txn, PrimKind::Set, full_key)?;
        Ok(existed)
    }

    pub fn add(&mut self, txn: &T, full_key: &[u8]) -> BundleResult<bool> {
        self.tree.write(txn, PrimKind::Set, full_key, Bytes::new())
    }

    pub fn remove(&mut self, txn: &T, full_key: &[u8]) -> BundleResult<bool> {
        self.tree.delete(txn, PrimKind::Set, full_key)
    }

    pub fn commit(&mut self, txn: &T) -> BundleResult<()> {
        self.tree.commit(txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_key_splits_to_single_chunk_path() {
        let (path, last) = split_key(b"hi", true);
        assert_eq!(path, vec![TUPLE_LEFT]);
        assert_eq!(last, Key::from_bytes(b"hi"));
    }

    #[test]
    fn long_key_walks_every_chunk() {
        let key = b"abcdefgh12345678ZZ";
        let (path, last) = split_key(key, true);
        assert_eq!(
            path,
            vec![
                TUPLE_RIGHT,
                Key::from_bytes(b"abcdefgh"),
                TUPLE_RIGHT,
                Key::from_bytes(b"12345678"),
                TUPLE_LEFT,
            ]
        );
        assert_eq!(last, Key::from_bytes(b"ZZ"));
    }

    #[test]
    fn prefix_sharing_keys_take_different_paths() {
        let (path_a, last_a) = split_key(b"abcdefgh", true);
        let (path_b, last_b) = split_key(b"abcdefgh12345678", true);
        assert_ne!((path_a, last_a), (path_b, last_b));
    }

    #[test]
    fn fixed_path_has_no_tuple_markers() {
        let (path, last) = split_key(b"abcdefghijklmnop", false);
        assert_eq!(path, vec![Key::from_bytes(b"abcdefgh")]);
        assert_eq!(last, Key::from_bytes(b"ijklmnop"));
    }
}
