//! The five bundle shapes, dispatched through a sum type (spec §9: "Implement
//! as a sum type of five variants plus a dispatch layer" — the
//! alternative to the source's capability-bag interface).

pub mod list;
pub mod map;
pub mod set;
pub mod timeline;
pub mod tuple;

use bytes::Bytes;

use crate::config::BundleConfig;
use crate::error::BundleResult;
use crate::key::Key;
use crate::value::{HEADER_MAP_POINTER, HEADER_SET_POINTER, TABLE_MAP, TABLE_SET};

pub use list::{ListPrimitive, LIST_LEFT, LIST_RIGHT, LIST_START, LIST_TREE};
pub use map::MapPrimitive;
pub use set::SetPrimitive;
pub use timeline::{TimelinePrimitive, TIMELINE_CURRENT, TIMELINE_CURRENT_KEY, TIMELINE_PAST};
pub use tuple::{TuplePrimitive, TUPLE_LEFT, TUPLE_RIGHT};

/// The declared shape of a Bundle, independent of whether the value
/// currently backing it is embedded bytes or a shard-family pointer.
/// Corresponds to the source's `Decoder` — a header-discriminator plus
/// constructor pair, realized here as a plain marker enum rather than a
/// stateful object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimKind {
    Map,
    Set,
    Tuple,
    List,
    Timeline,
}

impl PrimKind {
    /// The pointer header this kind uses when externalized. Only Map and
    /// Set can be pointers (spec §3 invariant 2); everything else is
    /// always embedded.
    pub fn pointer_header(self) -> Option<u8> {
        match self {
            PrimKind::Map => Some(HEADER_MAP_POINTER),
            PrimKind::Set => Some(HEADER_SET_POINTER),
            PrimKind::Tuple | PrimKind::List | PrimKind::Timeline => None,
        }
    }

    /// Whether `value`'s header marks it as a pointer of this kind.
    pub fn is_pointer(self, header: u8) -> bool {
        self.pointer_header() == Some(header)
    }

    /// The row-key prefix byte shards of this kind live under. Distinct
    /// from [`pointer_header`](Self::pointer_header), which tags the
    /// *parent's* inline slot, not the shard rows themselves.
    pub fn table_byte(self) -> Option<u8> {
        match self {
            PrimKind::Map => Some(TABLE_MAP),
            PrimKind::Set => Some(TABLE_SET),
            PrimKind::Tuple | PrimKind::List | PrimKind::Timeline => None,
        }
    }

    /// A fresh, empty in-memory primitive of this kind.
    pub fn new_primitive(self) -> Primitive {
        match self {
            PrimKind::Map => Primitive::Map(MapPrimitive::empty(true)),
            PrimKind::Set => Primitive::Set(SetPrimitive::empty(true)),
            PrimKind::Tuple => Primitive::Tuple(TuplePrimitive::empty()),
            PrimKind::List => Primitive::List(ListPrimitive::empty()),
            PrimKind::Timeline => Primitive::Timeline(TimelinePrimitive::empty()),
        }
    }

    /// Decodes `data` as an embedded primitive of this kind (never a
    /// pointer — callers route pointer-headed values to a `ShardedBundle`
    /// before reaching here). An empty buffer means "not yet written".
    pub fn decode(self, data: &Bytes, writable: bool) -> BundleResult<Primitive> {
        if data.is_empty() {
            return Ok(self.new_primitive());
        }
        Ok(match self {
            PrimKind::Map => Primitive::Map(if writable {
                MapPrimitive::from_bytes_writable(data)?
            } else {
                MapPrimitive::from_bytes_read_only(data)?
            }),
            PrimKind::Set => Primitive::Set(if writable {
                SetPrimitive::from_bytes_writable(data)?
            } else {
                SetPrimitive::from_bytes_read_only(data)?
            }),
            PrimKind::Tuple => Primitive::Tuple(if writable {
                TuplePrimitive::from_bytes_writable(data)?
            } else {
                TuplePrimitive::from_bytes_read_only(data)?
            }),
            PrimKind::List => Primitive::List(if writable {
                ListPrimitive::from_bytes_writable(data)?
            } else {
                ListPrimitive::from_bytes_read_only(data)?
            }),
            PrimKind::Timeline => Primitive::Timeline(if writable {
                TimelinePrimitive::from_bytes_writable(data)?
            } else {
                TimelinePrimitive::from_bytes_read_only(data)?
            }),
        })
    }
}

/// One loaded primitive shard, in whichever of the five shapes its owning
/// Bundle declared.
#[derive(Debug, Clone)]
pub enum Primitive {
    Map(MapPrimitive),
    Set(SetPrimitive),
    Tuple(TuplePrimitive),
    List(ListPrimitive),
    Timeline(TimelinePrimitive),
}

impl Primitive {
    pub fn kind(&self) -> PrimKind {
        match self {
            Primitive::Map(_) => PrimKind::Map,
            Primitive::Set(_) => PrimKind::Set,
            Primitive::Tuple(_) => PrimKind::Tuple,
            Primitive::List(_) => PrimKind::List,
            Primitive::Timeline(_) => PrimKind::Timeline,
        }
    }

    /// `(value, existed)` — mirrors the source's `(Value, bool)` pair
    /// rather than collapsing into `Option`, because Set reports
    /// `(None, true)` on a hit (it stores no payload, only membership).
    pub fn read(&self, key: Key) -> (Option<Bytes>, bool) {
        match self {
            Primitive::Map(p) => {
                let v = p.read(key);
                let existed = v.is_some();
                (v, existed)
            }
            Primitive::Set(p) => (None, p.contains(key)),
            Primitive::Tuple(p) => {
                let v = p.read(key);
                let existed = v.is_some();
                (v, existed)
            }
            Primitive::List(p) => {
                let v = p.read(key);
                let existed = v.is_some();
                (v, existed)
            }
            Primitive::Timeline(p) => {
                let v = p.read(key);
                let existed = v.is_some();
                (v, existed)
            }
        }
    }

    pub fn write(&mut self, key: Key, value: Bytes) -> bool {
        match self {
            Primitive::Map(p) => p.write(key, value),
            Primitive::Set(p) => p.add(key),
            Primitive::Tuple(p) => p.write(key, value),
            Primitive::List(p) => p.write(key, value),
            Primitive::Timeline(p) => p.write(key, value),
        }
    }

    pub fn delete(&mut self, key: Key) -> bool {
        match self {
            Primitive::Map(p) => p.delete(key),
            Primitive::Set(p) => p.delete(key),
            Primitive::Tuple(p) => p.delete(key),
            Primitive::List(p) => p.delete(key),
            Primitive::Timeline(p) => p.delete(key),
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        match self {
            Primitive::Map(p) => p.keys().to_vec(),
            Primitive::Set(p) => p.keys().to_vec(),
            Primitive::Tuple(p) => p.keys(),
            Primitive::List(p) => p.keys(),
            Primitive::Timeline(p) => p.keys(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Primitive::Map(p) => p.is_dirty(),
            Primitive::Set(p) => p.is_dirty(),
            Primitive::Tuple(p) => p.is_dirty(),
            Primitive::List(p) => p.is_dirty(),
            Primitive::Timeline(p) => p.is_dirty(),
        }
    }

    pub fn mark_clean(&mut self) {
        match self {
            Primitive::Map(p) => p.mark_clean(),
            Primitive::Set(p) => p.mark_clean(),
            Primitive::Tuple(p) => p.mark_clean(),
            Primitive::List(p) => p.mark_clean(),
            Primitive::Timeline(p) => p.mark_clean(),
        }
    }

    pub fn max(&self) -> Key {
        match self {
            Primitive::Map(p) => p.max(),
            Primitive::Set(p) => p.max(),
            Primitive::Tuple(p) => p.max(),
            Primitive::List(p) => p.max(),
            Primitive::Timeline(p) => p.max(),
        }
    }

    pub fn in_range(&self, key: Key) -> bool {
        match self {
            Primitive::Map(p) => p.in_range(key),
            Primitive::Set(p) => p.in_range(key),
            Primitive::Tuple(p) => p.in_range(key),
            Primitive::List(p) => p.in_range(key),
            Primitive::Timeline(p) => p.in_range(key),
        }
    }

    pub fn can_delete(&self) -> bool {
        match self {
            Primitive::Map(p) => p.can_delete(),
            Primitive::Set(p) => p.can_delete(),
            Primitive::Tuple(p) => p.can_delete(),
            Primitive::List(p) => p.can_delete(),
            Primitive::Timeline(p) => p.can_delete(),
        }
    }

    pub fn can_pop_embed(&self, cfg: &BundleConfig) -> bool {
        match self {
            Primitive::Map(p) => p.can_pop_embed(cfg),
            Primitive::Set(p) => p.can_pop_embed(cfg),
            Primitive::Tuple(p) => p.can_pop_embed(),
            Primitive::List(p) => p.can_pop_embed(),
            Primitive::Timeline(p) => p.can_pop_embed(),
        }
    }

    pub fn can_split_shard(&self, cfg: &BundleConfig) -> bool {
        match self {
            Primitive::Map(p) => p.can_split_shard(cfg),
            Primitive::Set(p) => p.can_split_shard(cfg),
            Primitive::Tuple(p) => p.can_split_shard(),
            Primitive::List(p) => p.can_split_shard(),
            Primitive::Timeline(p) => p.can_split_shard(),
        }
    }

    /// Splits in place, returning the lower half; the receiver keeps the
    /// upper half. Only ever called on Map/Set (the only kinds whose
    /// `can_split_shard` can be true).
    pub fn split(&mut self) -> Primitive {
        match self {
            Primitive::Map(p) => Primitive::Map(p.split()),
            Primitive::Set(p) => Primitive::Set(p.split()),
            other => unreachable!("{:?} never reports can_split_shard = true", other.kind()),
        }
    }

    pub fn serialize(&self) -> Bytes {
        match self {
            Primitive::Map(p) => p.serialize(),
            Primitive::Set(p) => p.serialize(),
            Primitive::Tuple(p) => p.serialize(),
            Primitive::List(p) => p.serialize(),
            Primitive::Timeline(p) => p.serialize(),
        }
    }

    pub fn as_map(&self) -> Option<&MapPrimitive> {
        match self {
            Primitive::Map(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapPrimitive> {
        match self {
            Primitive::Map(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetPrimitive> {
        match self {
            Primitive::Set(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut SetPrimitive> {
        match self {
            Primitive::Set(p) => Some(p),
            _ => None,
        }
    }
}
