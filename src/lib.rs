//! BundleDB layers ordered collections — maps, sets, double-ended lists,
//! and append-mostly timelines — on top of a transactional ordered
//! key-value store (spec §1). Its central problem is amortizing the
//! per-row overhead of that backing store: small collections are packed
//! ("bundled") into a single row, and a bundle is automatically split into
//! shards once it grows past a tunable threshold. Nested collections share
//! the same machinery through recursive embedding.
//!
//! A production backend adapter is out of scope; this crate only depends
//! on the [`backend::Transaction`]/[`backend::KvIterator`] traits, plus an
//! in-memory reference implementation under [`backend::memory`] used by
//! its own tests.

pub mod backend;
pub mod bundle;
pub mod codec;
pub mod config;
pub mod error;
pub mod iter;
pub mod key;
pub mod overlay;
pub mod primitive;
pub mod root;
pub mod sharded;
pub mod value;
pub mod views;

pub use backend::{KvIterator, Transaction};
pub use bundle::Bundle;
pub use config::BundleConfig;
pub use error::{BundleError, BundleResult};
pub use key::Key;
pub use overlay::{ByteMap, ByteSet, ByteTree};
pub use primitive::PrimKind;
pub use root::Root;
pub use views::{ListView, MapView, SetView, TimelineView};
