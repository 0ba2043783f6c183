//! Tunable thresholds governing embed-vs-shard and shard-split decisions.
//!
//! The spec's numbers (5/10 for Map and Set, 1920 bytes for Map) are the
//! `Default` values; an embedder backed by a KV store with different
//! per-row economics can retune these without forking the crate.
#[derive(Debug, Clone, Copy)]
pub struct BundleConfig {
    pub max_embedded_map_size: usize,
    pub max_embedded_map_bytes: usize,
    pub max_shard_map_size: usize,
    pub max_embedded_set_size: usize,
    pub max_shard_set_size: usize,
}

impl Default for BundleConfig {
    fn default() -> Self {
        BundleConfig {
            max_embedded_map_size: 5,
            max_embedded_map_bytes: 1920,
            max_shard_map_size: 10,
            max_embedded_set_size: 5,
            max_shard_set_size: 10,
        }
    }
}
