//! A fixed-size keyspace: codec, router and canonical table together.

use tracing::info;

use crate::canonical::CanonicalKeyTable;
use crate::error::HashkitError;
use crate::hash::HashRouter;
use crate::key::{HashTag, KeyCodec};

/// Everything needed to place a key on a shard.
///
/// Built once; the canonical table is computed eagerly and never changes.
#[derive(Debug, Clone)]
pub struct Keyspace {
    codec: KeyCodec,
    router: HashRouter,
    canonical: CanonicalKeyTable,
}

impl Keyspace {
    /// Build a keyspace, running the canonical key search with `amplifier`.
    pub fn new(num_shards: usize, tag: HashTag, amplifier: u64) -> Result<Self, HashkitError> {
        let router = HashRouter::new(num_shards)?;
        let canonical = CanonicalKeyTable::compute(&router, amplifier)?;
        info!(num_shards, hash_tag = %tag, "keyspace ready");
        Ok(Self {
            codec: KeyCodec::new(tag),
            router,
            canonical,
        })
    }

    /// Number of shards.
    pub fn num_shards(&self) -> usize {
        self.router.num_shards()
    }

    /// The key codec.
    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// The hash router.
    pub fn router(&self) -> &HashRouter {
        &self.router
    }

    /// The canonical key table.
    pub fn canonical_keys(&self) -> &CanonicalKeyTable {
        &self.canonical
    }

    /// Build `type:{id}`.
    pub fn build_key(&self, key_type: &str, key_id: &str) -> String {
        self.codec.build_key(key_type, key_id)
    }

    /// Shard index for a full key (hash-tag aware).
    pub fn shard_num_by_key(&self, key: &str) -> usize {
        self.router.route(self.codec.key_id(key))
    }

    /// Shard index for a bare identifier (no hash-tag extraction).
    pub fn shard_num_by_key_id(&self, key_id: &str) -> usize {
        self.router.route(key_id)
    }

    /// Canonical identifier of the shard `key_id` routes to.
    pub fn canonical_key_id(&self, key_id: &str) -> &str {
        self.canonical.get(self.shard_num_by_key_id(key_id))
    }

    /// Canonical identifier for a shard index.
    pub fn canonical_key_id_for_shard(&self, shard_num: usize) -> Option<&str> {
        self.canonical.for_shard(shard_num)
    }

    /// `type:{canonical id}` for the shard `key_id` lives on.
    ///
    /// `canonical_key("canceled", "123456")` is `"canceled:{18}"` on ten shards.
    pub fn canonical_key(&self, key_type: &str, key_id: &str) -> String {
        self.codec.build_key(key_type, self.canonical_key_id(key_id))
    }
}
