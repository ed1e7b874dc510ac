//! Shard index -> connection handle.

use std::sync::Arc;

use twem_hashkit::Keyspace;
use twem_store::ShardConnection;

use crate::error::RouterError;

/// The live handle for every shard, plus the keyspace that addresses them.
///
/// Populated once at construction and read-only afterwards. Each handle
/// belongs to exactly one slot.
pub struct ShardRegistry {
    keyspace: Keyspace,
    shards: Vec<Arc<dyn ShardConnection>>,
}

impl ShardRegistry {
    /// Pair a keyspace with one handle per shard, in shard order.
    pub fn new(
        keyspace: Keyspace,
        shards: Vec<Arc<dyn ShardConnection>>,
    ) -> Result<Self, RouterError> {
        if shards.len() != keyspace.num_shards() {
            return Err(RouterError::ShardCountMismatch {
                expected: keyspace.num_shards(),
                got: shards.len(),
            });
        }
        Ok(Self { keyspace, shards })
    }

    /// The keyspace used for routing.
    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Always `false` for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// The handle for `shard_num`, or `ShardOutOfRange` outside `[0, N)`.
    pub fn get_by_index(&self, shard_num: i64) -> Result<&Arc<dyn ShardConnection>, RouterError> {
        usize::try_from(shard_num)
            .ok()
            .and_then(|i| self.shards.get(i))
            .ok_or(RouterError::ShardOutOfRange {
                shard_num,
                num_shards: self.shards.len(),
            })
    }

    /// The handle owning `key` (hash-tag aware).
    pub fn get_by_key(&self, key: &str) -> &Arc<dyn ShardConnection> {
        self.shard(self.keyspace.shard_num_by_key(key))
    }

    /// The handle owning a bare key identifier.
    pub fn get_by_key_id(&self, key_id: &str) -> &Arc<dyn ShardConnection> {
        self.shard(self.keyspace.shard_num_by_key_id(key_id))
    }

    /// Iterate `(shard_num, handle)` in shard order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<dyn ShardConnection>)> {
        self.shards.iter().enumerate()
    }

    /// Handle for an index produced by the keyspace, which is always in range.
    pub(crate) fn shard(&self, shard_num: usize) -> &Arc<dyn ShardConnection> {
        &self.shards[shard_num]
    }
}
