//! Obtaining a live handle for each shard.

use std::sync::Arc;

use twem_store::{MemoryShard, ShardConnection, StoreError};

/// Resolves a shard to a live connection.
///
/// This is where endpoint discovery lives (asking sentinels which master
/// currently serves `shard_name`, for instance). The router calls it once
/// per shard at construction and keeps the handle for its lifetime.
#[async_trait::async_trait]
pub trait ShardConnector: Send + Sync {
    /// Connect to shard `shard_num`, whose discoverable name is `shard_name`.
    async fn connect(
        &self,
        shard_num: usize,
        shard_name: &str,
    ) -> Result<Arc<dyn ShardConnection>, StoreError>;
}

/// Hands out a fresh [`MemoryShard`] for every shard.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryConnector;

#[async_trait::async_trait]
impl ShardConnector for MemoryConnector {
    async fn connect(
        &self,
        _shard_num: usize,
        _shard_name: &str,
    ) -> Result<Arc<dyn ShardConnection>, StoreError> {
        Ok(Arc::new(MemoryShard::new()))
    }
}
