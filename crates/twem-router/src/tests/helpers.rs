//! Shared test utilities for twem-router tests.

use std::sync::{Arc, Mutex};

use tokio::sync::Barrier;
use twem_store::{Command, CommandName, MemoryShard, Reply, ShardConnection, StoreError};

use crate::config::RouterConfig;
use crate::router::TwemRouter;

pub const NUM_SHARDS: usize = 10;

/// Memory shard that remembers every command it was sent.
#[derive(Default)]
pub struct RecordingShard {
    inner: MemoryShard,
    log: Mutex<Vec<Command>>,
}

impl RecordingShard {
    pub fn commands(&self) -> Vec<Command> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, name: CommandName) -> usize {
        self.commands().iter().filter(|c| c.name == name).count()
    }
}

#[async_trait::async_trait]
impl ShardConnection for RecordingShard {
    async fn execute(&self, command: &Command) -> Result<Reply, StoreError> {
        self.log.lock().unwrap().push(command.clone());
        self.inner.execute(command).await
    }
}

/// Shard whose every command fails with the same error.
pub struct FailingShard(pub StoreError);

#[async_trait::async_trait]
impl ShardConnection for FailingShard {
    async fn execute(&self, _command: &Command) -> Result<Reply, StoreError> {
        Err(self.0.clone())
    }
}

/// Shard that only answers once every shard sharing the barrier has been
/// asked. Sequential fan-out would hang on the first one.
pub struct BarrierShard {
    pub barrier: Arc<Barrier>,
    pub inner: MemoryShard,
}

#[async_trait::async_trait]
impl ShardConnection for BarrierShard {
    async fn execute(&self, command: &Command) -> Result<Reply, StoreError> {
        self.barrier.wait().await;
        self.inner.execute(command).await
    }
}

pub fn config() -> RouterConfig {
    RouterConfig {
        num_shards: NUM_SHARDS,
        ..RouterConfig::default()
    }
}

/// A ten-shard router over recording memory shards.
pub fn recording_router() -> (TwemRouter, Vec<Arc<RecordingShard>>) {
    let shards: Vec<Arc<RecordingShard>> = (0..NUM_SHARDS)
        .map(|_| Arc::new(RecordingShard::default()))
        .collect();
    let handles = shards
        .iter()
        .map(|s| s.clone() as Arc<dyn ShardConnection>)
        .collect();
    let router = TwemRouter::with_shards(&config(), handles).unwrap();
    (router, shards)
}

/// Total commands seen across all shards.
pub fn total_commands(shards: &[Arc<RecordingShard>]) -> usize {
    shards.iter().map(|s| s.commands().len()).sum()
}
