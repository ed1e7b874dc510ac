//! The capability a router holds for each shard.

use crate::command::Command;
use crate::error::StoreError;
use crate::reply::Reply;

/// Executes commands against one shard's backing store.
///
/// Implementations own whatever connection state they need and must be
/// `Send + Sync` so fan-out can run on separate tasks. Timeouts and
/// reconnects are the implementation's business; the router neither
/// retries nor masks errors returned here.
#[async_trait::async_trait]
pub trait ShardConnection: Send + Sync {
    /// Run one command and return the shard's reply.
    async fn execute(&self, command: &Command) -> Result<Reply, StoreError>;
}
