//! Error types for the router.

use twem_store::{CommandName, StoreError};

/// Errors that can occur while building or using a router.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The keyspace could not be set up (bad hash tag, no shards, or the
    /// canonical key search ran out).
    #[error("keyspace configuration error: {0}")]
    Keyspace(#[from] twem_hashkit::HashkitError),

    /// A configuration value is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The number of shard handles does not match the configured shard count.
    #[error("expected {expected} shard handles, got {got}")]
    ShardCountMismatch {
        /// Configured shard count.
        expected: usize,
        /// Handles supplied.
        got: usize,
    },

    /// A shard index outside `[0, num_shards)` was requested.
    #[error("requested invalid shard {shard_num} (cluster has {num_shards} shards)")]
    ShardOutOfRange {
        /// The index asked for.
        shard_num: i64,
        /// Shards in the cluster.
        num_shards: usize,
    },

    /// The command cannot be routed to a single shard by its first argument.
    #[error(
        "cannot call {command} on sharded cluster: use a fan-out operation or a shard handle directly"
    )]
    UnsupportedSharded {
        /// The rejected command.
        command: CommandName,
    },

    /// A command taking several keys was given keys owned by different
    /// shards.
    #[error("cannot call {command} on sharded cluster: keys live on different shards")]
    CrossShardKeys {
        /// The rejected command.
        command: CommandName,
    },

    /// A routed command had no key argument.
    #[error("command {0} has no key to route by")]
    MissingKey(CommandName),

    /// Keys must be UTF-8 to extract their hash-tagged identifier.
    #[error("key is not valid UTF-8")]
    InvalidKey,

    /// The connector could not produce a handle for a shard.
    #[error("failed to connect shard {shard_num} ({shard_name}): {source}")]
    Connect {
        /// Shard index.
        shard_num: usize,
        /// Discoverable shard name.
        shard_name: String,
        /// What the connector reported.
        #[source]
        source: StoreError,
    },

    /// The shard itself reported an error; passed through as-is.
    #[error(transparent)]
    Shard(#[from] StoreError),

    /// A fan-out task panicked or was cancelled.
    #[error("fan-out task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
