//! Client-side sharding over a twemproxy-partitioned cluster.
//!
//! [`TwemRouter`] owns one [`ShardConnection`](twem_store::ShardConnection)
//! per shard and exposes the cluster as a single keyspace:
//!
//! - single-key commands are routed by the key's hash-tagged identifier
//!   ([`CommandDispatcher`]),
//! - multi-key work (`MGET`, `MSET`, `KEYS`) is partitioned or broadcast
//!   across shards and run concurrently ([`Fanout`]),
//! - explicit shard access goes through the [`ShardRegistry`].
//!
//! Finding live endpoints for shard names is left to a [`ShardConnector`].

pub mod config;
pub mod connector;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod registry;
pub mod router;

pub use config::{RouterConfig, ShardNameFormat};
pub use connector::{MemoryConnector, ShardConnector};
pub use dispatch::{CommandDispatcher, Denylist};
pub use error::RouterError;
pub use fanout::Fanout;
pub use registry::ShardRegistry;
pub use router::TwemRouter;

#[cfg(test)]
mod tests;
