//! Per-shard command execution.
//!
//! This crate defines the [`ShardConnection`] trait a router uses to talk to
//! one shard, the closed [`CommandName`] surface it can send, and the
//! [`Reply`] values that come back. [`MemoryShard`] is an in-memory backend
//! implementing the data-structure commands, used for tests and benchmarks.

mod command;
mod error;
mod glob;
mod memory_store;
mod reply;
mod traits;

pub use command::{Command, CommandName};
pub use error::StoreError;
pub use glob::glob_match;
pub use memory_store::MemoryShard;
pub use reply::Reply;
pub use traits::ShardConnection;
