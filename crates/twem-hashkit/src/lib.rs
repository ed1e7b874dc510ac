//! twemproxy-compatible key hashing for client-side sharding.
//!
//! This crate holds the pure routing math shared by every twem component:
//!
//! - [`HashRouter`] maps a key identifier to a shard index using the
//!   nutcracker `md5` distribution (first four digest bytes, little-endian,
//!   modulo the shard count).
//! - [`KeyCodec`] builds `type:{id}` keys and extracts the hash-tagged
//!   identifier back out of them.
//! - [`CanonicalKeyTable`] holds, for every shard, the smallest positive
//!   integer identifier that routes to it.
//! - [`Keyspace`] ties the three together for a fixed shard count.

mod canonical;
mod error;
mod hash;
mod key;
mod keyspace;

pub use canonical::{CanonicalKeyTable, DEFAULT_SEARCH_AMPLIFIER};
pub use error::HashkitError;
pub use hash::HashRouter;
pub use key::{HashTag, KeyCodec};
pub use keyspace::Keyspace;
