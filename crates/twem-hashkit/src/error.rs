//! Error types for key hashing and canonical key search.

/// Errors that can occur while setting up a keyspace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashkitError {
    /// A router was requested for zero shards.
    #[error("shard count must be positive")]
    NoShards,

    /// The hash tag is not exactly two characters.
    #[error("invalid hash tag {0:?}: expected exactly two characters")]
    InvalidHashTag(String),

    /// The canonical key search ran out of candidates before every shard
    /// had a representative.
    #[error(
        "failed to compute enough canonical keys: wanted {wanted}, got {found} (search amplifier {amplifier})"
    )]
    CanonicalSearchExhausted {
        /// Number of shards that need a canonical key.
        wanted: usize,
        /// Number of shards that got one.
        found: usize,
        /// Amplifier used to bound the search.
        amplifier: u64,
    },
}
