//! Shard selection using nutcracker's md5 distribution.

use md5::{Digest, Md5};

use crate::error::HashkitError;

/// Maps key identifiers onto `[0, num_shards)`.
///
/// The identifier is hashed as text (`"42"` and `42` are the same input),
/// and the first four bytes of the MD5 digest are read as a little-endian
/// `u32` before reduction modulo the shard count. This matches twemproxy's
/// `hash: md5` setting bit for bit; existing clusters depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRouter {
    num_shards: usize,
}

impl HashRouter {
    /// Create a router for `num_shards` shards.
    pub fn new(num_shards: usize) -> Result<Self, HashkitError> {
        if num_shards == 0 {
            return Err(HashkitError::NoShards);
        }
        Ok(Self { num_shards })
    }

    /// Return the shard count this router distributes over.
    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Return the shard index for a key identifier.
    pub fn route(&self, key_id: &str) -> usize {
        (hash_md5(key_id.as_bytes()) as usize) % self.num_shards
    }
}

/// twemproxy's `hash_md5`: the digest's first word in little-endian order.
fn hash_md5(data: &[u8]) -> u32 {
    let digest = Md5::digest(data);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}
