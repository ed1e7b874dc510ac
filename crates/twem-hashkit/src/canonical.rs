//! Canonical key identifiers: one small, known-good identifier per shard.
//!
//! There is no inverse of the hash, so the table is found by probing
//! `1, 2, 3, ...` until every shard has been hit. Keys built from these
//! identifiers give callers a deterministic place for per-shard marker
//! records (a set that must exist once on every shard, for example).

use tracing::debug;

use crate::error::HashkitError;
use crate::hash::HashRouter;

/// Default multiplier for the canonical key search bound.
pub const DEFAULT_SEARCH_AMPLIFIER: u64 = 100;

/// Shard index -> smallest positive integer identifier routing to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKeyTable {
    key_ids: Vec<String>,
}

impl CanonicalKeyTable {
    /// Probe identifiers `1..num_shards² * amplifier` until every shard has
    /// a representative.
    ///
    /// Fails with [`HashkitError::CanonicalSearchExhausted`] when the bound
    /// runs out first, which an amplifier of `0` always does.
    pub fn compute(router: &HashRouter, amplifier: u64) -> Result<Self, HashkitError> {
        let num_shards = router.num_shards();
        let bound = (num_shards as u64)
            .saturating_mul(num_shards as u64)
            .saturating_mul(amplifier);

        let mut slots: Vec<Option<String>> = vec![None; num_shards];
        let mut found = 0;

        for candidate in 1..bound {
            let key_id = candidate.to_string();
            let slot = &mut slots[router.route(&key_id)];
            if slot.is_some() {
                continue;
            }
            *slot = Some(key_id);
            found += 1;
            if found == num_shards {
                debug!(num_shards, probed = candidate, "canonical key search complete");
                break;
            }
        }

        if found != num_shards {
            return Err(HashkitError::CanonicalSearchExhausted {
                wanted: num_shards,
                found,
                amplifier,
            });
        }

        Ok(Self {
            key_ids: slots.into_iter().flatten().collect(),
        })
    }

    /// Return the canonical identifier for a shard, if the index is valid.
    pub fn for_shard(&self, shard_num: usize) -> Option<&str> {
        self.key_ids.get(shard_num).map(String::as_str)
    }

    /// Canonical identifier for a shard index produced by the router.
    ///
    /// # Panics
    ///
    /// If `shard_num` is not below the shard count the table was built for.
    pub(crate) fn get(&self, shard_num: usize) -> &str {
        &self.key_ids[shard_num]
    }

    /// Number of entries (always the shard count).
    pub fn len(&self) -> usize {
        self.key_ids.len()
    }

    /// Always `false`; a table covers at least one shard.
    pub fn is_empty(&self) -> bool {
        self.key_ids.is_empty()
    }

    /// Iterate identifiers in ascending shard order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.key_ids.iter().map(String::as_str)
    }
}
