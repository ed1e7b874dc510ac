//! Operations that touch more than one shard.
//!
//! `MGET` and `MSET` are split by owning shard; `KEYS` is broadcast. The
//! per-shard commands run concurrently, one task per shard, and the first
//! failure cancels the rest and is returned as-is.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::debug;
use twem_store::{Command, CommandName, Reply};

use crate::error::RouterError;
use crate::registry::ShardRegistry;

/// Multi-shard operations over a [`ShardRegistry`].
pub struct Fanout {
    registry: Arc<ShardRegistry>,
}

impl Fanout {
    /// Create fan-out operations over `registry`.
    pub fn new(registry: Arc<ShardRegistry>) -> Self {
        Self { registry }
    }

    /// Fetch many keys, one `MGET` per shard that owns any of them.
    ///
    /// Results are grouped by shard index, each group in the order its keys
    /// were given. Shards owning none of the keys are absent.
    pub async fn mget<I, K>(
        &self,
        keys: I,
    ) -> Result<BTreeMap<usize, Vec<Option<Bytes>>>, RouterError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut commands: BTreeMap<usize, Command> = BTreeMap::new();
        for key in keys {
            let key = key.as_ref();
            commands
                .entry(self.registry.keyspace().shard_num_by_key(key))
                .or_insert_with(|| Command::new(CommandName::Mget))
                .args
                .push(Bytes::copy_from_slice(key.as_bytes()));
        }

        debug!(shards = commands.len(), "fanning out mget");
        self.scatter(commands)
            .await?
            .into_iter()
            .map(|(shard_num, reply)| -> Result<_, RouterError> {
                Ok((shard_num, reply.into_optional_bulk_array()?))
            })
            .collect()
    }

    /// Store many key/value pairs, one `MSET` per owning shard.
    ///
    /// Fails on the first shard error; shards that already applied their
    /// part keep it.
    pub async fn mset<I, K, V>(&self, pairs: I) -> Result<(), RouterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut commands: BTreeMap<usize, Command> = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let args = &mut commands
                .entry(self.registry.keyspace().shard_num_by_key(key))
                .or_insert_with(|| Command::new(CommandName::Mset))
                .args;
            args.push(Bytes::copy_from_slice(key.as_bytes()));
            args.push(Bytes::copy_from_slice(value.as_ref()));
        }

        debug!(shards = commands.len(), "fanning out mset");
        self.scatter(commands).await?;
        Ok(())
    }

    /// Run `KEYS pattern` on every shard.
    ///
    /// Matches are returned per shard; every shard has an entry, possibly
    /// empty. Shards hold disjoint keys, so nothing is merged.
    pub async fn keys(&self, pattern: &str) -> Result<BTreeMap<usize, Vec<Bytes>>, RouterError> {
        let command = Command::new(CommandName::Keys).arg(pattern);
        let commands = (0..self.registry.len())
            .map(|shard_num| (shard_num, command.clone()))
            .collect();

        debug!(pattern, shards = self.registry.len(), "broadcasting keys");
        self.scatter(commands)
            .await?
            .into_iter()
            .map(|(shard_num, reply)| -> Result<_, RouterError> {
                Ok((shard_num, reply.into_bulk_array()?))
            })
            .collect()
    }

    /// Run each shard's command on its own task and gather the replies.
    async fn scatter(
        &self,
        commands: BTreeMap<usize, Command>,
    ) -> Result<BTreeMap<usize, Reply>, RouterError> {
        let mut tasks = JoinSet::new();
        for (shard_num, command) in commands {
            let shard = self.registry.shard(shard_num).clone();
            tasks.spawn(async move { (shard_num, shard.execute(&command).await) });
        }

        let mut replies = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (shard_num, reply) = joined?;
            // Returning early drops the JoinSet, which aborts the rest.
            replies.insert(shard_num, reply?);
        }
        Ok(replies)
    }
}
