//! [`TwemRouter`], the sharded client callers talk to.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use twem_hashkit::Keyspace;
use twem_store::{Command, CommandName, Reply, ShardConnection, StoreError};

use crate::config::{RouterConfig, ShardNameFormat};
use crate::connector::ShardConnector;
use crate::dispatch::{CommandDispatcher, Denylist};
use crate::error::RouterError;
use crate::fanout::Fanout;
use crate::registry::ShardRegistry;

/// A client for a cluster of independently addressed shards.
///
/// Built once from a [`RouterConfig`]; the canonical key table and the
/// shard handles are fixed for the router's lifetime.
pub struct TwemRouter {
    registry: Arc<ShardRegistry>,
    dispatcher: CommandDispatcher,
    fanout: Fanout,
    shard_names: ShardNameFormat,
}

impl TwemRouter {
    /// Build a router, asking `connector` for every shard's handle.
    pub async fn connect<C>(config: &RouterConfig, connector: &C) -> Result<Self, RouterError>
    where
        C: ShardConnector + ?Sized,
    {
        let (keyspace, shard_names, denylist) = prepare(config)?;

        let mut shards = Vec::with_capacity(keyspace.num_shards());
        for shard_num in 0..keyspace.num_shards() {
            let shard_name = shard_names.format(shard_num);
            let shard = connector
                .connect(shard_num, &shard_name)
                .await
                .map_err(|source| RouterError::Connect {
                    shard_num,
                    shard_name: shard_name.clone(),
                    source,
                })?;
            shards.push(shard);
        }
        info!(
            num_shards = keyspace.num_shards(),
            sentinels = config.sentinels.len(),
            "connected to all shards"
        );

        Self::assemble(keyspace, shards, shard_names, denylist)
    }

    /// Build a router around handles that are already connected, in shard
    /// order.
    pub fn with_shards(
        config: &RouterConfig,
        shards: Vec<Arc<dyn ShardConnection>>,
    ) -> Result<Self, RouterError> {
        let (keyspace, shard_names, denylist) = prepare(config)?;
        Self::assemble(keyspace, shards, shard_names, denylist)
    }

    fn assemble(
        keyspace: Keyspace,
        shards: Vec<Arc<dyn ShardConnection>>,
        shard_names: ShardNameFormat,
        denylist: Denylist,
    ) -> Result<Self, RouterError> {
        let registry = Arc::new(ShardRegistry::new(keyspace, shards)?);
        Ok(Self {
            dispatcher: CommandDispatcher::new(registry.clone(), denylist),
            fanout: Fanout::new(registry.clone()),
            registry,
            shard_names,
        })
    }

    // ------------------------------------------------------------------
    // Keyspace
    // ------------------------------------------------------------------

    /// Number of shards.
    pub fn num_shards(&self) -> usize {
        self.registry.len()
    }

    /// The keyspace (codec, router and canonical table).
    pub fn keyspace(&self) -> &Keyspace {
        self.registry.keyspace()
    }

    /// Build `type:{id}`.
    pub fn key(&self, key_type: &str, key_id: &str) -> String {
        self.keyspace().build_key(key_type, key_id)
    }

    /// `type:{canonical id}` for the shard `key_id` lives on.
    pub fn canonical_key(&self, key_type: &str, key_id: &str) -> String {
        self.keyspace().canonical_key(key_type, key_id)
    }

    /// Canonical identifier of the shard `key_id` lives on.
    pub fn canonical_key_id(&self, key_id: &str) -> &str {
        self.keyspace().canonical_key_id(key_id)
    }

    /// Canonical identifier for a shard index.
    pub fn canonical_key_id_for_shard(&self, shard_num: usize) -> Option<&str> {
        self.keyspace().canonical_key_id_for_shard(shard_num)
    }

    /// Shard index for a full key.
    pub fn shard_num_by_key(&self, key: &str) -> usize {
        self.keyspace().shard_num_by_key(key)
    }

    /// Shard index for a bare identifier.
    pub fn shard_num_by_key_id(&self, key_id: &str) -> usize {
        self.keyspace().shard_num_by_key_id(key_id)
    }

    /// Discoverable name of shard `shard_num`, e.g. `tdb007`.
    pub fn shard_name(&self, shard_num: usize) -> String {
        self.shard_names.format(shard_num)
    }

    // ------------------------------------------------------------------
    // Shard handles
    // ------------------------------------------------------------------

    /// The registry of shard handles.
    pub fn registry(&self) -> &ShardRegistry {
        &self.registry
    }

    /// Handle for shard `shard_num`; fails outside `[0, num_shards)`.
    pub fn shard_by_num(
        &self,
        shard_num: i64,
    ) -> Result<&Arc<dyn ShardConnection>, RouterError> {
        self.registry.get_by_index(shard_num)
    }

    /// Handle for the shard owning `key`.
    pub fn shard_by_key(&self, key: &str) -> &Arc<dyn ShardConnection> {
        self.registry.get_by_key(key)
    }

    /// Handle for the shard owning a bare identifier.
    pub fn shard_by_key_id(&self, key_id: &str) -> &Arc<dyn ShardConnection> {
        self.registry.get_by_key_id(key_id)
    }

    // ------------------------------------------------------------------
    // Key-routed commands
    // ------------------------------------------------------------------

    /// The commands [`invoke`](Self::invoke) refuses.
    pub fn denylist(&self) -> &Denylist {
        self.dispatcher.denylist()
    }

    /// Run any single-key command on the shard its first argument routes to.
    pub async fn invoke(&self, command: &Command) -> Result<Reply, RouterError> {
        self.dispatcher.invoke(command).await
    }

    /// `GET key`.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, RouterError> {
        let reply = self.call(CommandName::Get, key, &[]).await?;
        Ok(reply.into_optional_bulk()?)
    }

    /// `SET key value`.
    pub async fn set(&self, key: &str, value: impl AsRef<[u8]>) -> Result<(), RouterError> {
        self.call(CommandName::Set, key, &[value.as_ref()])
            .await?
            .into_status()?;
        Ok(())
    }

    /// `DEL key`; returns how many keys were removed.
    pub async fn del(&self, key: &str) -> Result<i64, RouterError> {
        Ok(self.call(CommandName::Del, key, &[]).await?.into_integer()?)
    }

    /// `EXISTS key`.
    pub async fn exists(&self, key: &str) -> Result<bool, RouterError> {
        Ok(self.call(CommandName::Exists, key, &[]).await?.into_integer()? > 0)
    }

    /// `INCR key`.
    pub async fn incr(&self, key: &str) -> Result<i64, RouterError> {
        Ok(self.call(CommandName::Incr, key, &[]).await?.into_integer()?)
    }

    /// `INCRBY key delta`.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, RouterError> {
        let delta = delta.to_string();
        let reply = self
            .call(CommandName::IncrBy, key, &[delta.as_bytes()])
            .await?;
        Ok(reply.into_integer()?)
    }

    /// `HSET key field value`; returns the number of new fields.
    pub async fn hset(
        &self,
        key: &str,
        field: &str,
        value: impl AsRef<[u8]>,
    ) -> Result<i64, RouterError> {
        let reply = self
            .call(CommandName::Hset, key, &[field.as_bytes(), value.as_ref()])
            .await?;
        Ok(reply.into_integer()?)
    }

    /// `HGET key field`.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, RouterError> {
        let reply = self.call(CommandName::Hget, key, &[field.as_bytes()]).await?;
        Ok(reply.into_optional_bulk()?)
    }

    /// `SADD key member`; returns the number of new members.
    pub async fn sadd(&self, key: &str, member: impl AsRef<[u8]>) -> Result<i64, RouterError> {
        let reply = self.call(CommandName::Sadd, key, &[member.as_ref()]).await?;
        Ok(reply.into_integer()?)
    }

    /// `SMEMBERS key`.
    pub async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, RouterError> {
        let reply = self.call(CommandName::Smembers, key, &[]).await?;
        Ok(reply.into_bulk_array()?)
    }

    /// `ZADD key score member`; returns the number of new members.
    pub async fn zadd(
        &self,
        key: &str,
        score: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<i64, RouterError> {
        let score = score.to_string();
        let reply = self
            .call(CommandName::Zadd, key, &[score.as_bytes(), member.as_ref()])
            .await?;
        Ok(reply.into_integer()?)
    }

    /// `ZRANGE key start stop`.
    pub async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, RouterError> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let reply = self
            .call(CommandName::Zrange, key, &[start.as_bytes(), stop.as_bytes()])
            .await?;
        Ok(reply.into_bulk_array()?)
    }

    /// `ZRANGE key start stop WITHSCORES`, as `(member, score)` pairs.
    pub async fn zrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Bytes, f64)>, RouterError> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let flat = self
            .call(
                CommandName::Zrange,
                key,
                &[start.as_bytes(), stop.as_bytes(), b"WITHSCORES".as_slice()],
            )
            .await?
            .into_bulk_array()?;
        if flat.len() % 2 != 0 {
            return Err(StoreError::UnexpectedReply {
                expected: "member/score pairs",
                got: "odd-length array",
            }
            .into());
        }

        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut items = flat.into_iter();
        while let (Some(member), Some(score)) = (items.next(), items.next()) {
            pairs.push((member, parse_score(&score)?));
        }
        Ok(pairs)
    }

    /// `LPUSH key value`; returns the new length.
    pub async fn lpush(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64, RouterError> {
        let reply = self.call(CommandName::Lpush, key, &[value.as_ref()]).await?;
        Ok(reply.into_integer()?)
    }

    /// `LRANGE key start stop`.
    pub async fn lrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, RouterError> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let reply = self
            .call(CommandName::Lrange, key, &[start.as_bytes(), stop.as_bytes()])
            .await?;
        Ok(reply.into_bulk_array()?)
    }

    async fn call(
        &self,
        name: CommandName,
        key: &str,
        rest: &[&[u8]],
    ) -> Result<Reply, RouterError> {
        let command = Command::new(name).arg(key).args(rest);
        self.dispatcher.invoke(&command).await
    }

    // ------------------------------------------------------------------
    // Fan-out
    // ------------------------------------------------------------------

    /// Fetch many keys; results grouped by shard index.
    pub async fn mget<I, K>(
        &self,
        keys: I,
    ) -> Result<BTreeMap<usize, Vec<Option<Bytes>>>, RouterError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.fanout.mget(keys).await
    }

    /// Store many key/value pairs, failing fast on the first shard error.
    pub async fn mset<I, K, V>(&self, pairs: I) -> Result<(), RouterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        self.fanout.mset(pairs).await
    }

    /// `KEYS pattern` on every shard; matches grouped by shard index.
    pub async fn keys(&self, pattern: &str) -> Result<BTreeMap<usize, Vec<Bytes>>, RouterError> {
        self.fanout.keys(pattern).await
    }
}

/// Validate the config and derive the immutable routing state.
fn prepare(config: &RouterConfig) -> Result<(Keyspace, ShardNameFormat, Denylist), RouterError> {
    config.validate()?;
    let keyspace = Keyspace::new(config.num_shards, config.hash_tag()?, config.search_amplifier)?;
    Ok((keyspace, config.shard_names()?, config.denylist()?))
}

fn parse_score(raw: &[u8]) -> Result<f64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::InvalidArgument("score is not a valid float".to_string()))
}
