//! Shared test harness for twem integration tests.
//!
//! Provides [`TestCluster`]: an N-shard in-memory cluster behind a real
//! [`TwemRouter`], built through the same connector path a deployment uses.
//! Every shard is seeded with two marker keys, `shard_num` and
//! `shard_name`, so a test can ask any handle which shard it really is.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use twem_router::{RouterConfig, ShardConnector, TwemRouter};
use twem_store::{Command, CommandName, MemoryShard, Reply, ShardConnection, StoreError};

/// Marker key holding the shard's index.
pub const SHARD_NUM_KEY: &str = "shard_num";
/// Marker key holding the shard's name.
pub const SHARD_NAME_KEY: &str = "shard_name";

// =========================================================================
// Mock shard
// =========================================================================

/// A memory shard that can be taken down.
///
/// While its index is in `down`, every command fails with a connection
/// error, the way a dead master looks to a client.
struct MockShard {
    shard_num: usize,
    backend: Arc<MemoryShard>,
    down: Arc<RwLock<HashSet<usize>>>,
}

#[async_trait]
impl ShardConnection for MockShard {
    async fn execute(&self, command: &Command) -> Result<Reply, StoreError> {
        if self.down.read().await.contains(&self.shard_num) {
            return Err(StoreError::Connection(format!(
                "shard {} is down",
                self.shard_num
            )));
        }
        self.backend.execute(command).await
    }
}

/// Connector that creates a seeded [`MockShard`] per shard and remembers
/// the backends it handed out.
struct SeedingConnector {
    backends: Mutex<Vec<Arc<MemoryShard>>>,
    down: Arc<RwLock<HashSet<usize>>>,
}

#[async_trait]
impl ShardConnector for SeedingConnector {
    async fn connect(
        &self,
        shard_num: usize,
        shard_name: &str,
    ) -> Result<Arc<dyn ShardConnection>, StoreError> {
        let backend = Arc::new(MemoryShard::new());
        let seed = Command::new(CommandName::Mset)
            .arg(SHARD_NUM_KEY)
            .arg(shard_num.to_string())
            .arg(SHARD_NAME_KEY)
            .arg(shard_name);
        backend.execute(&seed).await?;

        self.backends
            .lock()
            .expect("lock poisoned")
            .push(backend.clone());
        Ok(Arc::new(MockShard {
            shard_num,
            backend,
            down: self.down.clone(),
        }))
    }
}

// =========================================================================
// TestCluster
// =========================================================================

/// An in-memory cluster with a router in front of it.
pub struct TestCluster {
    router: TwemRouter,
    backends: Vec<Arc<MemoryShard>>,
    down: Arc<RwLock<HashSet<usize>>>,
}

impl TestCluster {
    /// Create an N-shard cluster with default naming and hash tag.
    pub async fn new(num_shards: usize) -> Self {
        Self::with_config(RouterConfig {
            num_shards,
            ..RouterConfig::default()
        })
        .await
    }

    /// Create a cluster from an explicit router config.
    pub async fn with_config(config: RouterConfig) -> Self {
        let down = Arc::new(RwLock::new(HashSet::new()));
        let connector = SeedingConnector {
            backends: Mutex::new(Vec::new()),
            down: down.clone(),
        };
        let router = TwemRouter::connect(&config, &connector)
            .await
            .expect("router should build over an in-memory cluster");
        let backends = connector.backends.into_inner().expect("lock poisoned");
        Self {
            router,
            backends,
            down,
        }
    }

    /// The router under test.
    pub fn router(&self) -> &TwemRouter {
        &self.router
    }

    /// Direct access to shard `i`'s storage, bypassing the router.
    pub fn backend(&self, i: usize) -> &MemoryShard {
        &self.backends[i]
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always `false`: a cluster has at least one shard.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Make shard `i` fail every command.
    pub async fn kill_shard(&self, i: usize) {
        self.down.write().await.insert(i);
    }

    /// Bring shard `i` back.
    pub async fn revive_shard(&self, i: usize) {
        self.down.write().await.remove(&i);
    }

    /// Number of user keys stored on shard `i` (markers excluded).
    pub fn user_key_count(&self, i: usize) -> usize {
        self.backends[i].len() - 2
    }
}

/// Read a marker key straight off a handle.
pub async fn read_marker(shard: &Arc<dyn ShardConnection>, marker: &str) -> String {
    let reply = shard
        .execute(&Command::new(CommandName::Get).arg(marker))
        .await
        .expect("marker read failed");
    let value = reply
        .into_bulk()
        .expect("marker should be a bulk string");
    String::from_utf8(value.to_vec()).expect("marker should be UTF-8")
}
