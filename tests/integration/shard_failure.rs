//! Integration test: shard failure.
//!
//! A dead shard fails exactly the operations that need it.

use bytes::Bytes;
use twem_integration_tests::TestCluster;
use twem_router::RouterError;
use twem_store::{Command, CommandName, ShardConnection, StoreError};

fn is_down(err: &RouterError, shard: usize) -> bool {
    matches!(
        err,
        RouterError::Shard(StoreError::Connection(msg)) if *msg == format!("shard {shard} is down")
    )
}

/// Keys on a dead shard fail; keys elsewhere keep working.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_dead_shard_only_fails_its_keys() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    r.set("cow", "moo").await.unwrap();
    r.set("cat", "meow").await.unwrap();

    c.kill_shard(7).await;
    let err = r.get("cow").await.unwrap_err();
    assert!(is_down(&err, 7), "unexpected error: {err}");
    assert_eq!(r.get("cat").await.unwrap(), Some(Bytes::from_static(b"meow")));

    c.revive_shard(7).await;
    assert_eq!(r.get("cow").await.unwrap(), Some(Bytes::from_static(b"moo")));
}

/// MGET fails if any participating shard is down, not otherwise.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_mget_with_dead_shard() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    r.mset([("cat", "1"), ("dog", "2"), ("cow", "3")])
        .await
        .unwrap();

    c.kill_shard(7).await;
    let err = r.mget(["cat", "cow"]).await.unwrap_err();
    assert!(is_down(&err, 7), "unexpected error: {err}");

    let got = r.mget(["cat", "dog"]).await.unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[&2].len(), 2);
}

/// MSET is not rolled back: healthy shards keep what they wrote.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_mset_partial_failure_is_not_rolled_back() {
    let c = TestCluster::new(10).await;
    let r = c.router();

    c.kill_shard(2).await;
    let err = r.mset([("cat", "1"), ("cow", "2")]).await.unwrap_err();
    assert!(is_down(&err, 2), "unexpected error: {err}");
    c.revive_shard(2).await;

    assert_eq!(r.get("cat").await.unwrap(), None);
    // cow's shard may or may not have finished before the failure surfaced.
    assert!(c.user_key_count(7) <= 1);
}

/// KEYS needs every shard.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_keys_with_dead_shard() {
    let c = TestCluster::new(10).await;
    c.kill_shard(0).await;
    let err = c.router().keys("*").await.unwrap_err();
    assert!(is_down(&err, 0), "unexpected error: {err}");
}

/// Shard handles obtained before a failure see it too.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_handles_follow_shard_state() {
    let c = TestCluster::new(3).await;
    let handle = c.router().shard_by_num(1).unwrap().clone();
    c.kill_shard(1).await;
    let ping = Command::new(CommandName::Ping);
    assert!(handle.execute(&ping).await.is_err());
    c.revive_shard(1).await;
    assert!(handle.execute(&ping).await.is_ok());
}
