//! Integration test: key-routed commands.
//!
//! Values written through the router must land on the backend the key
//! hashes to, and nowhere else.

use bytes::Bytes;
use twem_integration_tests::TestCluster;
use twem_router::RouterError;
use twem_store::{Command, CommandName, Reply, ShardConnection};

/// SET through the router, then read the owning backend directly.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_set_lands_on_owning_backend() {
    let c = TestCluster::new(10).await;
    let r = c.router();

    for i in 0..200 {
        let key = r.key("item", &i.to_string());
        r.set(&key, i.to_string()).await.unwrap();
    }

    let mut total = 0;
    for n in 0..c.len() {
        total += c.user_key_count(n);
    }
    assert_eq!(total, 200);

    for i in 0..200 {
        let key = r.key("item", &i.to_string());
        let owner = r.shard_num_by_key(&key);
        let get = Command::new(CommandName::Get).arg(&key);
        let direct = c.backend(owner).execute(&get).await.unwrap();
        assert_eq!(direct, Reply::Bulk(Bytes::from(i.to_string())));
        assert_eq!(
            r.get(&key).await.unwrap(),
            Some(Bytes::from(i.to_string()))
        );
    }
}

/// ZADD then ZRANGE WITHSCORES through the router.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_sorted_set_round_trip() {
    let c = TestCluster::new(10).await;
    let r = c.router();

    r.zadd("testset", 1.0, "foo").await.unwrap();
    r.zadd("testset", 0.5, "bar").await.unwrap();
    assert_eq!(c.user_key_count(3), 1);

    let pairs = r.zrange_with_scores("testset", 0, -1).await.unwrap();
    assert_eq!(
        pairs,
        vec![
            (Bytes::from_static(b"bar"), 0.5),
            (Bytes::from_static(b"foo"), 1.0),
        ]
    );

    let raw = r
        .invoke(
            &Command::new(CommandName::Zrange)
                .arg("testset")
                .arg("0")
                .arg("-1")
                .arg("WITHSCORES"),
        )
        .await
        .unwrap()
        .into_bulk_array()
        .unwrap();
    assert_eq!(raw.len(), 4);
    assert_eq!(raw[0], Bytes::from_static(b"bar"));
}

/// Commands without a single owning key are refused before any shard sees
/// them.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_multi_key_commands_are_refused() {
    let c = TestCluster::new(10).await;
    for name in ["keys", "scan", "hscan", "sscan", "zscan"] {
        let name: CommandName = name.parse().unwrap();
        let err = c
            .router()
            .invoke(&Command::new(name).arg("foo*"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, RouterError::UnsupportedSharded { command } if command == name),
            "{name} should be refused, got {err}"
        );
    }
    for n in 0..c.len() {
        assert_eq!(c.user_key_count(n), 0);
    }
}

/// Related keys built from one identifier can be worked on together.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_related_keys_on_one_shard() {
    let c = TestCluster::new(10).await;
    let r = c.router();

    let pending = r.key("friend_request", "123456");
    let canceled = r.key("canceled", "123456");
    r.sadd(&pending, "alice").await.unwrap();
    r.sadd(&canceled, "bob").await.unwrap();
    r.hset(&r.key("profile", "123456"), "name", "carol").await.unwrap();

    assert_eq!(c.user_key_count(7), 3);
    assert_eq!(
        r.smembers(&pending).await.unwrap(),
        vec![Bytes::from_static(b"alice")]
    );
}
