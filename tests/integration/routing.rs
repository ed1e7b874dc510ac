//! Integration test: key routing.
//!
//! Each shard carries marker keys naming itself, so every lookup path can
//! be checked against the shard that actually answers.

use twem_integration_tests::{SHARD_NAME_KEY, SHARD_NUM_KEY, TestCluster, read_marker};

/// shard_by_num(n) reaches the shard seeded as n, named tdbNNN.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_shard_by_num_reaches_named_shard() {
    let c = TestCluster::new(10).await;
    for n in 0..c.len() {
        let shard = c.router().shard_by_num(n as i64).unwrap();
        assert_eq!(read_marker(shard, SHARD_NUM_KEY).await, n.to_string());
        assert_eq!(read_marker(shard, SHARD_NAME_KEY).await, format!("tdb{n:03}"));
    }
    assert!(c.router().shard_by_num(-1).is_err());
    assert!(c.router().shard_by_num(10).is_err());
}

/// Canonical identifiers route to their own shard, by id and by full key.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_canonical_keys_reach_their_shard() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    let ids: Vec<&str> = (0..10)
        .map(|n| r.canonical_key_id_for_shard(n).unwrap())
        .collect();
    assert_eq!(ids, ["1", "7", "4", "8", "26", "10", "12", "18", "21", "13"]);

    for (n, id) in ids.iter().enumerate() {
        let by_id = r.shard_by_key_id(id);
        assert_eq!(read_marker(by_id, SHARD_NUM_KEY).await, n.to_string());

        let key = r.key("friend_request", id);
        let by_key = r.shard_by_key(&key);
        assert_eq!(read_marker(by_key, SHARD_NUM_KEY).await, n.to_string());
    }
}

/// Known placements for plain keys under ten shards.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_reference_placements() {
    let c = TestCluster::new(10).await;
    let cases = [
        ("123456", 7),
        ("banana", 6),
        ("12345", 6),
        ("cat", 2),
        ("cow", 7),
        ("dog", 2),
        ("pig", 3),
        ("sheep", 9),
        ("testset", 3),
        ("foo", 4),
    ];
    for (key, shard) in cases {
        assert_eq!(c.router().shard_num_by_key(key), shard, "key {key}");
        let handle = c.router().shard_by_key(key);
        assert_eq!(read_marker(handle, SHARD_NUM_KEY).await, shard.to_string());
    }
}

/// Keys sharing an identifier share a shard, whatever their type.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_hash_tag_colocates_related_keys() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    let types = ["friend_request", "canceled", "profile", "inbox"];
    for key_type in types {
        assert_eq!(r.shard_num_by_key(&r.key(key_type, "123456")), 7);
        assert_eq!(r.canonical_key(key_type, "123456"), format!("{key_type}:{{18}}"));
    }
    assert_eq!(r.canonical_key_id("banana"), "12");
}

/// Custom tags and names flow from the config into routing.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_custom_tag_and_names() {
    let c = TestCluster::with_config(twem_router::RouterConfig {
        num_shards: 4,
        hash_tag: "<>".to_string(),
        shard_name_format: "cache-{}".to_string(),
        ..Default::default()
    })
    .await;
    let r = c.router();
    let key = r.key("user", "42");
    assert_eq!(key, "user:<42>");
    assert_eq!(r.shard_num_by_key(&key), r.shard_num_by_key_id("42"));
    // Braces are ordinary characters under a <> tag.
    assert_eq!(r.shard_num_by_key("user:{42}"), r.shard_num_by_key_id("user:{42}"));

    let shard = r.shard_by_num(3).unwrap();
    assert_eq!(read_marker(shard, SHARD_NAME_KEY).await, "cache-3");
    assert_eq!(r.shard_name(3), "cache-3");
}
