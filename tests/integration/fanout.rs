//! Integration test: MGET, MSET and KEYS across the whole cluster.

use std::collections::BTreeMap;

use bytes::Bytes;
use twem_integration_tests::TestCluster;

fn canonical_keys(c: &TestCluster, key_type: &str) -> Vec<String> {
    let r = c.router();
    (0..c.len())
        .map(|n| r.canonical_key(key_type, r.canonical_key_id_for_shard(n).unwrap()))
        .collect()
}

/// MSET one canonical key per shard, then read them back with MGET.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_canonical_mset_mget_covers_every_shard() {
    let c = TestCluster::new(10).await;
    let keys = canonical_keys(&c, "marker");

    c.router()
        .mset(keys.iter().map(|k| (k, format!("value-{k}"))))
        .await
        .unwrap();
    for n in 0..c.len() {
        assert_eq!(c.user_key_count(n), 1, "shard {n}");
    }

    let got = c.router().mget(&keys).await.unwrap();
    let expected: BTreeMap<usize, Vec<Option<Bytes>>> = keys
        .iter()
        .enumerate()
        .map(|(n, k)| (n, vec![Some(Bytes::from(format!("value-{k}")))]))
        .collect();
    assert_eq!(got, expected);
}

/// Plain keys are grouped by owner; groups keep request order.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_mget_groups_preserve_order() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    r.mset([("dog", "woof"), ("cat", "meow"), ("pig", "oink")])
        .await
        .unwrap();

    let got = r.mget(["dog", "missing:{1}", "cat", "pig"]).await.unwrap();
    assert_eq!(got.keys().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
    assert_eq!(got[&0], vec![None]);
    assert_eq!(
        got[&2],
        vec![
            Some(Bytes::from_static(b"woof")),
            Some(Bytes::from_static(b"meow")),
        ]
    );
    assert_eq!(got[&3], vec![Some(Bytes::from_static(b"oink"))]);
}

/// KEYS foo* finds the one foo key planted on every shard.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_keys_across_all_shards() {
    let c = TestCluster::new(10).await;
    let keys = canonical_keys(&c, "foo");
    c.router()
        .mset(keys.iter().map(|k| (k, "x")))
        .await
        .unwrap();
    c.router().set("bar", "y").await.unwrap();

    let got = c.router().keys("foo*").await.unwrap();
    assert_eq!(got.len(), c.len());
    for (n, matches) in got {
        assert_eq!(matches, vec![Bytes::from(keys[n].clone())], "shard {n}");
    }

    // Markers are ordinary keys to KEYS.
    let markers = c.router().keys("shard_*").await.unwrap();
    assert!(markers.values().all(|m| m.len() == 2));
}

/// Large batches spread across every shard and come back intact.
#[tokio::test]
#[ntest::timeout(10000)]
async fn test_bulk_batch() {
    let c = TestCluster::new(10).await;
    let r = c.router();
    let keys: Vec<String> = (0..500).map(|i| format!("bulk:{i}")).collect();

    r.mset(keys.iter().map(|k| (k, k.as_bytes()))).await.unwrap();
    let total: usize = (0..c.len()).map(|n| c.user_key_count(n)).sum();
    assert_eq!(total, 500);
    assert!((0..c.len()).all(|n| c.user_key_count(n) > 0));

    let got = r.mget(&keys).await.unwrap();
    let values: usize = got.values().map(Vec::len).sum();
    assert_eq!(values, 500);
    assert!(got.values().flatten().all(Option::is_some));
}
