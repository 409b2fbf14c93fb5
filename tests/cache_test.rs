// Memoizer behavior: hit/miss accounting, error non-poisoning, and
// single-flight under concurrent identical-key load.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use product_analytics::engine::QueryCache;

type Key = (String, Vec<String>);

fn key(sql: &str, params: &[&str]) -> Key {
    (
        sql.to_string(),
        params.iter().map(|p| p.to_string()).collect(),
    )
}

#[tokio::test]
async fn test_same_key_computes_once_distinct_key_recomputes() {
    let cache: QueryCache<Key, u64> = QueryCache::new();
    let calls = AtomicUsize::new(0);

    let compute = |v: u64| {
        let calls = &calls;
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(v)
        }
    };

    let a1 = cache
        .get_or_compute(key("SELECT AVG(x)", &["A"]), compute(1))
        .await
        .unwrap();
    let a2 = cache
        .get_or_compute(key("SELECT AVG(x)", &["A"]), compute(1))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*a1, *a2);
    assert!(Arc::ptr_eq(&a1, &a2));

    // Different parameter tuple is a distinct key.
    let b = cache
        .get_or_compute(key("SELECT AVG(x)", &["B"]), compute(2))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*b, 2);

    let stats = cache.stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 2);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let cache: QueryCache<Key, u64> = QueryCache::new();
    let calls = AtomicUsize::new(0);
    let k = key("SELECT bad", &[]);

    let err = cache
        .get_or_compute(k.clone(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<u64, String>("syntax error".into())
        })
        .await
        .unwrap_err();
    assert_eq!(err, "syntax error");
    assert!(cache.is_empty());

    // A retry with the same key re-executes rather than replaying the
    // failure.
    let v = cache
        .get_or_compute(k.clone(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(7)
        })
        .await
        .unwrap();
    assert_eq!(*v, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);

    // And now it's a hit.
    let v2 = cache
        .get_or_compute(k, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(7)
        })
        .await
        .unwrap();
    assert_eq!(*v2, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_identical_keys_single_flight() {
    let cache: Arc<QueryCache<Key, u64>> = Arc::new(QueryCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(key("SELECT slow", &[]), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<u64, String>(99)
                    })
                    .await
                    .unwrap()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(*task.await.unwrap(), 99);
    }

    // The per-key gate let exactly one computation run; the rest observed
    // the stored result.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.len(), 1);
}
