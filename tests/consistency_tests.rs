//! Consistency Tests
//!
//! Drives the engine with concurrent readers against a slow primary store and
//! checks the guarantees each read strategy makes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use shop_cache::{
    cache::{KvCache, MemoryCache},
    codec,
    models::{Shop, ShopUpdate},
    AppError, CacheSettings, MemoryShopRepository, ReadStrategy, ShopService,
};

// == Helper Functions ==

fn engine(
    settings: CacheSettings,
    shops: impl IntoIterator<Item = Shop>,
) -> (Arc<ShopService>, MemoryCache, MemoryShopRepository) {
    let cache = MemoryCache::new();
    let repo = MemoryShopRepository::with_shops(shops);
    let service = ShopService::new(Arc::new(cache.clone()), Arc::new(repo.clone()), settings);
    (Arc::new(service), cache, repo)
}

fn with_strategy(strategy: ReadStrategy) -> CacheSettings {
    CacheSettings {
        strategy,
        ..CacheSettings::default()
    }
}

type TimedRead = (Result<Shop, AppError>, Duration);

async fn concurrent_reads(service: &Arc<ShopService>, id: u64, readers: usize) -> Vec<TimedRead> {
    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let service = Arc::clone(service);
            tokio::spawn(async move {
                let started = Instant::now();
                let result = service.query_by_id(id).await;
                (result, started.elapsed())
            })
        })
        .collect();

    let mut results = Vec::with_capacity(readers);
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

async fn wait_for_completed_rebuilds(service: &ShopService, expected: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while service.stats().rebuilds_completed < expected {
        assert!(Instant::now() < deadline, "rebuild did not complete in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// == Penetration ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_absent_id_queries_store_once_per_null_ttl() {
    for strategy in [ReadStrategy::PassThrough, ReadStrategy::Mutex] {
        let (service, _, repo) = engine(with_strategy(strategy), []);

        for _ in 0..50 {
            let err = service.query_by_id(404).await.unwrap_err();
            assert!(err.is_not_found());
        }

        assert_eq!(repo.query_count(), 1, "strategy {strategy}");
        assert_eq!(service.stats().null_hits, 49);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_absent_reads_query_store_once() {
    let settings = CacheSettings {
        retry_delay: Duration::from_millis(10),
        ..with_strategy(ReadStrategy::Mutex)
    };
    let (service, _, repo) = engine(settings, []);
    repo.set_latency(Duration::from_millis(50));

    let results = concurrent_reads(&service, 404, 30).await;

    for (result, _) in &results {
        assert!(result.as_ref().unwrap_err().is_not_found());
    }
    assert_eq!(repo.query_count(), 1);
}

#[tokio::test]
async fn test_absent_id_scenario_requeries_after_null_ttl() {
    let settings = CacheSettings {
        strategy: ReadStrategy::PassThrough,
        null_ttl: Duration::from_millis(200),
        ..CacheSettings::default()
    };
    let (service, cache, repo) = engine(settings, []);

    assert!(service.query_by_id(42).await.unwrap_err().is_not_found());
    assert_eq!(cache.get("cache:shop:42").await.unwrap().as_deref(), Some(""));

    assert!(service.query_by_id(42).await.unwrap_err().is_not_found());
    assert_eq!(repo.query_count(), 1, "null marker answered the second call");

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(service.query_by_id(42).await.unwrap_err().is_not_found());
    assert_eq!(repo.query_count(), 2);
}

#[tokio::test]
async fn test_null_marker_cleared_by_update_path() {
    let (service, cache, repo) = engine(with_strategy(ReadStrategy::PassThrough), []);
    assert!(service.query_by_id(5).await.unwrap_err().is_not_found());

    repo.insert(Shop::new(5, "New Bakery", "Market Street 5")).await;
    let update = ShopUpdate {
        id: Some(5),
        score: Some(45),
        ..Default::default()
    };
    service.update(update).await.unwrap();

    assert!(cache.get("cache:shop:5").await.unwrap().is_none());
    let shop = service.query_by_id(5).await.unwrap();
    assert_eq!(shop.score, 45);
}

// == Breakdown ==

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_hot_key_rebuilt_by_single_reader() {
    let settings = CacheSettings {
        retry_delay: Duration::from_millis(20),
        ..with_strategy(ReadStrategy::Mutex)
    };
    let (service, _, repo) = engine(settings, [Shop::new(1, "Tea House", "Jinhua Road 1")]);
    repo.set_latency(Duration::from_millis(100));

    let results = concurrent_reads(&service, 1, 20).await;

    for (result, _) in &results {
        assert_eq!(result.as_ref().unwrap().name, "Tea House");
    }
    assert_eq!(repo.query_count(), 1);
    assert!(service.stats().lock_contentions > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lock_released_after_rebuild() {
    let (service, cache, _) = engine(
        with_strategy(ReadStrategy::Mutex),
        [Shop::new(1, "Tea House", "Jinhua Road 1")],
    );

    concurrent_reads(&service, 1, 10).await;

    assert!(cache.get("lock:shop:1").await.unwrap().is_none());
}

// == Non-blocking staleness ==

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_expired_hot_key_served_stale_without_blocking() {
    let (service, cache, repo) = engine(
        with_strategy(ReadStrategy::LogicalExpire),
        [Shop::new(7, "Hot Pot", "River Side 7")],
    );
    let stale = Shop::new(7, "Hot Pot (old)", "River Side 7");
    let raw = codec::encode_wrapped_at(&stale, Utc::now() - ChronoDuration::seconds(1)).unwrap();
    cache.set("cache:shop:7", &raw, None).await.unwrap();
    repo.set_latency(Duration::from_millis(500));

    let results = concurrent_reads(&service, 7, 20).await;

    for (result, elapsed) in &results {
        assert_eq!(result.as_ref().unwrap().name, "Hot Pot (old)");
        assert!(*elapsed < Duration::from_millis(250), "reader waited {elapsed:?}");
    }
    assert_eq!(service.stats().rebuilds_scheduled, 1);

    wait_for_completed_rebuilds(&service, 1).await;
    assert_eq!(repo.query_count(), 1);
    assert_eq!(service.query_by_id(7).await.unwrap().name, "Hot Pot");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_logical_scenario_refreshes_expiry() {
    let settings = CacheSettings {
        logical_ttl: Duration::from_secs(20),
        ..with_strategy(ReadStrategy::LogicalExpire)
    };
    let (service, cache, repo) = engine(settings, [Shop::new(7, "Hot Pot", "River Side 7")]);
    service.warm_all().await.unwrap();

    // Fresh: served as is, nothing scheduled
    let fresh = service.query_by_id(7).await.unwrap();
    assert_eq!(fresh.name, "Hot Pot");
    assert_eq!(service.stats().rebuilds_scheduled, 0);

    // Past its logical expiry: same data comes back, one rebuild is queued
    let past = Utc::now() - ChronoDuration::seconds(5);
    let raw = codec::encode_wrapped_at(&fresh, past).unwrap();
    cache.set("cache:shop:7", &raw, None).await.unwrap();
    repo.insert(Shop::new(7, "Hot Pot Deluxe", "River Side 7")).await;

    let stale = service.query_by_id(7).await.unwrap();
    assert_eq!(stale, fresh);
    assert_eq!(service.stats().rebuilds_scheduled, 1);

    wait_for_completed_rebuilds(&service, 1).await;

    let raw = cache.get("cache:shop:7").await.unwrap().unwrap();
    let entry = codec::decode_wrapped(&raw).unwrap();
    assert!(entry.expire_time > Utc::now());
    assert_eq!(entry.data.name, "Hot Pot Deluxe");
    assert_eq!(service.query_by_id(7).await.unwrap().name, "Hot Pot Deluxe");
}

// == Write invalidation ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_read_after_update_sees_new_value() {
    for strategy in [ReadStrategy::PassThrough, ReadStrategy::Mutex] {
        let (service, _, _) = engine(
            with_strategy(strategy),
            [Shop::new(1, "Tea House", "Jinhua Road 1")],
        );
        assert_eq!(service.query_by_id(1).await.unwrap().name, "Tea House");

        let update = ShopUpdate {
            id: Some(1),
            name: Some("Tea House II".to_string()),
            avg_price: Some(88),
            ..Default::default()
        };
        service.update(update).await.unwrap();

        let shop = service.query_by_id(1).await.unwrap();
        assert_eq!(shop.name, "Tea House II", "strategy {strategy}");
        assert_eq!(shop.avg_price, Some(88));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_drains_pending_rebuilds() {
    let settings = CacheSettings {
        rebuild_workers: 1,
        ..with_strategy(ReadStrategy::LogicalExpire)
    };
    let shops = (1..=5).map(|id| Shop::new(id, format!("Shop {id}"), "Somewhere"));
    let (service, cache, repo) = engine(settings, shops);
    repo.set_latency(Duration::from_millis(20));

    let past = Utc::now() - ChronoDuration::seconds(1);
    for id in 1..=5 {
        let shop = Shop::new(id, "stale", "Somewhere");
        let raw = codec::encode_wrapped_at(&shop, past).unwrap();
        cache.set(&format!("cache:shop:{id}"), &raw, None).await.unwrap();
        service.query_by_id(id).await.unwrap();
    }

    service.shutdown().await;

    let stats = service.stats();
    assert_eq!(stats.rebuilds_scheduled, 5);
    assert_eq!(stats.rebuilds_completed, 5);
    for id in 1..=5 {
        assert!(cache.get(&format!("lock:shop:{id}")).await.unwrap().is_none());
    }
}
