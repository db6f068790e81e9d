//! End-to-end synchronization tests.
//!
//! Run with: cargo test --test sync
//!
//! Drives reconciler, committer and scheduler together against the scripted
//! upstream and the in-memory store.

use std::sync::Arc;

use catalog_sync::committer::{checksum, CatalogCell, ChecksumCommitter};
use catalog_sync::config::{ReconcilerConfig, SchedulerConfig};
use catalog_sync::interfaces::{CatalogStore, UpstreamClient};
use catalog_sync::mapper::DefaultReleaseMapper;
use catalog_sync::model::{Catalog, ReleaseId, ReleaseKind};
use catalog_sync::reconciler::CatalogReconciler;
use catalog_sync::scheduler::SyncScheduler;
use catalog_sync::storage::MemoryCatalogStore;
use catalog_sync::test_utils::{raw_release, ts, ManualClock, MockUpstreamClient};

const DAY: i64 = 24 * 60 * 60;

fn reconciler(upstream: Arc<dyn UpstreamClient>, versions: Vec<u32>) -> CatalogReconciler {
    let config = ReconcilerConfig {
        versions,
        ..Default::default()
    };
    CatalogReconciler::new(upstream, Arc::new(DefaultReleaseMapper::new("eclipse")), &config)
        .with_clock(Arc::new(ManualClock::new(ts(30 * DAY))))
}

async fn seeded_upstream() -> Arc<MockUpstreamClient> {
    let upstream = Arc::new(MockUpstreamClient::new());
    upstream
        .put_release(11, raw_release("a", "jdk-11.0.4+11", ts(0), ts(0)))
        .await;
    upstream
        .put_release(11, raw_release("b", "jdk-11.0.5+10", ts(DAY), ts(DAY)))
        .await;
    upstream
        .put_release(17, raw_release("c", "jdk-17.0.1+12", ts(2 * DAY), ts(2 * DAY)))
        .await;
    upstream
}

fn ids(catalog: &Catalog, version: u32) -> Vec<String> {
    catalog
        .get(version)
        .map(|fr| fr.releases.keys().map(ReleaseId::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_full_then_incremental_cycles() {
    let store = Arc::new(MemoryCatalogStore::new());
    let upstream = seeded_upstream().await;
    let scheduler = SyncScheduler::new(
        store.clone(),
        reconciler(upstream.clone(), vec![11, 17]),
        SchedulerConfig::default(),
    )
    .await;

    let full = scheduler.run_full_once().await.unwrap();
    assert_eq!(ids(&full, 11), vec!["a", "b"]);
    assert_eq!(ids(&full, 17), vec!["c"]);
    assert_eq!(
        full.latest_release(11, Some(ReleaseKind::Ga)).unwrap().id.as_str(),
        "b"
    );

    upstream.remove_release("a").await;
    upstream
        .put_release(17, raw_release("d", "jdk-17.0.2+8", ts(3 * DAY), ts(3 * DAY)))
        .await;
    upstream.clear_fetch_log().await;

    let incremental = scheduler.run_incremental_once().await.unwrap();

    assert_eq!(ids(&incremental, 11), vec!["b"]);
    assert_eq!(ids(&incremental, 17), vec!["c", "d"]);
    assert_eq!(upstream.total_fetches().await, 1);
    assert_eq!(store.read_catalog().await.unwrap().as_ref(), Some(&*incremental));
    assert_eq!(
        store.current_token().await.unwrap(),
        Some(checksum(&incremental).unwrap())
    );
    assert_eq!(scheduler.current_snapshot(), incremental);
}

#[tokio::test]
async fn test_stale_incremental_never_clobbers_full_rebuild() {
    let store = Arc::new(MemoryCatalogStore::new());
    let upstream = seeded_upstream().await;
    let reconciler = reconciler(upstream.clone(), vec![11, 17]);
    let cell = Arc::new(CatalogCell::default());
    let committer = ChecksumCommitter::new(store.clone(), cell.clone());

    let first = reconciler.build(&[11, 17]).await.unwrap();
    committer.commit_full(Arc::new(first)).await.unwrap();

    // An incremental cycle starts from the committed snapshot...
    let baseline = cell.load();
    upstream
        .put_release(11, raw_release("x", "jdk-11.0.6+10", ts(4 * DAY), ts(4 * DAY)))
        .await;
    let candidate = reconciler.incremental_update(&baseline).await;

    // ...while a full rebuild commits a different catalog.
    upstream.remove_release("c").await;
    let rebuilt = Arc::new(reconciler.build(&[11, 17]).await.unwrap());
    committer.commit_full(rebuilt.clone()).await.unwrap();

    let result = committer
        .commit_incremental(Arc::new(candidate), &baseline)
        .await
        .unwrap();

    assert_eq!(result, rebuilt);
    assert_eq!(cell.load(), rebuilt);
    assert_eq!(store.read_catalog().await.unwrap().as_ref(), Some(&*rebuilt));
}

#[tokio::test]
async fn test_poison_release_retried_only_by_full_rebuild() {
    let store = Arc::new(MemoryCatalogStore::new());
    let upstream = seeded_upstream().await;
    upstream
        .put_release(11, raw_release("poison", "not-a-version", ts(0), ts(0)))
        .await;
    let scheduler = SyncScheduler::new(
        store,
        reconciler(upstream.clone(), vec![11, 17]),
        SchedulerConfig::default(),
    )
    .await;

    scheduler.run_full_once().await.unwrap();
    assert_eq!(upstream.fetch_count("poison").await, 1);

    for _ in 0..3 {
        scheduler.run_incremental_once().await.unwrap();
    }
    assert_eq!(upstream.fetch_count("poison").await, 1);

    scheduler.run_full_once().await.unwrap();
    assert_eq!(upstream.fetch_count("poison").await, 2);
    assert!(!scheduler
        .current_snapshot()
        .get(11)
        .unwrap()
        .contains(&ReleaseId::new("poison")));
}

#[tokio::test]
async fn test_restart_resumes_from_stored_catalog() {
    let store = Arc::new(MemoryCatalogStore::new());
    let upstream = seeded_upstream().await;

    let committed = {
        let scheduler = SyncScheduler::new(
            store.clone(),
            reconciler(upstream.clone(), vec![11, 17]),
            SchedulerConfig::default(),
        )
        .await;
        scheduler.run_full_once().await.unwrap()
    };

    let restarted = SyncScheduler::new(
        store.clone(),
        reconciler(upstream.clone(), vec![11, 17]),
        SchedulerConfig::default(),
    )
    .await;
    assert_eq!(restarted.current_snapshot(), committed);

    upstream.clear_fetch_log().await;
    restarted.run_incremental_once().await.unwrap();
    assert_eq!(upstream.total_fetches().await, 0);
    assert_eq!(store.write_count(), 1);
}
