//! catalog-sync: JDK release catalog synchronizer
//!
//! Keeps a checksummed catalog of JDK releases in step with the upstream
//! release host, running a daily full rebuild and a frequent incremental
//! refresh until interrupted.
//!
//! ## Architecture
//! ```text
//! [GitHub releases API] --> [reconciler] --> [committer] --> [catalog store]
//!                                                  |
//!                                                  v
//!                                          current snapshot
//! ```
//!
//! ## Configuration
//! - CATALOG_CONFIG: Path to a YAML config file (optional)
//! - CATALOG__<SECTION>__<KEY>: Overrides for individual settings
//! - CATALOG_LOG: Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use catalog_sync::config::Config;
use catalog_sync::mapper::DefaultReleaseMapper;
use catalog_sync::reconciler::CatalogReconciler;
use catalog_sync::scheduler::SyncScheduler;
use catalog_sync::storage::init_storage;
use catalog_sync::upstream::GithubUpstreamClient;
use catalog_sync::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    let store = init_storage(&config.storage).await?;
    let upstream = Arc::new(GithubUpstreamClient::new(config.upstream.clone())?);
    let mapper = Arc::new(DefaultReleaseMapper::new(config.reconciler.vendor.clone()));
    let reconciler = CatalogReconciler::new(upstream, mapper, &config.reconciler);

    let scheduler = SyncScheduler::new(store, reconciler, config.scheduler.clone()).await;
    let handle = scheduler.spawn();

    info!(
        versions = ?config.reconciler.versions,
        api_url = %config.upstream.api_url,
        "catalog-sync started"
    );

    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    handle.stop();
    handle.join().await;

    Ok(())
}
