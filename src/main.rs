//! Shop Cache - HTTP server for the shop cache-consistency engine
//!
//! Serves shop reads through the configured cache strategy and invalidates
//! the cache on writes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_cache::{
    create_router, spawn_cleanup_task, AppState, Config, KvCache, MemoryCache,
    MemoryShopRepository, ShopService,
};

/// Main entry point for the shop cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the key-value cache (Redis when configured, else in-memory)
/// 4. Load the primary store seed data
/// 5. Build the engine and start its rebuild workers
/// 6. Preload the cache when warming is enabled
/// 7. Start background TTL cleanup for the in-memory cache
/// 8. Serve HTTP until SIGINT/SIGTERM, then drain pending rebuilds
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shop Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: strategy={}, port={}, cache_ttl={}s, null_ttl={}s, lock_ttl={}s, logical_ttl={}s",
        config.read_strategy,
        config.server_port,
        config.cache_ttl,
        config.null_ttl,
        config.lock_ttl,
        config.logical_ttl
    );

    let (cache, memory) = build_cache(&config).await?;

    let repo = match MemoryShopRepository::from_json_file(&config.shop_data_file).await {
        Ok(repo) => repo,
        Err(e) => {
            warn!(error = %e, "Seed data unavailable, starting with an empty store");
            MemoryShopRepository::new()
        }
    };

    let service = Arc::new(ShopService::new(cache, Arc::new(repo), config.cache_settings()));

    if config.warm_on_startup {
        service
            .warm_all()
            .await
            .context("failed to preload the cache")?;
    }

    let cleanup_handle = memory.map(|cache| {
        info!("Background cleanup task started");
        spawn_cleanup_task(cache, config.cleanup_interval)
    });

    let app = create_router(AppState::from_shared(Arc::clone(&service)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    service.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Picks the cache backend. The in-memory cache is also returned on its own
/// so the cleanup task can sweep it.
#[cfg(feature = "redis")]
async fn build_cache(config: &Config) -> anyhow::Result<(Arc<dyn KvCache>, Option<MemoryCache>)> {
    if let Some(url) = &config.redis_url {
        let cache = shop_cache::cache::RedisCache::new(url)
            .await
            .context("failed to connect to Redis")?;
        info!("Using Redis cache backend");
        return Ok((Arc::new(cache), None));
    }
    Ok(memory_cache())
}

#[cfg(not(feature = "redis"))]
async fn build_cache(config: &Config) -> anyhow::Result<(Arc<dyn KvCache>, Option<MemoryCache>)> {
    if config.redis_url.is_some() {
        warn!("REDIS_URL is set but the redis feature is disabled, using in-memory cache");
    }
    Ok(memory_cache())
}

fn memory_cache() -> (Arc<dyn KvCache>, Option<MemoryCache>) {
    let cache = MemoryCache::new();
    info!("Using in-memory cache backend");
    (Arc::new(cache.clone()), Some(cache))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
