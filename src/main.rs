//! Proxy Cache - a concurrent caching HTTP forward proxy
//!
//! Relays GET requests to origin servers and memoizes small responses in a
//! capacity-bounded, LRU-evicting in-memory cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxy_cache::{proxy, Config, ObjectCache};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse the required listening-port argument
/// 3. Load cache sizing from environment variables
/// 4. Create the shared object cache (memory-only, empty at every start)
/// 5. Bind the listener and serve until a shutdown signal arrives
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The listening port is the single required argument
    let port: u16 = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid port: {}", arg))?,
        None => {
            eprintln!("usage: proxy_cache <port>");
            std::process::exit(1);
        }
    };

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}B, max_object_size={}B, port={}",
        config.cache_capacity, config.max_object_size, port
    );

    let cache = Arc::new(ObjectCache::new(config.cache_capacity));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {}", addr))?;
    info!("Proxy listening on {}", addr);

    // Serve until Ctrl+C or SIGTERM; in-flight connections are not drained
    tokio::select! {
        _ = proxy::run(listener, Arc::clone(&cache), config.max_object_size) => {}
        _ = shutdown_signal() => {
            let stats = cache.stats();
            info!(
                "Shutting down: hits={}, misses={}, evictions={}, entries={}, used_bytes={}",
                stats.hits, stats.misses, stats.evictions, stats.entries, stats.used_bytes
            );
        }
    }

    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
}
