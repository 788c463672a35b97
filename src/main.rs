use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backon::BlockingRetryable;
use backon::ConstantBuilder;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use tokio::sync::watch;

use cache::SnapshotCache;
use db::HistoryStore;
use http::AppContext;

mod cache;
mod db;
mod http;
mod scheduler;
mod sensor;
mod sim;
mod snapshot;

const DEFAULT_PORT: u16 = 443;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    TermLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_time_offset_to_local()
            .map_err(|_| anyhow::anyhow!("Failed to set time offset to local"))?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    let port = parse_port(std::env::args().skip(1))?;

    if let Err(e) = run(port).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn parse_port(mut args: impl Iterator<Item = String>) -> Result<u16, anyhow::Error> {
    while let Some(arg) = args.next() {
        if arg == "--port" {
            let value = args.next().context("--port requires a value")?;
            return value
                .parse()
                .with_context(|| format!("Invalid port: {value}"));
        }
    }
    Ok(DEFAULT_PORT)
}

pub async fn run(port: u16) -> Result<(), anyhow::Error> {
    let retry_builder = ConstantBuilder::default()
        .with_delay(Duration::from_millis(100))
        .with_max_times(20);

    let store = (|| HistoryStore::open(db::DB_FILE))
        .retry(retry_builder)
        .notify(|e, dur| {
            log::error!("{e}");
            log::info!("Retrying in {:?}", dur);
        })
        .call()
        .context("Failed to open history store")?;
    store.init().context("Failed to initialize history store")?;

    let cache = Arc::new(SnapshotCache::new(sim::simulated_rig()));
    let store = Arc::new(store);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let fast = scheduler::spawn_lane(
        "cache",
        scheduler::CACHE_POLL_PERIOD,
        shutdown_rx.clone(),
        {
            let cache = Arc::clone(&cache);
            move || {
                let cache = Arc::clone(&cache);
                async move {
                    cache.refresh().await;
                }
            }
        },
    );

    let slow = scheduler::spawn_lane(
        "history",
        scheduler::DB_POLL_PERIOD,
        shutdown_rx.clone(),
        {
            let cache = Arc::clone(&cache);
            let store = Arc::clone(&store);
            move || {
                let cache = Arc::clone(&cache);
                let store = Arc::clone(&store);
                async move {
                    // The snapshot is copied out under the cache guard before
                    // the store guard is taken; the two are never held together.
                    let snapshot = cache.read_all().await;
                    if let Err(e) = store.append_snapshot(&snapshot) {
                        log::error!("Failed to save history snapshot, retrying next cycle: {e}");
                    }
                }
            }
        },
    );

    let ctx = Arc::new(AppContext { cache, store });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    log::info!("Farm telemetry server running on port {port}");

    let mut serve_shutdown = shutdown_rx.clone();
    let server = axum::serve(listener, http::router(ctx)).with_graceful_shutdown(async move {
        let _ = serve_shutdown.changed().await;
    });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to wait for Ctrl+C signal: {e}");
        }
        log::info!("Shutting down");
        let _ = shutdown_tx.send(true);
    });

    server.await.context("Server error")?;

    fast.await.context("Cache lane panicked")?;
    slow.await.context("History lane panicked")?;

    Ok(())
}
