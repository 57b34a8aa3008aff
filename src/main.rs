//! CoinSync headless sync shell
//!
//! Wires the in-memory store to the sync engine and logs every view
//! change until interrupted.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use coinsync_core::config::AppConfig;
use coinsync_core::error::AppError;
use coinsync_core::types::RawDocument;
use coinsync_realtime::{MemoryStore, SyncContext, SyncEngine, ViewSnapshot};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Sync shell error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("COINSYNC_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CoinSync v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Backing store ────────────────────────────────────
    let store = match &config.store.existing_identity {
        Some(uid) => {
            tracing::info!(identity = %uid, "Resuming persisted session");
            MemoryStore::with_identity(uid.clone())
        }
        None => MemoryStore::new(),
    };

    if let Some(path) = &config.store.seed_file {
        let documents = load_seed(path).await?;
        tracing::info!(
            "Seeded {} documents into '{}' from {}",
            documents.len(),
            config.sync.packages_collection,
            path
        );
        store.seed(&config.sync.packages_collection, documents);
    }
    let store = Arc::new(store);

    // ── Step 2: Sync engine ──────────────────────────────────────
    let ctx = SyncContext::from_store(Arc::clone(&store), config.sync.clone());
    let handle = SyncEngine::start(ctx);
    let mut view = handle.view();
    log_view(&view.borrow_and_update());

    // ── Step 3: Render until interrupted ─────────────────────────
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                log_view(&view.borrow_and_update());
            }
        }
    }

    let metrics = handle.metrics();
    handle.shutdown().await?;
    tracing::info!(
        snapshots = metrics.snapshots_received,
        write_backs = metrics.write_backs_completed,
        failed_write_backs = metrics.write_backs_failed,
        "CoinSync shut down"
    );
    Ok(())
}

/// Read a seed file holding an array of `{ "id", "fields" }` documents.
async fn load_seed(path: &str) -> Result<Vec<RawDocument>, AppError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::configuration(format!("Failed to read seed file '{}': {}", path, e))
    })?;
    let documents = serde_json::from_str(&raw)?;
    Ok(documents)
}

fn log_view(snapshot: &ViewSnapshot) {
    match (&snapshot.aggregate, &snapshot.error_message) {
        (_, Some(message)) => tracing::warn!(state = ?snapshot.state, "{}", message),
        (Some(aggregate), None) => tracing::info!(
            state = ?snapshot.state,
            total_coins = aggregate.total_coins,
            username = %aggregate.display_username,
            packages = aggregate.package_count,
            latest = ?aggregate.latest_package.as_ref().map(|p| p.id.as_str()),
            "View updated"
        ),
        (None, None) => match snapshot.state.status_line() {
            Some(line) => tracing::info!(state = ?snapshot.state, "{}", line),
            None => tracing::info!(state = ?snapshot.state, "View updated"),
        },
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
