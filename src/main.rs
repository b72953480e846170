//! Clinic Maintenance Server
//!
//! REST API for the dental clinic equipment maintenance tracker.

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use clinic_maintenance::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::{NoopPersistence, Persistence, Repository},
    services::{
        notifications,
        sync::{SyncQueue, SyncWorker},
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Clinic Maintenance Server v{}", env!("CARGO_PKG_VERSION"));

    let persistence: Arc<dyn Persistence> = if config.database.url.is_empty() {
        tracing::warn!("No database configured, running an in-memory session with demo data");
        Arc::new(NoopPersistence)
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;
        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations completed");

        Arc::new(Repository::new(pool))
    };

    let store = persistence.load_snapshot().await?.into_shared();

    let (queue, rx) = SyncQueue::channel();
    let notifier = notifications::from_config(&config.notifications);
    let worker = SyncWorker::new(rx, persistence, notifier, config.sync.retry()).spawn();

    let services = Services::new(store, queue, config.auth.clone(), config.stats.offset());

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last queue senders; let the worker drain what is left
    if let Err(e) = worker.await {
        tracing::error!("Sync worker panicked: {}", e);
    }
    Ok(())
}

/// Console output (pretty or json) plus an optional daily rolling log file.
/// The returned guard must live as long as the process.
fn init_tracing(logging: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("clinic_maintenance={},tower_http=debug", logging.level).into());

    let (file_layer, guard) = match logging.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "clinic-maintenance.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    let json = logging.format == "json";
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
