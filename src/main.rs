//! eonetd binary entry point.
//!
//! Startup order: load config, open the store and ensure the table, run the
//! one-shot ingestion pass, then serve the query endpoints. Ingestion always
//! finishes before the listener starts, so no request races it.

use std::net::SocketAddr;

use clap::Parser;
use eonetd::{
    config::AppConfig,
    feed::{self, FeedClient},
    server::{AppState, create_router},
    storage::EventStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// eonetd - EONET event snapshot service
#[derive(Parser, Debug)]
#[command(name = "eonetd", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "EONETD_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "EONETD_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "EONETD_SERVER_PORT")]
    server_port: Option<u16>,

    /// Database file path (overrides config file)
    #[arg(long, env = "EONETD_DB_PATH")]
    db_path: Option<String>,

    /// Feed URL (overrides config file)
    #[arg(long, env = "EONETD_FEED_URL")]
    feed_url: Option<String>,

    /// Feed result-count limit (overrides config file)
    #[arg(long, env = "EONETD_FEED_LIMIT")]
    feed_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eonetd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("loading configuration from: {}", cli.config);
    let mut config = AppConfig::load_or_default(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    if let Some(url) = cli.feed_url {
        config.feed.url = url;
    }
    if let Some(limit) = cli.feed_limit {
        config.feed.limit = limit;
    }
    config.validate()?;

    tracing::info!(
        "server: {}:{}, database: {}, feed: {} (limit {})",
        config.server.bind,
        config.server.port,
        config.database.path,
        config.feed.url,
        config.feed.limit,
    );

    let store = EventStore::connect(&config.database.path, config.database.pool_size).await?;

    // Expected to run on every startup; an existing table is not an error.
    // Any other DDL failure is logged and the process keeps serving, per the
    // swallow-and-log policy for store errors.
    if let Err(e) = store.ensure_table().await {
        tracing::error!(error = %e, "table setup failed, continuing");
    }

    let client = FeedClient::new(&config.feed.url, config.feed.limit, config.feed.timeout)?;
    let grouping_key = match feed::run_ingest(&client, &store).await {
        Ok((key, report)) => {
            if !report.all_written() {
                tracing::warn!(
                    failed = report.failed.len(),
                    "partial ingestion, serving what was written"
                );
            }
            key
        }
        Err(e) => {
            tracing::error!(error = %e, "ingestion pass failed, serving empty dataset");
            feed::DEFAULT_GROUPING_KEY.to_string()
        }
    };

    let app = create_router(AppState {
        store: store.clone(),
        grouping_key,
    });

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store))
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for SIGINT/SIGTERM, then close the store.
async fn shutdown_signal(store: EventStore) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("received terminate signal");
        }
    }

    store.close().await;
}
