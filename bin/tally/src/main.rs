//! Tally - on-chain event ingestion and reconciliation service.
//!
//! # Usage
//!
//! ```bash
//! # Start with default config
//! tally
//!
//! # Start with environment overrides
//! DATABASE_URL=postgres://localhost/tally INDEXER_URL=http://indexer:8080/v1/graphql tally
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tally_core::error::IngestError;
use tally_core::metrics::init_metrics;
use tally_core::services::{IngestConfig, IngestService};
use tally_processors::ProcessorSet;
use tally_storage::{Database, DatabaseConfig, PgRepositories};
use tally_upstream::{GraphqlEventSource, StaticChainReader, UpstreamConfig};

/// Tally CLI - on-chain event reconciler.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Tally - on-chain event ingestion and reconciliation service")]
#[command(version)]
struct Cli {
    /// Upstream indexing service GraphQL URL.
    #[arg(
        long,
        env = "INDEXER_URL",
        default_value = "http://127.0.0.1:8080/v1/graphql"
    )]
    indexer_url: String,

    /// PostgreSQL database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/tally")]
    database_url: String,

    /// Seconds between ingestion cycles.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Upper bound in seconds on one cycle's upstream fetch.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    fetch_timeout_secs: u64,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>()
    {
        Ok(metrics_addr) => match PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => {
                init_metrics();
                true
            }
            Err(e) => {
                warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                false
            }
        },
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Tally");
    debug!(indexer_url = %cli.indexer_url, "Upstream endpoint");
    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ DATABASE
    // ─────────────────────────────────────────────────────────────────────────
    info!("🗄️  Connecting to database...");
    let db_config = DatabaseConfig::for_ingest(&cli.database_url);
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;

    db.migrate().await.context("Failed to run migrations")?;
    info!("🗄️  Database ready (migrations applied)");

    if cli.migrate_only {
        info!("🛑 --migrate-only flag set, exiting");
        db.close().await;
        return Ok(());
    }

    let db = Arc::new(db);
    let repositories = Arc::new(PgRepositories::new(db.clone()));

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 UPSTREAM & PROCESSORS
    // ─────────────────────────────────────────────────────────────────────────
    let upstream_config = UpstreamConfig {
        url: cli.indexer_url.clone(),
        ..Default::default()
    };
    let source = Arc::new(
        GraphqlEventSource::new(upstream_config).context("Failed to build upstream client")?,
    );

    let processors = Arc::new(ProcessorSet::new(
        repositories.clone(),
        Arc::new(StaticChainReader),
    ));

    let ingest_config = IngestConfig {
        poll_interval: Duration::from_secs(cli.poll_interval_secs),
        fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
    };
    let ingest = IngestService::new(ingest_config, source, repositories, processors);

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICE START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut ingest_handle = tokio::spawn(
        async move { ingest.run(shutdown_rx).await }.instrument(info_span!("ingest")),
    );

    info!("✅ Tally ready");
    if metrics_enabled {
        info!("   📊 Metrics:  http://localhost:{}/metrics", cli.metrics_port);
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    let exit = tokio::select! {
        _ = shutdown_signal() => {
            // ─────────────────────────────────────────────────────────────────
            // 🛑 SHUTDOWN
            // ─────────────────────────────────────────────────────────────────
            info!("🛑 Shutting down...");
            let _ = shutdown_tx.send(true);

            match tokio::time::timeout(Duration::from_secs(30), &mut ingest_handle).await {
                Ok(_) => debug!("Ingest stopped"),
                Err(_) => warn!("⚠️  Ingest shutdown timed out"),
            }
            Ok(())
        }
        result = &mut ingest_handle => {
            // The ingest task only ends on its own for fatal errors; exit
            // non-zero so the supervisor restarts the process.
            match result {
                Ok(Err(IngestError::ShutdownRequested)) | Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "❌ Ingest failed");
                    Err(anyhow!(e))
                }
                Err(e) => {
                    error!(error = %e, "❌ Ingest task panicked");
                    Err(anyhow!(e))
                }
            }
        }
    };

    db.close().await;

    info!("🛑 Shutdown complete");
    exit
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
