//! Healthwatch CLI
//!
//! Command-line interface for the healthwatch alerting service.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use healthwatch::alerting::{AlertDispatcher, EvaluationEngine, WebhookTransport};
use healthwatch::api::{AppState, HttpServer};
use healthwatch::ingest::{DispatchWorker, IngestionService, DEFAULT_QUEUE_CAPACITY};
use healthwatch::store::{PgDeliveryLog, PgNotificationStore, PostgresPool};
use healthwatch::Config;

/// Healthwatch - health-check alerting for monitored URLs
#[derive(Parser)]
#[command(name = "healthwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "HEALTHWATCH_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the event ingestion server
    Serve {
        /// HTTP API port (overrides config)
        #[arg(long, env = "HEALTHWATCH_HTTP_PORT")]
        http_port: Option<u16>,
    },

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Serve { http_port } => run_serve(config, http_port).await,
        Commands::Migrate => run_migrate(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_serve(config: Config, http_port: Option<u16>) -> anyhow::Result<()> {
    let pool = PostgresPool::new(&config.database).await?;
    pool.health_check().await?;
    info!("database connection healthy");

    let transport = Arc::new(WebhookTransport::new(config.alerting.webhook_url.clone())?);
    let cancel = CancellationToken::new();
    let dispatcher = Arc::new(AlertDispatcher::new(
        transport,
        &config.alerting.recipient,
        config.alerting.max_attempts,
        Duration::from_secs(config.alerting.retry_interval_seconds),
        cancel.clone(),
    ));

    let delivery_log = Arc::new(PgDeliveryLog::new(&pool));
    let worker = Arc::new(DispatchWorker::new(
        dispatcher,
        delivery_log,
        DEFAULT_QUEUE_CAPACITY,
    ));
    let worker_task = worker.clone();
    tokio::spawn(async move { worker_task.start().await });

    let service = Arc::new(IngestionService::new(
        EvaluationEngine::new(config.alerting.latency_threshold_ms),
        Arc::new(PgNotificationStore::new(&pool)),
        worker,
    ));

    let addr = format!(
        "{}:{}",
        config.server.host,
        http_port.unwrap_or(config.server.http_port)
    );
    let server = HttpServer::new(AppState {
        service,
        api_key: config.api.key.clone(),
    });

    tokio::select! {
        result = server.serve(&addr) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down, aborting waiting dispatch retries");
            cancel.cancel();
        }
    }

    Ok(())
}

async fn run_migrate(config: Config) -> anyhow::Result<()> {
    let pool = PostgresPool::new(&config.database).await?;
    pool.migrate().await?;
    info!("migrations applied");
    Ok(())
}
