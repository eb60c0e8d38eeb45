use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use rss_sum::{
    Config, CycleController, Database, HttpFeedSource, IntervalTicker, OllamaSummarizer,
    RssUpdater, Sha256Hasher, SqlitePostStore,
};

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    println!("rss-sum {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(rss_sum::RssSumError::Io(e)) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.apply_env_overrides().and_then(|_| config.validate()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = rss_sum::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        rss_sum::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> rss_sum::Result<()> {
    let db = Database::open(&config.database.path).await?;
    if config.database.run_migrations {
        db.migrate().await?;
        info!("Database schema at version {}", db.schema_version().await?);
    }

    let controller = CycleController::new(
        &config.worker,
        Arc::new(HttpFeedSource::new()?),
        Arc::new(SqlitePostStore::new(db)),
        Arc::new(OllamaSummarizer::new(&config.assistant)?),
        Arc::new(Sha256Hasher::new()),
    );

    let ticker = IntervalTicker::new(Duration::from_secs(config.worker.interval_secs));
    info!(
        "Next cycle in {} seconds, then every {} seconds",
        ticker.period().as_secs(),
        ticker.period().as_secs()
    );

    RssUpdater::new(controller).run(ticker, shutdown_signal()).await;
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
