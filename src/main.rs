//! wallboard-collectd - bus event counters for collectd
//!
//! Counts bus events per category and, once per interval, prints a single
//! collectd `PUTVAL` line on stdout for the exec plugin to pick up.
//!
//! Exit codes:
//!   0 - Clean shutdown (SIGINT/SIGTERM)
//!   1 - Startup error (bad arguments, unreadable or invalid configuration)

mod aggregator;
mod bridge;
mod cli;
mod config;
mod error;
mod formatter;
mod scheduler;
mod sink;
mod source;
mod taxonomy;

use anyhow::{Context, Result};
use bridge::Bridge;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use sink::LineSink;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("wallboard-collectd v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_bridge(args).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("Bridge failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    eprintln!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging on stderr; stdout is reserved for PUTVAL lines.
///
/// `RUST_LOG` overrides the level chosen by --verbose/--quiet.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn log_filter(args: &Args) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy()
}

/// Build the bridge and run it until a shutdown signal arrives.
async fn run_bridge(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let bridge = Bridge::new(&config)?;
    info!(
        "Reporting as {} every {}s",
        bridge.host(),
        bridge.interval().as_secs()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let input = BufReader::new(tokio::io::stdin());
    let summary = bridge.run(input, LineSink::stdout(), shutdown_rx).await?;

    info!(
        ticks = summary.ticks,
        counted = summary.ingest.counted,
        dropped = summary.ingest.dropped,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Resolve once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
    info!("Signal received, finishing in-flight flush");
}
