//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Every setting
//! is optional here so that config file values are only overridden by
//! flags that were actually given.

use clap::Parser;
use std::path::PathBuf;

/// wallboard-collectd - bus event counters for collectd
///
/// Reads bus events (one JSON envelope or bare topic per line) on stdin,
/// counts them per category, and every interval prints one collectd
/// PUTVAL line on stdout. Logs go to stderr.
///
/// Examples:
///   fedmsg-tail --really-pretty=false | wallboard-collectd
///   wallboard-collectd --collectd-interval 10 --host busmon01
///   wallboard-collectd --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Number of seconds to sleep between collectd updates
    ///
    /// Defaults to the config file value, or 2.
    #[arg(long, value_name = "SECS", env = "WALLBOARD_COLLECTD_INTERVAL")]
    pub collectd_interval: Option<u64>,

    /// Host identifier reported to collectd
    ///
    /// Defaults to the machine hostname.
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Categories to count (comma-separated)
    ///
    /// Example: --categories bodhi,git,wiki
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .wallboard-collectd.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .wallboard-collectd.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.collectd_interval == Some(0) {
            return Err("Interval must be at least 1 second".to_string());
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
