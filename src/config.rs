//! Configuration file handling.
//!
//! This module handles loading, merging and validating configuration from
//! `.wallboard-collectd.toml` files.

use crate::error::BridgeError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".wallboard-collectd.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reporting settings.
    #[serde(default)]
    pub collectd: CollectdConfig,

    /// Topic to category mapping.
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

/// collectd reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectdConfig {
    /// Seconds between flushes.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Host identifier reported to collectd. Defaults to the machine hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Default for CollectdConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            host: None,
        }
    }
}

fn default_interval() -> u64 {
    2
}

/// Fixed category set and how topics map onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Categories counted and reported, one value each.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Only topics starting with this prefix are counted.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Zero-based dot-separated topic segment naming the category.
    #[serde(default = "default_category_segment")]
    pub category_segment: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            topic_prefix: default_topic_prefix(),
            category_segment: default_category_segment(),
        }
    }
}

fn default_categories() -> Vec<String> {
    vec![
        "ansible",
        "askbot",
        "bodhi",
        "buildsys",
        "compose",
        "copr",
        "fas",
        "fedbadges",
        "fedoratagger",
        "fmn",
        "git",
        "jenkins",
        "kerneltest",
        "logger",
        "mailman",
        "meetbot",
        "nuancier",
        "pkgdb",
        "planet",
        "trac",
        "wiki",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_topic_prefix() -> String {
    "org.fedoraproject.".to_string()
}

fn default_category_segment() -> usize {
    3
}

impl TaxonomyConfig {
    /// Lowercased, de-duplicated category set.
    pub fn normalized_categories(&self) -> BTreeSet<String> {
        self.categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect()
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load the default config file from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(interval) = args.collectd_interval {
            self.collectd.interval = interval;
        }
        if let Some(ref host) = args.host {
            self.collectd.host = Some(host.clone());
        }
        if let Some(ref categories) = args.categories {
            self.taxonomy.categories = categories.clone();
        }
    }

    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.collectd.interval == 0 {
            return Err(BridgeError::InvalidConfiguration(
                "interval must be at least 1 second".to_string(),
            ));
        }

        if let Some(ref host) = self.collectd.host {
            if host.trim().is_empty() {
                return Err(BridgeError::InvalidConfiguration(
                    "host must not be empty".to_string(),
                ));
            }
        }

        let categories = self.taxonomy.normalized_categories();
        if categories.is_empty() {
            return Err(BridgeError::InvalidConfiguration(
                "at least one category is required".to_string(),
            ));
        }
        for category in &categories {
            if category.is_empty() || category.contains('.') || category.contains(char::is_whitespace) {
                return Err(BridgeError::InvalidConfiguration(format!(
                    "invalid category name: {:?}",
                    category
                )));
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
