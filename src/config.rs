//! Runtime configuration for the vanity keypair generator.
//!
//! Every option can be given on the command line or through the environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::matcher::{PatternError, SearchPattern};
use crate::worker::{default_cores, SearchOptions};

/// Solana Vanity Keypair Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix the public key should start with (base58)
    #[arg(short, long, env = "VANITY_PREFIX", default_value = "")]
    pub prefix: String,

    /// Suffix the public key should end with (base58)
    #[arg(short, long, env = "VANITY_SUFFIX", default_value = "pump")]
    pub suffix: String,

    /// Seconds before a single search gives up
    #[arg(short, long = "timeout", env = "VANITY_TIMEOUT_SECONDS", default_value = "600")]
    pub timeout_seconds: u64,

    /// Number of worker threads (default: CPU count minus two, at least one)
    #[arg(short = 'w', long, env = "VANITY_CORES")]
    pub cores: Option<usize>,

    /// Stop after storing N keypairs (0 = run forever)
    #[arg(short = 'n', long, env = "VANITY_COUNT", default_value = "0")]
    pub count: usize,

    /// File the found keypairs are appended to
    #[arg(short, long, env = "VANITY_OUTPUT", default_value = "vanity-keys.jsonl")]
    pub output: PathBuf,

    /// Progress report interval in seconds
    #[arg(short, long, env = "VANITY_REPORT_INTERVAL", default_value = "1")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count minus two
    pub fn worker_count(&self) -> usize {
        self.cores.unwrap_or_else(default_cores)
    }

    /// Validates the configuration, returning the search pattern it describes
    pub fn validate(&self) -> Result<SearchPattern, ConfigError> {
        let pattern = self.pattern()?;
        self.search_options().validate()?;
        Ok(pattern)
    }

    /// Builds the search pattern
    pub fn pattern(&self) -> Result<SearchPattern, ConfigError> {
        Ok(SearchPattern::new(self.prefix.trim(), self.suffix.trim())?)
    }

    /// Builds the per-search tuning options
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            timeout: Duration::from_secs(self.timeout_seconds),
            cores: self.worker_count(),
            report_interval: Duration::from_secs(self.report_interval),
            ..SearchOptions::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
