//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - Ledger event journal and subscriber channel sizing
//! - Log filter for the CLI
//! - Genesis account balances for in-memory custody

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::custody::InMemoryCustody;
use crate::types::{AccountId, Amount};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Accounts credited before any ledger call
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Ledger behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Keep every committed event in memory as an audit trail
    #[serde(default = "default_journal")]
    pub journal: bool,
    /// Buffered events per subscriber before slow receivers lag
    #[serde(default = "default_channel_capacity")]
    pub event_channel_capacity: usize,
}

/// Logging configuration (RUST_LOG takes precedence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

/// Starting balance for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: AccountId,
    pub balance: Amount,
}

fn default_journal() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    256
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            journal: default_journal(),
            event_channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    /// Load from a specific path, or the embedded defaults when it is missing
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::parse(&content).context("Failed to parse config file")
        } else {
            // Use embedded default config
            Self::parse(DEFAULT_CONFIG).context("Failed to parse default config")
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Log filter (BOUNTY_LOG env var takes precedence over the config value)
    pub fn log_filter(&self) -> String {
        match std::env::var("BOUNTY_LOG") {
            Ok(filter) if !filter.is_empty() => filter,
            _ => self.logging.filter.clone(),
        }
    }

    /// Filter for the CLI: `--verbose` raises it to debug
    pub fn cli_log_filter(&self, verbose: bool) -> String {
        if verbose {
            "debug".to_string()
        } else {
            self.log_filter()
        }
    }

    /// Custody seeded with the configured account balances
    pub fn genesis_custody(&self) -> InMemoryCustody {
        InMemoryCustody::with_balances(
            self.accounts
                .iter()
                .map(|account| (account.id.clone(), account.balance)),
        )
    }
}
