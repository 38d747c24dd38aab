//! Runtime configuration for the ledger.
//!
//! Read from `config/ledger.toml` (optional) and then from `STOCK_LEDGER__*` environment
//! variables, e.g. `STOCK_LEDGER__LOW_STOCK_THRESHOLD=5`. Every key has a default, so an
//! empty environment yields [`LedgerConfig::default`].

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

use crate::model::MovementType;

const CONFIG_FILE: &str = "config/ledger.toml";
const ENV_PREFIX: &str = "STOCK_LEDGER";

/// When the integrity pre-flight check runs before a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityPolicy {
    /// Before every movement.
    Always,
    /// Before `sale` only, the operation that can oversell.
    #[default]
    Risky,
    Never,
}

impl IntegrityPolicy {
    pub fn applies_to(&self, movement_type: MovementType) -> bool {
        match self {
            IntegrityPolicy::Always => true,
            IntegrityPolicy::Risky => movement_type == MovementType::Sale,
            IntegrityPolicy::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_max_history_limit")]
    pub max_history_limit: usize,
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    #[serde(default = "default_actor_idle_timeout_ms")]
    pub actor_idle_timeout_ms: u64,
    #[serde(default)]
    pub integrity_policy: IntegrityPolicy,
    /// Periodic low-stock scan; 0 disables it.
    #[serde(default)]
    pub scan_interval_ms: u64,
}

fn default_low_stock_threshold() -> u32 {
    10
}

fn default_history_limit() -> usize {
    50
}

fn default_max_history_limit() -> usize {
    500
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_storage_timeout_ms() -> u64 {
    2_000
}

fn default_mailbox_capacity() -> usize {
    32
}

fn default_actor_idle_timeout_ms() -> u64 {
    60_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            history_limit: default_history_limit(),
            max_history_limit: default_max_history_limit(),
            max_conflict_retries: default_max_conflict_retries(),
            storage_timeout_ms: default_storage_timeout_ms(),
            mailbox_capacity: default_mailbox_capacity(),
            actor_idle_timeout_ms: default_actor_idle_timeout_ms(),
            integrity_policy: IntegrityPolicy::default(),
            scan_interval_ms: 0,
        }
    }
}

impl LedgerConfig {
    /// Load from `config/ledger.toml` (if present), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_settings(settings)
    }

    /// Parse a TOML document on its own, without the environment.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config: LedgerConfig = settings.try_deserialize()?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.storage_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "storage_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.history_limit > self.max_history_limit {
            return Err(ConfigError::Message(format!(
                "history_limit ({}) exceeds max_history_limit ({})",
                self.history_limit, self.max_history_limit
            )));
        }
        Ok(self)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn actor_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.actor_idle_timeout_ms)
    }

    /// `None` when the periodic scan is disabled.
    pub fn scan_interval(&self) -> Option<Duration> {
        (self.scan_interval_ms > 0).then(|| Duration::from_millis(self.scan_interval_ms))
    }

    /// Caller limit, or the default, capped at `max_history_limit`.
    pub fn effective_history_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.history_limit)
            .min(self.max_history_limit)
    }
}
