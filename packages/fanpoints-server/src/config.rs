//! Service configuration.
//!
//! Sources, lowest priority first: built-in defaults, an optional
//! `fanpoints.toml`, then `FANPOINTS_*` environment variables (nested keys
//! use `__`, e.g. `FANPOINTS_DEFAULT_RULES__DAILY_REWARD_CAP`).

use fanpoints_types::FraudRules;
use serde::Deserialize;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "fanpoints";
pub const ENV_PREFIX: &str = "FANPOINTS";

/// Configuration for the reward service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// JSON snapshot file. `None` keeps everything in memory only.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Seconds between periodic snapshots. 0 saves only on shutdown.
    #[serde(default = "defaults::snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,

    #[serde(default = "defaults::max_settle_attempts")]
    pub max_settle_attempts: u32,

    #[serde(default = "defaults::wallet_ledger_page")]
    pub wallet_ledger_page: usize,

    /// Seed for the fraud-rule singleton on first read.
    #[serde(default)]
    pub default_rules: RulesConfig,

    /// Gateway API key. Unset = dev mode (no auth).
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            snapshot_path: None,
            snapshot_interval_secs: defaults::snapshot_interval_secs(),
            max_settle_attempts: defaults::max_settle_attempts(),
            wallet_ledger_page: defaults::wallet_ledger_page(),
            default_rules: RulesConfig::default(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "defaults::daily_reward_cap")]
    pub daily_reward_cap: u64,

    #[serde(default = "defaults::max_sessions_per_hour")]
    pub max_sessions_per_hour: u32,

    #[serde(default = "defaults::min_heartbeat_gap_ms")]
    pub min_heartbeat_gap_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            daily_reward_cap: defaults::daily_reward_cap(),
            max_sessions_per_hour: defaults::max_sessions_per_hour(),
            min_heartbeat_gap_ms: defaults::min_heartbeat_gap_ms(),
        }
    }
}

impl From<RulesConfig> for FraudRules {
    fn from(c: RulesConfig) -> Self {
        FraudRules {
            daily_reward_cap: c.daily_reward_cap,
            max_sessions_per_hour: c.max_sessions_per_hour,
            min_heartbeat_gap_ms: c.min_heartbeat_gap_ms,
        }
    }
}

impl Config {
    /// Load from `fanpoints.toml` (if present) and the environment.
    pub fn load() -> Result<Self, crate::Error> {
        Self::from_sources(config::File::with_name(CONFIG_FILE).required(false))
    }

    fn from_sources(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<Self, crate::Error> {
        let config: Config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::Error::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.filter(|k| !k.is_empty()),
            ..config
        })
    }

    pub fn fraud_rules(&self) -> FraudRules {
        self.default_rules.into()
    }
}

mod defaults {
    use fanpoints_types::FraudRules;

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn snapshot_interval_secs() -> u64 {
        60
    }

    pub fn max_settle_attempts() -> u32 {
        3
    }

    pub fn wallet_ledger_page() -> usize {
        25
    }

    pub fn daily_reward_cap() -> u64 {
        FraudRules::default().daily_reward_cap
    }

    pub fn max_sessions_per_hour() -> u32 {
        FraudRules::default().max_sessions_per_hour
    }

    pub fn min_heartbeat_gap_ms() -> u64 {
        FraudRules::default().min_heartbeat_gap_ms
    }
}
