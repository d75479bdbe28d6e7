//! # Ledger Configuration
//!
//! Configuration management for the ledger and its record store.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PIGMENT_DB_PATH=/var/lib/pigment/pigment.db                        │
//! │     PIGMENT_MAX_CONNECTIONS=8                                          │
//! │     PIGMENT_COMMISSION_FLOOR=allow_negative                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pigment/pigment.toml (Linux)                             │
//! │     ~/Library/Application Support/com.pigment.ledger/pigment.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     <data dir>/pigment.db, clamp_to_zero                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pigment.toml
//! [database]
//! path = "/var/lib/pigment/pigment.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//!
//! [commission]
//! floor = "clamp_to_zero"  # clamp_to_zero | allow_negative
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use pigment_core::CommissionFloor;
use pigment_db::DbConfig;

const CONFIG_FILE: &str = "pigment.toml";
const DATABASE_FILE: &str = "pigment.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; `:memory:` for an in-memory store.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "pigment", "ledger")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// `[commission]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionSettings {
    /// What to do when refunds push an agent's totals below zero.
    #[serde(default)]
    pub floor: CommissionFloor,
}

// =============================================================================
// Ledger Config
// =============================================================================

/// Complete ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub commission: CommissionSettings,
}

impl LedgerConfig {
    /// Loads configuration: defaults, then the TOML file, then environment.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// In-memory store, default policies. For tests and dry runs.
    pub fn in_memory() -> Self {
        LedgerConfig {
            database: DatabaseSettings {
                path: PathBuf::from(pigment_db::pool::IN_MEMORY_PATH),
                max_connections: 1,
                ..DatabaseSettings::default()
            },
            commission: CommissionSettings::default(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        Ok(())
    }

    /// Builds the record store configuration.
    pub fn to_db_config(&self) -> DbConfig {
        let config = DbConfig::new(&self.database.path);
        if config.is_in_memory() {
            return DbConfig::in_memory();
        }
        config
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PIGMENT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("PIGMENT_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid PIGMENT_MAX_CONNECTIONS"),
            }
        }

        if let Ok(floor) = std::env::var("PIGMENT_COMMISSION_FLOOR") {
            match floor.to_lowercase().as_str() {
                "clamp_to_zero" | "clamp" => self.commission.floor = CommissionFloor::ClampToZero,
                "allow_negative" | "negative" => {
                    self.commission.floor = CommissionFloor::AllowNegative
                }
                _ => warn!(value = %floor, "Unknown commission floor in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pigment", "ledger")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
