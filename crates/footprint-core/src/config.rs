//! Configuration loading and typed config structures for the tracking core.
//!
//! The host supplies a YAML file (conventionally `footprint.yaml`). Every
//! field has a default, so an empty file, or no file at all, yields a
//! working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Why `footprint.yaml` could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read tracker config: {source}")]
    Io {
        /// Filesystem error.
        #[from]
        source: std::io::Error,
    },

    /// The file is not valid YAML or has mistyped keys.
    #[error("invalid tracker config: {source}")]
    Yaml {
        /// Parser error, with line and column.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracking configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Navigation tracking behavior.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Structured logger behavior.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity storage location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Persistence backend connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
}

impl TrackerConfig {
    /// Read and parse the tracker configuration at `path`.
    ///
    /// `DATABASE_URL`, when set, overrides `infrastructure.postgres_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse tracker configuration from YAML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Navigation tracking behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingConfig {
    /// Path prefixes that are never tracked (administrative routes).
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Delay before a dispatch reads page metadata and writes, in millis.
    #[serde(default = "default_title_settle_delay_ms")]
    pub title_settle_delay_ms: u64,

    /// Inactivity after which a session rotates, in minutes.
    #[serde(default = "default_session_inactivity_minutes")]
    pub session_inactivity_minutes: u64,
}

impl TrackingConfig {
    /// The settle delay as a [`Duration`].
    pub const fn title_settle_delay(&self) -> Duration {
        Duration::from_millis(self.title_settle_delay_ms)
    }

    /// The session inactivity window as a [`Duration`].
    pub const fn session_inactivity(&self) -> Duration {
        Duration::from_secs(self.session_inactivity_minutes.saturating_mul(60))
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: default_excluded_prefixes(),
            title_settle_delay_ms: default_title_settle_delay_ms(),
            session_inactivity_minutes: default_session_inactivity_minutes(),
        }
    }
}

/// Structured logger behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Whether structured log writes are persisted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Diagnostic subscriber level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
        }
    }
}

/// Identity storage location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the visitor and session keys.
    #[serde(default = "default_identity_path")]
    pub identity_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            identity_path: default_identity_path(),
        }
    }
}

/// Persistence backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. Empty means run without a database.
    #[serde(default)]
    pub postgres_url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Records of each kind kept in memory when no database is in use.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl InfrastructureConfig {
    /// Override the database URL with `DATABASE_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.postgres_url = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            postgres_url: String::new(),
            max_connections: default_max_connections(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_excluded_prefixes() -> Vec<String> {
    vec!["/admin".to_owned()]
}

const fn default_title_settle_delay_ms() -> u64 {
    100
}

const fn default_session_inactivity_minutes() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_identity_path() -> PathBuf {
    PathBuf::from("footprint-identity.json")
}

const fn default_max_connections() -> u32 {
    4
}

const fn default_memory_capacity() -> usize {
    1024
}

const fn default_true() -> bool {
    true
}
