//! Layered runtime configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `TASKMATE_` prefix, `__` separating
//!    nested sections (`TASKMATE_ENGINE__MAX_CONFLICT_RETRIES=5`)
//! 2. `taskmate.toml` in the working directory, or the file named by
//!    `TASKMATE_CONFIG`
//! 3. Built-in defaults

use crate::task::{adapters::postgres::TaskPgPool, domain::ReassignPolicy};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "TASKMATE_";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "taskmate.toml";

/// Errors raised while loading configuration or building resources from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A required setting is missing.
    #[error("configuration value '{0}' is not set")]
    Missing(&'static str),

    /// A setting has an unusable value.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted setting path.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Complete application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Storage connection.
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Lifecycle engine behaviour.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Authorization rules applied by the action dispatcher.
    #[serde(default)]
    pub authorization: AuthorizationSettings,
    /// Logging output.
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Loads settings from defaults, the configuration file and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Extracts and validates settings from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let settings: Self = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Builds the provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let config_path = std::env::var_os("TASKMATE_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["CONFIG", "LOG"])
                    .split("__"),
            )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

const fn default_pool_size() -> u32 {
    4
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// Connection URL. Empty means in-memory storage only.
    #[serde(default)]
    pub url: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
        }
    }
}

impl DatabaseSettings {
    /// Returns `true` when a database URL is set.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Builds an r2d2 connection pool for the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no URL is set and
    /// [`ConfigError::InvalidValue`] when the pool cannot be created.
    pub fn connect(&self) -> Result<TaskPgPool, ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::Missing("database.url"));
        }
        let manager = ConnectionManager::<PgConnection>::new(self.url.as_str());
        Pool::builder()
            .max_size(self.pool_size)
            .build(manager)
            .map_err(|err| ConfigError::InvalidValue {
                field: "database.url",
                reason: err.to_string(),
            })
    }
}

const fn default_max_conflict_retries() -> u32 {
    3
}

/// Lifecycle engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// How many times a write that lost a race is recomputed and retried.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Assignee handling when a task enters `in_progress`.
    #[serde(default)]
    pub reassign_policy: ReassignPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
            reassign_policy: ReassignPolicy::default(),
        }
    }
}

const fn enabled() -> bool {
    true
}

/// Creator-only rules enforced before destructive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorizationSettings {
    /// Only the creator may archive a task.
    #[serde(default = "enabled")]
    pub creator_only_archive: bool,
    /// Only the creator may delete a task, and only while it is new.
    #[serde(default = "enabled")]
    pub creator_only_delete: bool,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            creator_only_archive: true,
            creator_only_delete: true,
        }
    }
}

fn default_filter() -> String {
    "info".to_owned()
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogSettings {
    /// `tracing-subscriber` filter directive, e.g. `taskmate=debug`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
