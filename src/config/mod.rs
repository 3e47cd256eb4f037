//! Configuration loading.
//!
//! Loads stream configuration from `./event-stream.toml` (or
//! `$PES_CONFIG_PATH`). Environment variables override file values; file
//! values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapter::logger::StreamLogger;
use crate::adapter::options::{AdapterOptions, AuthenticationParams, ConnectionParams};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "PES_CONFIG_PATH";

/// Config file used when `$PES_CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "event-stream.toml";

// ── Top-level config ────────────────────────────────────────────

/// Top-level stream configuration loaded from TOML.
///
/// ```toml
/// event_name = "Order_Event__e"
///
/// [connection]
/// client_id = "3MVG9..."
/// client_secret = "..."
/// environment = "sandbox"
///
/// [authentication]
/// username = "integration@example.com"
/// password = "..."
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Topic to subscribe to.
    pub event_name: Option<String>,
    /// Connection parameters passed to the event source.
    pub connection: ConnectionParams,
    /// Credentials passed to the event source.
    pub authentication: Option<AuthenticationParams>,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl StreamConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$PES_CONFIG_PATH` or `./event-stream.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path, then apply env overrides.
    ///
    /// Unlike [`StreamConfig::load`], a missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    fn config_path() -> PathBuf {
        Self::config_path_with(|key| std::env::var(key).ok())
    }

    /// Resolve the config path using a custom env resolver.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("PES_EVENT_NAME") {
            self.event_name = Some(v);
        }

        // Connection.
        if let Some(v) = env("PES_CLIENT_ID") {
            self.connection.client_id = v;
        }
        if let Some(v) = env("PES_CLIENT_SECRET") {
            self.connection.client_secret = v;
        }
        if let Some(v) = env("PES_ENVIRONMENT") {
            match v.parse() {
                Ok(environment) => self.connection.environment = environment,
                Err(_) => tracing::warn!(
                    var = "PES_ENVIRONMENT",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Authentication (password grant only).
        let username = env("PES_USERNAME");
        let password = env("PES_PASSWORD");
        let security_token = env("PES_SECURITY_TOKEN");
        match &mut self.authentication {
            Some(AuthenticationParams::Password {
                username: current_username,
                password: current_password,
                security_token: current_token,
            }) => {
                if let Some(v) = username {
                    *current_username = v;
                }
                if let Some(v) = password {
                    *current_password = v;
                }
                if security_token.is_some() {
                    *current_token = security_token;
                }
            }
            _ => match (username, password) {
                (Some(username), Some(password)) => {
                    self.authentication = Some(AuthenticationParams::Password {
                        username,
                        password,
                        security_token,
                    });
                }
                (None, None) => {}
                _ => tracing::warn!(
                    "ignoring partial credential override: PES_USERNAME and PES_PASSWORD must both be set"
                ),
            },
        }

        // Logging.
        if let Some(v) = env("PES_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: StreamConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Check that the config is complete enough to build an adapter.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing setting.
    pub fn validate(&self) -> Result<()> {
        match self.event_name.as_deref() {
            None => anyhow::bail!("event_name is not set"),
            Some(name) if name.trim().is_empty() => anyhow::bail!("event_name is empty"),
            Some(_) => {}
        }
        if self.authentication.is_none() {
            anyhow::bail!("[authentication] is not set");
        }
        Ok(())
    }

    /// Build adapter options from this config.
    ///
    /// # Errors
    ///
    /// Returns an error if [`StreamConfig::validate`] fails.
    pub fn into_options(self, logger: Option<Arc<dyn StreamLogger>>) -> Result<AdapterOptions> {
        self.validate()?;
        let Self {
            event_name,
            connection,
            authentication,
            ..
        } = self;
        let (Some(event_name), Some(authentication)) = (event_name, authentication) else {
            anyhow::bail!("config validated but required fields are missing");
        };
        Ok(AdapterOptions {
            event_name,
            connection,
            authentication,
            logger,
        })
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily-rotated JSON logs. Console only when unset.
    pub json_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_dir: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
