//! Adapter construction input.
//!
//! [`AdapterOptions`] is consumed once by [`super::EventStreamAdapter::new`].
//! Connection and authentication parameters are handed to the event source
//! as-is, except for the connection multiplicity which is always forced to
//! [`ConnectionMode::Single`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::logger::StreamLogger;

const REDACTED: &str = "[REDACTED]";

/// How many connections the platform client may multiplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// One connection, owned by a single adapter.
    Single,
    /// Shared connection pool across consumers.
    Multi,
}

/// Platform environment to log in against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production org.
    #[default]
    Production,
    /// Sandbox org.
    Sandbox,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Connection parameters for the event source.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// OAuth client (consumer) key.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// OAuth redirect URI.
    pub redirect_uri: Option<String>,
    /// Production or sandbox.
    pub environment: Environment,
    /// Platform API version, e.g. `"v58.0"`.
    pub api_version: Option<String>,
    /// Override for the login endpoint.
    pub login_uri: Option<String>,
    /// Connection multiplicity. Always replaced with [`ConnectionMode::Single`]
    /// before reaching the source.
    pub mode: Option<ConnectionMode>,
    /// Source-specific settings not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConnectionParams {
    /// Apply the adapter's connection policy.
    ///
    /// The adapter owns its connection exclusively, so the mode is pinned to
    /// single regardless of what the caller asked for.
    pub fn normalized(self) -> Self {
        Self {
            mode: Some(ConnectionMode::Single),
            ..self
        }
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("redirect_uri", &self.redirect_uri)
            .field("environment", &self.environment)
            .field("api_version", &self.api_version)
            .field("login_uri", &self.login_uri)
            .field("mode", &self.mode)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Credentials passed opaquely to [`crate::source::Connection::authenticate`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthenticationParams {
    /// Username/password grant.
    Password {
        /// Login name.
        username: String,
        /// Account password.
        password: String,
        /// Security token appended to the password by some platforms.
        #[serde(default)]
        security_token: Option<String>,
    },
    /// OAuth authorization-code grant.
    AuthorizationCode {
        /// Code returned by the authorization redirect.
        code: String,
    },
    /// An already-issued access token.
    Token {
        /// Bearer token.
        access_token: String,
        /// Instance base URL the token is valid for.
        instance_url: String,
    },
}

impl fmt::Debug for AuthenticationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &REDACTED)
                .field("security_token", &REDACTED)
                .finish(),
            Self::AuthorizationCode { .. } => f
                .debug_struct("AuthorizationCode")
                .field("code", &REDACTED)
                .finish(),
            Self::Token { instance_url, .. } => f
                .debug_struct("Token")
                .field("access_token", &REDACTED)
                .field("instance_url", instance_url)
                .finish(),
        }
    }
}

/// Everything needed to build an [`super::EventStreamAdapter`].
#[derive(Clone)]
pub struct AdapterOptions {
    /// Topic to subscribe to. Must not be empty.
    pub event_name: String,
    /// Connection parameters for the source.
    pub connection: ConnectionParams,
    /// Credentials for the source.
    pub authentication: AuthenticationParams,
    /// Lifecycle logger. `None` means silent.
    pub logger: Option<Arc<dyn StreamLogger>>,
}

impl AdapterOptions {
    /// Options without a logger.
    pub fn new(
        event_name: impl Into<String>,
        connection: ConnectionParams,
        authentication: AuthenticationParams,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            connection,
            authentication,
            logger: None,
        }
    }

    /// Attach a lifecycle logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn StreamLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("event_name", &self.event_name)
            .field("connection", &self.connection)
            .field("authentication", &self.authentication)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
