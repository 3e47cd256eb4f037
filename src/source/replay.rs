//! Playback of recorded subscription traffic.
//!
//! A recording is a JSON-lines file, one entry per line:
//!
//! ```text
//! {"type": "connect"}
//! {"type": "data", "payload": {"Order_Id__c": "A-1"}}
//! {"type": "error", "message": "handshake expired"}
//! {"type": "disconnect"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A
//! `{"type": "reject_auth", "reason": "..."}` entry anywhere in the file makes
//! authentication fail with that reason; it is not played back.

use std::io::BufRead;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Connection, EventRecord, EventSource, SourceError, StreamingClient, SubscribeRequest,
    Subscription, SubscriptionSignal,
};
use crate::adapter::options::{AuthenticationParams, ConnectionParams};

/// Errors from loading a recording.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The recording could not be read.
    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not a valid entry.
    #[error("invalid entry on line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// One line of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEntry {
    /// Subscription handshake completed.
    Connect,
    /// Subscription closed by the platform.
    Disconnect,
    /// One event.
    Data {
        /// Event payload, passed through untouched.
        payload: serde_json::Value,
    },
    /// Subscription failure.
    Error {
        /// Failure description.
        message: String,
    },
    /// Refuse authentication.
    RejectAuth {
        /// Reason reported by the failed authentication.
        reason: String,
    },
}

/// Event source that replays a recording as its only subscription.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    signals: Vec<SubscriptionSignal>,
    auth_rejection: Option<String>,
}

impl ReplaySource {
    /// Load a recording from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if the file cannot be read or a line fails to parse.
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Load a recording from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if reading fails or a line fails to parse.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let entry = serde_json::from_str::<ReplayEntry>(trimmed).map_err(|source| {
                ReplayError::Parse {
                    line: index.saturating_add(1),
                    source,
                }
            })?;
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    /// Build a source from already-parsed entries.
    pub fn from_entries(entries: impl IntoIterator<Item = ReplayEntry>) -> Self {
        let mut signals = Vec::new();
        let mut auth_rejection = None;
        for entry in entries {
            match entry {
                ReplayEntry::Connect => signals.push(SubscriptionSignal::Connect),
                ReplayEntry::Disconnect => signals.push(SubscriptionSignal::Disconnect),
                ReplayEntry::Data { payload } => {
                    signals.push(SubscriptionSignal::Data(EventRecord::new(payload)));
                }
                ReplayEntry::Error { message } => {
                    signals.push(SubscriptionSignal::Error(SourceError::Transport(message)));
                }
                ReplayEntry::RejectAuth { reason } => auth_rejection = Some(reason),
            }
        }
        Self {
            signals,
            auth_rejection,
        }
    }

    /// Number of signals that will be played back.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the recording plays back nothing.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl EventSource for ReplaySource {
    fn create_connection(
        &self,
        _params: ConnectionParams,
    ) -> Result<Box<dyn Connection>, SourceError> {
        Ok(Box::new(ReplayConnection {
            signals: self.signals.clone(),
            auth_rejection: self.auth_rejection.clone(),
        }))
    }
}

struct ReplayConnection {
    signals: Vec<SubscriptionSignal>,
    auth_rejection: Option<String>,
}

#[async_trait]
impl Connection for ReplayConnection {
    async fn authenticate(&mut self, _auth: &AuthenticationParams) -> Result<(), SourceError> {
        match &self.auth_rejection {
            Some(reason) => Err(SourceError::Authentication(reason.clone())),
            None => Ok(()),
        }
    }

    fn create_stream_client(&self) -> Box<dyn StreamingClient> {
        Box::new(ReplayStreamingClient {
            signals: Some(self.signals.clone()),
        })
    }
}

struct ReplayStreamingClient {
    signals: Option<Vec<SubscriptionSignal>>,
}

impl StreamingClient for ReplayStreamingClient {
    fn subscribe(&mut self, request: SubscribeRequest) -> Result<Subscription, SourceError> {
        let signals = self.signals.take().ok_or_else(|| {
            SourceError::Rejected("recording already replayed".to_owned())
        })?;
        debug!(topic = %request.topic, signals = signals.len(), "replaying recording");
        Ok(Subscription::new(tokio_stream::iter(signals)))
    }
}
