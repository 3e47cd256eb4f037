//! External event-source interface.
//!
//! The adapter never talks to the remote platform itself. It drives an
//! [`EventSource`] through three steps: open a [`Connection`] synchronously,
//! authenticate it, then subscribe through a [`StreamingClient`]. The
//! resulting [`Subscription`] yields [`SubscriptionSignal`]s in the order the
//! platform delivered them.
//!
//! Two sources ship with the crate:
//! - [`channel::ChannelSource`]: driven in-process through a [`channel::SourceController`]
//! - [`replay::ReplaySource`]: plays back a JSON-lines recording of a subscription

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

use crate::adapter::options::{AuthenticationParams, ConnectionParams};

pub mod channel;
pub mod replay;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Errors reported by an event source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Credentials were refused or the credential exchange failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The underlying transport dropped or could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform sent something the client could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The source refused the request outright (bad parameters, reused handle).
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// One event delivered by a subscription.
///
/// The payload is opaque to this crate and is never inspected or rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(serde_json::Value);

impl EventRecord {
    /// Wrap a structured payload.
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }

    /// Take ownership of the payload.
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for EventRecord {
    fn from(payload: serde_json::Value) -> Self {
        Self(payload)
    }
}

/// A lifecycle notification pushed by a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionSignal {
    /// The subscription handshake completed.
    Connect,
    /// The platform closed the subscription.
    Disconnect,
    /// The subscription failed after it was established.
    Error(SourceError),
    /// An event arrived on the topic.
    Data(EventRecord),
}

/// What kind of topic a subscription targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    /// A platform event topic (`/event/<name>`).
    Event,
    /// A generic streaming channel.
    Channel,
}

/// Parameters for subscribing to one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// Topic name as configured by the caller.
    pub topic: String,
    /// Event or generic channel subscription.
    pub kind: SubscriptionKind,
}

impl SubscribeRequest {
    /// An event-typed subscription to `topic`.
    pub fn event(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            kind: SubscriptionKind::Event,
        }
    }
}

/// A live topic subscription.
///
/// Yields signals in delivery order. When the underlying signal stream runs
/// dry the subscription is over.
pub struct Subscription {
    signals: Pin<Box<dyn Stream<Item = SubscriptionSignal> + Send>>,
}

impl Subscription {
    /// Build a subscription over any signal stream.
    pub fn new<S>(signals: S) -> Self
    where
        S: Stream<Item = SubscriptionSignal> + Send + 'static,
    {
        Self {
            signals: Box::pin(signals),
        }
    }

    /// Build a subscription fed by an unbounded mpsc channel.
    pub fn from_receiver(receiver: mpsc::UnboundedReceiver<SubscriptionSignal>) -> Self {
        Self::new(UnboundedReceiverStream::new(receiver))
    }

    /// Poll for the next signal.
    pub fn poll_signal(&mut self, cx: &mut Context<'_>) -> Poll<Option<SubscriptionSignal>> {
        self.signals.as_mut().poll_next(cx)
    }
}

impl Stream for Subscription {
    type Item = SubscriptionSignal;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_signal(cx)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Factory for connections to a remote event platform.
pub trait EventSource: Send + Sync {
    /// Create a connection handle.
    ///
    /// Must not contact the remote service; that happens in
    /// [`Connection::authenticate`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Rejected`] when the parameters are unusable.
    fn create_connection(&self, params: ConnectionParams)
        -> Result<Box<dyn Connection>, SourceError>;
}

/// An unauthenticated (then authenticated) connection to the platform.
#[async_trait]
pub trait Connection: Send {
    /// Exchange credentials with the platform.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Authentication`] when the credentials are refused,
    /// or a transport error when the platform cannot be reached.
    async fn authenticate(&mut self, auth: &AuthenticationParams) -> Result<(), SourceError>;

    /// Create the streaming client bound to this (authenticated) connection.
    fn create_stream_client(&self) -> Box<dyn StreamingClient>;
}

/// Protocol-level client that turns topic names into live subscriptions.
pub trait StreamingClient: Send {
    /// Subscribe to a topic.
    ///
    /// # Errors
    ///
    /// Returns an error when the subscription cannot be registered.
    fn subscribe(&mut self, request: SubscribeRequest) -> Result<Subscription, SourceError>;
}
