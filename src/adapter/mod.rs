//! Pull-based stream over a push-based platform event subscription.
//!
//! [`EventStreamAdapter`] validates its options and opens a connection
//! synchronously, then authenticates and subscribes lazily the first time the
//! consumer polls. From there every subscription signal is fed through
//! [`state::transition`] and relayed:
//!
//! - `connect`: logged only
//! - `data`: logged, then yielded as `Some(Ok(record))`
//! - `disconnect`: logged, then the stream ends (`None`)
//! - `error`: logged, then yielded as `Some(Err(StreamError::Subscription))`;
//!   the stream is exhausted afterwards
//!
//! A setup failure (authentication or subscribe) is only logged. The adapter
//! moves to [`AdapterState::Idle`] and stays pending forever; nothing is
//! yielded for it. Callers that need to tell "still authenticating" from
//! "gave up" must watch the logger or [`EventStreamAdapter::state`].
//!
//! The adapter spawns nothing. It never slows the source down: the
//! subscription's own channel is the only buffer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use tokio_stream::Stream;

use crate::source::{
    Connection, EventRecord, EventSource, SourceError, StreamingClient, SubscribeRequest,
    Subscription, SubscriptionSignal,
};

pub mod logger;
pub mod options;
pub mod state;

use logger::{NoopLogger, StreamLogger};
use options::AdapterOptions;
use state::{transition, AdapterState, Effect};

/// Errors from the adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The options are unusable. Returned from [`EventStreamAdapter::new`].
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The source refused to open a connection. Returned from
    /// [`EventStreamAdapter::new`].
    #[error("could not open connection: {0}")]
    Connection(SourceError),

    /// Credential exchange failed. Only ever reported through the logger;
    /// never yielded by the stream.
    #[error("could not authenticate: {0}")]
    Authentication(SourceError),

    /// The live subscription failed. The only error the stream yields.
    #[error("subscription failed: {0}")]
    Subscription(SourceError),
}

type Authenticating =
    Pin<Box<dyn Future<Output = Result<Box<dyn Connection>, SourceError>> + Send>>;

/// Handles kept alive for as long as the subscription runs.
struct Live {
    _connection: Box<dyn Connection>,
    _client: Box<dyn StreamingClient>,
    subscription: Subscription,
}

enum Phase {
    Authenticating(Authenticating),
    Streaming(Live),
    Idle,
    Finished,
}

/// Stream of event records from one platform topic.
///
/// Yields `Ok(record)` in delivery order, then either ends or yields a
/// single `Err` and ends. It never does both.
pub struct EventStreamAdapter {
    topic: String,
    logger: Arc<dyn StreamLogger>,
    state: AdapterState,
    phase: Phase,
    setup_error: Option<StreamError>,
}

impl EventStreamAdapter {
    /// Validate `options` and open a connection through `source`.
    ///
    /// No remote work happens here; authentication starts on the first poll.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Configuration`] if the event name is empty; the
    ///   source is not touched.
    /// - [`StreamError::Connection`] if the source rejects the connection
    ///   parameters.
    pub fn new(options: AdapterOptions, source: &dyn EventSource) -> Result<Self, StreamError> {
        let AdapterOptions {
            event_name,
            connection,
            authentication,
            logger,
        } = options;

        if event_name.is_empty() {
            return Err(StreamError::Configuration(
                "invalid or missing event name".to_owned(),
            ));
        }

        let logger = logger.unwrap_or_else(|| Arc::new(NoopLogger));
        let mut handle = source
            .create_connection(connection.normalized())
            .map_err(StreamError::Connection)?;

        let authenticating: Authenticating = Box::pin(async move {
            handle.authenticate(&authentication).await?;
            Ok::<_, SourceError>(handle)
        });

        Ok(Self {
            topic: event_name,
            logger,
            state: AdapterState::Initializing,
            phase: Phase::Authenticating(authenticating),
            setup_error: None,
        })
    }

    /// Topic this adapter subscribes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Why setup gave up, if it did.
    ///
    /// Set together with [`AdapterState::Idle`]. The stream itself never
    /// reports this.
    pub fn setup_error(&self) -> Option<&StreamError> {
        self.setup_error.as_ref()
    }

    fn subscribe(&mut self, authenticated: Result<Box<dyn Connection>, SourceError>) -> Phase {
        let subscribed = authenticated
            .map_err(StreamError::Authentication)
            .and_then(|connection| {
                let mut client = connection.create_stream_client();
                client
                    .subscribe(SubscribeRequest::event(self.topic.clone()))
                    .map(|subscription| Live {
                        _connection: connection,
                        _client: client,
                        subscription,
                    })
                    .map_err(StreamError::Subscription)
            });

        match subscribed {
            Ok(live) => Phase::Streaming(live),
            Err(err) => {
                if let StreamError::Authentication(cause) | StreamError::Subscription(cause) = &err
                {
                    self.logger.error(&cause.to_string());
                }
                self.state = AdapterState::Idle;
                self.setup_error = Some(err);
                Phase::Idle
            }
        }
    }

    /// Carry out a transition's effect. `None` means keep polling.
    fn apply(&mut self, effect: Effect) -> Option<Option<Result<EventRecord, StreamError>>> {
        match effect {
            Effect::Connected => {
                self.logger.info(&format!("Connected to {}", self.topic), None);
                None
            }
            Effect::Relay(record) => {
                self.logger.info("Received", Some(record.payload()));
                Some(Some(Ok(record)))
            }
            Effect::End => {
                self.logger.info(&format!("Disconnected from {}", self.topic), None);
                self.phase = Phase::Finished;
                Some(None)
            }
            Effect::Fail(err) => {
                self.logger.error(&err.to_string());
                self.phase = Phase::Finished;
                Some(Some(Err(StreamError::Subscription(err))))
            }
            Effect::Ignore => None,
        }
    }
}

impl Stream for EventStreamAdapter {
    type Item = Result<EventRecord, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.phase {
                Phase::Authenticating(authenticating) => {
                    let authenticated = ready!(authenticating.as_mut().poll(cx));
                    let next = this.subscribe(authenticated);
                    this.phase = next;
                }
                Phase::Streaming(live) => {
                    let signal = ready!(live.subscription.poll_signal(cx))
                        .unwrap_or(SubscriptionSignal::Disconnect);
                    let (next, effect) = transition(this.state, signal);
                    this.state = next;
                    if let Some(item) = this.apply(effect) {
                        return Poll::Ready(item);
                    }
                }
                // Never woken: a failed setup leaves the consumer waiting.
                Phase::Idle => return Poll::Pending,
                Phase::Finished => return Poll::Ready(None),
            }
        }
    }
}

impl std::fmt::Debug for EventStreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamAdapter")
            .field("topic", &self.topic)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
