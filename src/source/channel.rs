//! In-process event source driven through a [`SourceController`].
//!
//! Useful wherever the platform is simulated: tests, local development, or
//! bridging events that already live inside the process. The controller pushes
//! signals into the subscription and decides how connection and
//! authentication requests are answered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::{
    Connection, EventRecord, EventSource, SourceError, StreamingClient, SubscribeRequest,
    Subscription, SubscriptionSignal,
};
use crate::adapter::options::{AuthenticationParams, ConnectionParams};

/// Shared state between the source, its connections, and the controller.
#[derive(Default)]
struct Shared {
    connection_failure: Option<SourceError>,
    authentication_failure: Option<SourceError>,
    subscribe_failure: Option<SourceError>,
    authentication_delay: Option<Duration>,
    receiver: Option<mpsc::UnboundedReceiver<SubscriptionSignal>>,
    connection_requests: Vec<ConnectionParams>,
    authentications: Vec<AuthenticationParams>,
    subscribe_requests: Vec<SubscribeRequest>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Event source whose subscription is fed from an in-process channel.
///
/// Only one subscription can be taken from a source; a second `subscribe`
/// is rejected.
#[derive(Clone)]
pub struct ChannelSource {
    shared: Arc<Mutex<Shared>>,
}

/// Drives a [`ChannelSource`]: pushes signals and scripts failures.
pub struct SourceController {
    sender: mpsc::UnboundedSender<SubscriptionSignal>,
    shared: Arc<Mutex<Shared>>,
}

impl ChannelSource {
    /// Create a source and the controller that drives it.
    pub fn new() -> (Self, SourceController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared {
            receiver: Some(receiver),
            ..Shared::default()
        }));
        let source = Self {
            shared: Arc::clone(&shared),
        };
        (source, SourceController { sender, shared })
    }
}

impl EventSource for ChannelSource {
    fn create_connection(
        &self,
        params: ConnectionParams,
    ) -> Result<Box<dyn Connection>, SourceError> {
        let mut shared = lock(&self.shared);
        shared.connection_requests.push(params);
        if let Some(err) = shared.connection_failure.clone() {
            return Err(err);
        }
        Ok(Box::new(ChannelConnection {
            shared: Arc::clone(&self.shared),
            authenticated: false,
        }))
    }
}

struct ChannelConnection {
    shared: Arc<Mutex<Shared>>,
    authenticated: bool,
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn authenticate(&mut self, auth: &AuthenticationParams) -> Result<(), SourceError> {
        let (delay, failure) = {
            let mut shared = lock(&self.shared);
            shared.authentications.push(auth.clone());
            (
                shared.authentication_delay,
                shared.authentication_failure.clone(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        self.authenticated = true;
        debug!("channel source authenticated");
        Ok(())
    }

    fn create_stream_client(&self) -> Box<dyn StreamingClient> {
        Box::new(ChannelStreamingClient {
            shared: Arc::clone(&self.shared),
            authenticated: self.authenticated,
        })
    }
}

struct ChannelStreamingClient {
    shared: Arc<Mutex<Shared>>,
    authenticated: bool,
}

impl StreamingClient for ChannelStreamingClient {
    fn subscribe(&mut self, request: SubscribeRequest) -> Result<Subscription, SourceError> {
        if !self.authenticated {
            return Err(SourceError::Rejected(
                "subscribe requires an authenticated connection".to_owned(),
            ));
        }
        let mut shared = lock(&self.shared);
        shared.subscribe_requests.push(request);
        if let Some(err) = shared.subscribe_failure.clone() {
            return Err(err);
        }
        let receiver = shared.receiver.take().ok_or_else(|| {
            SourceError::Rejected("channel source already has a subscriber".to_owned())
        })?;
        Ok(Subscription::from_receiver(receiver))
    }
}

impl SourceController {
    /// Push a raw signal. Returns `false` once the subscription is gone.
    pub fn send(&self, signal: SubscriptionSignal) -> bool {
        self.sender.send(signal).is_ok()
    }

    /// Signal that the subscription handshake completed.
    pub fn connect(&self) -> bool {
        self.send(SubscriptionSignal::Connect)
    }

    /// Deliver one event.
    pub fn data(&self, payload: serde_json::Value) -> bool {
        self.send(SubscriptionSignal::Data(EventRecord::new(payload)))
    }

    /// Close the subscription from the platform side.
    pub fn disconnect(&self) -> bool {
        self.send(SubscriptionSignal::Disconnect)
    }

    /// Fail the live subscription.
    pub fn error(&self, err: SourceError) -> bool {
        self.send(SubscriptionSignal::Error(err))
    }

    /// Make `create_connection` fail with `err`.
    pub fn reject_connections(&self, err: SourceError) {
        lock(&self.shared).connection_failure = Some(err);
    }

    /// Make `authenticate` fail with `err`.
    pub fn fail_authentication(&self, err: SourceError) {
        lock(&self.shared).authentication_failure = Some(err);
    }

    /// Make `subscribe` fail with `err`.
    pub fn fail_subscribe(&self, err: SourceError) {
        lock(&self.shared).subscribe_failure = Some(err);
    }

    /// Delay every authentication by `delay`.
    pub fn delay_authentication(&self, delay: Duration) {
        lock(&self.shared).authentication_delay = Some(delay);
    }

    /// Connection parameters received so far, in call order.
    pub fn connection_requests(&self) -> Vec<ConnectionParams> {
        lock(&self.shared).connection_requests.clone()
    }

    /// Credentials presented so far, in call order.
    pub fn authentications(&self) -> Vec<AuthenticationParams> {
        lock(&self.shared).authentications.clone()
    }

    /// Subscribe requests received so far, in call order.
    pub fn subscribe_requests(&self) -> Vec<SubscribeRequest> {
        lock(&self.shared).subscribe_requests.clone()
    }
}
