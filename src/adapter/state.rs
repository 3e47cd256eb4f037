//! Adapter state machine.
//!
//! ```text
//!                 connect            data
//!  Initializing ──────────▶ Connected ────▶ Emitting ◀─┐
//!       │                      │              │  data  │
//!       │ (setup failed)       │ disconnect   ├────────┘
//!       ▼                      ▼ / error      ▼ disconnect / error
//!      Idle                 Ended | Failed ◀──┘
//! ```
//!
//! [`transition`] is pure: it maps the current state and one subscription
//! signal to the next state and the [`Effect`] the adapter must carry out.
//! `Ended`, `Failed`, and `Idle` are terminal.

use crate::source::{EventRecord, SourceError, SubscriptionSignal};

/// Where an adapter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Constructed; authentication or subscription still pending.
    Initializing,
    /// Subscription established, no record relayed yet.
    Connected,
    /// Relaying records.
    Emitting,
    /// The platform closed the subscription; the stream has ended.
    Ended,
    /// The subscription failed; the failure was handed to the consumer.
    Failed,
    /// Setup failed before a subscription existed. The failure was logged
    /// and nothing is ever emitted; consumers stay pending forever.
    Idle,
}

impl AdapterState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed | Self::Idle)
    }
}

/// Action required by a transition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    /// Log the connect; nothing reaches the consumer.
    Connected,
    /// Log and hand the record to the consumer.
    Relay(EventRecord),
    /// Log the disconnect and end the stream.
    End,
    /// Log and hand the failure to the consumer, then end.
    Fail(SourceError),
    /// Signal arrived in a terminal state.
    Ignore,
}

/// Compute the next state for `signal`.
///
/// Signals are relayed whether or not `Connect` was seen first; the connect
/// notification is observability only.
pub(crate) fn transition(
    state: AdapterState,
    signal: SubscriptionSignal,
) -> (AdapterState, Effect) {
    if state.is_terminal() {
        return (state, Effect::Ignore);
    }
    match signal {
        SubscriptionSignal::Connect => {
            let next = match state {
                AdapterState::Initializing => AdapterState::Connected,
                other => other,
            };
            (next, Effect::Connected)
        }
        SubscriptionSignal::Data(record) => (AdapterState::Emitting, Effect::Relay(record)),
        SubscriptionSignal::Disconnect => (AdapterState::Ended, Effect::End),
        SubscriptionSignal::Error(err) => (AdapterState::Failed, Effect::Fail(err)),
    }
}
