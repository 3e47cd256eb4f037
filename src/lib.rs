//! Pull-based event streams over authenticated platform event subscriptions.
//!
//! The platform pushes: it calls back on connect, disconnect, error, and every
//! event. Consumers want to pull. [`EventStreamAdapter`] bridges the two: it
//! authenticates against an [`source::EventSource`], subscribes to one topic,
//! and exposes the subscription as a [`tokio_stream::Stream`] of
//! [`source::EventRecord`]s.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use tokio_stream::StreamExt;
//! use platform_event_stream::{AdapterOptions, AuthenticationParams, ConnectionParams,
//!     EventStreamAdapter, TracingLogger};
//! use platform_event_stream::source::replay::ReplaySource;
//!
//! let source = ReplaySource::open(std::path::Path::new("orders.jsonl"))?;
//! let options = AdapterOptions::new(
//!     "Order_Event__e",
//!     ConnectionParams::default(),
//!     AuthenticationParams::AuthorizationCode { code: "abc".to_owned() },
//! )
//! .with_logger(Arc::new(TracingLogger));
//!
//! let mut events = EventStreamAdapter::new(options, &source)?;
//! while let Some(record) = events.next().await {
//!     println!("{}", record?.payload());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod logging;
pub mod source;

pub use adapter::logger::{NoopLogger, StreamLogger, TracingLogger};
pub use adapter::options::{
    AdapterOptions, AuthenticationParams, ConnectionMode, ConnectionParams, Environment,
};
pub use adapter::state::AdapterState;
pub use adapter::{EventStreamAdapter, StreamError};
pub use source::{EventRecord, SourceError};
