//! Injectable lifecycle logger.
//!
//! The adapter reports every lifecycle transition and every record through a
//! [`StreamLogger`] before anything reaches the consumer. Callers that do not
//! supply one get [`NoopLogger`].

/// Logger capability handed to the adapter.
pub trait StreamLogger: Send + Sync {
    /// Informational message, optionally with a structured payload.
    fn info(&self, message: &str, details: Option<&serde_json::Value>);

    /// Error message.
    fn error(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl StreamLogger for NoopLogger {
    fn info(&self, _message: &str, _details: Option<&serde_json::Value>) {}

    fn error(&self, _message: &str) {}
}

/// Forwards to the `tracing` facade under the `platform_event_stream` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StreamLogger for TracingLogger {
    fn info(&self, message: &str, details: Option<&serde_json::Value>) {
        match details {
            Some(details) => {
                tracing::info!(target: "platform_event_stream", %details, "{message}");
            }
            None => tracing::info!(target: "platform_event_stream", "{message}"),
        }
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "platform_event_stream", "{message}");
    }
}
