//! Logging setup, request logging and the cart event log.

use thiserror::Error;

mod events;
mod logging;
mod request;
mod settings;

pub(crate) use events::spawn_event_logger;
pub(crate) use logging::init_subscriber;
pub(crate) use request::request_logging;

/// Errors raised while initialising observability.
#[derive(Debug, Error)]
pub(crate) enum ObservabilityError {
    /// Failed to initialise tracing subscriber.
    #[error("failed to initialise tracing subscriber: {0}")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),
}
