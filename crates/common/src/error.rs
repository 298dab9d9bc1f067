use thiserror::Error;

/// Errors that can escape to the build host.
///
/// Per-recipient delivery failures are NOT errors — they are reported through
/// the console sink and as `DeliveryOutcome` values. Only setup-time failures
/// (bad configuration, HTTP client construction) propagate, and the host
/// treats those as a build-step failure per its own convention.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
