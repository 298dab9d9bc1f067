use serde::{Deserialize, Serialize};

/// Outcome of a finished build, as reported by the build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildResult::Success => write!(f, "SUCCESS"),
            BuildResult::Unstable => write!(f, "UNSTABLE"),
            BuildResult::Failure => write!(f, "FAILURE"),
            BuildResult::NotBuilt => write!(f, "NOT_BUILT"),
            BuildResult::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// A user implicated by the changes that went into a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Culprit {
    pub display_name: String,
}

impl Culprit {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// Everything the publisher needs to know about a completed build.
///
/// Supplied by the build host; this crate consumes it, never produces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub project_name: String,
    pub result: BuildResult,
    pub culprits: Vec<Culprit>,
}

/// HTTP Basic credential pair for the Notifo API.
///
/// The service user and API token always travel together; resolution never
/// mixes a per-job user with a global token or vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub service_user: String,
    pub token: String,
}

impl Credential {
    pub fn new(service_user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            service_user: service_user.into(),
            token: token.into(),
        }
    }
}

/// Per-recipient delivery result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The API answered 200 OK.
    Delivered,
    /// The API answered with a non-200 status.
    HttpError(u16),
    /// The request never completed (connection, timeout, protocol failure).
    TransportError(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// One recipient's delivery outcome, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub recipient: String,
    pub outcome: DeliveryOutcome,
}

/// Error channel of the build's console log.
///
/// The build host supplies the real sink; delivery failures are written here
/// one line per failed recipient and never fail the build.
pub trait ConsoleSink {
    fn error(&mut self, message: String);
}

/// Sink that captures error lines into memory.
///
/// Used by the sample-notification path to report captured errors back to
/// the caller, and by tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ConsoleSink for BufferSink {
    fn error(&mut self, message: String) {
        self.lines.push(message);
    }
}
