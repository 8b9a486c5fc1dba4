use std::fmt;

pub type RequestId = u64;

/// Decoded body of a 2xx clone response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePayload {
    pub status: u16,
    pub cloned_html: String,
    /// Absent when the backend relies on the status code alone.
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        request_id: RequestId,
        bytes_received: u64,
    },
    CloneCompleted {
        request_id: RequestId,
        result: Result<ClonePayload, CloneError>,
    },
    HealthChecked(Result<HealthReport, CloneError>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CloneError {
    pub kind: FailureKind,
    pub message: String,
}

impl CloneError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The configured base URL cannot address the endpoint.
    InvalidEndpoint,
    Network,
    Timeout,
    /// Non-2xx answer; `message` is the service's own explanation, when it gave one.
    HttpStatus { status: u16, message: Option<String> },
    MalformedBody,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Cancelled,
}

impl FailureKind {
    /// True unless the service answered with a failure status. An unreadable
    /// success body counts as transport.
    pub fn is_transport(&self) -> bool {
        !matches!(self, FailureKind::HttpStatus { .. })
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus { status, .. } => write!(f, "http status {status}"),
            FailureKind::MalformedBody => write!(f, "malformed body"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
