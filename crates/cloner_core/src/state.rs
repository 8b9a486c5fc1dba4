use crate::msg::ActionKind;
use crate::view_model::{derived_preview_text, AppViewModel, Phase};

pub type RequestId = u64;

pub const VALIDATION_MESSAGE: &str = "Please enter a URL";
pub const NETWORK_MESSAGE: &str = "Network error - make sure your backend is running";
pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "Invalid response from backend - could not read the cloned website";
pub const SERVICE_FALLBACK_MESSAGE: &str = "Failed to clone website";

/// A completed clone. Immutable once stored; the next submit replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneResult {
    pub success: bool,
    pub cloned_html: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty input, caught before any network activity.
    Validation,
    /// No response at all: refused, unreachable, timed out.
    Transport,
    /// A response arrived but could not be decoded.
    MalformedResponse,
    /// The backend answered with a failure.
    Service { status: u16 },
}

impl ErrorKind {
    /// Connectivity-class failures, as opposed to answers from the service.
    pub fn is_transport(self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::MalformedResponse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl CloneFailure {
    pub fn validation() -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: VALIDATION_MESSAGE.to_string(),
        }
    }

    pub fn transport() -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: NETWORK_MESSAGE.to_string(),
        }
    }

    pub fn malformed_response() -> Self {
        Self {
            kind: ErrorKind::MalformedResponse,
            message: MALFORMED_RESPONSE_MESSAGE.to_string(),
        }
    }

    /// Service failure with the backend's own message, or the generic one when it sent none.
    pub fn service(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| SERVICE_FALLBACK_MESSAGE.to_string());
        Self {
            kind: ErrorKind::Service { status },
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    InFlight {
        request_id: RequestId,
        url: String,
        bytes_received: u64,
    },
    Succeeded(CloneResult),
    Failed(CloneFailure),
}

impl LifecycleState {
    pub fn in_flight_id(&self) -> Option<RequestId> {
        match self {
            LifecycleState::InFlight { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&CloneResult> {
        match self {
            LifecycleState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&CloneFailure> {
        match self {
            LifecycleState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Reachability of the backend as last observed by a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Checking,
    Online {
        service: Option<String>,
    },
    Unreachable {
        detail: String,
    },
}

/// Feedback about the most recent secondary action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: ActionKind,
    pub outcome: Result<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pending_url: String,
    lifecycle: LifecycleState,
    last_request_id: RequestId,
    source_expanded: bool,
    notice: Option<Notice>,
    backend: BackendStatus,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_url(&self) -> &str {
        &self.pending_url
    }

    pub fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    pub fn backend(&self) -> &BackendStatus {
        &self.backend
    }

    pub fn view(&self) -> AppViewModel {
        let in_flight = matches!(self.lifecycle, LifecycleState::InFlight { .. });
        let mut view = AppViewModel {
            url_input: self.pending_url.clone(),
            can_submit: !in_flight && !self.pending_url.trim().is_empty(),
            source_expanded: self.source_expanded,
            notice: self.notice.clone(),
            backend: self.backend.clone(),
            dirty: self.dirty,
            ..AppViewModel::default()
        };

        match &self.lifecycle {
            LifecycleState::Idle => view.phase = Phase::Idle,
            LifecycleState::InFlight {
                url,
                bytes_received,
                ..
            } => {
                view.phase = Phase::Loading;
                view.in_flight_url = Some(url.clone());
                view.bytes_received = *bytes_received;
            }
            LifecycleState::Succeeded(result) => {
                view.phase = Phase::Success;
                view.html_char_count = result.cloned_html.chars().count();
                view.html_byte_count = result.cloned_html.len();
                view.preview_text = Some(derived_preview_text(&result.cloned_html));
                if self.source_expanded {
                    view.source = Some(result.cloned_html.clone());
                }
            }
            LifecycleState::Failed(failure) => {
                view.phase = Phase::Error;
                view.error = Some(failure.clone());
            }
        }

        view
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_pending_url(&mut self, input: String) {
        if self.pending_url != input {
            self.pending_url = input;
            self.mark_dirty();
        }
    }

    /// Moves to `InFlight` for `url`, dropping the previous result or error.
    pub(crate) fn begin_request(&mut self, url: String) -> RequestId {
        self.last_request_id += 1;
        let request_id = self.last_request_id;
        self.lifecycle = LifecycleState::InFlight {
            request_id,
            url,
            bytes_received: 0,
        };
        self.source_expanded = false;
        self.notice = None;
        self.mark_dirty();
        request_id
    }

    pub(crate) fn fail(&mut self, failure: CloneFailure) {
        self.lifecycle = LifecycleState::Failed(failure);
        self.source_expanded = false;
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn succeed(&mut self, result: CloneResult) {
        self.lifecycle = LifecycleState::Succeeded(result);
        self.mark_dirty();
    }

    pub(crate) fn record_progress(&mut self, id: RequestId, bytes: u64) {
        if let LifecycleState::InFlight {
            request_id,
            bytes_received,
            ..
        } = &mut self.lifecycle
        {
            if *request_id == id && *bytes_received != bytes {
                *bytes_received = bytes;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn toggle_source(&mut self) {
        if self.lifecycle.result().is_some() {
            self.source_expanded = !self.source_expanded;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn set_backend(&mut self, backend: BackendStatus) {
        if self.backend != backend {
            self.backend = backend;
            self.mark_dirty();
        }
    }
}
