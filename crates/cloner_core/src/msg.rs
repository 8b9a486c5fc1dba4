use crate::{BackendStatus, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input.
    UrlChanged(String),
    /// User asked to clone the pending URL.
    SubmitClicked,
    /// Engine progress for the request currently in flight.
    CloneProgress {
        request_id: RequestId,
        bytes_received: u64,
    },
    /// Engine settlement for a request.
    CloneSettled {
        request_id: RequestId,
        settlement: Settlement,
    },
    DownloadClicked,
    PreviewClicked,
    CopyClicked,
    /// User expanded or collapsed the raw-source viewer.
    SourceToggled,
    /// A secondary action finished; `Ok` carries a confirmation, `Err` the reason it failed.
    ActionFinished {
        action: ActionKind,
        outcome: Result<String, String>,
    },
    BackendProbeRequested,
    BackendProbed(BackendStatus),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

/// How a request ended, as observed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// 2xx with a decodable body.
    Completed {
        status: u16,
        cloned_html: String,
        success: Option<bool>,
        error_message: Option<String>,
    },
    /// Non-2xx; `message` is whatever the service said, if anything.
    ServiceError { status: u16, message: Option<String> },
    /// The request never produced a response.
    TransportError { detail: String },
    /// A response arrived but its body could not be decoded.
    MalformedResponse { detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Download,
    Preview,
    Copy,
}
