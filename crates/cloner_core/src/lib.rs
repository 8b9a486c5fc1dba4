//! Cloner core: pure clone-request state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, DOWNLOAD_FILENAME, HTML_MEDIA_TYPE};
pub use msg::{ActionKind, Msg, Settlement};
pub use state::{
    AppState, BackendStatus, CloneFailure, CloneResult, ErrorKind, LifecycleState, Notice,
    RequestId, MALFORMED_RESPONSE_MESSAGE, NETWORK_MESSAGE, SERVICE_FALLBACK_MESSAGE,
    VALIDATION_MESSAGE,
};
pub use update::update;
pub use view_model::{
    derived_preview_text, AppViewModel, Phase, PREVIEW_CHAR_BUDGET, TRUNCATION_MARKER,
};
