//! Cloner engine: backend client, request execution and file output.
mod client;
mod engine;
mod output;
mod preview;
mod types;
mod wire;

pub use client::{
    ChannelProgressSink, ClientSettings, CloneBackend, ProgressSink, ReqwestCloneClient,
    DEFAULT_BASE_URL,
};
pub use engine::{EngineError, EngineHandle};
pub use output::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use preview::{stage_preview_document, stage_preview_document_in};
pub use types::{ClonePayload, CloneError, EngineEvent, FailureKind, HealthReport, RequestId};
