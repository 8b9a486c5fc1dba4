use crate::{BackendStatus, CloneFailure, Notice};

/// Characters of html shown in the inline preview.
pub const PREVIEW_CHAR_BUDGET: usize = 2000;
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub url_input: String,
    pub phase: Phase,
    /// False while loading or when the input is blank.
    pub can_submit: bool,
    pub in_flight_url: Option<String>,
    pub bytes_received: u64,
    pub error: Option<CloneFailure>,
    pub html_char_count: usize,
    pub html_byte_count: usize,
    pub preview_text: Option<String>,
    pub source_expanded: bool,
    /// Full markup, only while the source viewer is expanded.
    pub source: Option<String>,
    pub notice: Option<Notice>,
    pub backend: BackendStatus,
    pub dirty: bool,
}

impl AppViewModel {
    /// Download, preview and copy are only offered for a stored result.
    pub fn has_result(&self) -> bool {
        self.phase == Phase::Success
    }
}

/// First [`PREVIEW_CHAR_BUDGET`] characters of `html`, with [`TRUNCATION_MARKER`]
/// appended when anything was cut.
pub fn derived_preview_text(html: &str) -> String {
    match html.char_indices().nth(PREVIEW_CHAR_BUDGET) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &html[..cut]),
        None => html.to_string(),
    }
}
