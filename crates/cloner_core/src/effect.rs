/// File name offered for a downloaded clone.
pub const DOWNLOAD_FILENAME: &str = "cloned-website.html";
/// Media type of every artifact produced from a clone result.
pub const HTML_MEDIA_TYPE: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the trimmed url to the backend. Exactly one per accepted submit.
    SendCloneRequest {
        request_id: crate::RequestId,
        url: String,
    },
    /// Save the html as a standalone document.
    SaveHtml {
        filename: String,
        media_type: &'static str,
        html: String,
    },
    /// Open the html in a separate rendering surface.
    OpenPreview { html: String },
    CopyToClipboard { text: String },
    /// Ask the backend whether it is up.
    ProbeBackend,
}
