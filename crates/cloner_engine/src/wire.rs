//! JSON bodies exchanged with the cloning backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct CloneRequestBody<'a> {
    pub url: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CloneResponseBody {
    #[serde(default)]
    pub cloned_html: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error: Option<String>,
    /// FastAPI puts `HTTPException` text here; validation errors use a list instead.
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Message carried by a failure body: `error` first, then a string `detail`.
pub(crate) fn service_error_message(body: &[u8]) -> Option<String> {
    let parsed: ServiceErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .filter(|message| !message.trim().is_empty())
        .or_else(|| match parsed.detail {
            Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => Some(detail),
            _ => None,
        })
}
