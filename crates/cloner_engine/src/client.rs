use std::time::Duration;

use cloner_logging::{cloner_debug, cloner_info};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::wire::{self, CloneRequestBody, CloneResponseBody, HealthBody};
use crate::{ClonePayload, CloneError, EngineEvent, FailureKind, HealthReport, RequestId};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const CLONE_PATH: &str = "clone-website";
const HEALTH_PATH: &str = "health";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` waits for the backend however long generation takes.
    pub request_timeout: Option<Duration>,
    pub health_timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            health_timeout: Duration::from_secs(5),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ClientSettings {
    /// Resolves `path` below the base URL, keeping any path prefix the base carries.
    pub fn endpoint(&self, path: &str) -> Result<Url, CloneError> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|err| CloneError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(CloneError::new(
                FailureKind::InvalidEndpoint,
                format!("{} cannot be used as a base url", self.base_url),
            ));
        }
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|err| CloneError::new(FailureKind::InvalidEndpoint, err.to_string()))
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The remote generation service, seen from the client.
#[async_trait::async_trait]
pub trait CloneBackend: Send + Sync {
    async fn clone_website(
        &self,
        request_id: RequestId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ClonePayload, CloneError>;

    async fn check_health(&self) -> Result<HealthReport, CloneError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCloneClient {
    settings: ClientSettings,
}

impl ReqwestCloneClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, timeout: Option<Duration>) -> Result<reqwest::Client, CloneError> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.settings.connect_timeout);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| CloneError::new(FailureKind::Network, err.to_string()))
    }

    /// Streams the body, reporting progress, and stops at `max_body_bytes`.
    async fn read_body(
        &self,
        response: reqwest::Response,
        request_id: RequestId,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u8>, CloneError> {
        let max_bytes = self.settings.max_body_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(CloneError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(CloneError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
            sink.emit(EngineEvent::Progress {
                request_id,
                bytes_received: body.len() as u64,
            });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl CloneBackend for ReqwestCloneClient {
    async fn clone_website(
        &self,
        request_id: RequestId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ClonePayload, CloneError> {
        let endpoint = self.settings.endpoint(CLONE_PATH)?;
        let client = self.build_client(self.settings.request_timeout)?;
        let payload = serde_json::to_vec(&CloneRequestBody { url })
            .map_err(|err| CloneError::new(FailureKind::Network, err.to_string()))?;

        cloner_info!("POST {} request_id={} url={}", endpoint, request_id, url);
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            // The service answered; an unreadable error body only loses its message.
            let message = match self.read_body(response, request_id, sink).await {
                Ok(body) => wire::service_error_message(&body),
                Err(err) => {
                    cloner_debug!("request_id={} error body dropped: {}", request_id, err);
                    None
                }
            };
            return Err(CloneError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    message,
                },
                status.to_string(),
            ));
        }

        let body = self.read_body(response, request_id, sink).await?;
        cloner_debug!(
            "request_id={} status={} body_len={}",
            request_id,
            status,
            body.len()
        );

        let parsed: CloneResponseBody = serde_json::from_slice(&body)
            .map_err(|err| CloneError::new(FailureKind::MalformedBody, err.to_string()))?;
        let cloned_html = match (parsed.cloned_html, parsed.success) {
            (Some(html), _) => html,
            // A declared failure need not carry markup.
            (None, Some(false)) => String::new(),
            (None, _) => {
                return Err(CloneError::new(
                    FailureKind::MalformedBody,
                    "missing field `cloned_html`",
                ))
            }
        };

        Ok(ClonePayload {
            status: status.as_u16(),
            cloned_html,
            success: parsed.success,
            error_message: parsed.error_message,
        })
    }

    async fn check_health(&self) -> Result<HealthReport, CloneError> {
        let endpoint = self.settings.endpoint(HEALTH_PATH)?;
        let client = self.build_client(Some(self.settings.health_timeout))?;

        let response = client
            .get(endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(CloneError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    message: wire::service_error_message(&body),
                },
                status.to_string(),
            ));
        }

        let parsed: HealthBody = serde_json::from_slice(&body)
            .map_err(|err| CloneError::new(FailureKind::MalformedBody, err.to_string()))?;
        Ok(HealthReport {
            status: parsed.status,
            service: parsed.service,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CloneError {
    if err.is_timeout() {
        return CloneError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return CloneError::new(FailureKind::MalformedBody, err.to_string());
    }
    CloneError::new(FailureKind::Network, err.to_string())
}
