use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cloner_core::{ActionKind, BackendStatus, Effect, Msg, Settlement};
use cloner_engine::{
    stage_preview_document, AtomicFileWriter, ClonePayload, CloneError, EngineEvent,
    EngineHandle, FailureKind, HealthReport,
};
use cloner_logging::{cloner_debug, cloner_error, cloner_info, cloner_warn};
use tempfile::TempPath;

use super::app::AppEvent;

/// Previews kept on disk; the browser may still be loading the newest ones.
const KEPT_PREVIEWS: usize = 2;

/// Executes effects produced by `update`.
pub trait EffectSink {
    fn run(&mut self, effect: Effect);
}

pub struct EffectRunner {
    engine: EngineHandle,
    download_dir: PathBuf,
    events: mpsc::Sender<AppEvent>,
    clipboard: Option<arboard::Clipboard>,
    previews: StagedPreviews,
}

/// The most recent staged preview documents. Older ones are deleted as new
/// ones arrive; the rest go when the runner is dropped.
#[derive(Default)]
struct StagedPreviews {
    paths: VecDeque<TempPath>,
}

impl StagedPreviews {
    fn keep(&mut self, path: TempPath) {
        self.paths.push_back(path);
        while self.paths.len() > KEPT_PREVIEWS {
            let Some(stale) = self.paths.pop_front() else {
                break;
            };
            let display = stale.display().to_string();
            if let Err(err) = stale.close() {
                cloner_warn!("Could not remove preview {}: {}", display, err);
            }
        }
    }
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, download_dir: PathBuf, events: mpsc::Sender<AppEvent>) -> Self {
        let runner = Self {
            engine,
            download_dir,
            events,
            clipboard: None,
            previews: StagedPreviews::default(),
        };
        runner.spawn_event_loop();
        runner
    }

    fn report(&self, msg: Msg) {
        let _ = self.events.send(AppEvent::Core(msg));
    }

    fn finish(&self, action: ActionKind, outcome: Result<String, String>) {
        match &outcome {
            Ok(detail) => cloner_info!("{:?} done: {}", action, detail),
            Err(reason) => cloner_warn!("{:?} failed: {}", action, reason),
        }
        self.report(Msg::ActionFinished { action, outcome });
    }

    fn save_html(&self, filename: &str, html: &str) -> Result<String, String> {
        let writer = AtomicFileWriter::new(self.download_dir.clone());
        let path = writer.write(filename, html).map_err(|err| err.to_string())?;
        Ok(format!("saved to {}", path.display()))
    }

    fn open_preview(&mut self, html: &str) -> Result<String, String> {
        let staged = stage_preview_document(html).map_err(|err| err.to_string())?;
        opener::open(&*staged).map_err(|err| err.to_string())?;
        let detail = format!("opened {}", staged.display());
        self.previews.keep(staged);
        Ok(detail)
    }

    fn copy_to_clipboard(&mut self, text: String) -> Result<String, String> {
        if self.clipboard.is_none() {
            self.clipboard = Some(arboard::Clipboard::new().map_err(|err| err.to_string())?);
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Err("clipboard unavailable".to_string());
        };
        let len = text.chars().count();
        clipboard.set_text(text).map_err(|err| err.to_string())?;
        Ok(format!("copied {len} characters"))
    }

    /// Pumps engine events into the app channel until either side goes away.
    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let events = self.events.clone();
        thread::spawn(move || loop {
            let msg = match engine.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(event)) => msg_from_event(event),
                Ok(None) => continue,
                Err(_) => break,
            };
            if events.send(AppEvent::Core(msg)).is_err() {
                break;
            }
        });
    }
}

impl EffectSink for EffectRunner {
    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::SendCloneRequest { request_id, url } => {
                cloner_info!(
                    "SendCloneRequest request_id={} url_len={} url={}",
                    request_id,
                    url.len(),
                    url
                );
                if let Err(err) = self.engine.clone_website(request_id, url) {
                    // Settle right away so the lifecycle never waits on a dead engine.
                    cloner_error!("Engine rejected request {}: {}", request_id, err);
                    self.report(Msg::CloneSettled {
                        request_id,
                        settlement: Settlement::TransportError {
                            detail: err.to_string(),
                        },
                    });
                }
            }
            Effect::ProbeBackend => {
                if let Err(err) = self.engine.probe_health() {
                    self.report(Msg::BackendProbed(BackendStatus::Unreachable {
                        detail: err.to_string(),
                    }));
                }
            }
            Effect::SaveHtml {
                filename,
                media_type,
                html,
            } => {
                cloner_debug!("Saving {} ({}, {} bytes)", filename, media_type, html.len());
                let outcome = self.save_html(&filename, &html);
                self.finish(ActionKind::Download, outcome);
            }
            Effect::OpenPreview { html } => {
                let outcome = self.open_preview(&html);
                self.finish(ActionKind::Preview, outcome);
            }
            Effect::CopyToClipboard { text } => {
                let outcome = self.copy_to_clipboard(text);
                self.finish(ActionKind::Copy, outcome);
            }
        }
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

fn msg_from_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress {
            request_id,
            bytes_received,
        } => Msg::CloneProgress {
            request_id,
            bytes_received,
        },
        EngineEvent::CloneCompleted { request_id, result } => Msg::CloneSettled {
            request_id,
            settlement: settlement_from(result),
        },
        EngineEvent::HealthChecked(result) => Msg::BackendProbed(backend_status_from(result)),
    }
}

fn settlement_from(result: Result<ClonePayload, CloneError>) -> Settlement {
    match result {
        Ok(payload) => Settlement::Completed {
            status: payload.status,
            cloned_html: payload.cloned_html,
            success: payload.success,
            error_message: payload.error_message,
        },
        Err(CloneError {
            kind: FailureKind::HttpStatus { status, message },
            ..
        }) => Settlement::ServiceError { status, message },
        Err(CloneError {
            kind: FailureKind::MalformedBody,
            message,
        }) => Settlement::MalformedResponse { detail: message },
        Err(err) => Settlement::TransportError {
            detail: err.to_string(),
        },
    }
}

fn backend_status_from(result: Result<HealthReport, CloneError>) -> BackendStatus {
    match result {
        Ok(report) if report.status.eq_ignore_ascii_case("healthy") => BackendStatus::Online {
            service: report.service,
        },
        Ok(report) => BackendStatus::Unreachable {
            detail: format!("reports status {:?}", report.status),
        },
        Err(err) if err.kind.is_transport() => BackendStatus::Unreachable {
            detail: err.kind.to_string(),
        },
        Err(err) => BackendStatus::Unreachable {
            detail: err.to_string(),
        },
    }
}
