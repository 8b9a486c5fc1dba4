use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use cloner_logging::{cloner_debug, cloner_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::client::{ChannelProgressSink, ClientSettings, CloneBackend, ReqwestCloneClient};
use crate::{CloneError, EngineEvent, FailureKind, RequestId};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("engine is shut down")]
    Closed,
}

enum EngineCommand {
    Clone { request_id: RequestId, url: String },
    ProbeHealth,
    Shutdown,
}

/// Handle to the background thread that runs backend requests on a tokio runtime.
///
/// Commands are fire-and-forget; outcomes come back as [`EngineEvent`]s.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        Self::with_backend(Arc::new(ReqwestCloneClient::new(settings)))
    }

    pub fn with_backend(backend: Arc<dyn CloneBackend>) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cloner-io")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("cloner-engine".to_string())
            .spawn(move || run_engine(runtime, backend, cmd_rx, event_tx))?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn clone_website(
        &self,
        request_id: RequestId,
        url: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::Clone {
            request_id,
            url: url.into(),
        })
    }

    pub fn probe_health(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::ProbeHealth)
    }

    /// Cancels outstanding requests and stops the engine thread.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Err(Closed)` once the engine has stopped
    /// and every event has been drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        let rx = self.event_rx.lock().map_err(|_| EngineError::Closed)?;
        match rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Closed),
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx.send(command).map_err(|_| EngineError::Closed)
    }
}

fn run_engine(
    runtime: Runtime,
    backend: Arc<dyn CloneBackend>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Clone { request_id, url } => {
                let task = run_clone(
                    backend.clone(),
                    request_id,
                    url,
                    event_tx.clone(),
                    cancel.child_token(),
                );
                tracker.spawn_on(task, runtime.handle());
            }
            EngineCommand::ProbeHealth => {
                let task = run_probe(backend.clone(), event_tx.clone(), cancel.child_token());
                tracker.spawn_on(task, runtime.handle());
            }
            EngineCommand::Shutdown => break,
        }
    }

    cloner_debug!("Engine stopping; cancelling {} outstanding task(s)", tracker.len());
    tracker.close();
    cancel.cancel();
    // Let cancelled tasks report before the runtime drops them.
    runtime.block_on(async {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, tracker.wait()).await;
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn run_clone(
    backend: Arc<dyn CloneBackend>,
    request_id: RequestId,
    url: String,
    event_tx: mpsc::Sender<EngineEvent>,
    token: CancellationToken,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    let result = tokio::select! {
        result = backend.clone_website(request_id, &url, &sink) => result,
        _ = token.cancelled() => Err(CloneError::new(
            FailureKind::Cancelled,
            "engine shut down before the backend answered",
        )),
    };
    if let Err(err) = &result {
        cloner_warn!("Clone request {} failed: {}", request_id, err);
    }
    let _ = event_tx.send(EngineEvent::CloneCompleted { request_id, result });
}

async fn run_probe(
    backend: Arc<dyn CloneBackend>,
    event_tx: mpsc::Sender<EngineEvent>,
    token: CancellationToken,
) {
    let result = tokio::select! {
        result = backend.check_health() => result,
        _ = token.cancelled() => Err(CloneError::new(
            FailureKind::Cancelled,
            "engine shut down during health probe",
        )),
    };
    let _ = event_tx.send(EngineEvent::HealthChecked(result));
}
