use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local};
use cloner_core::{update, AppState, LifecycleState, Msg};
use cloner_engine::{ensure_output_dir, EngineHandle};
use cloner_logging::{cloner_debug, cloner_info, cloner_warn};

use super::config::AppConfig;
use super::effects::{EffectRunner, EffectSink};
use super::ui;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the main loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Core(Msg),
    Tick,
    Help,
    Unknown(String),
    Quit,
}

pub fn run_app(config: AppConfig, initial_url: Option<String>) -> anyhow::Result<()> {
    ensure_output_dir(&config.download_dir).context("preparing download directory")?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let engine = EngineHandle::new(config.client_settings()).context("starting engine")?;
    let runner = EffectRunner::new(engine, config.download_dir.clone(), event_tx.clone());

    // Background tick to throttle rendering.
    let tick_tx = event_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(AppEvent::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let input_tx = event_tx;
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for event in ui::commands::parse(&line).into_events() {
                if input_tx.send(event).is_err() {
                    return;
                }
            }
        }
        let _ = input_tx.send(AppEvent::Quit);
    });

    let mut handler = AppEventHandler::new(runner, io::stdout(), config.backend_url.clone());
    handler.print(ui::constants::HELP_TEXT)?;
    handler.render(true)?;

    if config.probe_on_start {
        handler.dispatch(Msg::BackendProbeRequested);
    }
    if let Some(url) = initial_url {
        handler.dispatch(Msg::UrlChanged(url));
        handler.dispatch(Msg::SubmitClicked);
    }

    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Core(msg) => handler.dispatch(msg),
            AppEvent::Tick => handler.render(false)?,
            AppEvent::Help => handler.print(ui::constants::HELP_TEXT)?,
            AppEvent::Unknown(text) => {
                handler.print(&format!("Unknown command {text:?}. Type `help` for commands.\n"))?
            }
            AppEvent::Quit => break,
        }
    }

    cloner_info!("Session ended");
    Ok(())
}

struct AppEventHandler<E, W> {
    state: AppState,
    effects: E,
    out: W,
    backend_url: String,
    completed_at: Option<DateTime<Local>>,
    last_frame: Option<String>,
}

impl<E: EffectSink, W: Write> AppEventHandler<E, W> {
    fn new(effects: E, out: W, backend_url: String) -> Self {
        Self {
            state: AppState::new(),
            effects,
            out,
            backend_url,
            completed_at: None,
            last_frame: None,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        cloner_debug!("dispatch {:?}", msg_label(&msg));
        let was_in_flight = self.state.lifecycle().in_flight_id().is_some();

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        if was_in_flight {
            match self.state.lifecycle() {
                LifecycleState::Succeeded(result) => {
                    self.completed_at = Some(Local::now());
                    cloner_info!("Clone succeeded: {} bytes of HTML", result.cloned_html.len());
                }
                LifecycleState::Failed(failure) => {
                    cloner_warn!("Clone failed ({:?}): {}", failure.kind, failure.message);
                }
                _ => {}
            }
        }

        for effect in effects {
            self.effects.run(effect);
        }
    }

    /// Writes a frame when the state changed since the last one, or always when `force`d.
    fn render(&mut self, force: bool) -> io::Result<()> {
        if !self.state.consume_dirty() && !force {
            return Ok(());
        }
        let frame = ui::render::render(
            &self.state.view(),
            &ui::render::RenderContext {
                backend_url: &self.backend_url,
                completed_at: self.completed_at,
            },
        );
        if !force && self.last_frame.as_deref() == Some(frame.as_str()) {
            return Ok(());
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        self.last_frame = Some(frame);
        Ok(())
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}

/// Keeps cloned HTML out of debug logs.
fn msg_label(msg: &Msg) -> &'static str {
    match msg {
        Msg::UrlChanged(_) => "UrlChanged",
        Msg::SubmitClicked => "SubmitClicked",
        Msg::CloneProgress { .. } => "CloneProgress",
        Msg::CloneSettled { .. } => "CloneSettled",
        Msg::DownloadClicked => "DownloadClicked",
        Msg::PreviewClicked => "PreviewClicked",
        Msg::CopyClicked => "CopyClicked",
        Msg::SourceToggled => "SourceToggled",
        Msg::ActionFinished { .. } => "ActionFinished",
        Msg::BackendProbeRequested => "BackendProbeRequested",
        Msg::BackendProbed(_) => "BackendProbed",
        Msg::Tick => "Tick",
        Msg::NoOp => "NoOp",
    }
}
