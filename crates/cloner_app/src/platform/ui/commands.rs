use cloner_core::Msg;

use super::constants::*;
use crate::platform::app::AppEvent;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetUrl(String),
    Submit,
    /// Set the URL, then submit it.
    Clone(String),
    Source,
    Preview,
    Download,
    Copy,
    Health,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Submit;
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        CMD_URL => Command::SetUrl(rest.to_string()),
        CMD_SUBMIT if rest.is_empty() => Command::Submit,
        CMD_CLONE if rest.is_empty() => Command::Submit,
        CMD_CLONE => Command::Clone(rest.to_string()),
        CMD_SOURCE if rest.is_empty() => Command::Source,
        CMD_PREVIEW if rest.is_empty() => Command::Preview,
        CMD_DOWNLOAD if rest.is_empty() => Command::Download,
        CMD_COPY if rest.is_empty() => Command::Copy,
        CMD_HEALTH if rest.is_empty() => Command::Health,
        CMD_HELP | "?" if rest.is_empty() => Command::Help,
        CMD_QUIT | "exit" | "q" if rest.is_empty() => Command::Quit,
        _ if looks_like_url(line) => Command::Clone(line.to_string()),
        _ => Command::Unknown(line.to_string()),
    }
}

/// Bare input is only taken as a URL when it plausibly is one, so typos of
/// commands do not reach the backend.
fn looks_like_url(text: &str) -> bool {
    !text.contains(char::is_whitespace)
        && (text.contains("://") || text.contains('.') || text.starts_with("localhost"))
}

impl Command {
    pub fn into_events(self) -> Vec<AppEvent> {
        match self {
            Command::SetUrl(url) => vec![AppEvent::Core(Msg::UrlChanged(url))],
            Command::Submit => vec![AppEvent::Core(Msg::SubmitClicked)],
            Command::Clone(url) => vec![
                AppEvent::Core(Msg::UrlChanged(url)),
                AppEvent::Core(Msg::SubmitClicked),
            ],
            Command::Source => vec![AppEvent::Core(Msg::SourceToggled)],
            Command::Preview => vec![AppEvent::Core(Msg::PreviewClicked)],
            Command::Download => vec![AppEvent::Core(Msg::DownloadClicked)],
            Command::Copy => vec![AppEvent::Core(Msg::CopyClicked)],
            Command::Health => vec![AppEvent::Core(Msg::BackendProbeRequested)],
            Command::Help => vec![AppEvent::Help],
            Command::Quit => vec![AppEvent::Quit],
            Command::Unknown(text) => vec![AppEvent::Unknown(text)],
        }
    }
}
