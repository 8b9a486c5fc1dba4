use chrono::{DateTime, Local};
use cloner_core::{ActionKind, AppViewModel, BackendStatus, ErrorKind, Phase};

use super::constants::RULE_WIDTH;

/// Facts the view model does not carry.
pub struct RenderContext<'a> {
    pub backend_url: &'a str,
    pub completed_at: Option<DateTime<Local>>,
}

/// Builds one full frame of the terminal view.
pub fn render(view: &AppViewModel, ctx: &RenderContext<'_>) -> String {
    let mut lines = Vec::new();

    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "Website Cloner | backend {} ({})",
        ctx.backend_url,
        backend_label(&view.backend)
    ));
    if view.url_input.is_empty() {
        lines.push("URL: (none)".to_string());
    } else {
        lines.push(format!("URL: {}", view.url_input));
    }

    match view.phase {
        Phase::Idle => {
            lines.push("Enter a website URL to clone. Type `help` for commands.".to_string());
        }
        Phase::Loading => {
            let target = view.in_flight_url.as_deref().unwrap_or_default();
            if view.bytes_received > 0 {
                lines.push(format!(
                    "Cloning {target} ... {} received",
                    format_bytes(view.bytes_received)
                ));
            } else {
                lines.push(format!(
                    "Cloning {target} ... the backend is analyzing the site and generating HTML"
                ));
            }
        }
        Phase::Error => {
            if let Some(error) = &view.error {
                lines.push(format!("Error ({}): {}", error_label(error.kind), error.message));
            }
        }
        Phase::Success => render_success(view, ctx, &mut lines),
    }

    if view.has_result() {
        let toggle = if view.source_expanded {
            "source (hide)"
        } else {
            "source (show)"
        };
        lines.push(format!("Actions: preview | download | copy | {toggle}"));
    }

    if let Some(notice) = &view.notice {
        let action = action_label(notice.action);
        lines.push(match &notice.outcome {
            Ok(detail) => format!("{action}: {detail}"),
            Err(reason) => format!("{action} failed: {reason}"),
        });
    }

    lines.push("-".repeat(RULE_WIDTH));
    let mut frame = lines.join("\n");
    frame.push('\n');
    frame
}

fn render_success(view: &AppViewModel, ctx: &RenderContext<'_>, lines: &mut Vec<String>) {
    match ctx.completed_at {
        Some(at) => lines.push(format!(
            "Website cloned successfully at {}",
            at.format("%H:%M:%S")
        )),
        None => lines.push("Website cloned successfully".to_string()),
    }
    lines.push(format!(
        "{} characters, {}",
        format_with_commas(view.html_char_count as u64),
        format_bytes(view.html_byte_count as u64)
    ));

    lines.push(section("Preview"));
    if let Some(preview) = &view.preview_text {
        lines.push(preview.clone());
    }

    if let Some(source) = &view.source {
        lines.push(section("Generated HTML"));
        lines.push(source.clone());
        lines.push(section("End of HTML"));
    }
}

fn section(title: &str) -> String {
    let head = format!("-- {title} ");
    let fill = RULE_WIDTH.saturating_sub(head.len());
    format!("{head}{}", "-".repeat(fill))
}

fn backend_label(status: &BackendStatus) -> String {
    match status {
        BackendStatus::Unknown => "not checked".to_string(),
        BackendStatus::Checking => "checking".to_string(),
        BackendStatus::Online { service: Some(name) } => format!("online: {name}"),
        BackendStatus::Online { service: None } => "online".to_string(),
        BackendStatus::Unreachable { detail } => format!("unreachable: {detail}"),
    }
}

fn error_label(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Validation => "input".to_string(),
        ErrorKind::Transport => "network".to_string(),
        ErrorKind::MalformedResponse => "bad response".to_string(),
        ErrorKind::Service { status } => format!("backend {status}"),
    }
}

fn action_label(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Download => "Download",
        ActionKind::Preview => "Preview",
        ActionKind::Copy => "Copy",
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
