use crate::{
    AppState, BackendStatus, CloneFailure, CloneResult, Effect, LifecycleState, Msg, Notice,
    Settlement, DOWNLOAD_FILENAME, HTML_MEDIA_TYPE,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(input) => {
            state.set_pending_url(input);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::CloneProgress {
            request_id,
            bytes_received,
        } => {
            state.record_progress(request_id, bytes_received);
            Vec::new()
        }
        Msg::CloneSettled {
            request_id,
            settlement,
        } => {
            // Anything not answering the request in flight is stale.
            if state.lifecycle().in_flight_id() == Some(request_id) {
                match outcome(settlement) {
                    Ok(result) => state.succeed(result),
                    Err(failure) => state.fail(failure),
                }
            }
            Vec::new()
        }
        Msg::DownloadClicked => with_result(&state, |result| Effect::SaveHtml {
            filename: DOWNLOAD_FILENAME.to_string(),
            media_type: HTML_MEDIA_TYPE,
            html: result.cloned_html.clone(),
        }),
        Msg::PreviewClicked => with_result(&state, |result| Effect::OpenPreview {
            html: result.cloned_html.clone(),
        }),
        Msg::CopyClicked => with_result(&state, |result| Effect::CopyToClipboard {
            text: result.cloned_html.clone(),
        }),
        Msg::SourceToggled => {
            state.toggle_source();
            Vec::new()
        }
        Msg::ActionFinished { action, outcome } => {
            state.set_notice(Notice { action, outcome });
            Vec::new()
        }
        Msg::BackendProbeRequested => {
            if *state.backend() == BackendStatus::Checking {
                Vec::new()
            } else {
                state.set_backend(BackendStatus::Checking);
                vec![Effect::ProbeBackend]
            }
        }
        Msg::BackendProbed(status) => {
            state.set_backend(status);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    // Only one request may be in flight; the late result must never race a newer one.
    if matches!(state.lifecycle(), LifecycleState::InFlight { .. }) {
        return Vec::new();
    }

    let url = state.pending_url().trim().to_string();
    if url.is_empty() {
        state.fail(CloneFailure::validation());
        return Vec::new();
    }

    let request_id = state.begin_request(url.clone());
    vec![Effect::SendCloneRequest { request_id, url }]
}

/// HTTP status decides first; inside a 2xx an explicit `success: false` is still a service failure.
fn outcome(settlement: Settlement) -> Result<CloneResult, CloneFailure> {
    match settlement {
        Settlement::Completed {
            status,
            success: Some(false),
            error_message,
            ..
        } => Err(CloneFailure::service(status, error_message)),
        Settlement::Completed {
            cloned_html,
            error_message,
            ..
        } => Ok(CloneResult {
            success: true,
            cloned_html,
            error_message,
        }),
        Settlement::ServiceError { status, message } => {
            Err(CloneFailure::service(status, message))
        }
        Settlement::TransportError { .. } => Err(CloneFailure::transport()),
        Settlement::MalformedResponse { .. } => Err(CloneFailure::malformed_response()),
    }
}

fn with_result(state: &AppState, effect: impl FnOnce(&CloneResult) -> Effect) -> Vec<Effect> {
    state.lifecycle().result().map(effect).into_iter().collect()
}
