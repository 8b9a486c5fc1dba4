use std::sync::Once;

use cloner_core::{
    update, AppState, Effect, ErrorKind, LifecycleState, Msg, Phase, Settlement,
    VALIDATION_MESSAGE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(cloner_logging::initialize_for_tests);
}

fn submit_url(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::UrlChanged(input.to_string()));
    update(state, Msg::SubmitClicked)
}

fn settle_ok(state: AppState, request_id: u64, html: &str) -> AppState {
    let (state, _) = update(
        state,
        Msg::CloneSettled {
            request_id,
            settlement: Settlement::Completed {
                status: 200,
                cloned_html: html.to_string(),
                success: Some(true),
                error_message: None,
            },
        },
    );
    state
}

#[test]
fn initial_state_is_idle() {
    init_logging();
    let state = AppState::new();
    assert_eq!(*state.lifecycle(), LifecycleState::Idle);
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(!view.can_submit);
}

#[test]
fn blank_inputs_fail_validation_without_request() {
    init_logging();
    for input in ["", "   ", "\t\n", " \r\n "] {
        let (state, effects) = submit_url(AppState::new(), input);

        assert!(effects.is_empty(), "no request for {input:?}");
        let failure = state.lifecycle().failure().expect("validation failure");
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert_eq!(failure.message, VALIDATION_MESSAGE);
        assert_eq!(state.view().phase, Phase::Error);
    }
}

#[test]
fn valid_submit_trims_and_issues_one_request() {
    init_logging();
    let (mut state, effects) = submit_url(AppState::new(), "  https://example.com  ");

    assert_eq!(
        effects,
        vec![Effect::SendCloneRequest {
            request_id: 1,
            url: "https://example.com".to_string(),
        }]
    );
    assert_eq!(state.lifecycle().in_flight_id(), Some(1));
    let view = state.view();
    assert_eq!(view.phase, Phase::Loading);
    assert_eq!(view.in_flight_url.as_deref(), Some("https://example.com"));
    assert!(!view.can_submit);
    assert!(state.consume_dirty());
}

#[test]
fn url_without_scheme_is_sent_verbatim() {
    init_logging();
    let (_state, effects) = submit_url(AppState::new(), "example.com");
    assert_eq!(
        effects,
        vec![Effect::SendCloneRequest {
            request_id: 1,
            url: "example.com".to_string(),
        }]
    );
}

#[test]
fn second_submit_while_in_flight_is_ignored() {
    init_logging();
    let (mut state, _) = submit_url(AppState::new(), "https://example.com");
    assert!(state.consume_dirty());
    let before = state.clone();

    let (mut state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state, before);
    assert!(!state.consume_dirty());

    // Editing the input is allowed, but a resubmit is still swallowed.
    let (state, effects) = submit_url(state, "https://other.example.com");
    assert!(effects.is_empty());
    assert_eq!(state.lifecycle(), before.lifecycle());
    assert_eq!(state.pending_url(), "https://other.example.com");
}

#[test]
fn blank_submit_while_in_flight_does_not_fail() {
    init_logging();
    let (state, _) = submit_url(AppState::new(), "https://example.com");
    let (state, effects) = submit_url(state, "   ");

    assert!(effects.is_empty());
    assert_eq!(state.lifecycle().in_flight_id(), Some(1));
}

#[test]
fn resubmit_after_success_clears_result() {
    init_logging();
    let (state, _) = submit_url(AppState::new(), "https://a.example.com");
    let state = settle_ok(state, 1, "<p>a</p>");
    assert!(state.lifecycle().result().is_some());

    let (state, effects) = submit_url(state, "https://b.example.com");
    assert_eq!(
        effects,
        vec![Effect::SendCloneRequest {
            request_id: 2,
            url: "https://b.example.com".to_string(),
        }]
    );
    assert!(state.lifecycle().result().is_none());
    assert_eq!(state.view().preview_text, None);
}

#[test]
fn resubmit_after_failure_clears_error() {
    init_logging();
    let (state, _) = submit_url(AppState::new(), "");
    assert!(state.lifecycle().failure().is_some());

    let (state, effects) = submit_url(state, "https://example.com");
    assert_eq!(effects.len(), 1);
    assert!(state.lifecycle().failure().is_none());
    assert_eq!(state.view().error, None);
}

#[test]
fn blank_submit_after_success_replaces_result_with_validation_error() {
    init_logging();
    let (state, _) = submit_url(AppState::new(), "https://example.com");
    let state = settle_ok(state, 1, "<p>hi</p>");

    let (state, effects) = submit_url(state, "  ");
    assert!(effects.is_empty());
    assert_eq!(
        state.lifecycle().failure().map(|f| f.kind),
        Some(ErrorKind::Validation)
    );
}

#[test]
fn url_changes_are_allowed_in_every_state() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::UrlChanged("a".into()));
    assert_eq!(state.pending_url(), "a");

    let (state, _) = submit_url(state, "https://example.com");
    let (state, _) = update(state, Msg::UrlChanged("b".into()));
    assert_eq!(state.pending_url(), "b");

    let state = settle_ok(state, 1, "<p>hi</p>");
    let (state, effects) = update(state, Msg::UrlChanged("c".into()));
    assert!(effects.is_empty());
    assert_eq!(state.pending_url(), "c");
    assert!(state.lifecycle().result().is_some());
}

#[test]
fn request_ids_increase_across_submissions() {
    init_logging();
    let mut state = AppState::new();
    for expected in 1..=3u64 {
        let (next, effects) = submit_url(state, "https://example.com");
        assert_eq!(
            effects,
            vec![Effect::SendCloneRequest {
                request_id: expected,
                url: "https://example.com".to_string(),
            }]
        );
        state = settle_ok(next, expected, "<p>ok</p>");
    }
}

#[test]
fn can_submit_follows_input_and_loading() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::UrlChanged("  ".into()));
    assert!(!state.view().can_submit);

    let (state, _) = update(state, Msg::UrlChanged("example.com".into()));
    assert!(state.view().can_submit);

    let (state, _) = update(state, Msg::SubmitClicked);
    assert!(!state.view().can_submit);
}
