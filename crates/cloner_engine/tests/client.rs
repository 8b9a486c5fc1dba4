use std::sync::{Arc, Mutex};
use std::time::Duration;

use cloner_engine::{
    ClientSettings, CloneBackend, EngineEvent, FailureKind, ProgressSink, ReqwestCloneClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn client_for(base_url: impl Into<String>) -> ReqwestCloneClient {
    ReqwestCloneClient::new(ClientSettings {
        base_url: base_url.into(),
        ..ClientSettings::default()
    })
}

/// A local address nothing listens on.
fn refused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn posts_json_url_and_returns_html() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "url": "https://example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cloned_html": "<p>hi</p>",
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(server.uri());
    let sink = TestSink::new();
    let payload = client
        .clone_website(1, "https://example.com", &sink)
        .await
        .expect("clone ok");

    assert_eq!(payload.status, 200);
    assert_eq!(payload.cloned_html, "<p>hi</p>");
    assert_eq!(payload.success, Some(true));
    assert_eq!(payload.error_message, None);
}

#[tokio::test]
async fn success_flag_may_be_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "cloned_html": "<p>hi</p>" })),
        )
        .mount(&server)
        .await;

    let payload = client_for(server.uri())
        .clone_website(1, "example.com", &TestSink::new())
        .await
        .expect("clone ok");
    assert_eq!(payload.cloned_html, "<p>hi</p>");
    assert_eq!(payload.success, None);
}

#[tokio::test]
async fn body_progress_is_reported_with_request_id() {
    let server = MockServer::start().await;
    let html = "<div>".repeat(2048);
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cloned_html": html })))
        .mount(&server)
        .await;

    let sink = TestSink::new();
    client_for(server.uri())
        .clone_website(42, "https://example.com", &sink)
        .await
        .expect("clone ok");

    let progress: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress {
                request_id,
                bytes_received,
            } => Some((request_id, bytes_received)),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.iter().all(|(id, _)| *id == 42));
    let (_, last) = progress.last().copied().unwrap();
    assert!(last > html.len() as u64);
}

#[tokio::test]
async fn service_error_carries_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;

    let err = client_for(server.uri())
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 500,
            message: Some("boom".to_string()),
        }
    );
    assert!(!err.kind.is_transport());
}

#[tokio::test]
async fn service_error_reads_fastapi_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "detail": "Failed to scrape website: timeout" })),
        )
        .mount(&server)
        .await;

    let err = client_for(server.uri())
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 500,
            message: Some("Failed to scrape website: timeout".to_string()),
        }
    );
}

#[tokio::test]
async fn service_error_without_json_has_no_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(server.uri())
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 502,
            message: None,
        }
    );
}

#[tokio::test]
async fn unparseable_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(server.uri())
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedBody);
    assert!(err.kind.is_transport());
}

#[tokio::test]
async fn oversized_error_page_still_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(64)))
        .mount(&server)
        .await;

    let client = ReqwestCloneClient::new(ClientSettings {
        base_url: server.uri(),
        max_body_bytes: 16,
        ..ClientSettings::default()
    });
    let err = client
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 500,
            message: None,
        }
    );
    assert!(!err.kind.is_transport());
}

#[tokio::test]
async fn missing_html_is_malformed_unless_failure_declared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .and(body_json(json!({ "url": "a.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .and(body_json(json!({ "url": "b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error_message": "generation failed"
        })))
        .mount(&server)
        .await;

    let client = client_for(server.uri());
    let err = client
        .clone_website(1, "a.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedBody);

    let payload = client
        .clone_website(2, "b.com", &TestSink::new())
        .await
        .expect("declared failure still decodes");
    assert_eq!(payload.success, Some(false));
    assert_eq!(payload.cloned_html, "");
    assert_eq!(payload.error_message.as_deref(), Some("generation failed"));
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    let err = client_for(refused_base_url())
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
    assert!(err.kind.is_transport());
}

#[tokio::test]
async fn configured_timeout_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "cloned_html": "<p>late</p>" })),
        )
        .mount(&server)
        .await;

    let client = ReqwestCloneClient::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Some(Duration::from_millis(50)),
        ..ClientSettings::default()
    });
    let err = client
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clone-website"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "cloned_html": "x".repeat(64) })),
        )
        .mount(&server)
        .await;

    let client = ReqwestCloneClient::new(ClientSettings {
        base_url: server.uri(),
        max_body_bytes: 16,
        ..ClientSettings::default()
    });
    let err = client
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::TooLarge { max_bytes: 16, .. }
    ));
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/clone-website"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cloned_html": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(format!("{}/api", server.uri()))
        .clone_website(1, "https://example.com", &TestSink::new())
        .await
        .expect("clone ok");
    assert_eq!(payload.cloned_html, "ok");
}

#[tokio::test]
async fn health_probe_reads_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "website-cloning-api",
            "anthropic_client": true
        })))
        .mount(&server)
        .await;

    let report = client_for(server.uri()).check_health().await.expect("healthy");
    assert_eq!(report.status, "healthy");
    assert_eq!(report.service.as_deref(), Some("website-cloning-api"));
}

#[tokio::test]
async fn health_probe_against_nothing_fails_as_network() {
    let err = client_for(refused_base_url())
        .check_health()
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}
