//! End-to-end runs of the detection pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tagwatch_cloud::mock::{MockResponse, MockTransport};
use tagwatch_cloud::{
    AuthSession, Credentials, HttpResponse, HttpTransport, LogSubmitter, ReqwestTransport,
    StatusAware, TransportError,
};
use tagwatch_core::{CredentialId, FixedClock, PosixTz, ReferenceIds, TerminalConfig, TimestampFormatter};
use tagwatch_display::{DisplayState, FeedbackController, PanelGeometry};
use tagwatch_hardware::mock::{MockDisplay, MockDisplayHandle, MockTagReader};
use tagwatch_hardware::{AnyTagReader, DetectionEvent, DetectionListener, TagState};
use tagwatch_terminal::{DisplayOutcome, EventOrchestrator};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IDENTITY: &str = "https://identity.test/signIn";
const DB: &str = "https://db.test";

const GRAY: u16 = 0x8410;

/// Records the color on the panel at the moment each request is sent.
#[derive(Clone)]
struct ObservingTransport {
    inner: MockTransport,
    display: MockDisplayHandle,
    colors: Arc<Mutex<Vec<Option<u16>>>>,
}

impl HttpTransport for ObservingTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        self.colors.lock().unwrap().push(self.display.last_color());
        self.inner.post_json(url, body).await
    }
}

fn uid(hex: &str) -> CredentialId {
    CredentialId::parse_hex(hex).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_listener_driven_run_submits_after_revert() {
    let mock = MockTransport::new();
    mock.set_response(IDENTITY, MockResponse::ok_json(json!({ "idToken": "T1" })));
    mock.set_response(DB, MockResponse::status(200));

    let (display, display_handle) = MockDisplay::new();
    let transport = ObservingTransport {
        inner: mock.clone(),
        display: display_handle.clone(),
        colors: Arc::new(Mutex::new(Vec::new())),
    };

    let mut session = AuthSession::new(IDENTITY);
    session
        .sign_in(&transport, &Credentials::new("k", "e@x.test", "p"))
        .await
        .unwrap();
    mock.clear_requests();
    transport.colors.lock().unwrap().clear();

    let geometry = PanelGeometry::new(128, 160, 40).unwrap();
    let feedback = FeedbackController::new(display, geometry, Duration::from_millis(3000));
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap());
    let zone = PosixTz::parse("IST-2IDT,M3.4.4/26,M10.5.0").unwrap();
    let mut orchestrator = EventOrchestrator::new(
        ReferenceIds::default(),
        feedback,
        TimestampFormatter::with_clock(clock, zone),
        session,
        transport.clone(),
        LogSubmitter::new(DB),
    );

    let (reader, reader_handle) = MockTagReader::new();
    let mut listener = DetectionListener::new(AnyTagReader::Mock(reader)).start();

    reader_handle.present(uid("99B6B302")).await.unwrap();
    reader_handle
        .transition(uid("99B6B302"), TagState::Halt)
        .await
        .unwrap();
    reader_handle.present(uid("250FC501")).await.unwrap();
    reader_handle.present(uid("01020304")).await.unwrap();
    drop(reader_handle);

    let stats = orchestrator.run(&mut listener).await;
    listener.shutdown().await.unwrap();

    assert_eq!(stats.events, 4);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.category_a, 1);
    assert_eq!(stats.category_b, 1);
    assert_eq!(stats.unknown, 1);
    assert_eq!(stats.submitted, 3);

    // Each submission saw the idle screen, so feedback had fully reverted
    assert_eq!(
        *transport.colors.lock().unwrap(),
        vec![Some(GRAY), Some(GRAY), Some(GRAY)]
    );

    let bodies: Vec<serde_json::Value> = mock
        .get_requests()
        .iter()
        .map(|r| serde_json::from_str(&r.body).unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec![
            json!({ "uid": "99 B6 B3 02", "timestamp": "2024-07-01T15:00:00Z" }),
            json!({ "uid": "25 0F C5 01", "timestamp": "2024-07-01T15:00:00Z" }),
            json!({ "uid": "01 02 03 04", "timestamp": "2024-07-01T15:00:00Z" }),
        ]
    );

    let shown: Vec<DisplayState> = orchestrator
        .feedback()
        .history()
        .iter()
        .map(|t| t.to)
        .collect();
    assert_eq!(
        shown,
        vec![
            DisplayState::CategoryA,
            DisplayState::Idle,
            DisplayState::CategoryB,
            DisplayState::Idle,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_feedback_never_reverts_early() {
    let mock = MockTransport::new();
    mock.set_default_response(MockResponse::status(200));

    let (display, _display_handle) = MockDisplay::new();
    let geometry = PanelGeometry::new(128, 160, 40).unwrap();
    let feedback = FeedbackController::new(display, geometry, Duration::from_millis(3000));
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    let zone = PosixTz::parse("UTC0").unwrap();
    let mut orchestrator = EventOrchestrator::new(
        ReferenceIds::default(),
        feedback,
        TimestampFormatter::with_clock(clock, zone),
        AuthSession::new(IDENTITY),
        mock,
        LogSubmitter::with_policy(DB, StatusAware),
    );

    for _ in 0..3 {
        orchestrator
            .handle(&DetectionEvent::active(uid("250FC501")))
            .await;
    }

    let history = orchestrator.feedback().history();
    for pair in history.iter().collect::<Vec<_>>().windows(2) {
        if pair[0].to == DisplayState::CategoryB {
            assert_eq!(pair[1].to, DisplayState::Idle);
            assert!(pair[1].at - pair[0].at >= Duration::from_millis(3000));
        }
    }
    assert_eq!(history.len(), 6);
}

#[tokio::test]
async fn test_configured_pipeline_against_http_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rfid_logs.json"))
        .and(query_param("auth", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "-Nz" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = TerminalConfig::default()
        .with_credentials("api-key", "acme", "terminal@example.com", "secret")
        .with_dwell_ms(20)
        .with_timezone("UTC0");
    config.validate().unwrap();
    // The local server speaks plain HTTP, which validation refuses.
    config.cloud.identity_url = format!("{}/v1/accounts:signInWithPassword", server.uri());
    config.cloud.database_url = Some(server.uri());

    let transport = ReqwestTransport::with_client(reqwest::Client::new());
    let mut session = AuthSession::from_config(&config.cloud);
    session
        .sign_in(&transport, &Credentials::from_config(&config.cloud))
        .await
        .unwrap();

    let (display, display_handle) = MockDisplay::new();
    let mut orchestrator =
        EventOrchestrator::from_config(&config, display, transport, session).unwrap();
    orchestrator.paint_idle().await.unwrap();

    let outcome = orchestrator
        .handle(&DetectionEvent::active(uid("99B6B302")))
        .await;
    let processed = outcome.processed().unwrap();

    assert!(matches!(
        processed.display,
        DisplayOutcome::Shown(DisplayState::CategoryA)
    ));
    assert_eq!(processed.timestamp.len(), "2024-03-01T12:00:00Z".len());
    assert!(processed.timestamp.ends_with('Z'));
    assert_eq!(
        processed.submission.as_ref().unwrap().key.as_deref(),
        Some("-Nz")
    );
    assert_eq!(display_handle.last_color(), Some(GRAY));
}
