//! Sign-in and submission against a local HTTP server.

use serde_json::json;
use tagwatch_cloud::{
    AuthError, AuthSession, Credentials, LogSubmitter, ReqwestTransport, StatusAware, SubmitError,
};
use tagwatch_core::{AccessLogEntry, CredentialId};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> ReqwestTransport {
    ReqwestTransport::with_client(reqwest::Client::new())
}

fn credentials() -> Credentials {
    Credentials::new("test-key", "terminal@example.com", "secret")
}

fn entry() -> AccessLogEntry {
    let id = CredentialId::parse_hex("250FC501").unwrap();
    AccessLogEntry::new(&id, "2024-07-01T15:00:00Z")
}

async fn mount_sign_in(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "email": "terminal@example.com",
            "password": "secret",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "idToken": token,
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn identity_url(server: &MockServer) -> String {
    format!("{}/v1/accounts:signInWithPassword", server.uri())
}

#[tokio::test]
async fn test_sign_in_then_submit() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "T1").await;

    Mock::given(method("POST"))
        .and(path("/rfid_logs.json"))
        .and(query_param("auth", "T1"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "uid": "25 0F C5 01",
            "timestamp": "2024-07-01T15:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "-Nk3" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport();
    let mut session = AuthSession::new(identity_url(&server));
    session.sign_in(&transport, &credentials()).await.unwrap();

    let receipt = LogSubmitter::new(server.uri())
        .submit(&transport, &session, entry())
        .await
        .unwrap();

    assert_eq!(receipt.status, 200);
    assert_eq!(receipt.key.as_deref(), Some("-Nk3"));
}

#[tokio::test]
async fn test_rejected_sign_in_blocks_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rfid_logs.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport();
    let mut session = AuthSession::new(identity_url(&server));

    let err = session.sign_in(&transport, &credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 400, .. }));

    let err = LogSubmitter::new(server.uri())
        .submit(&transport, &session, entry())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::NoToken));
}

#[tokio::test]
async fn test_error_status_depends_on_policy() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "T1").await;
    Mock::given(method("POST"))
        .and(path("/rfid_logs.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Permission denied"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let transport = transport();
    let mut session = AuthSession::new(identity_url(&server));
    session.sign_in(&transport, &credentials()).await.unwrap();

    let lenient = LogSubmitter::new(server.uri())
        .submit(&transport, &session, entry())
        .await
        .unwrap();
    assert_eq!(lenient.status, 401);

    let strict = LogSubmitter::with_policy(server.uri(), StatusAware)
        .submit(&transport, &session, entry())
        .await
        .unwrap_err();
    assert!(matches!(strict, SubmitError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let mut session = AuthSession::new(format!("{uri}/v1/accounts:signInWithPassword"));
    let err = session
        .sign_in(&transport(), &credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Transport(_)));
    assert!(session.is_failed());
}

#[tokio::test]
async fn test_transport_errors_do_not_carry_secrets() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "SECRET-TOKEN").await;

    let transport = transport();
    let mut session = AuthSession::new(identity_url(&server));
    session.sign_in(&transport, &credentials()).await.unwrap();
    let uri = server.uri();
    drop(server);

    let err = LogSubmitter::new(uri.clone())
        .submit(&transport, &session, entry())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)));
    assert!(!err.to_string().contains("SECRET-TOKEN"), "{err}");

    let mut session = AuthSession::new(format!("{uri}/v1/accounts:signInWithPassword"));
    let err = session
        .sign_in(&transport, &credentials())
        .await
        .unwrap_err();
    assert!(!err.to_string().contains("test-key"), "{err}");
}
