//! Challenge API client tests against a local mock backend

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scriptorium_core::{ApiConfig, ChallengeClient, Error};

const CHALLENGE_PATH: &str = "/api/cipher/challenge";

fn config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_ms: 2_000,
        ..Default::default()
    }
}

fn success_body() -> serde_json::Value {
    json!({
        "success": true,
        "challenge": {
            "bookTitle": "Necronomicon",
            "hint": "Busca las posiciones en el vault",
            "vault": ["a", "b", "c", "d", "e"],
            "targets": [2, 0, 3]
        }
    })
}

#[tokio::test]
async fn test_fetch_sends_query_and_solves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .and(query_param("bookTitle", "Necronomicon"))
        .and(query_param("unlockCode", "SERAPH1520"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let payload = client.fetch_challenge("Necronomicon", "SERAPH1520").await.unwrap();
    assert_eq!(payload.book_title, "Necronomicon");
    assert_eq!(scriptorium_core::solve(&payload).unwrap(), "cad");
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.token = Some("s3cret".into());
    let client = ChallengeClient::new(&cfg).unwrap();
    let password = client.unlock_password("Necronomicon", "SERAPH1520", "XVII").await.unwrap();
    assert_eq!(password, "cad");
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Código de desbloqueo incorrecto"
        })))
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let err = client.fetch_challenge("Necronomicon", "WRONG").await.unwrap_err();
    match err {
        Error::RemoteChallenge { status, message } => {
            assert_eq!(status, Some(200));
            assert_eq!(message, "Código de desbloqueo incorrecto");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "bad unlock code"
        })))
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let err = client.fetch_challenge("Necronomicon", "WRONG").await.unwrap_err();
    assert!(matches!(
        err,
        Error::RemoteChallenge { status: Some(400), ref message } if message == "bad unlock code"
    ));
}

#[tokio::test]
async fn test_non_json_body_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let err = client.fetch_challenge("Necronomicon", "X").await.unwrap_err();
    assert!(matches!(err, Error::RemoteChallenge { .. }));
}

#[tokio::test]
async fn test_missing_challenge_object_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let err = client.fetch_challenge("Necronomicon", "X").await.unwrap_err();
    assert!(matches!(err, Error::RemoteChallenge { .. }));
}

#[tokio::test]
async fn test_out_of_bounds_target_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "challenge": { "vault": ["a", "b", "c", "d", "e"], "targets": [5] }
        })))
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&config(&server)).unwrap();
    let err = client.unlock_password("Necronomicon", "X", "XVII").await.unwrap_err();
    assert!(matches!(err, Error::MalformedChallenge(_)));
}

#[tokio::test]
async fn test_fallback_requires_opt_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHALLENGE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.fallback_passwords.insert("XVII".into(), "VS675Q".into());

    let strict = ChallengeClient::new(&cfg).unwrap();
    let err = strict.unlock_password("Necronomicon", "X", "XVII").await.unwrap_err();
    assert!(matches!(err, Error::RemoteChallenge { status: Some(503), .. }));

    cfg.allow_fallback_codes = true;
    let lenient = ChallengeClient::new(&cfg).unwrap();
    assert_eq!(
        lenient.unlock_password("Necronomicon", "X", "XVII").await.unwrap(),
        "VS675Q"
    );

    // Opted in, but no fallback for this century: still an error.
    assert!(lenient.unlock_password("Malleus Maleficarum", "X", "XVIII").await.is_err());
}
