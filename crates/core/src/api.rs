//! HTTP client for the remote cipher challenge endpoint

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::challenge::{solve, ChallengePayload};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Response envelope: `{ success, challenge?, error? }`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    challenge: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ChallengeClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    allow_fallback_codes: bool,
    fallback_passwords: BTreeMap<String, String>,
}

impl ChallengeClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            url: config.challenge_url(),
            token: config.token.clone(),
            allow_fallback_codes: config.allow_fallback_codes,
            fallback_passwords: config.fallback_passwords.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the challenge for a manuscript, validating the response envelope.
    pub async fn fetch_challenge(&self, book_title: &str, unlock_code: &str) -> Result<ChallengePayload> {
        info!(book_title, url = %self.url, "requesting challenge");
        debug!(unlock_code, "challenge unlock code");

        let mut request = self
            .client
            .get(&self.url)
            .query(&[("bookTitle", book_title), ("unlockCode", unlock_code)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body = %truncate(&body, 200), "challenge response");

        let envelope: Option<Envelope> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = envelope
                .and_then(|e| e.error)
                .unwrap_or_else(|| truncate(&body, 200));
            return Err(Error::RemoteChallenge {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope = envelope.ok_or_else(|| Error::RemoteChallenge {
            status: Some(status.as_u16()),
            message: "malformed response body".into(),
        })?;

        if !envelope.success {
            return Err(Error::RemoteChallenge {
                status: Some(status.as_u16()),
                message: envelope.error.unwrap_or_else(|| "request rejected".into()),
            });
        }

        let challenge = envelope.challenge.ok_or_else(|| Error::RemoteChallenge {
            status: Some(status.as_u16()),
            message: "response has no challenge".into(),
        })?;

        ChallengePayload::from_value(challenge)
    }

    /// Fetch and solve the challenge for a century.
    ///
    /// A configured fallback password is only used when fallback codes are
    /// explicitly allowed; otherwise the failure propagates.
    pub async fn unlock_password(&self, book_title: &str, unlock_code: &str, century: &str) -> Result<String> {
        let attempt = match self.fetch_challenge(book_title, unlock_code).await {
            Ok(payload) => solve(&payload),
            Err(e) => Err(e),
        };

        match attempt {
            Ok(password) => {
                info!(century, "challenge solved");
                Ok(password)
            }
            Err(e) if e.is_challenge_failure() && self.allow_fallback_codes => {
                match self.fallback_passwords.get(century) {
                    Some(fallback) => {
                        warn!(century, error = %e, "challenge failed; using configured fallback password");
                        Ok(fallback.clone())
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("códice", 2), "có...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ApiConfig {
            base_url: "not-a-url".into(),
            ..Default::default()
        };
        assert!(matches!(ChallengeClient::new(&config), Err(Error::InvalidConfig(_))));
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unlock_code_stays_out_of_info_logs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "challenge": { "vault": ["a"], "targets": [0] }
            })))
            .mount(&server)
            .await;

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = ApiConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        let client = ChallengeClient::new(&config).unwrap();
        client.fetch_challenge("Necronomicon", "SERAPH1520").await.unwrap();

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("requesting challenge"));
        assert!(!logs.contains("SERAPH1520"));
    }

    #[test]
    fn test_url_from_config() {
        let config = ApiConfig {
            base_url: "https://backend.example.test".into(),
            ..Default::default()
        };
        let client = ChallengeClient::new(&config).unwrap();
        assert_eq!(client.url(), "https://backend.example.test/api/cipher/challenge");
    }
}
