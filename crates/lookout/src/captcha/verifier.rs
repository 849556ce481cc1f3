//! reCAPTCHA `siteverify` client.

use std::time::Duration;

use argus_common::{ArgusError, VerificationResult};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Why no usable verification answer was obtained
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Token verification backend
#[async_trait]
pub trait SiteVerifier: Send + Sync {
    async fn verify(
        &self,
        secret: &str,
        token: &str,
        remote_ip: &str,
    ) -> Result<VerificationResult, VerifyError>;
}

/// Verifier backed by Google's `siteverify` endpoint
pub struct RecaptchaVerifier {
    client: Client,
    verify_url: String,
    timeout: Duration,
}

impl RecaptchaVerifier {
    pub fn new(verify_url: impl Into<String>, timeout: Duration) -> Result<Self, ArgusError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("argus-lookout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArgusError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            verify_url: verify_url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl SiteVerifier for RecaptchaVerifier {
    async fn verify(
        &self,
        secret: &str,
        token: &str,
        remote_ip: &str,
    ) -> Result<VerificationResult, VerifyError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token), ("remoteip", remote_ip)])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;

        serde_json::from_str(&body).map_err(|e| VerifyError::Malformed(e.to_string()))
    }
}

impl RecaptchaVerifier {
    fn classify(&self, err: reqwest::Error) -> VerifyError {
        if err.is_timeout() {
            VerifyError::Timeout(self.timeout)
        } else {
            VerifyError::Transport(err.to_string())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Form, Json, Router, http::StatusCode, routing::post};
    use serde_json::json;
    use std::collections::HashMap;

    /// Serve `router` on an ephemeral port, returning the siteverify URL
    async fn spawn_siteverify(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/recaptcha/api/siteverify")
    }

    #[tokio::test]
    async fn test_posts_form_and_parses_answer() {
        let router = Router::new().route(
            "/recaptcha/api/siteverify",
            post(|Form(body): Form<HashMap<String, String>>| async move {
                let ok = body.get("secret").map(String::as_str) == Some("s3cret")
                    && body.get("response").map(String::as_str) == Some("tok")
                    && body.get("remoteip").map(String::as_str) == Some("203.0.113.7");
                Json(json!({
                    "success": ok,
                    "score": 0.9,
                    "action": "submit",
                    "hostname": "example.org"
                }))
            }),
        );
        let url = spawn_siteverify(router).await;

        let verifier = RecaptchaVerifier::new(url, Duration::from_secs(5)).unwrap();
        let result = verifier.verify("s3cret", "tok", "203.0.113.7").await.unwrap();

        assert!(result.success);
        assert_eq!(result.score, Some(0.9));
        assert_eq!(result.action.as_deref(), Some("submit"));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let router = Router::new().route(
            "/recaptcha/api/siteverify",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "success": true, "score": 1.0 }))
            }),
        );
        let url = spawn_siteverify(router).await;

        let verifier = RecaptchaVerifier::new(url, Duration::from_millis(200)).unwrap();
        let err = verifier.verify("s", "t", "").await.unwrap_err();

        assert!(matches!(err, VerifyError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_schema_drift_is_malformed() {
        let router = Router::new().route(
            "/recaptcha/api/siteverify",
            post(|| async { Json(json!({ "success": "maybe", "score": "high" })) }),
        );
        let url = spawn_siteverify(router).await;

        let verifier = RecaptchaVerifier::new(url, Duration::from_secs(5)).unwrap();
        let err = verifier.verify("s", "t", "").await.unwrap_err();

        assert!(matches!(err, VerifyError::Malformed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/recaptcha/api/siteverify",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let url = spawn_siteverify(router).await;

        let verifier = RecaptchaVerifier::new(url, Duration::from_secs(5)).unwrap();
        let err = verifier.verify("s", "t", "").await.unwrap_err();

        assert!(matches!(err, VerifyError::Status(503)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let verifier =
            RecaptchaVerifier::new(format!("http://{addr}/siteverify"), Duration::from_secs(2))
                .unwrap();
        let err = verifier.verify("s", "t", "").await.unwrap_err();

        assert!(
            matches!(err, VerifyError::Transport(_) | VerifyError::Timeout(_)),
            "got {err:?}"
        );
    }
}
