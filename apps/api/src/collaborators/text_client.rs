use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, CollaboratorError, RateLimiter, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRequest {
    pub prompt: String,
    pub max_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>, max_length: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_length,
            temperature: None,
            top_p: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    generated_text: String,
}

/// Prompt in, prose out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &TextRequest) -> Result<String, CollaboratorError>;
}

/// Client for the text-generation service (`POST {prompt, max_length, ...}`
/// → `{generated_text}`).
#[derive(Clone)]
pub struct HttpTextClient {
    client: Client,
    url: String,
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl HttpTextClient {
    pub fn new(
        url: impl Into<String>,
        policy: RetryPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: http_client(&policy)?,
            url: url.into(),
            policy,
            limiter,
        })
    }

    async fn call_once(&self, request: &TextRequest) -> Result<String, CollaboratorError> {
        self.limiter
            .try_acquire()
            .map_err(|retry_after| CollaboratorError::RateLimited { retry_after })?;

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: TextResponse = serde_json::from_slice(&bytes)?;
        let text = parsed.generated_text.trim();
        if text.is_empty() {
            return Err(CollaboratorError::EmptyResponse);
        }

        debug!("Text service returned {} chars", text.len());
        Ok(text.to_string())
    }
}

#[async_trait]
impl TextGenerator for HttpTextClient {
    async fn generate(&self, request: &TextRequest) -> Result<String, CollaboratorError> {
        self.policy
            .run("Text service", || self.call_once(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ManualClock;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/generate")
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        }
    }

    fn roomy_limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            100,
            Duration::from_secs(3600),
            Arc::new(ManualClock::new()),
        ))
    }

    #[test]
    fn test_request_omits_unset_sampling_fields() {
        let body = serde_json::to_value(TextRequest::new("hello", 150)).unwrap();
        assert_eq!(body, json!({"prompt": "hello", "max_length": 150}));
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_text() {
        let router = Router::new().route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["max_length"], 150);
                Json(json!({"generated_text": "  A quiet lagoon retreat.  "}))
            }),
        );
        let url = serve(router).await;
        let client = HttpTextClient::new(url, fast_policy(), roomy_limiter()).unwrap();

        let text = client
            .generate(&TextRequest::new("describe", 150))
            .await
            .unwrap();
        assert_eq!(text, "A quiet lagoon retreat.");
    }

    #[tokio::test]
    async fn test_generate_retries_after_429() {
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route(
                "/generate",
                post(|State(hits): State<Arc<AtomicU32>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::TOO_MANY_REQUESTS, Json(json!({"detail": "Rate limit exceeded"})))
                    } else {
                        (StatusCode::OK, Json(json!({"generated_text": "second time lucky"})))
                    }
                }),
            )
            .with_state(hits.clone());
        let url = serve(router).await;
        let client = HttpTextClient::new(url, fast_policy(), roomy_limiter()).unwrap();

        let text = client.generate(&TextRequest::new("p", 150)).await.unwrap();
        assert_eq!(text, "second time lucky");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_client_error_is_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route(
                "/generate",
                post(|State(hits): State<Arc<AtomicU32>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::UNPROCESSABLE_ENTITY
                }),
            )
            .with_state(hits.clone());
        let url = serve(router).await;
        let client = HttpTextClient::new(url, fast_policy(), roomy_limiter()).unwrap();

        let err = client.generate(&TextRequest::new("p", 150)).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Status { status: 422, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_empty_text_is_an_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async { Json(json!({"generated_text": "   "})) }),
        );
        let url = serve(router).await;
        let client = HttpTextClient::new(url, fast_policy(), roomy_limiter()).unwrap();
        let err = client.generate(&TextRequest::new("p", 150)).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_full_local_window_fails_without_calling_service() {
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route(
                "/generate",
                post(|State(hits): State<Arc<AtomicU32>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"generated_text": "ok"}))
                }),
            )
            .with_state(hits.clone());
        let url = serve(router).await;
        let limiter = Arc::new(RateLimiter::new(
            1,
            Duration::from_secs(3600),
            Arc::new(ManualClock::new()),
        ));
        let client = HttpTextClient::new(url, fast_policy(), limiter).unwrap();

        assert!(client.generate(&TextRequest::new("p", 150)).await.is_ok());
        let err = client.generate(&TextRequest::new("p", 150)).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::RateLimited { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_service_exhausts_retries() {
        // Nothing listens on port 9 locally.
        let client = HttpTextClient::new(
            "http://127.0.0.1:9/generate",
            fast_policy(),
            roomy_limiter(),
        )
        .unwrap();
        let err = client.generate(&TextRequest::new("p", 150)).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Http(_)));
    }
}
