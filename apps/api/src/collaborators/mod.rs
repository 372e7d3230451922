//! Collaborators: the HTTP clients for the text- and image-generation services.
//!
//! RULE: nothing else in the crate talks to either service directly. Both
//! clients share one retry policy and one local rate limiter, and both are
//! reached through a trait so the pipeline can run against in-process fakes.
//!
//! A collaborator failure is never fatal to a brochure: callers substitute
//! deterministic fallback content (see `brochure::content`).

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;

pub mod image_client;
pub mod prompts;
pub mod rate_limit;
pub mod text_client;

pub use image_client::{HttpImageClient, ImageGenerator, ImageRequest};
#[cfg(test)]
pub use rate_limit::ManualClock;
pub use rate_limit::{Clock, RateLimiter, SystemClock};
pub use text_client::{HttpTextClient, TextGenerator, TextRequest};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("local rate limit reached; next slot in {}ms", .retry_after.as_millis())]
    RateLimited { retry_after: Duration },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image payload could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("service returned no content")]
    EmptyResponse,
}

impl CollaboratorError {
    /// 429, 5xx and transport failures are worth another attempt; everything
    /// else fails straight through to the fallback.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::Http(_) => true,
            CollaboratorError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            _ => false,
        }
    }
}

/// Attempt budget shared by both clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(3),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// the budget is spent. Returns the last error on exhaustion.
    pub async fn run<T, F, Fut>(&self, service: &str, mut attempt: F) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error: Option<CollaboratorError> = None;

        for n in 0..attempts {
            if n > 0 {
                warn!(
                    "{} call attempt {} failed, retrying after {}ms...",
                    service,
                    n,
                    self.backoff.as_millis()
                );
                tokio::time::sleep(self.backoff).await;
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!("{} call failed: {}", service, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(CollaboratorError::EmptyResponse))
    }
}

/// Builds the shared `reqwest` client with the policy's timeout.
pub(crate) fn http_client(policy: &RetryPolicy) -> Result<reqwest::Client, CollaboratorError> {
    Ok(reqwest::Client::builder().timeout(policy.timeout).build()?)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
