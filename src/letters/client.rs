//! # Letter-Rendering Collaborator Client
//!
//! Synchronous (per-call) HTTP client for the external letter-rendering
//! service. Server-class failures retry with exponential backoff; client
//! errors surface immediately as typed failures. The trait seam exists so
//! the tracking handlers can be exercised without a live rendering service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum LetterError {
    #[error("Letter service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Letter service unavailable after {attempts} attempts: {message}")]
    Unavailable { attempts: u32, message: String },

    #[error("Letter service transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl LetterError {
    /// Only server-class failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            LetterError::Rejected { status, .. } => *status >= 500,
            LetterError::Unavailable { .. } => true,
            LetterError::Transport(error) => error.is_timeout() || error.is_connect(),
        }
    }
}

pub type LetterResult<T> = Result<T, LetterError>;

/// Request body sent to the rendering service
#[derive(Debug, Clone, Serialize)]
pub struct LetterRequest {
    pub case_id: i64,
    pub external_id: String,
    pub decision_version_id: i64,
    pub decision_kind: String,
    pub clinical_decision: String,
    pub document_id: Option<i64>,
}

/// Metadata returned for a successfully rendered letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterPackage {
    pub blob_url: String,
    pub filename: String,
    pub file_size_bytes: i64,
    pub generated_at: DateTime<Utc>,
}

/// Seam for the external rendering collaborator
#[async_trait]
pub trait LetterRenderer: Send + Sync {
    async fn render(&self, request: &LetterRequest) -> LetterResult<LetterPackage>;
}

/// HTTP implementation with exponential backoff on server-class errors
pub struct HttpLetterClient {
    client: reqwest::Client,
    base_url: String,
    retry_limit: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl HttpLetterClient {
    pub fn new(
        base_url: String,
        retry_limit: u32,
        backoff_base_ms: u64,
        backoff_max_ms: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            retry_limit,
            backoff_base: Duration::from_millis(backoff_base_ms),
            backoff_max: Duration::from_millis(backoff_max_ms),
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self.backoff_base.saturating_mul(factor as u32);
        delay.min(self.backoff_max)
    }

    async fn render_once(&self, request: &LetterRequest) -> LetterResult<LetterPackage> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<LetterPackage>().await?);
        }

        let message = response.text().await.unwrap_or_default();
        Err(LetterError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl LetterRenderer for HttpLetterClient {
    #[instrument(skip(self, request), fields(case_id = request.case_id))]
    async fn render(&self, request: &LetterRequest) -> LetterResult<LetterPackage> {
        let mut last_error: Option<LetterError> = None;

        for attempt in 0..=self.retry_limit {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt - 1);
                debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying letter generation after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            match self.render_once(request).await {
                Ok(package) => return Ok(package),
                Err(error) if error.is_retryable() => {
                    warn!(
                        attempt = attempt,
                        error = %error,
                        "Letter generation attempt failed with a retryable error"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(LetterError::Unavailable {
            attempts: self.retry_limit + 1,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability_by_status_class() {
        let server_error = LetterError::Rejected {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(server_error.is_retryable());

        let client_error = LetterError::Rejected {
            status: 422,
            message: "bad template".to_string(),
        };
        assert!(!client_error.is_retryable());
    }

    #[test]
    fn test_backoff_is_capped() {
        let client = HttpLetterClient::new("http://localhost".to_string(), 5, 1000, 4000);
        assert_eq!(client.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(client.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(client.backoff_delay(6), Duration::from_millis(4000));
    }
}
