//! API client for the driving-school backend.
//!
//! This module provides the `ApiClient` struct for fetching quiz content
//! and regions, submitting quiz attempts, and registering push
//! subscriptions.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{DevicePlatform, QuizAttemptRecord, QuizDefinition, StatesResponse};
use crate::push::PushBackend;
use crate::sync::SubmitBackend;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Wrapper shape some deployments use for the quiz list endpoint.
#[derive(Debug, Deserialize)]
struct QuizListResponse {
    #[serde(alias = "data", alias = "items")]
    quizzes: Vec<QuizDefinition>,
}

/// API client for the quiz backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    /// This is more efficient than creating a new client for each request.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET a URL and return its body, retrying on rate limits.
    async fn get_text(&self, url: &str) -> Result<String> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url));
                }
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// POST a JSON body where only the status matters; the response body
    /// is discarded. Retries on rate limits.
    async fn post_ack<B: serde::Serialize>(&self, url: &str, body: &B) -> Result<()> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(url)
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await
                .with_context(|| format!("Failed to send POST request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(_) => return Ok(()),
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch the list of wilayas served by the registration flow
    pub async fn fetch_states(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/states", self.base_url);
        let text = self.get_text(&url).await?;
        parse_states(&text)
    }

    /// Fetch the theory quiz catalog
    pub async fn fetch_theory_quizzes(&self) -> Result<Vec<QuizDefinition>> {
        let url = format!("{}/api/quizzes/theory", self.base_url);
        let text = self.get_text(&url).await?;
        parse_quiz_list(&text)
    }
}

/// The endpoint normally answers `{"states": [...]}`; older deployments
/// return the bare array.
fn parse_states(text: &str) -> Result<Vec<String>> {
    if let Ok(wrapped) = serde_json::from_str::<StatesResponse>(text) {
        return Ok(wrapped.states);
    }
    serde_json::from_str::<Vec<String>>(text).context("Failed to parse states response")
}

/// The endpoint normally answers a bare array; some deployments wrap it.
fn parse_quiz_list(text: &str) -> Result<Vec<QuizDefinition>> {
    if let Ok(quizzes) = serde_json::from_str::<Vec<QuizDefinition>>(text) {
        return Ok(quizzes);
    }
    let wrapped: QuizListResponse =
        serde_json::from_str(text).context("Failed to parse quiz list response")?;
    Ok(wrapped.quizzes)
}

impl SubmitBackend for ApiClient {
    async fn submit_attempt(&self, record: &QuizAttemptRecord) -> Result<()> {
        let url = format!("{}/api/quiz-attempts", self.base_url);
        self.post_ack(&url, record).await
    }
}

impl PushBackend for ApiClient {
    async fn subscribe_push(&self, descriptor: &Value, device: DevicePlatform) -> Result<()> {
        let url = format!("{}/api/notifications/subscribe", self.base_url);
        let body = serde_json::json!({
            "subscription": descriptor,
            "device_type": device.as_str(),
        });
        self.post_ack(&url, &body).await
    }

    async fn unsubscribe_push(&self, endpoint: &str) -> Result<()> {
        let url = format!("{}/api/notifications/unsubscribe", self.base_url);
        let body = serde_json::json!({ "endpoint": endpoint });
        self.post_ack(&url, &body).await
    }
}
