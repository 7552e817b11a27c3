use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::quiz::{CourseId, QuizId};
use crate::telemetry::{redact_secrets, sanitize_for_log};

pub mod types;

use types::*;

/// The two backend calls the attempt state machine depends on.
///
/// Kept as a trait so the controller can be driven by a mock in tests.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Allocate an attempt on the server and fetch its questions.
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<StartQuizData, ApiError>;

    /// Submit the answers of an attempt.
    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        request: SubmitQuizRequest,
    ) -> Result<SubmitQuizResult, ApiError>;
}

/// Retry configuration for idempotent requests
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn from_settings(settings: &crate::config::RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry_config: RetryConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &crate::config::Config, token: Option<String>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.http.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            retry_config: RetryConfig::from_settings(&config.retry),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Every attempt of the current user. A missing list is empty.
    pub async fn attempts_history(&self) -> Result<Vec<SubmitQuizResult>, ApiError> {
        let url = self.url("/Quizzes/attempts/history");
        let envelope: Envelope<Vec<SubmitQuizResult>> = self
            .send_with_retry(|| self.authorize(self.client.get(&url)))
            .await?;
        envelope.into_list()
    }

    /// The current user's attempts within one course.
    pub async fn course_attempts(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<SubmitQuizResult>, ApiError> {
        let url = self.url(&format!("/Quizzes/courses/{}/attempts", course_id));
        let envelope: Envelope<Vec<SubmitQuizResult>> = self
            .send_with_retry(|| self.authorize(self.client.get(&url)))
            .await?;
        envelope.into_list()
    }

    pub async fn course_quizzes(&self, course_id: CourseId) -> Result<Vec<QuizSummary>, ApiError> {
        let url = self.url(&format!("/Quizzes/courses/{}", course_id));
        let envelope: Envelope<Vec<QuizSummary>> = self
            .send_with_retry(|| self.authorize(self.client.get(&url)))
            .await?;
        envelope.into_list()
    }

    /// The user the bearer token belongs to.
    pub async fn current_user(&self) -> Result<UserDto, ApiError> {
        let url = self.url("/Auth/me");
        let envelope: Envelope<UserDto> = self
            .send_with_retry(|| self.authorize(self.client.get(&url)))
            .await?;
        envelope.into_data()
    }

    /// Exchange credentials for a bearer token. Sent without authorization.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginData, ApiError> {
        let url = self.url("/Auth/login");
        let data: LoginData = self.send_once(self.client.post(&url).json(request)).await?;
        if data.token.trim().is_empty() {
            return Err(ApiError::Validation("login returned an empty token".to_string()));
        }
        Ok(data)
    }

    /// Send a request once and unwrap the response envelope.
    async fn send_once<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send_envelope(request).await?.into_data()
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        debug!("Backend responded {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &body);
            warn!(
                "Backend error {}: {}",
                status,
                sanitize_for_log(&redact_secrets(&err.user_message()))
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Send an idempotent request with exponential backoff retry logic
    async fn send_with_retry<T, F>(&self, build: F) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.send_envelope(build()).await {
                Ok(envelope) => return Ok(envelope),
                Err(e) if e.is_retryable() && attempt < self.retry_config.max_retries => {
                    attempt += 1;
                    let base = self.retry_config.delay_for(attempt);
                    // Add jitter (±10%)
                    let jitter = (base as f64 * 0.1 * (rand_jitter() - 0.5) * 2.0) as i64;
                    let delay_ms = base.saturating_add_signed(jitter);
                    warn!(
                        "Retry attempt {}/{} after {}ms delay: {}",
                        attempt, self.retry_config.max_retries, delay_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<StartQuizData, ApiError> {
        let url = self.url(&format!("/Quizzes/{}/start", quiz_id));
        debug!("Starting quiz {} via {}", quiz_id, url);
        let request = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({}));
        self.send_once(request).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        request: SubmitQuizRequest,
    ) -> Result<SubmitQuizResult, ApiError> {
        let url = self.url(&format!("/Quizzes/{}/submit", quiz_id));
        debug!(
            "Submitting attempt {} ({} answers) via {}",
            request.attempt_id,
            request.answers.len(),
            url
        );
        self.send_once(self.authorize(self.client.post(&url)).json(&request))
            .await
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Parse(e.to_string())
    } else {
        ApiError::Network(redact_secrets(&e.to_string()))
    }
}

/// Turn a non-success status and its body into a typed error.
pub fn classify_failure(status: u16, body: &str) -> ApiError {
    let message = describe_failure(status, body);
    match status {
        401 | 403 => ApiError::Authentication(message),
        404 => ApiError::NotFound(message),
        _ => ApiError::HttpStatus { status, message },
    }
}

/// Pick the most specific human message for a failed response.
///
/// Order: body `message`, body `errors` (list or field map), plain-text
/// body, then a generic message for the status code.
pub fn describe_failure(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(msg) = json
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
        {
            return msg.to_string();
        }

        let errors: Vec<String> = match json.get("errors") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|e| e.as_str().map(String::from))
                .collect(),
            Some(serde_json::Value::Object(fields)) => fields
                .values()
                .flat_map(|v| match v {
                    serde_json::Value::Array(items) => items
                        .iter()
                        .filter_map(|e| e.as_str().map(String::from))
                        .collect::<Vec<_>>(),
                    serde_json::Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                })
                .collect(),
            _ => Vec::new(),
        };
        if !errors.is_empty() {
            return errors.join(", ");
        }
    } else if !trimmed.is_empty() && !trimmed.starts_with('<') {
        return trimmed.chars().take(300).collect();
    }

    status_message(status)
}

fn status_message(status: u16) -> String {
    match status {
        400 => "The request is invalid. Check the submitted data".to_string(),
        401 => "You are not authorized. Please log in".to_string(),
        403 => "You do not have permission to access this resource".to_string(),
        404 => "The requested resource was not found".to_string(),
        409 => "Data conflict. The resource may already exist".to_string(),
        422 => "The submitted data is invalid".to_string(),
        429 => "Too many requests. Please try again later".to_string(),
        500 => "Server error. Please try again later".to_string(),
        502 => "Bad gateway while contacting the server".to_string(),
        503 => "The service is currently unavailable. Please try again later".to_string(),
        504 => "The connection timed out. Please try again later".to_string(),
        other => format!("Unexpected error (status {})", other),
    }
}

/// Generate a random jitter value between 0 and 1
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}
