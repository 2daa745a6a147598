use super::responses::{ErrorResponse, OutputItem, ResponseBody, ResponseRequest};
use crate::config::Settings;
use crate::util::truncate;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Maximum length for error content in error messages
const MAX_ERROR_CONTENT_LEN: usize = 200;

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000; // 2 seconds
const BACKOFF_MULTIPLIER: u64 = 2; // Exponential backoff

/// Anything that can answer a Responses API request.
///
/// The HTTP client implements this; tests script model turns with stubs.
pub trait ResponsesClient {
    fn create_response(
        &self,
        request: &ResponseRequest,
    ) -> impl Future<Output = anyhow::Result<Vec<OutputItem>>> + Send;
}

/// HTTP client for the OpenAI Responses endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.api_key.clone(), settings.api_base_url.clone())
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url)
    }
}

impl ResponsesClient for OpenAiClient {
    async fn create_response(&self, request: &ResponseRequest) -> anyhow::Result<Vec<OutputItem>> {
        let url = self.responses_url();
        let mut retry_count = 0;

        loop {
            let response = self
                .http
                .post(&url)
                .header("Content-Type", "application/json")
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                let parsed: ResponseBody = serde_json::from_str(&text).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to parse model response: {} ({})",
                        e,
                        sanitize_api_response(&text)
                    )
                })?;
                debug!(items = parsed.output.len(), "model response received");
                return Ok(parsed.output);
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let retry_after =
                    parse_retry_after(&text).unwrap_or_else(|| backoff_secs(retry_count));
                warn!(
                    retry_after,
                    attempt = retry_count,
                    max = MAX_RETRIES,
                    "rate limited, retrying"
                );
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            return Err(api_error(status, &text, retry_count));
        }
    }
}

fn api_error(status: reqwest::StatusCode, text: &str, retry_count: u32) -> anyhow::Error {
    let detail = serde_json::from_str::<ErrorResponse>(text)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| text.to_string());

    let message = match status.as_u16() {
        401 => "Invalid API key. Check OPENAI_API_KEY.".to_string(),
        429 => format!(
            "Rate limited after {} retries. Try again in a few minutes.",
            retry_count
        ),
        500..=599 => format!(
            "Model API server error ({}). The service may be temporarily unavailable.",
            status
        ),
        _ => format!("API error {}: {}", status, sanitize_api_response(&detail)),
    };
    anyhow::anyhow!("{}", message)
}

/// Exponential backoff in seconds for the given 1-based retry.
fn backoff_secs(retry_count: u32) -> u64 {
    (INITIAL_BACKOFF_MS * BACKOFF_MULTIPLIER.pow(retry_count.saturating_sub(1))) / 1000
}

/// Extract a "retry after N seconds" hint from an error body.
fn parse_retry_after(text: &str) -> Option<u64> {
    let text_lower = text.to_lowercase();
    let pos = text_lower.find("retry")?;
    let after_retry = &text_lower[pos..];
    for word in after_retry.split_whitespace().skip(1).take(5) {
        if let Ok(secs) = word
            .trim_matches(|c: char| !c.is_numeric())
            .parse::<u64>()
        {
            if secs > 0 && secs < 300 {
                return Some(secs);
            }
        }
    }
    None
}

/// Truncate API response content and redact anything that looks like a secret.
fn sanitize_api_response(content: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "api_key",
        "apikey",
        "secret",
        "password",
        "credential",
        "bearer",
        "sk-",
    ];

    let truncated = truncate(content, MAX_ERROR_CONTENT_LEN);
    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "(response details redacted - may contain sensitive data)".to_string();
    }
    truncated
}
