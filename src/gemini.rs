use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;
use crate::error::ErrorKind;
use crate::request::GenerateRequest;

/// Shown when the service answers 2xx but without any answer text.
pub const EMPTY_RESPONSE_MESSAGE: &str =
    "No valid response from the AI. The content might have been blocked.";

/// Gemini response types
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Why a generate call produced no answer text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{}", EMPTY_RESPONSE_MESSAGE)]
    EmptyResponse,

    /// No key was configured, so nothing was sent.
    #[error("No Gemini API key configured")]
    MissingApiKey,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Network(_) => ErrorKind::Network,
            ServiceError::Rejected { .. } => ErrorKind::ServiceRejected,
            ServiceError::EmptyResponse => ErrorKind::EmptyResponse,
            ServiceError::MissingApiKey => ErrorKind::MissingApiKey,
        }
    }
}

/// Something that turns a request into raw answer text.
pub trait InferenceService {
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let timeout = config.request_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.generate_url(),
            api_key: config.gemini_api_key.clone(),
            timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Network(format!(
                "Request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            ServiceError::Network(err.without_url().to_string())
        }
    }
}

impl InferenceService for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        let resp = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = rejection_message(status, &body);
            log::warn!("Gemini API error {status}: {message}");
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        answer_text(&body).ok_or(ServiceError::EmptyResponse)
    }
}

/// Message for a non-2xx reply: the service's own message when the body
/// carries one, otherwise a generic status line.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("API Error: {}", status.as_u16()))
}

/// Text of the first candidate, or `None` when the body has none.
fn answer_text(body: &str) -> Option<String> {
    let gemini_resp: GeminiResponse = serde_json::from_str(body).ok()?;
    let parts = gemini_resp
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts;

    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if texts.is_empty() {
        return None;
    }
    Some(texts.join(""))
}
