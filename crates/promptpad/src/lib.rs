//! Prompt templating and single-shot text generation against the Gemini API.
//!
//! `promptpad` is the interaction core behind a small "paste text, pick an
//! instruction, generate" front end. It has three pieces:
//!
//! - [`prompt`] — combines raw user text with a preset or custom template.
//! - [`GeminiClient`] — sends one resolved prompt to the `generateContent`
//!   endpoint and classifies the reply.
//! - [`session`] — the [`Session`](session::Session) controller that tracks
//!   mode, the last prompt, the last output and in-flight status, and exposes
//!   the generate / regenerate actions.
//!
//! # Getting started
//!
//! ```ignore
//! use promptpad::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let client = GeminiClient::new(GenerationConfig::from_env())?;
//!     let session = Session::new(client);
//!
//!     let selection = Selection::preset(Preset::default());
//!     match session.generate("Rust ownership in one paragraph", &selection).await {
//!         Ok(text) => println!("{text}"),
//!         Err(failure) => eprintln!("{failure}"),
//!     }
//!
//!     // Feed the last prompt back through the builder.
//!     let _ = session.regenerate("Rust ownership in one paragraph").await;
//!     Ok(())
//! }
//! ```
//!
//! # Wire format
//!
//! Requests carry the prompt as the only content part:
//!
//! ```json
//! {"contents":[{"role":"user","parts":[{"text":"<prompt>"}]}]}
//! ```
//!
//! A reply counts as well formed only if `candidates[0].content.parts[0].text`
//! is present. Anything else is
//! [`GenerationFailure::MalformedResponse`]; connection problems and
//! unreadable bodies are [`GenerationFailure::TransportError`].

pub mod config;
pub mod error;
pub mod prelude;
pub mod prompt;
pub mod session;

pub use config::{GenerationConfig, PendingPolicy, RegenerateStrategy, SessionConfig};
pub use error::{GenerationFailure, GenerationResult};

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, trace, warn};

// ── Request types ──────────────────────────────────────────────────

/// Role attached to a content block. Requests only ever carry user turns.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A single text part.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Part {
    pub text: String,
}

/// One turn of content sent to the API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Body of a `generateContent` request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Request whose sole payload is `prompt` as a user turn.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
///
/// Every field is optional so that partial replies still deserialize and can
/// be classified instead of rejected outright.
#[derive(Deserialize, Debug)]
struct RawGenerateResponse {
    candidates: Option<Vec<RawCandidate>>,
    error: Option<ApiErrorResponse>,
}

#[derive(Deserialize, Debug)]
struct RawCandidate {
    content: Option<RawContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawContent {
    parts: Option<Vec<RawPart>>,
}

#[derive(Deserialize, Debug)]
struct RawPart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: Option<String>,
}

impl RawGenerateResponse {
    /// Text of the first part of the first candidate, if the reply has one.
    fn into_first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}

/// Classify a response body.
///
/// A body that is not JSON at all is a transport-level failure; valid JSON
/// without a usable candidate text is a malformed response.
pub fn parse_response(body: &str) -> GenerationResult {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        warn!("Response body is not JSON: {e}");
        GenerationFailure::TransportError
    })?;

    let parsed: RawGenerateResponse = serde_json::from_value(value).map_err(|e| {
        warn!("Unexpected API response structure: {e}");
        GenerationFailure::MalformedResponse
    })?;

    if let Some(ref err) = parsed.error {
        warn!(
            "Gemini API error: {}",
            err.message.as_deref().unwrap_or("(no message)")
        );
    }
    if let Some(reason) = parsed
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.finish_reason.as_deref())
    {
        trace!("First candidate finish reason: {reason}");
    }

    parsed.into_first_text().ok_or_else(|| {
        warn!("Unexpected API response structure: no candidate text");
        GenerationFailure::MalformedResponse
    })
}

// ── Backend seam ───────────────────────────────────────────────────

/// Future returned by [`GenerationBackend::generate`].
pub type GenerationFuture<'a> = Pin<Box<dyn Future<Output = GenerationResult> + Send + 'a>>;

/// Anything that can turn a resolved prompt into generated text.
///
/// [`GeminiClient`] is the production implementation. Tests substitute
/// scripted backends to drive a [`Session`](session::Session) without a
/// network.
pub trait GenerationBackend: Send + Sync {
    fn generate(&self, prompt: &str) -> GenerationFuture<'_>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl GeminiClient {
    /// Create a client from the given configuration.
    pub fn new(config: GenerationConfig) -> Result<Self, String> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        let mut endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| format!("invalid endpoint '{}': {e}", config.endpoint))?;
        endpoint
            .query_pairs_mut()
            .append_pair("key", &config.api_key);

        Ok(Self { client, endpoint })
    }

    /// Send one prompt and return the first candidate's text.
    pub async fn send(&self, prompt: &str) -> GenerationResult {
        let body = GenerateContentRequest::from_prompt(prompt);
        debug!("Generation request: {} chars prompt", prompt.len());

        let start = Instant::now();

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("API call failed: {e}");
                GenerationFailure::TransportError
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            warn!("Failed to read response: {e}");
            GenerationFailure::TransportError
        })?;

        debug!(
            "Generation response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        if !status.is_success() {
            warn!("Gemini API HTTP {status}");
        }

        let output = parse_response(&text)?;
        debug!("Generation output: {} chars", output.len());
        Ok(output)
    }
}

impl GenerationBackend for GeminiClient {
    fn generate(&self, prompt: &str) -> GenerationFuture<'_> {
        let prompt = prompt.to_string();
        Box::pin(async move { self.send(&prompt).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let req = GenerateContentRequest::from_prompt("Summarize \"hi\"");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Summarize \"hi\""}]}]
            })
        );
    }

    #[test]
    fn well_formed_response_yields_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hi there"}]}}]}"#;
        assert_eq!(parse_response(body), Ok("Hi there".to_string()));
    }

    #[test]
    fn text_is_not_trimmed() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"  padded \n"}]}}]}"#;
        assert_eq!(parse_response(body), Ok("  padded \n".to_string()));
    }

    #[test]
    fn only_first_candidate_and_part_are_used() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"first"},{"text":"second"}]}},
            {"content":{"parts":[{"text":"other"}]}}
        ]}"#;
        assert_eq!(parse_response(body), Ok("first".to_string()));
    }

    #[test]
    fn empty_candidates_is_malformed() {
        assert_eq!(
            parse_response(r#"{"candidates":[]}"#),
            Err(GenerationFailure::MalformedResponse)
        );
    }

    #[test]
    fn missing_nested_fields_are_malformed() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{}}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
            r#"{"candidates":"nope"}"#,
            r#"[1,2,3]"#,
            r#"{"error":{"code":400,"message":"API key not valid"}}"#,
        ] {
            assert_eq!(
                parse_response(body),
                Err(GenerationFailure::MalformedResponse),
                "body: {body}"
            );
        }
    }

    #[test]
    fn non_json_body_is_transport_error() {
        assert_eq!(
            parse_response("<html>502 Bad Gateway</html>"),
            Err(GenerationFailure::TransportError)
        );
    }

    #[test]
    fn client_appends_key_query_parameter() {
        let config = GenerationConfig::default()
            .with_endpoint("http://localhost:1/v1/generate")
            .with_api_key("abc 123");
        let client = GeminiClient::new(config).unwrap();
        assert_eq!(client.endpoint.query(), Some("key=abc+123"));
    }

    #[test]
    fn empty_key_is_still_sent() {
        let client = GeminiClient::new(GenerationConfig::default()).unwrap();
        assert_eq!(client.endpoint.query(), Some("key="));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = GenerationConfig::default().with_endpoint("not a url");
        assert!(GeminiClient::new(config).is_err());
    }
}
