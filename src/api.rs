// API client module: contains a small blocking HTTP client that talks to
// the chat-completion endpoint. Blocking keeps the call synchronous from the
// caller's point of view; the progress spinner runs on its own thread.

use crate::error::CompletionError;
use crate::types::{GenerationParameters, Message, Model, Transcript};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Endpoint used unless the client is pointed elsewhere.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Upper bound on a single completion request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn a message list into a reply. The summarizer and
/// the chat session only depend on this, so tests can swap the transport.
pub trait Completion {
    fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParameters,
    ) -> Result<String, CompletionError>;
}

impl<C: Completion + ?Sized> Completion for &C {
    fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        (**self).complete(messages, params)
    }
}

/// Request body. Optional settings that are `None` are omitted from the JSON
/// rather than sent as `null`, so an absent `max_tokens` and `max_tokens: 0`
/// stay distinguishable on the wire.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: Model, messages: &'a [Message], params: &GenerationParameters) -> Self {
        ChatRequest {
            model: model.as_str(),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        }
    }
}

/// Successful response body. Only the parts we read are modeled.
#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, or an empty string when there is none.
    pub fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

/// Completion client holding an injected reqwest blocking client, the
/// endpoint URL and the bearer key.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

/// Build the HTTP client used in production, with the fixed request timeout.
pub fn default_http_client() -> Result<Client, CompletionError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(client)
}

impl CompletionClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        CompletionClient {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at another endpoint (proxies, local test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the whole transcript and return the assistant's reply text.
    pub fn send(
        &self,
        transcript: &Transcript,
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        self.complete(transcript.messages(), params)
    }

    /// Helper to build the bearer and content-type headers.
    fn headers(&self) -> Result<HeaderMap, CompletionError> {
        let mut headers = HeaderMap::new();
        // A key that is not a valid header value can never authenticate.
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| CompletionError::Unauthorized)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl Completion for CompletionClient {
    fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        let model: Model = params.model.parse()?;
        let body = ChatRequest::new(model, messages, params);
        debug!(
            endpoint = %self.endpoint,
            %model,
            messages = messages.len(),
            "sending completion request"
        );

        let res = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()?;
        let status = res.status();
        let text = res.text()?;
        debug!(status = status.as_u16(), bytes = text.len(), "completion response received");
        classify(status, &text)
    }
}

/// Map a status and body to the reply text or a classified failure.
pub fn classify(status: StatusCode, body: &str) -> Result<String, CompletionError> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(CompletionError::RateLimited),
        StatusCode::UNAUTHORIZED => Err(CompletionError::Unauthorized),
        s if !s.is_success() => {
            debug!(status = s.as_u16(), body, "completion request rejected");
            Err(CompletionError::Http {
                status: s.as_u16(),
                reason: s.canonical_reason().unwrap_or("Unknown").to_string(),
            })
        }
        _ => {
            let parsed: ChatResponse = serde_json::from_str(body)?;
            Ok(parsed.into_text())
        }
    }
}
