// src/llm/perplexity.rs
// Perplexity chat completions client (non-streaming, single attempt)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, error, info, instrument};
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};

use super::{Completion, CompletionBackend, Message};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Chat completion request body. Every generation parameter is sent on every
/// call; the values come from configuration and never vary per request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_citations: bool,
    search_domain_filter: Vec<String>,
    search_recency_filter: String,
}

/// Non-streaming chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    citations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parse a completion response body into a Completion
fn parse_completion(response_body: &str) -> Result<Completion> {
    let data: ChatCompletionResponse = serde_json::from_str(response_body)
        .map_err(|e| RelayError::upstream(format!("failed to parse completion response: {e}")))?;

    // The reply is the first choice; anything without one is a failure
    let text = data
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RelayError::upstream("completion response contained no reply"))?;

    Ok(Completion {
        text,
        citations: data.citations,
    })
}

/// Map an upstream failure status onto the relay error taxonomy
fn classify_status(status: StatusCode, detail: &str) -> RelayError {
    match status {
        StatusCode::UNAUTHORIZED => RelayError::Auth,
        StatusCode::TOO_MANY_REQUESTS => RelayError::RateLimited,
        _ => RelayError::upstream(format!("API error {status}: {detail}")),
    }
}

/// Perplexity API client
pub struct PerplexityClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    search_domain_filter: Vec<String>,
    search_recency_filter: String,
    client: Client,
}

impl PerplexityClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            search_domain_filter: vec![config.search_domain.clone()],
            search_recency_filter: config.search_recency.clone(),
            client,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, messages: Vec<Message>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            return_citations: true,
            search_domain_filter: self.search_domain_filter.clone(),
            search_recency_filter: self.search_recency_filter.clone(),
        }
    }
}

#[async_trait]
impl CompletionBackend for PerplexityClient {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    #[instrument(skip(self, messages), fields(request_id, model = %self.model, message_count = messages.len()))]
    async fn complete(&self, messages: Vec<Message>) -> Result<Completion> {
        // A missing credential fails the same way an upstream rejection would,
        // without the round trip
        if self.api_key.is_empty() {
            return Err(RelayError::Auth);
        }

        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", &request_id);

        info!(
            request_id = %request_id,
            message_count = messages.len(),
            model = %self.model,
            "starting completion request"
        );

        let request = self.build_request(messages);
        let body = serde_json::to_string(&request)
            .map_err(|e| RelayError::upstream(format!("failed to encode request: {e}")))?;
        debug!(request_id = %request_id, "completion request: {}", body);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(request_id = %request_id, error = %e, "completion request failed to send");
                RelayError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                request_id = %request_id,
                status = %status,
                error = %error_body,
                "completion request rejected"
            );
            return Err(classify_status(status, &error_body));
        }

        let response_body = response.text().await.map_err(RelayError::from)?;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        let completion = parse_completion(&response_body)?;

        info!(
            request_id = %request_id,
            duration_ms,
            reply_chars = completion.text.len(),
            citation_count = completion.citations.len(),
            "completion request finished"
        );

        Ok(completion)
    }
}
