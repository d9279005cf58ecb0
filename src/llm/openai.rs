//! OpenAI-compatible API client.
//!
//! Talks to `/chat/completions` for turns and `/images/generations` for
//! images. Turns serialize directly into the chat completions message shape,
//! so the caller's history is forwarded without reshaping.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::config::LlmTimeouts;
use super::types::{Content, GeneratedImage, ImageRequest, LlmError, Role, Turn};

/// Provider error codes that mean "slow down" rather than "broken".
const RATE_LIMIT_CODES: &[&str] = &["insufficient_quota", "rate_limit_exceeded"];

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Build a client for `base_url` (without trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: &str, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Run one chat completion and return `choices[0].message` as a turn.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport failure, non-success status, or an
    /// unparseable body.
    pub async fn chat(&self, model: &str, messages: &[Turn]) -> Result<Turn, LlmError> {
        let body = CcRequest { model, messages };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_completions_response(&text)
    }

    /// Request `request.amount` images and return their URLs.
    ///
    /// # Errors
    ///
    /// Same conditions as [`OpenAiClient::chat`].
    pub async fn generate_images(&self, model: &str, request: &ImageRequest) -> Result<Vec<GeneratedImage>, LlmError> {
        let body = ImgRequest {
            model,
            prompt: &request.prompt,
            n: request.amount,
            size: &request.resolution,
            response_format: "url",
        };
        let text = self.send_json("/images/generations", &body).await?;
        parse_images_response(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(classify_error(status, text));
        }
        Ok(text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Serialize)]
struct ImgRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'static str,
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Map a non-success response to an error, separating quota/rate-limit signals.
pub(crate) fn classify_error(status: u16, body: String) -> LlmError {
    let code = serde_json::from_str::<Value>(&body).ok().and_then(|root| {
        root.get("error")
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    });
    let quota_signal = code.as_deref().is_some_and(|c| RATE_LIMIT_CODES.contains(&c));
    if status == 429 || quota_signal {
        LlmError::RateLimited { status, body }
    } else {
        LlmError::ApiResponse { status, body }
    }
}

pub(crate) fn parse_chat_completions_response(json_text: &str) -> Result<Turn, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let Some(message) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0].message".to_string()));
    };

    let content = match message.get("content") {
        Some(Value::Null) | None => message
            .get("refusal")
            .and_then(Value::as_str)
            .map(|refusal| Content::Text(refusal.to_owned())),
        Some(raw) => Some(
            serde_json::from_value::<Content>(raw.clone())
                .map_err(|e| LlmError::ApiParse(format!("chat_completions: bad message content: {e}")))?,
        ),
    };
    let Some(content) = content else {
        return Err(LlmError::ApiParse("chat_completions: message has no content".to_string()));
    };

    Ok(Turn { role: Role::Assistant, content })
}

pub(crate) fn parse_images_response(json_text: &str) -> Result<Vec<GeneratedImage>, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let Some(items) = root.get("data").and_then(Value::as_array) else {
        return Err(LlmError::ApiParse("images: missing data".to_string()));
    };
    let images = items
        .iter()
        .filter_map(|item| item.get("url").and_then(Value::as_str))
        .map(|url| GeneratedImage { url: url.to_owned() })
        .collect::<Vec<_>>();
    if images.is_empty() {
        return Err(LlmError::ApiParse("images: no image urls in response".to_string()));
    }
    Ok(images)
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
