//! OpenAI-compatible chat-completions client.
//!
//! Works against api.openai.com as well as any gateway speaking the same
//! wire format (`OpenRouter`, a local vLLM, ...). The model is asked to answer
//! with a small JSON object whose `disease_name` the diagnosis engine reads.

use phyto_config::VisionConfig;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::VisionError;
use crate::http::{check_response, excerpt};
use crate::{VisionDebugInfo, VisionGateway, VisionRequest, VisionResponse};

const SYSTEM_PROMPT: &str = "You are a plant pathologist. Identify the most likely disease \
affecting the plant from the photo and the grower's description. Answer with a single JSON \
object and nothing else: {\"disease_name\": string, \"confidence\": number between 0 and 1, \
\"symptoms\": [string], \"treatment\": string}. If the plant looks healthy use \
\"Healthy\" as disease_name.";

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

/// [`VisionGateway`] over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    config: VisionConfig,
}

impl OpenAiVisionClient {
    /// Build a client; the request timeout comes from `config.timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the TLS backend cannot be initialized.
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("phyto/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub const fn config(&self) -> &VisionConfig {
        &self.config
    }

    fn request_body(&self, request: &VisionRequest) -> Value {
        let language = if request.language.trim().is_empty() {
            self.config.language.as_str()
        } else {
            request.language.trim()
        };

        let mut text = format!("Answer in language code '{language}'.");
        if let Some(description) = request.description() {
            text.push_str("\nGrower's description: ");
            text.push_str(description);
        }

        let mut parts = vec![json!({ "type": "text", "text": text })];
        if let Some(url) = image_url(request) {
            parts.push(json!({ "type": "image_url", "image_url": { "url": url } }));
        }

        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": parts },
            ],
        })
    }

    /// Send the request and return `(status, content, raw body)`.
    async fn complete(&self, request: &VisionRequest) -> Result<(u16, String, String), VisionError> {
        let resp = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(request))
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let status = resp.status().as_u16();
        let raw = resp.text().await?;
        let content = parse_content(&raw)?;
        Ok((status, content, raw))
    }
}

/// Image reference for the `image_url` content part.
fn image_url(request: &VisionRequest) -> Option<String> {
    if let Some(b64) = request.image_base64.as_deref().filter(|s| !s.is_empty()) {
        if b64.starts_with("data:") {
            return Some(b64.to_string());
        }
        return Some(format!("data:image/jpeg;base64,{b64}"));
    }
    request
        .image_url
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Pull the assistant text out of a chat-completions body.
///
/// `content` is either a string or, on some gateways, an array of
/// `{ "type": "text", "text": ... }` parts.
fn parse_content(raw: &str) -> Result<String, VisionError> {
    let data: ChatResponse = serde_json::from_str(raw)
        .map_err(|e| VisionError::Parse(format!("invalid completion body: {e}")))?;
    let content = data
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| VisionError::Parse("completion has no choices".to_string()))?;

    let text = match content {
        Value::String(s) => s,
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        return Err(VisionError::Parse("completion content is empty".to_string()));
    }
    Ok(text)
}

impl VisionGateway for OpenAiVisionClient {
    fn is_available(&self) -> bool {
        self.config.is_configured()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn provider_name(&self) -> &str {
        &self.config.provider
    }

    async fn analyze_image(&self, request: &VisionRequest) -> VisionResponse {
        let debug = VisionDebugInfo::for_call(self, request);

        if !self.is_available() {
            let err = VisionError::NotConfigured("vision.api_key is not set".to_string());
            return VisionResponse::failure(debug.with_vision_error(&err));
        }
        if !request.has_image() && request.description().is_none() {
            let err = VisionError::EmptyRequest("no image and no description".to_string());
            return VisionResponse::failure(debug.with_vision_error(&err));
        }

        match self.complete(request).await {
            Ok((status, content, raw)) => {
                tracing::debug!(
                    provider = %self.config.provider,
                    model = %self.config.model,
                    status,
                    "vision analysis completed"
                );
                VisionResponse::ok(
                    content,
                    VisionDebugInfo {
                        http_status_code: Some(status),
                        raw_response_excerpt: Some(excerpt(&raw)),
                        ..debug
                    },
                )
            }
            Err(e) => {
                tracing::warn!(
                    provider = %self.config.provider,
                    code = e.code(),
                    %e,
                    "vision analysis failed"
                );
                VisionResponse::failure(debug.with_vision_error(&e))
            }
        }
    }
}
