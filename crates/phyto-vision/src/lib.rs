//! # phyto-vision
//!
//! The AI vision tier of Phyto: the [`VisionGateway`] seam the diagnosis
//! engine calls when neither the knowledge base nor the cache can answer, and
//! [`OpenAiVisionClient`], an implementation for any OpenAI-compatible
//! `/chat/completions` endpoint.
//!
//! Gateways never return `Err`. Every failure is folded into a
//! [`VisionResponse`] with `success == false` and a populated
//! [`VisionDebugInfo`], whose [`ErrorSource`] tells callers whether the
//! provider or the application is at fault.

mod error;
mod http;
pub mod openai;

pub use error::VisionError;
pub use openai::OpenAiVisionClient;

use std::future::Future;

use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────

/// Which side of the gateway a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSource {
    /// The provider failed: network, timeout, non-2xx, unusable payload.
    #[serde(rename = "AI")]
    Ai,
    /// The application failed: missing configuration, invalid request.
    #[serde(rename = "App")]
    App,
}

impl ErrorSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::App => "App",
        }
    }
}

impl std::fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_language() -> String {
    "vi".to_string()
}

/// Input of one vision analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Base64 image bytes, or a complete `data:` URL.
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_description: Option<String>,
    /// Answer language (ISO 639-1).
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for VisionRequest {
    fn default() -> Self {
        Self {
            image_base64: None,
            image_url: None,
            user_description: None,
            language: default_language(),
        }
    }
}

impl VisionRequest {
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image_base64.as_deref().is_some_and(|s| !s.is_empty())
            || self.image_url.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Non-blank user description, trimmed.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.user_description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Diagnostics attached to every gateway response, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionDebugInfo {
    pub provider: String,
    pub http_status_code: Option<u16>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub raw_response_excerpt: Option<String>,
    pub model: String,
    pub has_image: bool,
    pub error_source: Option<ErrorSource>,
}

impl VisionDebugInfo {
    /// Debug info for a call `gateway` is about to make for `request`.
    pub fn for_call<G: VisionGateway + ?Sized>(gateway: &G, request: &VisionRequest) -> Self {
        Self {
            provider: gateway.provider_name().to_string(),
            model: gateway.model_name().to_string(),
            has_image: request.has_image(),
            ..Self::default()
        }
    }

    /// Record a failure on this debug info.
    #[must_use]
    pub fn with_error(
        mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        source: ErrorSource,
    ) -> Self {
        self.error_code = Some(code.into());
        self.error_message = Some(message.into());
        self.error_source = Some(source);
        self
    }

    /// Record a [`VisionError`], carrying over its status code and body.
    #[must_use]
    pub fn with_vision_error(mut self, err: &VisionError) -> Self {
        match err {
            VisionError::Api { status, message } => {
                self.http_status_code = Some(*status);
                self.raw_response_excerpt = Some(message.clone());
            }
            VisionError::Http(e) => {
                self.http_status_code = e.status().map(|s| s.as_u16());
            }
            _ => {}
        }
        self.with_error(err.code(), err.to_string(), err.source_tag())
    }
}

/// Outcome of one vision analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionResponse {
    pub success: bool,
    /// Model answer on success, empty on failure.
    pub content: String,
    pub debug_info: VisionDebugInfo,
}

impl VisionResponse {
    #[must_use]
    pub const fn ok(content: String, debug_info: VisionDebugInfo) -> Self {
        Self {
            success: true,
            content,
            debug_info,
        }
    }

    #[must_use]
    pub const fn failure(debug_info: VisionDebugInfo) -> Self {
        Self {
            success: false,
            content: String::new(),
            debug_info,
        }
    }

    /// The failure's source; `None` on success.
    #[must_use]
    pub const fn error_source(&self) -> Option<ErrorSource> {
        if self.success {
            None
        } else {
            self.debug_info.error_source
        }
    }
}

// ── Gateway ────────────────────────────────────────────────────────

/// Image/text-to-diagnosis provider.
///
/// `analyze_image` must not block; the caller bounds it with a timeout and a
/// cancellation token and simply drops the future when either fires.
pub trait VisionGateway: Send + Sync {
    /// Whether the gateway is configured well enough to attempt a call.
    fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;

    fn provider_name(&self) -> &str;

    fn analyze_image(
        &self,
        request: &VisionRequest,
    ) -> impl Future<Output = VisionResponse> + Send;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Named;

    impl VisionGateway for Named {
        fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "test-model"
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        async fn analyze_image(&self, _request: &VisionRequest) -> VisionResponse {
            VisionResponse::ok("Leaf Spot".into(), VisionDebugInfo::default())
        }
    }

    #[test]
    fn error_source_serializes_as_tags() {
        assert_eq!(serde_json::to_string(&ErrorSource::Ai).unwrap(), r#""AI""#);
        assert_eq!(serde_json::to_string(&ErrorSource::App).unwrap(), r#""App""#);
        let back: ErrorSource = serde_json::from_str(r#""App""#).unwrap();
        assert_eq!(back, ErrorSource::App);
    }

    #[test]
    fn request_defaults_to_vietnamese() {
        let request: VisionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.language, "vi");
        assert!(!request.has_image());
        assert_eq!(request.description(), None);
    }

    #[test]
    fn blank_image_does_not_count() {
        let request = VisionRequest {
            image_base64: Some(String::new()),
            image_url: Some("https://example.com/leaf.jpg".into()),
            user_description: Some("  yellow leaves ".into()),
            ..VisionRequest::default()
        };
        assert!(request.has_image());
        assert_eq!(request.description(), Some("yellow leaves"));
    }

    #[test]
    fn debug_info_for_call_names_gateway() {
        let request = VisionRequest::default();
        let debug = VisionDebugInfo::for_call(&Named, &request)
            .with_error("timeout", "took too long", ErrorSource::Ai);
        assert_eq!(debug.provider, "test");
        assert_eq!(debug.model, "test-model");
        assert_eq!(debug.error_code.as_deref(), Some("timeout"));
        assert_eq!(debug.error_source, Some(ErrorSource::Ai));
        assert!(!debug.has_image);
    }

    #[test]
    fn api_error_keeps_status_and_body() {
        let err = VisionError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        let debug = VisionDebugInfo::default().with_vision_error(&err);
        assert_eq!(debug.http_status_code, Some(503));
        assert_eq!(debug.raw_response_excerpt.as_deref(), Some("overloaded"));
        assert_eq!(debug.error_code.as_deref(), Some("api_error"));
        assert_eq!(debug.error_source, Some(ErrorSource::Ai));
    }

    #[test]
    fn success_has_no_error_source() {
        let ok = VisionResponse::ok("x".into(), VisionDebugInfo::default());
        assert_eq!(ok.error_source(), None);
        let failed = VisionResponse::failure(VisionDebugInfo::default().with_error(
            "not_configured",
            "missing key",
            ErrorSource::App,
        ));
        assert_eq!(failed.error_source(), Some(ErrorSource::App));
        assert!(failed.content.is_empty());
    }
}
