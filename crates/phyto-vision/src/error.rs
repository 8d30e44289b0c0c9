//! Vision gateway error types.
//!
//! These never cross the gateway boundary: [`crate::OpenAiVisionClient`]
//! folds them into a failed [`crate::VisionResponse`] with debug info.

use thiserror::Error;

use crate::ErrorSource;

#[derive(Debug, Error)]
pub enum VisionError {
    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Provider answered but the payload was not usable.
    #[error("parse error: {0}")]
    Parse(String),

    /// Gateway is missing an API key, model, or base URL.
    #[error("vision gateway not configured: {0}")]
    NotConfigured(String),

    /// Request carries neither an image nor a description.
    #[error("empty request: {0}")]
    EmptyRequest(String),
}

impl VisionError {
    /// Short machine-readable code for debug info.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(e) if e.is_connect() => "connect",
            Self::Http(_) => "http",
            Self::Api { status: 429, .. } => "rate_limited",
            Self::Api { .. } => "api_error",
            Self::Parse(_) => "parse_error",
            Self::NotConfigured(_) => "not_configured",
            Self::EmptyRequest(_) => "empty_request",
        }
    }

    /// Whether the provider or the application is at fault.
    #[must_use]
    pub const fn source_tag(&self) -> ErrorSource {
        match self {
            Self::Http(_) | Self::Api { .. } | Self::Parse(_) => ErrorSource::Ai,
            Self::NotConfigured(_) | Self::EmptyRequest(_) => ErrorSource::App,
        }
    }
}
