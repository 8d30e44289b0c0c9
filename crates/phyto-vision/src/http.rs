//! Shared HTTP response helpers for the vision client.

use crate::error::VisionError;

/// Longest provider body kept in debug info, in chars.
pub const EXCERPT_CHARS: usize = 500;

/// Check an HTTP response for a non-success status.
///
/// Returns the response unchanged on success, otherwise
/// [`VisionError::Api`] carrying the status and a body excerpt.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, VisionError> {
    if !resp.status().is_success() {
        return Err(VisionError::Api {
            status: resp.status().as_u16(),
            message: excerpt(&resp.text().await.unwrap_or_default()),
        });
    }
    Ok(resp)
}

/// First [`EXCERPT_CHARS`] chars of `text`, cut on a char boundary.
#[must_use]
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
