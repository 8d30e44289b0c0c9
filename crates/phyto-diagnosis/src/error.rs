//! Diagnosis error types.
//!
//! Tier fall-through is not an error. Only a failed AI tier or a failing
//! store reaches the caller.

use phyto_db::error::DatabaseError;
use phyto_vision::{ErrorSource, VisionDebugInfo};

#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    /// No tier answered and the AI gateway is not configured.
    #[error("AI vision gateway unavailable: {}", .debug.error_message.as_deref().unwrap_or("not configured"))]
    GatewayUnavailable { debug: VisionDebugInfo },

    /// The AI call failed, timed out, or gave no usable answer.
    #[error(
        "AI vision call failed ({}): {}",
        .debug.error_code.as_deref().unwrap_or("unknown"),
        .debug.error_message.as_deref().unwrap_or("no details")
    )]
    GatewayCallFailed { debug: VisionDebugInfo },

    /// The caller cancelled the request while the AI call was in flight.
    #[error("diagnosis cancelled")]
    Cancelled,

    #[error("persistence failure: {0}")]
    Persistence(#[from] DatabaseError),
}

impl DiagnosisError {
    /// Which side is at fault, for triage.
    ///
    /// Gateway call failures keep the tag the gateway reported.
    #[must_use]
    pub fn error_source(&self) -> ErrorSource {
        match self {
            Self::GatewayCallFailed { debug } => debug.error_source.unwrap_or(ErrorSource::Ai),
            Self::GatewayUnavailable { .. } | Self::Cancelled | Self::Persistence(_) => {
                ErrorSource::App
            }
        }
    }

    /// Gateway debug info, when the failure came from the AI tier.
    #[must_use]
    pub const fn debug_info(&self) -> Option<&VisionDebugInfo> {
        match self {
            Self::GatewayUnavailable { debug } | Self::GatewayCallFailed { debug } => Some(debug),
            Self::Cancelled | Self::Persistence(_) => None,
        }
    }
}
