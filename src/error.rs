//! Error types for the handoff protocol
//!
//! This module provides error handling using thiserror for structured error
//! definitions and anyhow for propagation at the binary edge. Every variant
//! maps onto exactly one [`ErrorCode`], which is what the failure surface
//! shows to the user.

use crate::failure::ErrorCode;
use thiserror::Error;

/// Main error type for handoff operations
#[derive(Error, Debug)]
pub enum HandoffError {
    /// Inbound link does not target this app
    #[error("Expected '{expected}' but received '{actual}'")]
    InvalidLink { expected: String, actual: String },

    /// Inbound link could not be decoded
    #[error("Link parse error: {0}")]
    Parse(String),

    /// Malformed URL
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The OS refused or failed to dispatch a URL
    #[error("Failed to open '{url}': {reason}")]
    Dispatch { url: String, reason: String },

    /// The OS did not report a dispatch outcome in time
    #[error("Timed out after {waited:?} waiting to open '{url}'")]
    DispatchTimeout {
        url: String,
        waited: std::time::Duration,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl HandoffError {
    /// Failure category shown to the user
    pub fn code(&self) -> ErrorCode {
        match self {
            HandoffError::InvalidLink { .. } => ErrorCode::InvalidDeepLink,
            HandoffError::Parse(_) | HandoffError::Url(_) => ErrorCode::DeepLinkParseError,
            HandoffError::Dispatch { .. } | HandoffError::DispatchTimeout { .. } => {
                ErrorCode::DispatchFailure
            }
            HandoffError::Config(_)
            | HandoffError::Io(_)
            | HandoffError::Serialization(_)
            | HandoffError::Other(_) => ErrorCode::WorkflowFailure,
        }
    }
}

/// Result type alias for handoff operations
pub type Result<T> = std::result::Result<T, HandoffError>;

/// Convert anyhow::Error to HandoffError, keeping the context chain
impl From<anyhow::Error> for HandoffError {
    fn from(err: anyhow::Error) -> Self {
        HandoffError::Other(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HandoffError::InvalidLink {
            expected: "mauiapp://check-in".to_string(),
            actual: "mauiapp://wrong".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expected 'mauiapp://check-in' but received 'mauiapp://wrong'"
        );
    }

    #[test]
    fn test_error_conversion() {
        let url_err = url::Url::parse("not a url");
        assert!(url_err.is_err());

        let handoff_err: HandoffError = url_err.unwrap_err().into();
        assert!(matches!(handoff_err, HandoffError::Url(_)));
        assert_eq!(handoff_err.code(), ErrorCode::DeepLinkParseError);
    }

    #[test]
    fn test_anyhow_context_is_kept() {
        let err: HandoffError = anyhow::anyhow!("file missing")
            .context("Failed to load config")
            .into();
        assert_eq!(err.to_string(), "Failed to load config: file missing");
        assert_eq!(err.code(), ErrorCode::WorkflowFailure);
    }

    #[test]
    fn test_dispatch_errors_share_code() {
        let failed = HandoffError::Dispatch {
            url: "app://x".to_string(),
            reason: "no handler".to_string(),
        };
        let timed_out = HandoffError::DispatchTimeout {
            url: "app://x".to_string(),
            waited: std::time::Duration::from_secs(5),
        };
        assert_eq!(failed.code(), ErrorCode::DispatchFailure);
        assert_eq!(timed_out.code(), ErrorCode::DispatchFailure);
    }
}
