//! Failure surface
//!
//! Every failure boundary (inbound validation, parsing, dispatch) builds exactly
//! one [`ErrorState`] and hands it to [`FailureReporter::report`], which routes it
//! to the two sinks every failure must reach: a one-button alert for the user
//! and an `error!` event carrying the technical details for developers.

use crate::error::HandoffError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Failure categories surfaced by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Scheme/host mismatch on an inbound link
    InvalidDeepLink,

    /// Inbound link could not be decoded into a launch context
    DeepLinkParseError,

    /// The OS failed to open an outbound URL
    DispatchFailure,

    /// The workflow itself reported a failure
    WorkflowFailure,
}

impl ErrorCode {
    /// Wire form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidDeepLink => "INVALID_DEEP_LINK",
            ErrorCode::DeepLinkParseError => "DEEP_LINK_PARSE_ERROR",
            ErrorCode::DispatchFailure => "DISPATCH_FAILURE",
            ErrorCode::WorkflowFailure => "WORKFLOW_FAILURE",
        }
    }

    /// Title of the alert shown for this code
    pub fn alert_title(&self) -> &'static str {
        match self {
            ErrorCode::InvalidDeepLink => "Invalid Deep Link",
            ErrorCode::DispatchFailure => "Handoff Error",
            ErrorCode::DeepLinkParseError | ErrorCode::WorkflowFailure => "Error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error with user-friendly and technical details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    /// Error code for categorization
    pub error_code: ErrorCode,

    /// User-friendly error message
    pub user_message: String,

    /// Technical details for debugging (not shown to user)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,

    /// When the error occurred
    pub occurred_at: DateTime<Utc>,

    /// Suggested recovery action for user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_action: Option<String>,
}

impl ErrorState {
    /// Create a new error state stamped with the current time
    pub fn new(error_code: ErrorCode, user_message: impl Into<String>) -> Self {
        Self {
            error_code,
            user_message: user_message.into(),
            technical_details: None,
            occurred_at: Utc::now(),
            recovery_action: None,
        }
    }

    pub fn with_technical_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    pub fn with_recovery_action(mut self, action: impl Into<String>) -> Self {
        self.recovery_action = Some(action.into());
        self
    }

    /// Build the user-facing record for a protocol error
    pub fn from_error(err: &HandoffError) -> Self {
        let code = err.code();
        let state = match err {
            HandoffError::InvalidLink { .. } => Self::new(code, err.to_string()),
            HandoffError::Parse(_) | HandoffError::Url(_) => {
                Self::new(code, "Failed to process deep link")
                    .with_recovery_action("Retry the link")
            }
            HandoffError::Dispatch { url, .. } | HandoffError::DispatchTimeout { url, .. } => {
                Self::new(
                    code,
                    format!(
                        "Cannot open the return URL. The target app may not be installed.\n\nAttempted URL: {}",
                        url
                    ),
                )
                .with_recovery_action("Verify the target app is installed, then try again")
            }
            _ => Self::new(code, "Something went wrong"),
        };
        state.with_technical_details(err.to_string())
    }
}

impl From<HandoffError> for ErrorState {
    fn from(err: HandoffError) -> Self {
        Self::from_error(&err)
    }
}

impl std::fmt::Display for ErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code, self.user_message)
    }
}

/// A user-visible acknowledgement with a single button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub button: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            button: "OK".to_string(),
        }
    }
}

impl From<&ErrorState> for Alert {
    fn from(state: &ErrorState) -> Self {
        let message = match &state.recovery_action {
            Some(action) => format!("{}\n\n{}", state.user_message, action),
            None => state.user_message.clone(),
        };
        Alert::new(state.error_code.alert_title(), message)
    }
}

/// Where alerts are shown (implemented by the UI layer)
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Show an alert; returns once the user has acknowledged it
    async fn show(&self, alert: Alert);
}

/// Alert sink that writes to stderr, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAlertSink;

#[async_trait]
impl AlertSink for ConsoleAlertSink {
    async fn show(&self, alert: Alert) {
        eprintln!("[{}] {} ({})", alert.title, alert.message, alert.button);
    }
}

/// Routes error states to the user and to the log
#[derive(Clone)]
pub struct FailureReporter {
    alerts: Arc<dyn AlertSink>,
}

impl FailureReporter {
    pub fn new(alerts: Arc<dyn AlertSink>) -> Self {
        Self { alerts }
    }

    /// Log the error state once and show it to the user once
    pub async fn report(&self, state: &ErrorState) {
        error!(
            error_code = %state.error_code,
            technical_details = state.technical_details.as_deref().unwrap_or(""),
            recovery_action = state.recovery_action.as_deref().unwrap_or(""),
            "{}",
            state.user_message
        );
        self.alerts.show(Alert::from(state)).await;
    }

    /// Show a non-error acknowledgement
    pub async fn notify(&self, alert: Alert) {
        self.alerts.show(alert).await;
    }
}

impl std::fmt::Debug for FailureReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureReporter").finish_non_exhaustive()
    }
}
