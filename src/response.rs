//! Handoff responses
//!
//! A worker app answers its caller by opening
//! `<returnUrl>?status=..&completedTimestamp=..&message=..&originalRequestId=..[&extra=..]`.
//! [`HandoffResponse`] builds that query; [`ReceivedHandoff`] decodes it again
//! on the orchestrator side.

use crate::codec::build_query_verbatim;
use crate::context::LaunchContext;
use crate::error::{HandoffError, Result};
use crate::failure::{ErrorCode, ErrorState};
use crate::types::{InboundLink, Parameters};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// `completedTimestamp` format (UTC, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Keys every response carries, in wire order
pub const RESPONSE_KEYS: [&str; 4] = [
    "status",
    "completedTimestamp",
    "message",
    "originalRequestId",
];

/// Outcome reported back to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoffStatus {
    Success,
    Failure,
    Cancel,
}

impl HandoffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffStatus::Success => "SUCCESS",
            HandoffStatus::Failure => "FAILURE",
            HandoffStatus::Cancel => "CANCEL",
        }
    }
}

impl std::fmt::Display for HandoffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandoffStatus {
    type Err = HandoffError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUCCESS" => Ok(HandoffStatus::Success),
            "FAILURE" => Ok(HandoffStatus::Failure),
            "CANCEL" => Ok(HandoffStatus::Cancel),
            other => Err(HandoffError::Parse(format!("unknown handoff status '{}'", other))),
        }
    }
}

/// What the workflow UI reports when it finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed {
        message: String,
        return_data: Vec<(String, String)>,
    },
    Cancelled {
        message: String,
    },
    Failed {
        message: String,
        error: ErrorState,
    },
}

impl WorkflowOutcome {
    /// Successful completion with the default message
    pub fn completed() -> Self {
        WorkflowOutcome::Completed {
            message: "Check-in completed successfully".to_string(),
            return_data: Vec::new(),
        }
    }

    pub fn status(&self) -> HandoffStatus {
        match self {
            WorkflowOutcome::Completed { .. } => HandoffStatus::Success,
            WorkflowOutcome::Cancelled { .. } => HandoffStatus::Cancel,
            WorkflowOutcome::Failed { .. } => HandoffStatus::Failure,
        }
    }

    /// Response for this outcome, echoing `request_id`
    pub fn into_response(self, request_id: Option<String>) -> HandoffResponse {
        let response = match self {
            WorkflowOutcome::Completed {
                message,
                return_data,
            } => HandoffResponse::success(message).with_return_data(return_data),
            WorkflowOutcome::Cancelled { message } => HandoffResponse::cancel(message),
            WorkflowOutcome::Failed { message, error } => HandoffResponse::failure(message, error),
        };
        response.with_request_id(request_id)
    }
}

/// Data sent back to the orchestrator when a workflow completes
///
/// `error_details` is present exactly when the status is `FAILURE`; the
/// constructors are the only way to set either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffResponse {
    status: HandoffStatus,
    completed_at: DateTime<Utc>,
    original_request_id: Option<String>,
    message: String,
    error_details: Option<ErrorState>,
    return_data: Option<Vec<(String, String)>>,
}

impl HandoffResponse {
    fn new(status: HandoffStatus, message: String, error_details: Option<ErrorState>) -> Self {
        Self {
            status,
            completed_at: Utc::now(),
            original_request_id: None,
            message,
            error_details,
            return_data: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(HandoffStatus::Success, message.into(), None)
    }

    pub fn cancel(message: impl Into<String>) -> Self {
        Self::new(HandoffStatus::Cancel, message.into(), None)
    }

    pub fn failure(message: impl Into<String>, error: ErrorState) -> Self {
        Self::new(HandoffStatus::Failure, message.into(), Some(error))
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.original_request_id = request_id;
        self
    }

    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = completed_at;
        self
    }

    /// Extra keys appended after the required ones, in the given order
    ///
    /// Keys that would shadow a required key are dropped.
    pub fn with_return_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data: Vec<(String, String)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| {
                let reserved = RESPONSE_KEYS.contains(&k.as_str());
                if reserved {
                    warn!("Dropping return data key '{}': reserved by the response", k);
                }
                !reserved
            })
            .collect();

        self.return_data = if data.is_empty() { None } else { Some(data) };
        self
    }

    pub fn status(&self) -> HandoffStatus {
        self.status
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn original_request_id(&self) -> Option<&str> {
        self.original_request_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_details(&self) -> Option<&ErrorState> {
        self.error_details.as_ref()
    }

    pub fn return_data(&self) -> Option<&[(String, String)]> {
        self.return_data.as_deref()
    }

    /// Ordered key/value pairs of the response query
    ///
    /// `originalRequestId` is always present, empty when there was none.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("status".to_string(), self.status.as_str().to_string()),
            (
                "completedTimestamp".to_string(),
                self.completed_at.format(TIMESTAMP_FORMAT).to_string(),
            ),
            ("message".to_string(), self.message.clone()),
            (
                "originalRequestId".to_string(),
                self.original_request_id.clone().unwrap_or_default(),
            ),
        ];
        if let Some(data) = &self.return_data {
            pairs.extend(data.iter().cloned());
        }
        pairs
    }

    /// Query string for this response
    ///
    /// The timestamp and echoed request id go out unescaped when they are
    /// query-safe; everything else is percent-encoded.
    pub fn to_query(&self) -> String {
        build_query_verbatim(self.query_pairs(), &["completedTimestamp", "originalRequestId"])
    }
}

/// Where to send the response: the context's return URL, else `fallback`
pub fn resolve_target_url(context: &LaunchContext, fallback: &str) -> String {
    context
        .return_url()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// A handoff response as decoded by the app that receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedHandoff {
    pub status: HandoffStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub message: String,
    pub original_request_id: Option<String>,
    pub return_data: Parameters,
}

impl ReceivedHandoff {
    /// Decode response parameters; `status` is required, everything else optional
    pub fn from_parameters(parameters: &Parameters) -> Result<Self> {
        let status = parameters
            .get("status")
            .ok_or_else(|| HandoffError::Parse("handoff response has no status".to_string()))?
            .parse::<HandoffStatus>()?;

        let completed_at = match parameters.get("completedTimestamp").filter(|v| !v.is_empty()) {
            Some(raw) => Some(
                NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
                    .map_err(|e| {
                        HandoffError::Parse(format!("bad completedTimestamp '{}': {}", raw, e))
                    })?
                    .and_utc(),
            ),
            None => None,
        };

        let return_data = parameters
            .iter()
            .filter(|(k, _)| !RESPONSE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            status,
            completed_at,
            message: parameters.get("message").cloned().unwrap_or_default(),
            original_request_id: parameters
                .get("originalRequestId")
                .filter(|v| !v.is_empty())
                .cloned(),
            return_data,
        })
    }

    pub fn from_link(link: &InboundLink) -> Result<Self> {
        Self::from_parameters(&link.parameters)
    }

    /// Whether this response answers the request launched with `request_id`
    pub fn answers(&self, request_id: &str) -> bool {
        self.original_request_id.as_deref() == Some(request_id)
    }

    /// Error state to surface for a `FAILURE` response
    pub fn failure_state(&self) -> Option<ErrorState> {
        (self.status == HandoffStatus::Failure)
            .then(|| ErrorState::new(ErrorCode::WorkflowFailure, self.message.clone()))
    }
}
