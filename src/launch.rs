//! Launching a worker app
//!
//! The orchestrator starts a workflow by opening `scheme://host?...` on a
//! worker app. [`LaunchRequest`] builds that link with the known keys the
//! worker understands, a fresh request id for correlating the response, and
//! the URL the worker should hand back to.

use crate::codec::{assemble_url, build_query};
use crate::types::is_known_key;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

/// An outbound launch link for a worker app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Worker's `scheme://host`
    target: String,
    request_id: String,
    timestamp: DateTime<Utc>,
    user_id: Option<String>,
    location: Option<String>,
    event: Option<String>,
    return_url: Option<String>,
    custom_fields: Vec<(String, String)>,
}

impl LaunchRequest {
    /// New request for `target` with a random request id
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: None,
            location: None,
            event: None,
            return_url: None,
            custom_fields: Vec::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Where the worker should send its handoff response
    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = Some(return_url.into());
        self
    }

    /// Pass an extra field through to the worker
    ///
    /// Known keys must be set through their own builder methods; passing one
    /// here is ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if is_known_key(&key) {
            warn!("Ignoring custom field '{}': it is a known key", key);
            return self;
        }
        self.custom_fields.push((key, value.into()));
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Ordered query fields; unset optional keys are left out
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let optional = [
            ("userId", &self.user_id),
            ("location", &self.location),
            ("event", &self.event),
        ];

        let mut pairs: Vec<(String, String)> = optional
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
            .collect();

        pairs.push((
            "timestamp".to_string(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        pairs.push(("requestId".to_string(), self.request_id.clone()));
        if let Some(return_url) = &self.return_url {
            pairs.push(("returnUrl".to_string(), return_url.clone()));
        }
        pairs.extend(self.custom_fields.iter().cloned());
        pairs
    }

    /// The full launch URL
    pub fn to_url(&self) -> String {
        assemble_url(&self.target, &build_query(self.query_pairs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{extract, LinkCodec};
    use chrono::TimeZone;

    #[test]
    fn test_launch_url_decodes_on_worker_side() {
        let request = LaunchRequest::new("mauiapp://check-in")
            .with_user_id("u1")
            .with_location("Dock 4")
            .with_return_url("reactnativeapp://handoff-complete")
            .with_field("shift", "night");

        let link = LinkCodec::new("mauiapp", "check-in")
            .decode(&request.to_url())
            .unwrap();
        assert_eq!(link.user_id(), Some("u1"));
        assert_eq!(link.location(), Some("Dock 4"));
        assert_eq!(link.event(), None);
        assert_eq!(link.custom_fields().len(), 1);

        let targets = extract(&link.parameters).unwrap();
        assert_eq!(targets.request_id.as_deref(), Some(request.request_id()));
        assert_eq!(
            targets.return_url.as_deref(),
            Some("reactnativeapp://handoff-complete")
        );
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = LaunchRequest::new("mauiapp://check-in");
        let b = LaunchRequest::new("mauiapp://check-in");
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_known_keys_not_accepted_as_custom() {
        let request = LaunchRequest::new("mauiapp://check-in")
            .with_request_id("r1")
            .with_field("requestId", "spoofed");
        let ids: Vec<_> = request
            .query_pairs()
            .into_iter()
            .filter(|(k, _)| k == "requestId")
            .collect();
        assert_eq!(ids, vec![("requestId".to_string(), "r1".to_string())]);
    }

    #[test]
    fn test_timestamp_field() {
        let request = LaunchRequest::new("flna://home")
            .with_timestamp(Utc.with_ymd_and_hms(2026, 1, 26, 9, 0, 0).unwrap());
        assert!(request
            .query_pairs()
            .contains(&("timestamp".to_string(), "2026-01-26T09:00:00Z".to_string())));
    }
}
