//! Core data types for inbound links
//!
//! An [`InboundLink`] is the decoded form of one deep link delivered to this app.
//! It is created per inbound event and discarded once the workflow UI has
//! consumed it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query parameters, keyed uniquely (last occurrence wins on duplicates)
pub type Parameters = BTreeMap<String, String>;

/// Query keys with a defined meaning; everything else is a custom field
pub const KNOWN_KEYS: [&str; 6] = [
    "userId",
    "location",
    "event",
    "timestamp",
    "requestId",
    "returnUrl",
];

/// Whether a query key belongs to the fixed known-key set
pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}

/// A validated and decoded deep link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundLink {
    /// Full link as received
    pub raw_uri: String,

    /// All query parameters
    pub parameters: Parameters,

    /// When the link was received
    pub received_at: DateTime<Utc>,
}

impl InboundLink {
    pub fn new(raw_uri: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            raw_uri: raw_uri.into(),
            parameters,
            received_at: Utc::now(),
        }
    }

    /// Non-empty value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get("userId")
    }

    pub fn location(&self) -> Option<&str> {
        self.get("location")
    }

    pub fn event(&self) -> Option<&str> {
        self.get("event")
    }

    /// All parameters not in [`KNOWN_KEYS`]
    pub fn custom_fields(&self) -> Parameters {
        self.parameters
            .iter()
            .filter(|(k, _)| !is_known_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
