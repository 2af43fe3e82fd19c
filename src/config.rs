//! Configuration for a handoff participant
//!
//! Settings are layered (lowest to highest): built-in defaults, an optional
//! TOML file, then `HANDOFF_`-prefixed environment variables with `__`
//! separating sections.
//!
//! # Configuration File Format
//!
//! ```toml
//! [inbound]
//! scheme = "mauiapp"
//! host = "check-in"
//!
//! [outbound]
//! fallback_return_url = "reactnativeapp://handoff-complete"
//! open_timeout_secs = 30
//! ```
//!
//! Environment example: `HANDOFF_INBOUND__HOST=check-out`.

use crate::codec::LinkCodec;
use crate::error::{HandoffError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HANDOFF";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Links this app accepts
    #[serde(default)]
    pub inbound: InboundSettings,

    /// Where and how responses are sent
    #[serde(default)]
    pub outbound: OutboundSettings,
}

/// Inbound link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSettings {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for InboundSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
        }
    }
}

/// Outbound response settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundSettings {
    /// Used when the inbound link carried no `returnUrl`
    #[serde(default = "default_fallback_return_url")]
    pub fallback_return_url: String,

    /// Upper bound on waiting for the OS to open a URL (0 = wait forever)
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
}

impl Default for OutboundSettings {
    fn default() -> Self {
        Self {
            fallback_return_url: default_fallback_return_url(),
            open_timeout_secs: default_open_timeout_secs(),
        }
    }
}

fn default_scheme() -> String {
    "mauiapp".to_string()
}

fn default_host() -> String {
    "check-in".to_string()
}

fn default_fallback_return_url() -> String {
    "reactnativeapp://handoff-complete".to_string()
}

fn default_open_timeout_secs() -> u64 {
    30
}

impl HandoffConfig {
    /// Load defaults, then `path` (if given and present), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&HandoffConfig::default())?);

        if let Some(path) = path {
            debug!("Loading handoff config from {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config: HandoffConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HandoffConfig = toml::from_str(content)
            .map_err(|e| config::ConfigError::Message(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| HandoffError::Other(format!("Failed to render config: {}", e)))
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.inbound.scheme.trim().is_empty() || self.inbound.host.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "inbound scheme and host must not be empty".to_string(),
            )
            .into());
        }

        Url::parse(&self.outbound.fallback_return_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "fallback_return_url '{}' is not an absolute URL: {}",
                self.outbound.fallback_return_url, e
            ))
        })?;

        Ok(())
    }

    /// Codec for the configured inbound `scheme://host`
    pub fn codec(&self) -> LinkCodec {
        LinkCodec::new(&self.inbound.scheme, &self.inbound.host)
    }

    pub fn open_timeout(&self) -> Option<Duration> {
        match self.outbound.open_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
