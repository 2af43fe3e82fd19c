//! Shared fixtures for handoff integration tests
//!
//! Stand-ins for the two platform collaborators: a dispatcher that records
//! what it was asked to open, and an alert sink that records what the user
//! would have seen.

#![allow(dead_code)]

use async_trait::async_trait;
use handoff_core::{
    error::Result, Alert, AlertSink, Dispatcher, HandoffConfig, HandoffError, HandoffSession,
    LinkAccepted,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// How the mock OS answers `open`
#[derive(Debug, Clone)]
pub enum OpenBehavior {
    Accept,
    Fail(String),
    Hang,
}

/// Dispatcher that records calls instead of talking to an OS
pub struct MockDispatcher {
    probe_answer: bool,
    behavior: OpenBehavior,
    probed: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockDispatcher {
    pub fn new(probe_answer: bool, behavior: OpenBehavior) -> Self {
        Self {
            probe_answer,
            behavior,
            probed: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Probe says yes, open succeeds
    pub fn accepting() -> Self {
        Self::new(true, OpenBehavior::Accept)
    }

    /// Probe and open both fail
    pub fn failing(reason: &str) -> Self {
        Self::new(false, OpenBehavior::Fail(reason.to_string()))
    }

    pub async fn probed(&self) -> Vec<String> {
        self.probed.lock().await.clone()
    }

    pub async fn opened(&self) -> Vec<String> {
        self.opened.lock().await.clone()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn can_open(&self, url: &str) -> bool {
        self.probed.lock().await.push(url.to_string());
        self.probe_answer
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().await.push(url.to_string());
        match &self.behavior {
            OpenBehavior::Accept => Ok(()),
            OpenBehavior::Fail(reason) => Err(HandoffError::Dispatch {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            OpenBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// Alert sink that keeps every alert shown
#[derive(Default)]
pub struct CollectingAlerts {
    shown: Mutex<Vec<Alert>>,
}

impl CollectingAlerts {
    pub async fn shown(&self) -> Vec<Alert> {
        self.shown.lock().await.clone()
    }
}

#[async_trait]
impl AlertSink for CollectingAlerts {
    async fn show(&self, alert: Alert) {
        self.shown.lock().await.push(alert);
    }
}

/// Worker config accepting `app://check-in`, falling back to `launcher://handoff-complete`
pub fn worker_config() -> HandoffConfig {
    HandoffConfig::from_toml(
        r#"
[inbound]
scheme = "app"
host = "check-in"

[outbound]
fallback_return_url = "launcher://handoff-complete"
open_timeout_secs = 1
"#,
    )
    .expect("fixture config is valid")
}

pub struct Harness {
    pub session: HandoffSession,
    pub dispatcher: Arc<MockDispatcher>,
    pub alerts: Arc<CollectingAlerts>,
    pub accepted: mpsc::UnboundedReceiver<LinkAccepted>,
}

/// Worker session wired to the mocks
pub fn worker(dispatcher: MockDispatcher) -> Harness {
    let dispatcher = Arc::new(dispatcher);
    let alerts = Arc::new(CollectingAlerts::default());
    let (session, accepted) =
        HandoffSession::new(&worker_config(), dispatcher.clone(), alerts.clone());
    Harness {
        session,
        dispatcher,
        alerts,
        accepted,
    }
}
