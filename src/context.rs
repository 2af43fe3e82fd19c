//! Launch context
//!
//! Records how and why the current process was started. The context is an
//! owned value rather than ambient global state: [`launch_context`] creates it
//! once at process start and returns a single [`LaunchContextWriter`] plus a
//! cloneable [`LaunchContextReader`].
//!
//! The current record lives in a single-slot `watch` channel. Writers replace
//! the whole record in one step and readers always get a complete snapshot, so
//! a workflow can never observe a half-updated context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// How the process was launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchMode {
    /// Opened directly by the user
    Standalone,

    /// Opened by another app through a deep link
    DeepLink,
}

impl std::fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchMode::Standalone => write!(f, "STANDALONE"),
            LaunchMode::DeepLink => write!(f, "DEEP_LINK"),
        }
    }
}

/// Snapshot of the launch context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchContext {
    pub mode: LaunchMode,

    /// Where the handoff response goes (None if standalone or not provided)
    pub orchestrator_return_url: Option<String>,

    /// Request id to echo back to the orchestrator
    pub original_request_id: Option<String>,

    pub launched_at: DateTime<Utc>,
}

impl LaunchContext {
    /// Context of a process the user opened directly
    pub fn standalone() -> Self {
        Self {
            mode: LaunchMode::Standalone,
            orchestrator_return_url: None,
            original_request_id: None,
            launched_at: Utc::now(),
        }
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    pub fn return_url(&self) -> Option<&str> {
        self.orchestrator_return_url.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.original_request_id.as_deref()
    }

    pub fn is_deep_link(&self) -> bool {
        self.mode == LaunchMode::DeepLink
    }
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self::standalone()
    }
}

/// Create the launch context for this process (cold start)
///
/// The context is reset to standalone here, once; a deep link adopted later
/// replaces it.
pub fn launch_context() -> (LaunchContextWriter, LaunchContextReader) {
    let (tx, _) = watch::channel(Arc::new(LaunchContext::standalone()));
    let writer = LaunchContextWriter { tx };
    writer.reset();
    let reader = writer.reader();
    (writer, reader)
}

/// The only handle allowed to change the launch context
///
/// Not `Clone`: whoever owns it is the single writer.
#[derive(Debug)]
pub struct LaunchContextWriter {
    tx: watch::Sender<Arc<LaunchContext>>,
}

impl LaunchContextWriter {
    /// Return to standalone mode, clearing the return target
    pub fn reset(&self) {
        debug!("Launch context reset to STANDALONE");
        self.tx.send_replace(Arc::new(LaunchContext::standalone()));
    }

    /// Replace the whole context in one step (last writer wins, no merge)
    pub fn adopt(
        &self,
        mode: LaunchMode,
        return_url: Option<String>,
        request_id: Option<String>,
    ) -> Arc<LaunchContext> {
        let next = Arc::new(LaunchContext {
            mode,
            orchestrator_return_url: return_url,
            original_request_id: request_id,
            launched_at: Utc::now(),
        });
        let previous = self.tx.send_replace(next.clone());
        debug!(
            "Launch context {} -> {} (request id {:?})",
            previous.mode, next.mode, next.original_request_id
        );
        next
    }

    /// A new reader of this context
    pub fn reader(&self) -> LaunchContextReader {
        LaunchContextReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Current snapshot, as seen by the writer
    pub fn current(&self) -> Arc<LaunchContext> {
        self.tx.borrow().clone()
    }
}

/// Read-only view of the launch context
#[derive(Debug, Clone)]
pub struct LaunchContextReader {
    rx: watch::Receiver<Arc<LaunchContext>>,
}

impl LaunchContextReader {
    /// The whole current record; read fields from this rather than one by one
    pub fn snapshot(&self) -> Arc<LaunchContext> {
        self.rx.borrow().clone()
    }

    pub fn mode(&self) -> LaunchMode {
        self.rx.borrow().mode
    }

    pub fn return_url(&self) -> Option<String> {
        self.rx.borrow().orchestrator_return_url.clone()
    }

    pub fn request_id(&self) -> Option<String> {
        self.rx.borrow().original_request_id.clone()
    }
}
