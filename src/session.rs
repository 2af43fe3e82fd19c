//! Handoff session
//!
//! Ties the protocol together for one app process. Inbound links and
//! workflow-finished events arrive on a single ordered channel and are handled
//! one at a time, so launch-context replacement and response dispatch never
//! interleave.
//!
//! # Flow
//! 1. A raw link arrives: validate, parse, extract. Only if all three succeed
//!    is the launch context replaced and a [`LinkAccepted`] event emitted for
//!    the workflow UI.
//! 2. The workflow finishes: in deep-link mode the response URL is assembled
//!    against the current context and dispatched; in standalone mode the user
//!    just gets a confirmation.
//!
//! Each failure produces one [`ErrorState`], reported once, and never retried.

use crate::codec::{assemble_url, extract, LinkCodec, LinkTargets};
use crate::config::HandoffConfig;
use crate::context::{
    launch_context, LaunchContext, LaunchContextReader, LaunchContextWriter, LaunchMode,
};
use crate::dispatch::{open_with_deadline, Dispatcher};
use crate::error::{HandoffError, Result};
use crate::failure::{Alert, AlertSink, ErrorState, FailureReporter};
use crate::response::{resolve_target_url, HandoffResponse, HandoffStatus, WorkflowOutcome};
use crate::types::InboundLink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Events consumed by the session, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A raw link delivered by the OS
    Link(String),

    /// The workflow UI finished
    WorkflowFinished(WorkflowOutcome),
}

/// Emitted to the workflow UI for every accepted link
#[derive(Debug, Clone)]
pub struct LinkAccepted {
    pub link: InboundLink,

    /// Context adopted for this link
    pub context: Arc<LaunchContext>,
}

/// How a finished workflow was wrapped up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Launched standalone; nothing to hand back
    Standalone { status: HandoffStatus },

    /// The OS accepted the handoff URL (delivery is not confirmed)
    Dispatched {
        url: String,
        response: HandoffResponse,
    },
}

/// Protocol state and collaborators for one app process
pub struct HandoffSession {
    codec: LinkCodec,
    fallback_return_url: String,
    open_timeout: Option<Duration>,
    context: LaunchContextWriter,
    dispatcher: Arc<dyn Dispatcher>,
    reporter: FailureReporter,
    accepted: mpsc::UnboundedSender<LinkAccepted>,
}

impl HandoffSession {
    /// Create a session in standalone mode
    ///
    /// Returns the receiver on which the workflow UI gets accepted links.
    pub fn new(
        config: &HandoffConfig,
        dispatcher: Arc<dyn Dispatcher>,
        alerts: Arc<dyn AlertSink>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkAccepted>) {
        let (accepted, accepted_rx) = mpsc::unbounded_channel();
        let (context, _) = launch_context();

        let session = Self {
            codec: config.codec(),
            fallback_return_url: config.outbound.fallback_return_url.clone(),
            open_timeout: config.open_timeout(),
            context,
            dispatcher,
            reporter: FailureReporter::new(alerts),
            accepted,
        };
        (session, accepted_rx)
    }

    /// Read handle on the launch context
    pub fn context(&self) -> LaunchContextReader {
        self.context.reader()
    }

    /// Handle one inbound link
    ///
    /// On any failure the launch context is left exactly as it was.
    pub async fn handle_link(&self, raw: &str) -> std::result::Result<InboundLink, ErrorState> {
        match self.accept(raw) {
            Ok((link, targets)) => {
                let context = self.context.adopt(
                    LaunchMode::DeepLink,
                    targets.return_url,
                    targets.request_id,
                );
                info!(
                    "Accepted link for {} ({} parameter(s), request id {:?})",
                    self.codec.expected(),
                    link.parameters.len(),
                    context.original_request_id
                );

                let accepted = LinkAccepted {
                    link: link.clone(),
                    context,
                };
                if self.accepted.send(accepted).is_err() {
                    warn!("No workflow listener; accepted link was not delivered to the UI");
                }
                Ok(link)
            }
            Err(err) => {
                let state = ErrorState::from_error(&err)
                    .with_technical_details(format!("{} (link: {})", err, raw));
                self.reporter.report(&state).await;
                Err(state)
            }
        }
    }

    fn accept(&self, raw: &str) -> Result<(InboundLink, LinkTargets)> {
        let link = self.codec.decode(raw)?;
        let targets = extract(&link.parameters)?;
        Ok((link, targets))
    }

    /// Wrap up a finished workflow
    ///
    /// A failed workflow's error state is reported here in either mode; in
    /// deep-link mode the caller additionally receives a `FAILURE` response.
    pub async fn finish_workflow(
        &self,
        outcome: WorkflowOutcome,
    ) -> std::result::Result<Completion, ErrorState> {
        let context = self.context.current();

        if let WorkflowOutcome::Failed { error, .. } = &outcome {
            self.reporter.report(error).await;
        }

        if !context.is_deep_link() {
            return Ok(self.finish_standalone(outcome).await);
        }

        let response = outcome.into_response(context.original_request_id.clone());
        let target = resolve_target_url(&context, &self.fallback_return_url);
        let url = assemble_url(&target, &response.to_query());

        match open_with_deadline(self.dispatcher.as_ref(), &url, self.open_timeout).await {
            Ok(()) => {
                info!("Handoff {} dispatched to {}", response.status(), target);
                Ok(Completion::Dispatched { url, response })
            }
            Err(err) => {
                let state = ErrorState::from_error(&err);
                self.reporter.report(&state).await;
                Err(state)
            }
        }
    }

    async fn finish_standalone(&self, outcome: WorkflowOutcome) -> Completion {
        let status = outcome.status();
        match outcome {
            WorkflowOutcome::Completed { .. } => {
                self.reporter
                    .notify(Alert::new("Success", "Check-in completed!"))
                    .await;
            }
            WorkflowOutcome::Cancelled { .. } => {
                debug!("Standalone workflow cancelled");
            }
            // Reported by finish_workflow
            WorkflowOutcome::Failed { .. } => {}
        }
        Completion::Standalone { status }
    }

    /// Handle one event; failures have already been reported when this returns
    pub async fn handle(&self, event: SessionEvent) {
        match event {
            SessionEvent::Link(raw) => {
                let _ = self.handle_link(&raw).await;
            }
            SessionEvent::WorkflowFinished(outcome) => {
                let _ = self.finish_workflow(outcome).await;
            }
        }
    }

    /// Consume events in order until every sender is gone
    pub async fn run(self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("Session event channel closed");
    }

    /// Run the session on its own task
    pub fn spawn(self, buffer: usize) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer);
        let task = tokio::spawn(self.run(rx));
        (SessionHandle { tx }, task)
    }
}

impl std::fmt::Debug for HandoffSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffSession")
            .field("codec", &self.codec)
            .field("fallback_return_url", &self.fallback_return_url)
            .field("open_timeout", &self.open_timeout)
            .field("context", &self.context.current())
            .finish_non_exhaustive()
    }
}

/// Cloneable sender side of a spawned session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Deliver a raw link (called from the platform's URL callback)
    pub async fn deliver_link(&self, raw: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::Link(raw.into())).await
    }

    /// Report that the workflow UI finished
    pub async fn finish(&self, outcome: WorkflowOutcome) -> Result<()> {
        self.send(SessionEvent::WorkflowFinished(outcome)).await
    }

    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| HandoffError::Other("handoff session has stopped".to_string()))
    }
}
