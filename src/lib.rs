//! Handoff - Inter-App Workflow Handoff over Custom URL Schemes
//!
//! Lets independently packaged apps pass a single user workflow between each
//! other using OS-level URL dispatch as the only transport:
//! - Validate and decode inbound deep links for this app's `scheme://host`
//! - Remember how the process was launched and where to send the result
//! - Encode the workflow result into a return URL
//! - Dispatch URLs through a platform-abstracted capability
//!
//! Delivery is best effort and at most once: there is no acknowledgement
//! channel and nothing is retried.
//!
//! # Architecture
//!
//! - **Codec**: pure link parsing and building ([`codec`])
//! - **Context**: single-writer launch context ([`context`])
//! - **Response**: handoff result encoding and decoding ([`response`], [`launch`])
//! - **Dispatch**: OS URL dispatch capability ([`dispatch`])
//! - **Failure**: error states routed to the user and the log ([`failure`])
//! - **Session**: the ordered event loop tying it all together ([`session`])
//!
//! # Example
//!
//! ```ignore
//! use handoff_core::{HandoffConfig, HandoffSession, SystemDispatcher, ConsoleAlertSink, WorkflowOutcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> handoff_core::Result<()> {
//!     let config = HandoffConfig::load(None)?;
//!     let (session, mut accepted) =
//!         HandoffSession::new(&config, Arc::new(SystemDispatcher::new()), Arc::new(ConsoleAlertSink));
//!
//!     session.handle_link("mauiapp://check-in?userId=u1&returnUrl=reactnativeapp%3A%2F%2Fdone").await.ok();
//!     if let Some(event) = accepted.recv().await {
//!         println!("check in {:?}", event.link.user_id());
//!     }
//!     session.finish_workflow(WorkflowOutcome::completed()).await.ok();
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod failure;
pub mod launch;
pub mod response;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use codec::{
    assemble_url, build_query, build_query_verbatim, extract, parse_query, LinkCodec, LinkTargets,
};
pub use config::HandoffConfig;
pub use context::{
    launch_context, LaunchContext, LaunchContextReader, LaunchContextWriter, LaunchMode,
};
pub use dispatch::{open_with_deadline, Dispatcher, RecordingDispatcher, SystemDispatcher};
pub use error::{HandoffError, Result};
pub use failure::{Alert, AlertSink, ConsoleAlertSink, ErrorCode, ErrorState, FailureReporter};
pub use launch::LaunchRequest;
pub use response::{
    resolve_target_url, HandoffResponse, HandoffStatus, ReceivedHandoff, WorkflowOutcome,
};
pub use session::{Completion, HandoffSession, LinkAccepted, SessionEvent, SessionHandle};
pub use types::{InboundLink, Parameters, KNOWN_KEYS};
