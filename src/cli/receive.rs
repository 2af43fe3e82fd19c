//! Worker side: handle an inbound link and optionally hand back

use super::helpers::{exit_reported, print_json};
use clap::ValueEnum;
use handoff_core::{
    error::Result, Completion, ConsoleAlertSink, Dispatcher, ErrorCode, ErrorState,
    HandoffConfig, HandoffSession, RecordingDispatcher, SystemDispatcher, WorkflowOutcome,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Outcome to finish the workflow with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompleteAs {
    Success,
    Cancel,
    Failure,
}

impl CompleteAs {
    fn into_outcome(self, message: Option<String>, data: Vec<(String, String)>) -> WorkflowOutcome {
        match self {
            CompleteAs::Success => WorkflowOutcome::Completed {
                message: message.unwrap_or_else(|| "Check-in completed successfully".to_string()),
                return_data: data,
            },
            CompleteAs::Cancel => WorkflowOutcome::Cancelled {
                message: message.unwrap_or_else(|| "Check-in cancelled".to_string()),
            },
            CompleteAs::Failure => {
                let message = message.unwrap_or_else(|| "Check-in failed".to_string());
                WorkflowOutcome::Failed {
                    error: ErrorState::new(ErrorCode::WorkflowFailure, message.clone()),
                    message,
                }
            }
        }
    }
}

pub struct ReceiveArgs {
    pub uri: String,
    pub complete: Option<CompleteAs>,
    pub message: Option<String>,
    pub data: Vec<(String, String)>,
    pub dry_run: bool,
}

/// Handle receive command
pub async fn handle(config: &HandoffConfig, args: ReceiveArgs) -> Result<()> {
    let dispatcher: Arc<dyn Dispatcher> = if args.dry_run {
        Arc::new(RecordingDispatcher::new())
    } else {
        Arc::new(SystemDispatcher::new())
    };
    let (session, mut accepted) =
        HandoffSession::new(config, dispatcher, Arc::new(ConsoleAlertSink));

    if let Err(state) = session.handle_link(&args.uri).await {
        exit_reported(&state);
    }

    if let Some(event) = accepted.recv().await {
        print_json(&json!({
            "link": event.link,
            "customFields": event.link.custom_fields(),
            "context": event.context.as_ref(),
        }))?;
    }

    let Some(complete) = args.complete else {
        if !args.data.is_empty() {
            warn!("--data is ignored without --complete");
        }
        return Ok(());
    };

    match session
        .finish_workflow(complete.into_outcome(args.message, args.data))
        .await
    {
        Ok(Completion::Dispatched { url, response }) => {
            if args.dry_run {
                println!("{}", url);
            } else {
                println!("✓ Handoff {} sent: {}", response.status(), url);
            }
        }
        Ok(Completion::Standalone { status }) => {
            println!("Workflow finished ({}) without a caller to hand back to", status);
        }
        Err(state) => exit_reported(&state),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::HandoffStatus;

    #[test]
    fn test_failure_outcome_carries_error() {
        let outcome =
            CompleteAs::Failure.into_outcome(Some("Badge rejected".to_string()), Vec::new());
        assert_eq!(outcome.status(), HandoffStatus::Failure);
        match outcome {
            WorkflowOutcome::Failed { message, error } => {
                assert_eq!(message, "Badge rejected");
                assert_eq!(error.error_code, ErrorCode::WorkflowFailure);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_success_keeps_return_data() {
        let outcome = CompleteAs::Success
            .into_outcome(None, vec![("badge".to_string(), "B-1".to_string())]);
        assert_eq!(
            outcome,
            WorkflowOutcome::Completed {
                message: "Check-in completed successfully".to_string(),
                return_data: vec![("badge".to_string(), "B-1".to_string())],
            }
        );
    }
}
