//! Orchestrator side: open a worker app

use super::helpers::exit_reported;
use handoff_core::{
    error::Result, open_with_deadline, ConsoleAlertSink, ErrorState, FailureReporter,
    HandoffConfig, LaunchRequest, SystemDispatcher,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

pub struct LaunchArgs {
    pub target: String,
    pub user_id: Option<String>,
    pub location: Option<String>,
    pub event: Option<String>,
    pub request_id: Option<String>,
    pub return_url: Option<String>,
    pub fields: Vec<(String, String)>,
    pub dry_run: bool,
}

fn build_request(args: LaunchArgs) -> Result<LaunchRequest> {
    Url::parse(&args.target)
        .map_err(|e| anyhow::anyhow!("Invalid target '{}': {}", args.target, e))?;

    let mut request = LaunchRequest::new(args.target);
    if let Some(request_id) = args.request_id {
        request = request.with_request_id(request_id);
    }
    if let Some(user_id) = args.user_id {
        request = request.with_user_id(user_id);
    }
    if let Some(location) = args.location {
        request = request.with_location(location);
    }
    if let Some(event) = args.event {
        request = request.with_event(event);
    }
    if let Some(return_url) = args.return_url {
        request = request.with_return_url(return_url);
    }
    Ok(args
        .fields
        .into_iter()
        .fold(request, |request, (key, value)| request.with_field(key, value)))
}

/// Handle launch command
pub async fn handle(config: &HandoffConfig, args: LaunchArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let request = build_request(args)?;
    let url = request.to_url();

    if dry_run {
        println!("{}", url);
        return Ok(());
    }

    info!("Launching {} (request id {})", request.target(), request.request_id());
    let dispatcher = SystemDispatcher::new();
    if let Err(err) = open_with_deadline(&dispatcher, &url, config.open_timeout()).await {
        let state = ErrorState::from_error(&err);
        FailureReporter::new(Arc::new(ConsoleAlertSink))
            .report(&state)
            .await;
        exit_reported(&state);
    }

    println!("✓ Launched {} (request id {})", request.target(), request.request_id());
    Ok(())
}
