//! End-to-end handoff flow tests
//!
//! Drives a worker session the way the OS and the workflow UI would, and
//! checks what reaches the launch context, the dispatcher, and the user.

mod fixtures;

use fixtures::{worker, MockDispatcher, OpenBehavior};
use handoff_core::{
    Completion, ErrorCode, ErrorState, HandoffStatus, LaunchMode, LaunchRequest, LinkCodec,
    ReceivedHandoff, WorkflowOutcome,
};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_check_in_link_is_accepted() {
    let mut h = worker(MockDispatcher::accepting());

    let link = assert_ok!(
        h.session
            .handle_link("app://check-in?userId=u1&location=L1&custom1=x")
            .await
    );

    assert_eq!(link.parameters.len(), 3);
    assert_eq!(link.parameters.get("userId").map(String::as_str), Some("u1"));
    assert_eq!(link.parameters.get("location").map(String::as_str), Some("L1"));
    assert_eq!(link.parameters.get("custom1").map(String::as_str), Some("x"));

    let custom = link.custom_fields();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom.get("custom1").map(String::as_str), Some("x"));

    assert_eq!(h.session.context().mode(), LaunchMode::DeepLink);

    // The workflow UI hears about it exactly once
    let event = h.accepted.recv().await.unwrap();
    assert_eq!(event.link, link);
    assert!(h.accepted.try_recv().is_err());
    assert!(h.alerts.shown().await.is_empty());
}

#[tokio::test]
async fn test_wrong_host_is_rejected_without_state_change() {
    let mut h = worker(MockDispatcher::accepting());

    let state = assert_err!(h.session.handle_link("app://wrong-host?x=1").await);
    assert_eq!(state.error_code, ErrorCode::InvalidDeepLink);
    assert_eq!(state.error_code.as_str(), "INVALID_DEEP_LINK");
    assert_eq!(
        state.user_message,
        "Expected 'app://check-in' but received 'app://wrong-host'"
    );
    assert!(state.technical_details.unwrap().contains("app://wrong-host?x=1"));

    assert_eq!(h.session.context().mode(), LaunchMode::Standalone);
    assert!(h.accepted.try_recv().is_err());

    let shown = h.alerts.shown().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Invalid Deep Link");
}

#[tokio::test]
async fn test_wrong_scheme_keeps_existing_deep_link_context() {
    let h = worker(MockDispatcher::accepting());

    h.session
        .handle_link("app://check-in?requestId=r1&returnUrl=launcher%3A%2F%2Fdone")
        .await
        .unwrap();
    let before = h.session.context().snapshot();

    let state = assert_err!(h.session.handle_link("other://check-in?requestId=r2").await);
    assert_eq!(state.error_code, ErrorCode::InvalidDeepLink);

    assert_eq!(h.session.context().snapshot(), before);
}

#[tokio::test]
async fn test_later_link_wins() {
    let h = worker(MockDispatcher::accepting());

    h.session.handle_link("app://check-in?requestId=r1").await.unwrap();
    h.session.handle_link("app://check-in?requestId=r2").await.unwrap();

    assert_eq!(h.session.context().request_id().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_dispatch_failure_is_reported_once() {
    let h = worker(MockDispatcher::failing("no app registered for launcher://"));

    h.session
        .handle_link("app://check-in?requestId=r1&returnUrl=launcher%3A%2F%2Fdone")
        .await
        .unwrap();
    let before = h.session.context().snapshot();

    let state = assert_err!(h.session.finish_workflow(WorkflowOutcome::completed()).await);
    assert_eq!(state.error_code, ErrorCode::DispatchFailure);
    assert_eq!(state.error_code.as_str(), "DISPATCH_FAILURE");
    assert!(state.user_message.contains("launcher://done?status=SUCCESS"));
    assert!(state
        .technical_details
        .as_deref()
        .unwrap()
        .contains("no app registered"));

    // Attempted exactly once, never retried
    assert_eq!(h.dispatcher.opened().await.len(), 1);
    assert_eq!(h.session.context().snapshot(), before);

    let shown = h.alerts.shown().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Handoff Error");
}

#[tokio::test]
async fn test_negative_probe_still_opens() {
    let h = worker(MockDispatcher::new(false, OpenBehavior::Accept));

    h.session
        .handle_link("app://check-in?requestId=r1&returnUrl=launcher%3A%2F%2Fdone")
        .await
        .unwrap();
    let completion = assert_ok!(h.session.finish_workflow(WorkflowOutcome::completed()).await);

    assert!(matches!(completion, Completion::Dispatched { .. }));
    assert_eq!(h.dispatcher.probed().await.len(), 1);
    assert_eq!(h.dispatcher.opened().await.len(), 1);
    assert!(h.alerts.shown().await.is_empty());
}

#[tokio::test]
async fn test_hung_dispatch_times_out() {
    let h = worker(MockDispatcher::new(true, OpenBehavior::Hang));

    h.session.handle_link("app://check-in?requestId=r1").await.unwrap();
    let state = assert_err!(h.session.finish_workflow(WorkflowOutcome::completed()).await);

    assert_eq!(state.error_code, ErrorCode::DispatchFailure);
    assert!(state.technical_details.unwrap().contains("Timed out"));
}

#[tokio::test]
async fn test_return_url_with_query_is_merged() {
    let h = worker(MockDispatcher::accepting());

    h.session
        .handle_link("app://check-in?requestId=r1&returnUrl=launcher%3A%2F%2Fdone%3Fsource%3Dkiosk")
        .await
        .unwrap();
    h.session
        .finish_workflow(WorkflowOutcome::completed())
        .await
        .unwrap();

    let opened = h.dispatcher.opened().await;
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("launcher://done?source=kiosk&status=SUCCESS&"));
    assert_eq!(opened[0].matches('?').count(), 1);
}

#[tokio::test]
async fn test_failed_workflow_hands_back_failure() {
    let h = worker(MockDispatcher::accepting());

    h.session
        .handle_link("app://check-in?requestId=r5&returnUrl=launcher%3A%2F%2Fdone")
        .await
        .unwrap();

    let outcome = WorkflowOutcome::Failed {
        message: "Badge rejected".to_string(),
        error: ErrorState::new(ErrorCode::WorkflowFailure, "Badge rejected")
            .with_technical_details("badge db 503"),
    };
    let completion = h.session.finish_workflow(outcome).await.unwrap();

    match completion {
        Completion::Dispatched { url, response } => {
            assert_eq!(response.status(), HandoffStatus::Failure);
            assert!(response.error_details().is_some());
            assert!(url.contains("status=FAILURE"));
            assert!(url.contains("message=Badge%20rejected"));
        }
        other => panic!("unexpected completion: {:?}", other),
    }

    // The worker's own user still sees the failure, once
    let shown = h.alerts.shown().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].message, "Badge rejected");
    assert_eq!(h.dispatcher.opened().await.len(), 1);
}

#[tokio::test]
async fn test_orchestrator_round_trip() {
    let h = worker(MockDispatcher::accepting());

    // Orchestrator launches the worker
    let request = LaunchRequest::new("app://check-in")
        .with_user_id("u1")
        .with_event("Shift start")
        .with_return_url("launcher://handoff-complete")
        .with_field("badge", "B-1");
    h.session.handle_link(&request.to_url()).await.unwrap();

    // Worker finishes and hands back
    let outcome = WorkflowOutcome::Completed {
        message: "Checked in at Dock 4".to_string(),
        return_data: vec![("seat".to_string(), "12".to_string())],
    };
    let completion = h.session.finish_workflow(outcome).await.unwrap();
    let Completion::Dispatched { url, response } = completion else {
        panic!("expected a dispatched handoff");
    };

    // Orchestrator decodes what came back
    let link = LinkCodec::new("launcher", "handoff-complete")
        .decode(&url)
        .unwrap();
    let received = ReceivedHandoff::from_link(&link).unwrap();

    assert_eq!(received.status, HandoffStatus::Success);
    assert_eq!(received.message, "Checked in at Dock 4");
    assert!(received.answers(request.request_id()));
    assert_eq!(
        received.completed_at.map(|t| t.timestamp()),
        Some(response.completed_at().timestamp())
    );
    assert_eq!(received.return_data.get("seat").map(String::as_str), Some("12"));
}

#[tokio::test]
async fn test_standalone_launch_confirms_locally() {
    let h = worker(MockDispatcher::accepting());

    let completion = h
        .session
        .finish_workflow(WorkflowOutcome::completed())
        .await
        .unwrap();

    assert_eq!(
        completion,
        Completion::Standalone {
            status: HandoffStatus::Success
        }
    );
    assert!(h.dispatcher.opened().await.is_empty());

    let shown = h.alerts.shown().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Success");
}
