//! Decode a returned handoff link

use super::helpers::{exit_reported, print_json};
use handoff_core::{
    error::Result, ConsoleAlertSink, ErrorState, FailureReporter, LinkCodec, ReceivedHandoff,
};
use std::sync::Arc;
use tracing::warn;

fn decode(
    uri: &str,
    scheme: &str,
    host: &str,
) -> std::result::Result<ReceivedHandoff, ErrorState> {
    LinkCodec::new(scheme, host)
        .decode(uri)
        .and_then(|link| ReceivedHandoff::from_link(&link))
        .map_err(|err| {
            ErrorState::from_error(&err).with_technical_details(format!("{} (link: {})", err, uri))
        })
}

/// Handle inspect command
pub async fn handle(
    uri: &str,
    scheme: &str,
    host: &str,
    expect_request_id: Option<&str>,
) -> Result<()> {
    let received = match decode(uri, scheme, host) {
        Ok(received) => received,
        Err(state) => {
            FailureReporter::new(Arc::new(ConsoleAlertSink))
                .report(&state)
                .await;
            exit_reported(&state);
        }
    };

    if let Some(expected) = expect_request_id {
        if !received.answers(expected) {
            warn!(
                "Response echoes request id {:?}, expected {:?}",
                received.original_request_id, expected
            );
        }
    }

    print_json(&received)
}
