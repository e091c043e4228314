use std::sync::Arc;
use std::time::Duration;

use bosh_bootloader::error::BblError;
use bosh_bootloader::events::RecordingEventSink;
use bosh_bootloader::stack::memory::{InMemoryStackTransport, RecordingClock, TransportCall};
use bosh_bootloader::stack::{HttpStatused, StackAction, StackManager, StackStatus, TransportError};
use bosh_bootloader::template::{Output, Template};
use serde_json::json;

struct Harness {
    transport: InMemoryStackTransport,
    clock: RecordingClock,
    events: RecordingEventSink,
    manager: StackManager,
}

fn harness(transport: InMemoryStackTransport) -> Harness {
    let clock = RecordingClock::new();
    let events = RecordingEventSink::new();
    let manager = StackManager::new(Arc::new(transport.clone()), Arc::new(events.clone()))
        .with_clock(Arc::new(clock.clone()));
    Harness {
        transport,
        clock,
        events,
        manager,
    }
}

fn template(marker: &str) -> Template {
    Template::described("test").with_output("Marker", Output::new(json!(marker)))
}

#[tokio::test]
async fn create_or_update_creates_missing_stack() {
    let h = harness(InMemoryStackTransport::new());
    h.manager.create_or_update("bbl", &template("a")).await.unwrap();
    assert_eq!(h.transport.create_calls().len(), 1);
    assert!(h.transport.update_calls().is_empty());
    assert_eq!(
        h.transport.template_body("bbl"),
        Some(template("a").to_json().unwrap())
    );
}

#[tokio::test]
async fn create_or_update_updates_existing_stack() {
    let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
    h.manager.create_or_update("bbl", &template("b")).await.unwrap();
    assert_eq!(h.transport.update_calls().len(), 1);
    assert!(h.transport.create_calls().is_empty());
    let update = &h.transport.update_calls()[0];
    assert_eq!(update.capabilities, ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"]);
}

#[tokio::test]
async fn create_or_update_stops_on_describe_failure() {
    let h = harness(InMemoryStackTransport::new());
    h.transport
        .script_describe(Err(TransportError::request_failure(403, "denied")));
    let err = h
        .manager
        .create_or_update("bbl", &template("a"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(h.transport.calls().len(), 1);
}

#[tokio::test]
async fn update_treats_bad_request_as_no_op() {
    let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
    h.transport
        .fail_update(TransportError::request_failure(400, "No updates are to be performed."));
    h.manager.update("bbl", &template("a")).await.unwrap();
}

#[tokio::test]
async fn update_propagates_every_other_failure() {
    for failure in [
        TransportError::request_failure(500, "internal"),
        TransportError::request_failure(403, "denied"),
        TransportError::new("connection reset"),
    ] {
        let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
        h.transport.fail_update(failure.clone());
        let err = h.manager.update("bbl", &template("a")).await.unwrap_err();
        assert!(matches!(err, BblError::Transport(ref inner) if *inner == failure));
    }
}

#[tokio::test]
async fn identical_update_is_a_no_op() {
    let h = harness(InMemoryStackTransport::new());
    h.manager.create("bbl", &template("same")).await.unwrap();
    h.manager.update("bbl", &template("same")).await.unwrap();
    assert_eq!(h.transport.update_calls().len(), 1);
}

#[tokio::test]
async fn describe_extracts_status_and_outputs() {
    let h = harness(
        InMemoryStackTransport::new()
            .with_stack("bbl", "UPDATE_COMPLETE")
            .with_outputs("bbl", &[("BOSHEIP", "52.0.0.1"), ("VPCID", "vpc-1")]),
    );
    let stack = h.manager.describe("bbl").await.unwrap();
    assert_eq!(stack.status, StackStatus::UpdateComplete);
    assert_eq!(stack.output("BOSHEIP"), Some("52.0.0.1"));
    assert_eq!(stack.output("Missing"), None);
}

#[tokio::test]
async fn wait_polls_until_terminal() {
    let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
    h.transport
        .script_statuses("bbl", &["CREATE_IN_PROGRESS", "CREATE_IN_PROGRESS"]);
    h.manager
        .wait_for_completion("bbl", Duration::from_secs(15), StackAction::Apply)
        .await
        .unwrap();
    assert_eq!(h.clock.sleeps(), [Duration::from_secs(15); 2]);
    assert_eq!(h.events.dots(), 2);
    assert_eq!(
        h.events.steps().last().map(String::as_str),
        Some("finished applying cloudformation template")
    );
}

#[tokio::test]
async fn failed_terminal_still_ends_the_wait() {
    let h = harness(InMemoryStackTransport::new());
    h.transport.script_statuses("bbl", &["UPDATE_ROLLBACK_FAILED"]);
    h.manager
        .wait_for_completion("bbl", Duration::from_secs(1), StackAction::Update)
        .await
        .unwrap();
    assert!(h.clock.sleeps().is_empty());
}

#[tokio::test]
async fn vanished_stack_ends_only_delete_waits() {
    let h = harness(InMemoryStackTransport::new());
    h.manager
        .wait_for_completion("bbl", Duration::from_secs(1), StackAction::Delete)
        .await
        .unwrap();

    let err = h
        .manager
        .wait_for_completion("bbl", Duration::from_secs(1), StackAction::Apply)
        .await
        .unwrap_err();
    assert!(err.is_stack_not_found());
}

#[tokio::test]
async fn transport_error_ends_the_wait() {
    let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
    h.transport.script_statuses("bbl", &["CREATE_IN_PROGRESS"]);
    h.transport
        .script_describe(Err(TransportError::request_failure(503, "unavailable")));
    let err = h
        .manager
        .wait_for_completion("bbl", Duration::from_secs(1), StackAction::Apply)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(h.clock.sleeps().len(), 1);
}

#[tokio::test]
async fn delete_issues_one_request() {
    let h = harness(InMemoryStackTransport::new().with_stack("bbl", "CREATE_COMPLETE"));
    h.manager.delete("bbl").await.unwrap();
    assert_eq!(
        h.transport.calls(),
        [TransportCall::Delete(
            bosh_bootloader::stack::transport::DeleteStackInput {
                stack_name: "bbl".into()
            }
        )]
    );
}
