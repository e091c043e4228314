use std::sync::Arc;
use std::time::Duration;

use bosh_bootloader::error::{BblError, Result};
use bosh_bootloader::events::RecordingEventSink;
use bosh_bootloader::infrastructure::InfrastructureManager;
use bosh_bootloader::stack::memory::{InMemoryStackTransport, RecordingClock};
use bosh_bootloader::stack::{StackManager, StackStatus, TransportError};
use bosh_bootloader::template::{
    AwsTemplateBuilder, LoadBalancerKind, Template, TemplateBuilder, TemplateParams,
};

fn params() -> TemplateParams {
    TemplateParams {
        env_id: "lake".into(),
        availability_zones: vec!["us-east-1a".into()],
        key_pair_name: "keypair-lake".into(),
        iam_user_name: "bosh-iam-user-lake".into(),
        load_balancer: LoadBalancerKind::None,
        load_balancer_certificate_arn: None,
    }
}

fn infrastructure(
    transport: &InMemoryStackTransport,
    builder: Arc<dyn TemplateBuilder>,
) -> (InfrastructureManager, RecordingClock) {
    let clock = RecordingClock::new();
    let stacks = StackManager::new(
        Arc::new(transport.clone()),
        Arc::new(RecordingEventSink::new()),
    )
    .with_clock(Arc::new(clock.clone()));
    (InfrastructureManager::new(builder, stacks), clock)
}

struct FailingBuilder;

impl TemplateBuilder for FailingBuilder {
    fn build(&self, _params: &TemplateParams) -> Result<Template> {
        Err(BblError::Composition("conflicting builders".into()))
    }
}

#[tokio::test]
async fn create_builds_applies_waits_and_describes() {
    let transport = InMemoryStackTransport::new();
    let (manager, clock) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    transport.script_describe(Err(TransportError::request_failure(400, "does not exist")));
    transport.script_statuses("bbl-lake", &["CREATE_IN_PROGRESS"]);

    let stack = manager.create("bbl-lake", &params()).await.unwrap();
    assert_eq!(stack.name, "bbl-lake");
    assert_eq!(stack.status, StackStatus::CreateComplete);
    assert_eq!(transport.create_calls().len(), 1);
    assert_eq!(clock.sleeps(), [Duration::from_secs(15)]);

    let body: serde_json::Value =
        serde_json::from_str(&transport.template_body("bbl-lake").unwrap()).unwrap();
    assert!(body["Resources"]["NATInstance"].is_object());
}

#[tokio::test]
async fn builder_failure_touches_nothing() {
    let transport = InMemoryStackTransport::new();
    let (manager, _) = infrastructure(&transport, Arc::new(FailingBuilder));
    let err = manager.create("bbl-lake", &params()).await.unwrap_err();
    assert!(matches!(err, BblError::Composition(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn update_uses_update_path() {
    let transport = InMemoryStackTransport::new().with_stack("bbl-lake", "CREATE_COMPLETE");
    let (manager, _) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    let stack = manager.update("bbl-lake", &params()).await.unwrap();
    assert_eq!(stack.status, StackStatus::UpdateComplete);
    assert!(transport.create_calls().is_empty());
    assert_eq!(transport.update_calls().len(), 1);
}

#[tokio::test]
async fn exists_reports_presence() {
    let transport = InMemoryStackTransport::new().with_stack("present", "CREATE_COMPLETE");
    let (manager, _) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    assert!(manager.exists("present").await.unwrap());
    assert!(!manager.exists("absent").await.unwrap());
}

#[tokio::test]
async fn exists_propagates_other_errors() {
    let transport = InMemoryStackTransport::new();
    transport.script_describe(Err(TransportError::new("network down")));
    let (manager, _) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    let err = manager.exists("bbl-lake").await.unwrap_err();
    assert!(matches!(err, BblError::Transport(_)));
}

#[tokio::test]
async fn delete_swallows_vanished_stack() {
    let transport = InMemoryStackTransport::new().with_stack("bbl-lake", "CREATE_COMPLETE");
    let (manager, _) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    transport.script_statuses("bbl-lake", &["DELETE_IN_PROGRESS"]);
    manager.delete("bbl-lake").await.unwrap();
    assert_eq!(transport.delete_calls().len(), 1);
    assert!(!manager.exists("bbl-lake").await.unwrap());
}

#[tokio::test]
async fn delete_failure_skips_the_wait() {
    let transport = InMemoryStackTransport::new().with_stack("bbl-lake", "CREATE_COMPLETE");
    transport.fail_delete(TransportError::request_failure(500, "internal"));
    let (manager, clock) = infrastructure(&transport, Arc::new(AwsTemplateBuilder::new()));
    assert!(manager.delete("bbl-lake").await.is_err());
    assert!(clock.sleeps().is_empty());
    assert!(manager.describe("bbl-lake").await.is_ok());
}
