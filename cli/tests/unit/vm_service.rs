//! Unit tests for `application::services::vm_service`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use agent_deploy_cli::application::services::vm_service::{load_spec, resolve_and_compose};
use agent_deploy_cli::domain::error::ResolutionError;
use agent_deploy_common::cloud::NetworkSelector;

use crate::mocks::{BrokenCloud, FakeCloud, InlineConfig, RecordingReporter};

const VM_STACK: &str = "selfHostedAgentsAccessToken: tok-vm-456\n";

#[tokio::test]
async fn without_vpc_id_looks_up_default_network() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let cloud = FakeCloud::healthy();
    resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap();
    assert_eq!(*cloud.seen_selector.borrow(), Some(NetworkSelector::Default));
}

#[tokio::test]
async fn vpc_id_is_passed_through() {
    let spec = load_spec(&InlineConfig::new(VM_STACK).with_set("vpcId=vpc-abc")).unwrap();
    let cloud = FakeCloud::healthy();
    resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap();
    assert_eq!(
        *cloud.seen_selector.borrow(),
        Some(NetworkSelector::ById("vpc-abc".into()))
    );
}

#[tokio::test]
async fn picks_first_subnet_and_newest_matching_image() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let cloud = FakeCloud::healthy();
    let resources = resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap();
    assert_eq!(resources.instance.subnet_id, "subnet-first");
    assert_eq!(resources.instance.ami, "ami-new");
    assert_eq!(resources.instance.instance_type, "t3.small");
    assert_eq!(resources.security_group.vpc_id, "vpc-default");
    assert_eq!(
        cloud.seen_pattern.borrow().as_deref(),
        Some("pulumi-workflow-agent*")
    );
}

#[tokio::test]
async fn missing_default_network_is_resolution_error() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let cloud = FakeCloud {
        vpc: None,
        ..FakeCloud::healthy()
    };
    let err = resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ResolutionError>(),
        Some(ResolutionError::NoDefaultNetwork)
    ));
}

#[tokio::test]
async fn unknown_vpc_id_is_named_in_error() {
    let spec = load_spec(&InlineConfig::new(VM_STACK).with_set("vpcId=vpc-gone")).unwrap();
    let cloud = FakeCloud {
        vpc: None,
        ..FakeCloud::healthy()
    };
    let err = resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("vpc-gone"));
}

#[tokio::test]
async fn no_subnets_aborts() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let cloud = FakeCloud {
        subnets: Vec::new(),
        ..FakeCloud::healthy()
    };
    let err = resolve_and_compose(&spec, &cloud, &RecordingReporter::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ResolutionError>(),
        Some(ResolutionError::NoSubnets(_))
    ));
}

#[tokio::test]
async fn no_matching_image_aborts() {
    let spec = load_spec(&InlineConfig::new(VM_STACK).with_set("amiPrefix=custom-agent")).unwrap();
    let cloud = FakeCloud::healthy();
    let reporter = RecordingReporter::default();
    let err = resolve_and_compose(&spec, &cloud, &reporter)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ResolutionError>(),
        Some(ResolutionError::ImageNotFound(_))
    ));
    assert!(
        !reporter.events.borrow().iter().any(|e| e.starts_with("success")),
        "no success reported on failure"
    );
}

#[tokio::test]
async fn inventory_failure_propagates() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let err = resolve_and_compose(&spec, &BrokenCloud, &RecordingReporter::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unable to locate credentials"));
}

#[tokio::test]
async fn token_only_in_enveloped_user_data() {
    let spec = load_spec(&InlineConfig::new(VM_STACK)).unwrap();
    let resources = resolve_and_compose(&spec, &FakeCloud::healthy(), &RecordingReporter::default())
        .await
        .unwrap();
    let doc = serde_json::to_value(resources.document()).unwrap();
    let user_data = &doc["resources"]["agent"]["properties"]["userData"];
    assert!(user_data["value"].as_str().unwrap().contains("tok-vm-456"));
    let mut sg = doc["resources"]["agentSg"].to_string();
    sg.push_str(&doc["resources"]["agent"]["properties"]["tags"].to_string());
    assert!(!sg.contains("tok-vm-456"));
    assert!(!format!("{resources:?}").contains("tok-vm-456"));
}

#[test]
fn vm_spec_requires_token() {
    let err = load_spec(&InlineConfig::new("vpcId: vpc-1\n")).unwrap_err();
    assert!(err.to_string().contains("selfHostedAgentsAccessToken"));
}
