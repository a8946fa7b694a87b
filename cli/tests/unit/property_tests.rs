//! Property-based tests for composition invariants.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use agent_deploy_cli::domain::compose::cluster::BUILTIN_ENV_COUNT;
use agent_deploy_cli::domain::compose::{ResourceSet, compose_cluster, compose_dind};
use agent_deploy_cli::domain::config::{
    ClusterAgentSpec, DindAgentSpec, StackConfig, validate_config_key,
};
use agent_deploy_common::k8s::EnvVar;
use agent_deploy_common::{Manifest, Sensitive};
use proptest::prelude::*;

fn base_config(token: &str) -> StackConfig {
    StackConfig {
        agent_namespace: Some("ci".into()),
        agent_image: Some("img:latest".into()),
        self_hosted_agents_access_token: Some(Sensitive::new(token.to_string())),
        ..StackConfig::default()
    }
}

/// Serialize every non-secret manifest.
fn non_secret_text(manifests: &[Manifest]) -> String {
    manifests
        .iter()
        .filter(|m| !m.is_secret_store())
        .map(|m| serde_json::to_string(m).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    /// The token never appears outside the Secret, whatever its content.
    #[test]
    fn prop_token_never_leaks(token in "[A-Za-z0-9_]{12,40}", monitor in any::<bool>()) {
        let mut cfg = base_config(&token);
        cfg.enable_service_monitor = Some(monitor);
        let spec = ClusterAgentSpec::from_config(&cfg).unwrap();
        let manifests = compose_cluster(&spec).unwrap().manifests();
        prop_assert!(!non_secret_text(&manifests).contains(&token));

        let dind = compose_dind(&DindAgentSpec::from_config(&cfg).unwrap()).manifests();
        prop_assert!(!non_secret_text(&dind).contains(&token));
    }

    /// Replica count reaches the Deployment unchanged.
    #[test]
    fn prop_replicas_pass_through(replicas in 1u32..500) {
        let mut cfg = base_config("tok-replicas");
        cfg.agent_replicas = Some(replicas);
        let spec = ClusterAgentSpec::from_config(&cfg).unwrap();
        let resources = compose_cluster(&spec).unwrap();
        prop_assert_eq!(resources.deployment.spec.replicas, replicas);
    }

    /// Extra env entries follow the built-ins in input order.
    #[test]
    fn prop_extra_env_order_preserved(names in prop::collection::vec("EXTRA_[A-Z]{1,8}", 0..8)) {
        let mut cfg = base_config("tok-env");
        cfg.agent_extra_env = names.iter().map(|n| EnvVar::literal(n, "v")).collect();
        let spec = ClusterAgentSpec::from_config(&cfg).unwrap();
        let resources = compose_cluster(&spec).unwrap();
        let env = &resources.deployment.pod_spec().containers[0].env;
        prop_assert_eq!(env.len(), BUILTIN_ENV_COUNT + names.len());
        let tail: Vec<&str> = env[BUILTIN_ENV_COUNT..]
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        let expected: Vec<&str> = names.iter().map(String::as_str).collect();
        prop_assert_eq!(tail, expected);
    }

    /// Arbitrary dotted keys are never accepted.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,12}\\.[a-z]{1,12}") {
        prop_assert!(validate_config_key(&key).is_err());
    }
}
