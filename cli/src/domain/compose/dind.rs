//! Docker-in-Docker agent pod: the agent talks to a privileged `dockerd`
//! sidecar over loopback TCP.

use agent_deploy_common::k8s::{
    Container, Deployment, DeploymentSpec, EnvVar, LabelSelector, Labels, Manifest, Namespace,
    ObjectMeta, PodSpec, PodTemplateSpec, Secret, SecurityContext, Volume, VolumeMount,
};

use super::{
    AGENT_CONTAINER, DEPLOYMENT_NAME, ENV_SHARED_VOLUME, ResourceSet, SECRET_NAME, TOKEN_KEY,
    WORK_DIR, WORK_VOLUME, labels, token_secret,
};
use crate::domain::config::DindAgentSpec;

pub const POOL_LABEL: (&str, &str) = ("app", "pulumi-workflow-agent-pool");
pub const POD_NAME_LABEL: (&str, &str) = ("app.kubernetes.io/name", "pulumi-workflow-agent-pool");

pub const DIND_CONTAINER: &str = "dind";
pub const DIND_IMAGE: &str = "docker:dind";
pub const DOCKER_HOST: &str = "tcp://localhost:2375";
pub const DOCKERD_LISTEN: &str = "tcp://127.0.0.1:2375";

#[derive(Debug, Clone)]
pub struct DindAgentResources {
    pub namespace: Namespace,
    pub secret: Secret,
    pub deployment: Deployment,
}

impl ResourceSet for DindAgentResources {
    fn manifests(&self) -> Vec<Manifest> {
        vec![
            Manifest::Namespace(self.namespace.clone()),
            Manifest::Secret(self.secret.clone()),
            Manifest::Deployment(self.deployment.clone()),
        ]
    }
}

/// Derive the single-replica DinD deployment and its token secret.
#[must_use]
pub fn compose_dind(spec: &DindAgentSpec) -> DindAgentResources {
    let ns = spec.namespace.as_str();
    let selector = labels(&[POOL_LABEL]);
    let mut pod_labels: Labels = selector.clone();
    pod_labels.extend(labels(&[POD_NAME_LABEL]));

    let work_mount = VolumeMount::new(WORK_VOLUME, WORK_DIR);

    let agent = Container {
        name: AGENT_CONTAINER.into(),
        image: spec.image.clone(),
        image_pull_policy: Some(spec.image_pull_policy.to_string()),
        env: vec![
            EnvVar::literal("DOCKER_HOST", DOCKER_HOST),
            EnvVar::literal(ENV_SHARED_VOLUME, WORK_DIR),
            EnvVar::from_secret(TOKEN_KEY, SECRET_NAME, TOKEN_KEY),
        ],
        volume_mounts: vec![work_mount.clone()],
        ..Container::default()
    };

    let dind = Container {
        name: DIND_CONTAINER.into(),
        image: DIND_IMAGE.into(),
        image_pull_policy: Some("Always".into()),
        command: vec!["dockerd".into(), "--host".into(), DOCKERD_LISTEN.into()],
        volume_mounts: vec![work_mount],
        security_context: Some(SecurityContext {
            privileged: Some(true),
        }),
        ..Container::default()
    };

    let deployment = Deployment::new(
        ObjectMeta::namespaced(DEPLOYMENT_NAME, ns)
            .with_annotation(POD_NAME_LABEL.0, POD_NAME_LABEL.1),
        DeploymentSpec {
            replicas: 1,
            selector: LabelSelector {
                match_labels: selector,
            },
            template: PodTemplateSpec {
                metadata: ObjectMeta::default().with_labels(&pod_labels),
                spec: PodSpec {
                    service_account_name: None,
                    containers: vec![agent, dind],
                    volumes: vec![Volume::empty_dir(WORK_VOLUME)],
                },
            },
        },
    );

    DindAgentResources {
        namespace: Namespace::new(ns),
        secret: token_secret(ns, &spec.access_token, &Labels::new()),
        deployment,
    }
}
