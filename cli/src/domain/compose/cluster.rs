//! Cluster agent pool: config, secret, RBAC, deployment, service and an
//! optional ServiceMonitor.

use std::collections::BTreeMap;

use agent_deploy_common::k8s::{
    ConfigMap, Container, ContainerPort, Deployment, DeploymentSpec, EnvVar, LabelSelector,
    Labels, Manifest, Namespace, ObjectMeta, PodSpec, PodTemplateSpec, PolicyRule, RBAC_API_GROUP,
    Role, RoleBinding, RoleRef, ScrapeEndpoint, Secret, Service, ServiceAccount, ServiceMonitor,
    ServiceMonitorSpec, ServicePort, ServiceSpec, Subject, Volume, VolumeMount,
};
use anyhow::{Context, Result};

use super::{
    AGENT_CONTAINER, DEPLOYMENT_NAME, ENV_SHARED_VOLUME, ResourceSet, SECRET_NAME, TOKEN_KEY,
    WORK_DIR, WORK_VOLUME, labels, token_secret,
};
use crate::domain::config::ClusterAgentSpec;

pub const APP_LABEL: (&str, &str) = ("app.kubernetes.io/name", "customer-managed-workflow-agent");
pub const COMPONENT_LABEL: (&str, &str) = ("app.kubernetes.io/component", "metrics");

pub const CONFIG_MAP_NAME: &str = "agent-config";
pub const RBAC_NAME: &str = "workflow-agent";
pub const SERVICE_NAME: &str = "deployment-agent-service";
pub const SERVICE_MONITOR_NAME: &str = "deployment-agent-servicemonitor";

pub const ENV_DEPLOY_TARGET: &str = "PULUMI_AGENT_DEPLOY_TARGET";
pub const ENV_SERVICE_URL: &str = "PULUMI_AGENT_SERVICE_URL";
pub const ENV_IMAGE: &str = "PULUMI_AGENT_IMAGE";
pub const ENV_PULL_POLICY: &str = "PULUMI_AGENT_IMAGE_PULL_POLICY";
pub const ENV_SERVICE_ACCOUNT: &str = "PULUMI_AGENT_SERVICE_ACCOUNT_NAME";
pub const ENV_NUM_CPUS: &str = "PULUMI_AGENT_NUM_CPUS";
pub const ENV_MEM_QUANTITY: &str = "PULUMI_AGENT_MEM_QUANTITY";

pub const WORKER_POD_KEY: &str = "worker-pod.json";
pub const WORKER_POD_PATH: &str = "/mnt/worker-pod.json";
pub const CA_VOLUME: &str = "ca-certificates";
pub const CA_KEY: &str = "ca-certificates.crt";
pub const CA_PATH: &str = "/etc/ssl/certs/ca-certificates.crt";
/// 0644
pub const CA_FILE_MODE: u32 = 420;

pub const HTTP_PORT: u16 = 8080;
pub const HEALTH_PATH: &str = "/healthz";
pub const SCRAPE_INTERVAL: &str = "30s";

/// Number of built-in env entries on the agent container; `extraEnv`
/// starts at this index.
pub const BUILTIN_ENV_COUNT: usize = 9;

/// Bundle produced by [`compose_cluster`], keyed by role.
#[derive(Debug, Clone)]
pub struct ClusterAgentResources {
    pub namespace: Namespace,
    pub config_map: ConfigMap,
    pub secret: Secret,
    pub service_account: ServiceAccount,
    pub role: Role,
    pub role_binding: RoleBinding,
    pub worker_service_account: Option<ServiceAccount>,
    pub deployment: Deployment,
    pub service: Service,
    pub service_monitor: Option<ServiceMonitor>,
}

impl ClusterAgentResources {
    /// Output handed downstream (ingress wiring, dashboards).
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    #[must_use]
    pub fn service_monitor(&self) -> Option<&ServiceMonitor> {
        self.service_monitor.as_ref()
    }
}

impl ResourceSet for ClusterAgentResources {
    fn manifests(&self) -> Vec<Manifest> {
        let mut out = vec![
            Manifest::Namespace(self.namespace.clone()),
            Manifest::ConfigMap(self.config_map.clone()),
            Manifest::Secret(self.secret.clone()),
            Manifest::ServiceAccount(self.service_account.clone()),
        ];
        if let Some(sa) = &self.worker_service_account {
            out.push(Manifest::ServiceAccount(sa.clone()));
        }
        out.push(Manifest::Role(self.role.clone()));
        out.push(Manifest::RoleBinding(self.role_binding.clone()));
        out.push(Manifest::Deployment(self.deployment.clone()));
        out.push(Manifest::Service(self.service.clone()));
        if let Some(sm) = &self.service_monitor {
            out.push(Manifest::ServiceMonitor(sm.clone()));
        }
        out
    }
}

/// Derive the agent pool resource set.
///
/// # Errors
///
/// Returns an error if the worker pod template cannot be serialized.
pub fn compose_cluster(spec: &ClusterAgentSpec) -> Result<ClusterAgentResources> {
    let ns = spec.namespace.as_str();
    let app = labels(&[APP_LABEL]);

    let worker_pod = match &spec.pod_template {
        Some(t) => serde_json::to_string_pretty(t).context("serializing worker pod template")?,
        None => "{}".to_string(),
    };
    let mut data = BTreeMap::new();
    data.insert(ENV_SERVICE_URL.to_string(), spec.service_url.clone());
    data.insert(ENV_IMAGE.to_string(), spec.image.clone());
    data.insert(
        ENV_PULL_POLICY.to_string(),
        spec.image_pull_policy.to_string(),
    );
    data.insert(WORKER_POD_KEY.to_string(), worker_pod);
    let config_map = ConfigMap::new(
        ObjectMeta::namespaced(CONFIG_MAP_NAME, ns).with_labels(&app),
        data,
    );

    let secret = token_secret(ns, &spec.access_token, &Labels::new());

    let service_account =
        ServiceAccount::new(ObjectMeta::namespaced(RBAC_NAME, ns).with_labels(&app));
    let role = Role::new(
        ObjectMeta::namespaced(RBAC_NAME, ns).with_labels(&app),
        vec![PolicyRule {
            api_groups: vec![String::new()],
            resources: ["pods", "pods/log", "configmaps"].map(String::from).to_vec(),
            verbs: ["create", "get", "list", "watch", "update", "delete"]
                .map(String::from)
                .to_vec(),
        }],
    );
    let role_binding = RoleBinding::new(
        ObjectMeta::namespaced(RBAC_NAME, ns).with_labels(&app),
        vec![Subject {
            kind: "ServiceAccount".into(),
            name: RBAC_NAME.into(),
            namespace: Some(ns.to_string()),
        }],
        RoleRef {
            kind: "Role".into(),
            name: RBAC_NAME.into(),
            api_group: RBAC_API_GROUP.into(),
        },
    );

    let worker_service_account = spec
        .worker_service_account_name
        .as_deref()
        .map(|name| ServiceAccount::new(ObjectMeta::namespaced(name, ns)));

    let deployment = agent_deployment(spec, &app);

    let service = Service::new(
        ObjectMeta::namespaced(SERVICE_NAME, ns)
            .with_labels(&labels(&[APP_LABEL, COMPONENT_LABEL]))
            .with_annotation("prometheus.io/scrape", "true")
            .with_annotation("prometheus.io/port", &HTTP_PORT.to_string())
            .with_annotation("prometheus.io/path", HEALTH_PATH),
        ServiceSpec {
            type_: "ClusterIP".into(),
            selector: app.clone(),
            ports: vec![ServicePort {
                name: "http".into(),
                port: HTTP_PORT,
                target_port: HTTP_PORT,
                protocol: "TCP".into(),
            }],
        },
    );

    let service_monitor = spec.enable_service_monitor.then(|| {
        ServiceMonitor::new(
            ObjectMeta::namespaced(SERVICE_MONITOR_NAME, ns).with_labels(&app),
            ServiceMonitorSpec {
                selector: LabelSelector {
                    match_labels: labels(&[APP_LABEL, COMPONENT_LABEL]),
                },
                endpoints: vec![ScrapeEndpoint {
                    port: "http".into(),
                    path: HEALTH_PATH.into(),
                    interval: SCRAPE_INTERVAL.into(),
                }],
            },
        )
    });

    Ok(ClusterAgentResources {
        namespace: Namespace::new(ns),
        config_map,
        secret,
        service_account,
        role,
        role_binding,
        worker_service_account,
        deployment,
        service,
        service_monitor,
    })
}

/// Built-in env entries followed by `extra_env`, untouched and in order.
fn agent_env(spec: &ClusterAgentSpec) -> Vec<EnvVar> {
    let mut env = vec![
        EnvVar::literal(ENV_DEPLOY_TARGET, "kubernetes"),
        EnvVar::literal(ENV_SHARED_VOLUME, WORK_DIR),
        EnvVar::from_config_map(ENV_SERVICE_URL, CONFIG_MAP_NAME, ENV_SERVICE_URL),
        EnvVar::from_config_map(ENV_IMAGE, CONFIG_MAP_NAME, ENV_IMAGE),
        EnvVar::from_config_map(ENV_PULL_POLICY, CONFIG_MAP_NAME, ENV_PULL_POLICY),
        EnvVar::from_secret(TOKEN_KEY, SECRET_NAME, TOKEN_KEY),
        EnvVar::optional(ENV_SERVICE_ACCOUNT, spec.worker_service_account_name.clone()),
        EnvVar::optional(ENV_NUM_CPUS, spec.resources.num_cpus.map(|n| n.to_string())),
        EnvVar::optional(
            ENV_MEM_QUANTITY,
            spec.resources.mem_quantity.map(|n| n.to_string()),
        ),
    ];
    debug_assert_eq!(env.len(), BUILTIN_ENV_COUNT);
    env.extend(spec.extra_env.iter().cloned());
    env
}

fn agent_deployment(spec: &ClusterAgentSpec, app: &Labels) -> Deployment {
    let mut volume_mounts = vec![
        VolumeMount::new(WORK_VOLUME, WORK_DIR),
        VolumeMount::read_only_file(CONFIG_MAP_NAME, WORKER_POD_PATH, WORKER_POD_KEY),
    ];
    let mut volumes = vec![
        Volume::empty_dir(WORK_VOLUME),
        Volume::config_map(CONFIG_MAP_NAME, CONFIG_MAP_NAME),
    ];
    if let Some(ca_secret) = &spec.ca_certificate_secret_name {
        volume_mounts.push(VolumeMount::read_only_file(CA_VOLUME, CA_PATH, CA_KEY));
        volumes.push(Volume::secret(CA_VOLUME, ca_secret, CA_FILE_MODE));
    }

    let container = Container {
        name: AGENT_CONTAINER.into(),
        image: spec.image.clone(),
        image_pull_policy: Some(spec.image_pull_policy.to_string()),
        env: agent_env(spec),
        ports: vec![ContainerPort {
            name: "http".into(),
            container_port: HTTP_PORT,
            protocol: "TCP".into(),
        }],
        volume_mounts,
        ..Container::default()
    };

    Deployment::new(
        ObjectMeta::namespaced(DEPLOYMENT_NAME, &spec.namespace)
            .with_labels(app)
            .with_annotation("app.kubernetes.io/name", "pulumi-workflow-agent-pool"),
        DeploymentSpec {
            replicas: spec.replicas,
            selector: LabelSelector {
                match_labels: app.clone(),
            },
            template: PodTemplateSpec {
                metadata: ObjectMeta::default().with_labels(app),
                spec: PodSpec {
                    service_account_name: Some(RBAC_NAME.into()),
                    containers: vec![container],
                    volumes,
                },
            },
        },
    )
}
