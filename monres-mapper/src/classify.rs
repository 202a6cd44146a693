//! Resource classification.
//!
//! A [`ResourceClassifier`] decides which monitored-resource type a resource
//! belongs to and fills that type's labels. [`GcmClassifier`] ships the common
//! platform heuristics; callers may plug their own table instead.

use monres_common::{AttributeView, MonitoredResource, semconv};

use crate::error::ClassificationError;

pub const GCE_INSTANCE: &str = "gce_instance";
pub const K8S_CONTAINER: &str = "k8s_container";
pub const K8S_POD: &str = "k8s_pod";
pub const K8S_NODE: &str = "k8s_node";
pub const K8S_CLUSTER: &str = "k8s_cluster";
pub const AWS_EC2_INSTANCE: &str = "aws_ec2_instance";
pub const GENERIC_TASK: &str = "generic_task";
pub const GENERIC_NODE: &str = "generic_node";

/// Location used when no zone or region is known.
pub const GLOBAL_LOCATION: &str = "global";

/// Maps a resource's attributes to a monitored-resource type and raw labels.
///
/// Implementations must be pure: the same attributes always classify the
/// same way and no state is kept between calls.
pub trait ResourceClassifier: Send + Sync {
    fn classify(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, ClassificationError>;
}

impl<F> ResourceClassifier for F
where
    F: Fn(&dyn AttributeView) -> Result<MonitoredResource, ClassificationError> + Send + Sync,
{
    fn classify(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, ClassificationError> {
        self(attrs)
    }
}

/// Built-in classification table for Google Cloud Monitoring resource types.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcmClassifier;

impl GcmClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceClassifier for GcmClassifier {
    fn classify(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, ClassificationError> {
        let platform = attrs.get_string(semconv::CLOUD_PLATFORM).unwrap_or_default();

        let mr = match &*platform {
            semconv::platform::GCP_COMPUTE_ENGINE => gce_instance(attrs),
            semconv::platform::AWS_EC2 => aws_ec2_instance(attrs),
            semconv::platform::GCP_KUBERNETES_ENGINE => kubernetes(attrs),
            _ if attrs.get_string(semconv::K8S_CLUSTER_NAME).is_some() => kubernetes(attrs),
            _ => generic(attrs),
        };

        Ok(mr)
    }
}

/// Lookup helper that fills missing values with an empty string.
struct Lookup<'a>(&'a dyn AttributeView);

impl Lookup<'_> {
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.0.get_string(k))
            .find(|v| !v.is_empty())
            .map(|v| v.into_owned())
    }

    fn get(&self, key: &str) -> String {
        self.first_of(&[key]).unwrap_or_default()
    }

    fn location(&self) -> String {
        self.first_of(&[semconv::CLOUD_AVAILABILITY_ZONE, semconv::CLOUD_REGION])
            .unwrap_or_else(|| GLOBAL_LOCATION.to_string())
    }
}

fn gce_instance(attrs: &dyn AttributeView) -> MonitoredResource {
    let l = Lookup(attrs);
    MonitoredResource::new(GCE_INSTANCE)
        .with_label("zone", l.get(semconv::CLOUD_AVAILABILITY_ZONE))
        .with_label("instance_id", l.get(semconv::HOST_ID))
}

fn aws_ec2_instance(attrs: &dyn AttributeView) -> MonitoredResource {
    let l = Lookup(attrs);
    MonitoredResource::new(AWS_EC2_INSTANCE)
        .with_label("instance_id", l.get(semconv::HOST_ID))
        .with_label("region", l.location())
        .with_label("aws_account", l.get(semconv::CLOUD_ACCOUNT_ID))
}

/// Picks the most specific Kubernetes type the attributes support.
fn kubernetes(attrs: &dyn AttributeView) -> MonitoredResource {
    let l = Lookup(attrs);
    let base = |resource_type: &str| {
        MonitoredResource::new(resource_type)
            .with_label("location", l.location())
            .with_label("cluster_name", l.get(semconv::K8S_CLUSTER_NAME))
    };

    let pod = l.first_of(&[semconv::K8S_POD_NAME]);
    let container = l.first_of(&[semconv::K8S_CONTAINER_NAME]);

    match (pod, container) {
        (Some(pod), Some(container)) => base(K8S_CONTAINER)
            .with_label("namespace_name", l.get(semconv::K8S_NAMESPACE_NAME))
            .with_label("pod_name", pod)
            .with_label("container_name", container),
        (Some(pod), None) => base(K8S_POD)
            .with_label("namespace_name", l.get(semconv::K8S_NAMESPACE_NAME))
            .with_label("pod_name", pod),
        (None, _) => match l.first_of(&[semconv::K8S_NODE_NAME]) {
            Some(node) => base(K8S_NODE).with_label("node_name", node),
            None => base(K8S_CLUSTER),
        },
    }
}

/// `generic_task` when a job and task can be identified, else `generic_node`.
fn generic(attrs: &dyn AttributeView) -> MonitoredResource {
    let l = Lookup(attrs);
    let job = l.first_of(&[semconv::SERVICE_NAME, semconv::FAAS_NAME]);
    let task = l.first_of(&[semconv::SERVICE_INSTANCE_ID, semconv::FAAS_INSTANCE]);

    match (job, task) {
        (Some(job), Some(task_id)) => MonitoredResource::new(GENERIC_TASK)
            .with_label("location", l.location())
            .with_label("namespace", l.get(semconv::SERVICE_NAMESPACE))
            .with_label("job", job)
            .with_label("task_id", task_id),
        _ => MonitoredResource::new(GENERIC_NODE)
            .with_label("location", l.location())
            .with_label("namespace", l.get(semconv::SERVICE_NAMESPACE))
            .with_label(
                "node_id",
                l.first_of(&[semconv::HOST_ID, semconv::HOST_NAME])
                    .unwrap_or_default(),
            ),
    }
}
