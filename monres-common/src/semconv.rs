//! Well-known resource attribute keys.
//!
//! Only the keys the mapping engine inspects are listed here.

pub const SERVICE_NAME: &str = "service.name";
pub const SERVICE_NAMESPACE: &str = "service.namespace";
pub const SERVICE_INSTANCE_ID: &str = "service.instance.id";

/// The service identity keys eligible for the service-label shortcut.
pub const SERVICE_KEYS: [&str; 3] = [SERVICE_NAME, SERVICE_NAMESPACE, SERVICE_INSTANCE_ID];

pub const CLOUD_PROVIDER: &str = "cloud.provider";
pub const CLOUD_PLATFORM: &str = "cloud.platform";
pub const CLOUD_REGION: &str = "cloud.region";
pub const CLOUD_AVAILABILITY_ZONE: &str = "cloud.availability_zone";
pub const CLOUD_ACCOUNT_ID: &str = "cloud.account.id";

pub const HOST_ID: &str = "host.id";
pub const HOST_NAME: &str = "host.name";

pub const K8S_CLUSTER_NAME: &str = "k8s.cluster.name";
pub const K8S_NAMESPACE_NAME: &str = "k8s.namespace.name";
pub const K8S_POD_NAME: &str = "k8s.pod.name";
pub const K8S_NODE_NAME: &str = "k8s.node.name";
pub const K8S_CONTAINER_NAME: &str = "k8s.container.name";

pub const FAAS_NAME: &str = "faas.name";
pub const FAAS_INSTANCE: &str = "faas.instance";

/// `cloud.platform` values.
pub mod platform {
    pub const GCP_COMPUTE_ENGINE: &str = "gcp_compute_engine";
    pub const GCP_KUBERNETES_ENGINE: &str = "gcp_kubernetes_engine";
    pub const AWS_EC2: &str = "aws_ec2";
}

/// Returns true if `key` is one of the service identity keys.
pub fn is_service_key(key: &str) -> bool {
    SERVICE_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_service_key() {
        assert!(is_service_key("service.name"));
        assert!(is_service_key("service.namespace"));
        assert!(is_service_key("service.instance.id"));
        assert!(!is_service_key("service.version"));
        assert!(!is_service_key("service"));
    }
}
