use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label mapping attached to a monitored resource or produced by label selection.
pub type Labels = BTreeMap<String, String>;

/// A monitored-resource identity as accepted by the monitoring backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredResource {
    /// Resource type name (e.g., "gce_instance", "generic_task").
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Labels filling the resource type's schema.
    #[serde(default)]
    pub labels: Labels,
}

impl MonitoredResource {
    /// Create a monitored resource with no labels.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            labels: Labels::new(),
        }
    }

    /// Add a label to this resource.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add multiple labels to this resource.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = (String, String)>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Check the identity invariants.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.resource_type.trim().is_empty() {
            return Err("monitored resource type must not be empty".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Display for MonitoredResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.resource_type)?;
        for (i, (k, v)) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", k, v)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mr = MonitoredResource::new("generic_task")
            .with_label("location", "us-east1")
            .with_label("job", "checkout");

        assert_eq!(mr.resource_type, "generic_task");
        assert_eq!(mr.labels.get("location"), Some(&"us-east1".to_string()));
        assert_eq!(mr.labels.len(), 2);
        assert!(mr.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_type() {
        assert!(MonitoredResource::new("").validate().is_err());
        assert!(MonitoredResource::new("   ").validate().is_err());
    }

    #[test]
    fn test_serde_uses_type_field() {
        let mr = MonitoredResource::new("gce_instance").with_label("zone", "us-central1-a");
        let json = serde_json::to_string(&mr).unwrap();

        assert_eq!(json, r#"{"type":"gce_instance","labels":{"zone":"us-central1-a"}}"#);

        let back: MonitoredResource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mr);
    }

    #[test]
    fn test_display() {
        let mr = MonitoredResource::new("k8s_pod")
            .with_label("cluster_name", "prod")
            .with_label("pod_name", "web-0");

        assert_eq!(mr.to_string(), r#"k8s_pod{cluster_name="prod", pod_name="web-0"}"#);
    }
}
