//! Selection of resource attributes that become exported labels.
//!
//! Two inclusion rules are applied to every attribute:
//!
//! 1. The service-label shortcut keeps non-empty `service.name`,
//!    `service.namespace` and `service.instance.id` values.
//! 2. Resource filters keep attributes whose key starts with the filter
//!    prefix and matches the filter regex. The first matching filter wins.

use monres_common::{AttributeView, Labels, semconv};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;

/// A prefix + regex rule deciding whether an attribute becomes a label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceFilter {
    /// Required key prefix.
    #[serde(default)]
    pub prefix: String,

    /// Regular expression the key must match.
    #[serde(default)]
    pub regex: String,
}

impl ResourceFilter {
    /// Create a new filter.
    pub fn new(prefix: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            regex: regex.into(),
        }
    }
}

/// A resource filter with its regex compiled once at configuration time.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    prefix: String,
    regex: Regex,
}

impl CompiledFilter {
    /// Compile a filter, failing on an invalid regex.
    pub fn compile(filter: &ResourceFilter) -> Result<Self, ConfigError> {
        let regex = Regex::new(&filter.regex).map_err(|source| ConfigError::InvalidFilter {
            prefix: filter.prefix.clone(),
            regex: filter.regex.clone(),
            source,
        })?;

        Ok(Self {
            prefix: filter.prefix.clone(),
            regex,
        })
    }

    /// Both the prefix and the regex must match.
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix) && self.regex.is_match(key)
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The configured regex source.
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }
}

/// Turns resource attributes into exportable labels.
#[derive(Debug, Clone, Default)]
pub struct LabelSelector {
    service_resource_labels: bool,
    filters: Vec<CompiledFilter>,
}

impl LabelSelector {
    /// Build a selector, compiling every filter.
    pub fn new(
        service_resource_labels: bool,
        filters: &[ResourceFilter],
    ) -> Result<Self, ConfigError> {
        let filters = filters
            .iter()
            .map(CompiledFilter::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            service_resource_labels,
            filters,
        })
    }

    /// Whether the service-label shortcut is enabled.
    pub fn service_resource_labels(&self) -> bool {
        self.service_resource_labels
    }

    /// The compiled filters in declaration order.
    pub fn filters(&self) -> &[CompiledFilter] {
        &self.filters
    }

    /// Select the labels for one resource.
    pub fn select(&self, attrs: &dyn AttributeView) -> Labels {
        let mut labels = Labels::new();

        for (key, value) in attrs.iter_strings() {
            if self.service_resource_labels && semconv::is_service_key(key) {
                if !value.is_empty() {
                    labels.insert(key.to_string(), value.into_owned());
                }
                continue;
            }

            if let Some(filter) = self.filters.iter().find(|f| f.matches(key)) {
                trace!(key, prefix = filter.prefix(), "Attribute selected by filter");
                labels.insert(key.to_string(), value.into_owned());
            }
        }

        labels
    }
}
