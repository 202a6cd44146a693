//! The resource mapping pipeline façade.

use std::sync::atomic::{AtomicU64, Ordering};

use monres_common::{AttributeView, Labels, MonitoredResource};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::config::ResourceMappingConfig;
use crate::default_mapper::DefaultMapper;
use crate::error::{ConfigError, MappingError};
use crate::filter::LabelSelector;
use crate::script::ScriptedMapper;

/// Maps one resource to its monitored-resource identity.
pub trait MapResource: Send + Sync {
    fn map(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, MappingError>;
}

/// Which mapping path is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// Built-in classification table.
    #[default]
    Default,
    /// User-supplied mapping script.
    Script,
}

impl std::fmt::Display for MappingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingMode::Default => write!(f, "default"),
            MappingMode::Script => write!(f, "script"),
        }
    }
}

#[derive(Debug, Default)]
struct MapperStats {
    resources_mapped: AtomicU64,
    mapping_errors: AtomicU64,
}

/// Point-in-time copy of the mapping counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MapperStatsSnapshot {
    pub resources_mapped: u64,
    pub mapping_errors: u64,
}

/// Resource mapper wiring label selection and the active mapping path.
pub struct ResourceMapper {
    mapper: Box<dyn MapResource>,
    selector: LabelSelector,
    mode: MappingMode,
    stats: MapperStats,
}

impl std::fmt::Debug for ResourceMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceMapper")
            .field("mode", &self.mode)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl ResourceMapper {
    /// Build the pipeline from configuration.
    ///
    /// Filters are compiled and any script is loaded here, so a bad regex or
    /// a broken script rejects the configuration before any resource is seen.
    pub fn from_config(config: &ResourceMappingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let selector =
            LabelSelector::new(config.service_resource_labels, &config.resource_filters)?;

        let mapper: Box<dyn MapResource> = match config.mode {
            MappingMode::Default => Box::new(DefaultMapper::default()),
            MappingMode::Script => {
                let source = config.script_source()?;
                Box::new(ScriptedMapper::new(&source, &config.sandbox)?)
            }
        };

        info!(
            mode = %config.mode,
            filters = selector.filters().len(),
            service_resource_labels = selector.service_resource_labels(),
            "Resource mapper configured"
        );

        Ok(Self::new(mapper, selector, config.mode))
    }

    /// Assemble a mapper from already-built parts.
    pub fn new(mapper: Box<dyn MapResource>, selector: LabelSelector, mode: MappingMode) -> Self {
        Self {
            mapper,
            selector,
            mode,
            stats: MapperStats::default(),
        }
    }

    /// Map one resource. Failures affect this resource only.
    pub fn map(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, MappingError> {
        match self.mapper.map(attrs) {
            Ok(resource) => {
                self.stats.resources_mapped.fetch_add(1, Ordering::Relaxed);
                trace!(%resource, "Resource mapped");
                Ok(resource)
            }
            Err(e) => {
                self.stats.mapping_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, mode = %self.mode, "Failed to map resource");
                Err(e)
            }
        }
    }

    /// Resource attributes to attach as labels.
    pub fn resource_labels(&self, attrs: &dyn AttributeView) -> Labels {
        self.selector.select(attrs)
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    pub fn stats(&self) -> MapperStatsSnapshot {
        MapperStatsSnapshot {
            resources_mapped: self.stats.resources_mapped.load(Ordering::Relaxed),
            mapping_errors: self.stats.mapping_errors.load(Ordering::Relaxed),
        }
    }
}
