//! Configuration for the resource mapper.

use std::path::{Path, PathBuf};

use monres_common::LoggingConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::ResourceFilter;
use crate::mapper::MappingMode;
use crate::script::SandboxLimits;

/// Complete mapper configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Resource mapping settings.
    #[serde(default)]
    pub resource_mapping: ResourceMappingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resource mapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMappingConfig {
    /// Keep non-empty `service.name`, `service.namespace` and
    /// `service.instance.id` as labels.
    #[serde(default = "default_true")]
    pub service_resource_labels: bool,

    /// Attribute filters, in priority order.
    #[serde(default)]
    pub resource_filters: Vec<ResourceFilter>,

    /// Mapping path: "default" or "script".
    #[serde(default)]
    pub mode: MappingMode,

    /// Inline mapping script.
    #[serde(default)]
    pub script: Option<String>,

    /// Path to a mapping script file.
    #[serde(default)]
    pub script_path: Option<PathBuf>,

    /// Execution budget for scripts.
    #[serde(default)]
    pub sandbox: SandboxLimits,
}

fn default_true() -> bool {
    true
}

impl Default for ResourceMappingConfig {
    fn default() -> Self {
        Self {
            service_resource_labels: true,
            resource_filters: Vec::new(),
            mode: MappingMode::Default,
            script: None,
            script_path: None,
            sandbox: SandboxLimits::default(),
        }
    }
}

impl ResourceMappingConfig {
    /// Validate the mapping settings.
    ///
    /// Filter regexes are not compiled here; `ResourceMapper::from_config`
    /// compiles them once while building its selector.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.mode, &self.script, &self.script_path) {
            (MappingMode::Script, None, None) => {
                return Err(ConfigError::Validation(
                    "script mode requires one of script or script_path".to_string(),
                ));
            }
            (MappingMode::Script, Some(_), Some(_)) => {
                return Err(ConfigError::Validation(
                    "script and script_path are mutually exclusive".to_string(),
                ));
            }
            (MappingMode::Default, Some(_), _) | (MappingMode::Default, _, Some(_)) => {
                return Err(ConfigError::Validation(
                    "a script is configured but mode is \"default\"".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(name) = self.sandbox.first_zero() {
            return Err(ConfigError::Validation(format!("sandbox.{} must be > 0", name)));
        }

        Ok(())
    }

    /// The script text, read from `script_path` when not inline.
    pub fn script_source(&self) -> Result<String, ConfigError> {
        match (&self.script, &self.script_path) {
            (Some(script), _) => Ok(script.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
            (None, None) => Err(ConfigError::Validation(
                "no script configured".to_string(),
            )),
        }
    }

    /// Switch to script mode using the file at `path`.
    pub fn use_script_file(&mut self, path: impl Into<PathBuf>) {
        self.mode = MappingMode::Script;
        self.script = None;
        self.script_path = Some(path.into());
    }
}

impl MapperConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: MapperConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resource_mapping.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monres_common::LogFormat;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = MapperConfig::parse("{}").unwrap();

        assert!(config.resource_mapping.service_resource_labels);
        assert!(config.resource_mapping.resource_filters.is_empty());
        assert_eq!(config.resource_mapping.mode, MappingMode::Default);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
        {
            // JSON5 allows comments
            resource_mapping: {
                service_resource_labels: false,
                resource_filters: [
                    { prefix: "cloud.", regex: "^cloud\\..*" },
                    { prefix: "k8s.", regex: "name$" },
                ],
                mode: "script",
                script: "fn map_resource(attrs) { MonitoredResource(\"generic_node\", #{}) }",
                sandbox: {
                    max_operations: 5000,
                },
            },
            logging: {
                level: "debug",
                format: "json",
            },
        }
        "#;

        let config = MapperConfig::parse(content).unwrap();
        let rm = &config.resource_mapping;

        assert!(!rm.service_resource_labels);
        assert_eq!(rm.resource_filters.len(), 2);
        assert_eq!(rm.resource_filters[1], ResourceFilter::new("k8s.", "name$"));
        assert_eq!(rm.mode, MappingMode::Script);
        assert!(rm.script.as_deref().unwrap().contains("map_resource"));
        assert_eq!(rm.sandbox.max_operations, 5000);
        assert_eq!(rm.sandbox.max_call_levels, 32);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_script_mode_without_script() {
        let result = MapperConfig::parse(r#"{ resource_mapping: { mode: "script" } }"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_both_script_sources() {
        let config = ResourceMappingConfig {
            mode: MappingMode::Script,
            script: Some("x".to_string()),
            script_path: Some(PathBuf::from("map.rhai")),
            ..ResourceMappingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_script_in_default_mode() {
        let result =
            MapperConfig::parse(r#"{ resource_mapping: { script: "fn map_resource(a) {}" } }"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_zero_limit() {
        let result = MapperConfig::parse(
            r#"{ resource_mapping: { sandbox: { max_call_levels: 0 } } }"#,
        );
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("max_call_levels")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_regex_rejected_when_mapper_built() {
        let config = MapperConfig::parse(
            r#"{ resource_mapping: { resource_filters: [{ prefix: "a", regex: "(" }] } }"#,
        )
        .unwrap();

        match crate::ResourceMapper::from_config(&config.resource_mapping) {
            Err(ConfigError::InvalidFilter { prefix, regex, .. }) => {
                assert_eq!(prefix, "a");
                assert_eq!(regex, "(");
            }
            other => panic!("expected InvalidFilter, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mode() {
        let result = MapperConfig::parse(r#"{ resource_mapping: { mode: "magic" } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_script_source_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "fn map_resource(attrs) {{ 1 }}").unwrap();

        let mut config = ResourceMappingConfig::default();
        config.use_script_file(file.path());

        assert!(config.validate().is_ok());
        assert_eq!(
            config.script_source().unwrap(),
            "fn map_resource(attrs) { 1 }"
        );
    }

    #[test]
    fn test_script_source_missing_file() {
        let mut config = ResourceMappingConfig::default();
        config.use_script_file("/nonexistent/map.rhai");

        assert!(matches!(config.script_source(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ logging: {{ level: \"warn\" }} }}").unwrap();

        let config = MapperConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
    }
}
