//! Scripted resource mapping.
//!
//! A [`ScriptedMapper`] hands every resource attribute to a user-supplied
//! `map_resource(attrs)` function and turns its return value into a
//! [`MonitoredResource`]. The evaluator sits behind [`ScriptEngine`];
//! [`RhaiEngine`] is the shipped implementation.

pub mod engine;
pub mod rhai;

pub use self::engine::{CONSTRUCTOR, MAP_FUNCTION, ScriptEngine, ScriptInput};
pub use self::rhai::{RhaiEngine, RhaiProgram, ScriptResource};

use monres_common::{AttributeView, MonitoredResource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MappingError, ScriptCompileError};
use crate::mapper::MapResource;

/// Execution budget applied to every script invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// Maximum number of operations per call.
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,

    /// Maximum function call depth.
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,

    /// Maximum expression nesting depth.
    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,

    /// Maximum string length in bytes.
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,

    /// Maximum number of array elements.
    #[serde(default = "default_max_collection_size")]
    pub max_array_size: usize,

    /// Maximum number of map entries. The `attrs` map handed to the script
    /// counts too, so a resource with more attributes than this fails with
    /// `BudgetExceeded` whatever the script does.
    #[serde(default = "default_max_collection_size")]
    pub max_map_size: usize,
}

fn default_max_operations() -> u64 {
    100_000
}

fn default_max_call_levels() -> usize {
    32
}

fn default_max_expr_depth() -> usize {
    64
}

fn default_max_string_size() -> usize {
    64 * 1024
}

fn default_max_collection_size() -> usize {
    1024
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_expr_depth: default_max_expr_depth(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_collection_size(),
            max_map_size: default_max_collection_size(),
        }
    }
}

impl SandboxLimits {
    /// Name of the first limit set to zero, if any.
    pub fn first_zero(&self) -> Option<&'static str> {
        [
            ("max_operations", self.max_operations == 0),
            ("max_call_levels", self.max_call_levels == 0),
            ("max_expr_depth", self.max_expr_depth == 0),
            ("max_string_size", self.max_string_size == 0),
            ("max_array_size", self.max_array_size == 0),
            ("max_map_size", self.max_map_size == 0),
        ]
        .into_iter()
        .find_map(|(name, zero)| zero.then_some(name))
    }
}

/// Maps resources by running a user script.
pub struct ScriptedMapper<E: ScriptEngine = RhaiEngine> {
    engine: E,
    program: E::Program,
}

impl<E: ScriptEngine> std::fmt::Debug for ScriptedMapper<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedMapper").finish_non_exhaustive()
    }
}

impl ScriptedMapper<RhaiEngine> {
    /// Compile `source` in a Rhai sandbox bounded by `limits`.
    pub fn new(source: &str, limits: &SandboxLimits) -> Result<Self, ScriptCompileError> {
        Self::with_engine(RhaiEngine::new(limits), source)
    }
}

impl<E: ScriptEngine> ScriptedMapper<E> {
    /// Compile `source` with a specific engine.
    pub fn with_engine(engine: E, source: &str) -> Result<Self, ScriptCompileError> {
        let program = engine.compile(source)?;
        info!(bytes = source.len(), "Resource mapping script loaded");
        Ok(Self { engine, program })
    }
}

impl<E: ScriptEngine> MapResource for ScriptedMapper<E> {
    fn map(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, MappingError> {
        let input: ScriptInput = attrs
            .iter_strings()
            .map(|(k, v)| (k.to_string(), v.into_owned()))
            .collect();

        let resource = self.engine.invoke(&self.program, input)?;
        debug!(%resource, "Script mapped resource");
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptInvocationError;
    use std::collections::HashMap;

    /// Engine whose programs are just a resource type name.
    struct EchoEngine;

    impl ScriptEngine for EchoEngine {
        type Program = String;

        fn compile(&self, source: &str) -> Result<String, ScriptCompileError> {
            match source.strip_prefix("type:") {
                Some(t) => Ok(t.to_string()),
                None => Err(ScriptCompileError::Parse("expected 'type:'".to_string())),
            }
        }

        fn invoke(
            &self,
            program: &String,
            input: ScriptInput,
        ) -> Result<MonitoredResource, ScriptInvocationError> {
            if input.contains_key("fail") {
                return Err(ScriptInvocationError::Runtime {
                    message: "asked to fail".to_string(),
                });
            }
            Ok(MonitoredResource::new(program.clone()).with_labels(input))
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_engine_is_swappable() {
        let mapper = ScriptedMapper::with_engine(EchoEngine, "type:generic_node").unwrap();

        let mr = mapper.map(&attrs(&[("host.name", "vm-1")])).unwrap();
        assert_eq!(
            mr,
            MonitoredResource::new("generic_node").with_label("host.name", "vm-1")
        );

        assert!(matches!(
            mapper.map(&attrs(&[("fail", "")])),
            Err(MappingError::Script(ScriptInvocationError::Runtime { .. }))
        ));
    }

    #[test]
    fn test_compile_error_surfaces() {
        let err = ScriptedMapper::with_engine(EchoEngine, "nonsense").unwrap_err();
        assert!(matches!(err, ScriptCompileError::Parse(_)));
    }

    #[test]
    fn test_rhai_mapper_gets_unfiltered_attributes() {
        let source = r#"
            fn map_resource(attrs) {
                MonitoredResource("generic_task", #{
                    location: attrs["cloud.region"],
                    job: attrs["service.name"],
                })
            }
        "#;
        let mapper = ScriptedMapper::new(source, &SandboxLimits::default()).unwrap();

        let mr = mapper
            .map(&attrs(&[("cloud.region", "us-east1"), ("service.name", "checkout")]))
            .unwrap();

        assert_eq!(mr.labels["location"], "us-east1");
        assert_eq!(mr.labels["job"], "checkout");
    }

    #[test]
    fn test_limits_defaults() {
        let limits = SandboxLimits::default();
        assert_eq!(limits.max_operations, 100_000);
        assert_eq!(limits.max_call_levels, 32);
        assert_eq!(limits.max_expr_depth, 64);
        assert_eq!(limits.max_string_size, 65_536);
        assert_eq!(limits.max_map_size, 1024);
        assert_eq!(limits.first_zero(), None);
    }

    #[test]
    fn test_limits_partial_deserialize() {
        let limits: SandboxLimits = serde_json::from_str(r#"{"max_operations": 10}"#).unwrap();
        assert_eq!(limits.max_operations, 10);
        assert_eq!(limits.max_call_levels, 32);

        let zero = SandboxLimits {
            max_map_size: 0,
            ..SandboxLimits::default()
        };
        assert_eq!(zero.first_zero(), Some("max_map_size"));
    }
}
