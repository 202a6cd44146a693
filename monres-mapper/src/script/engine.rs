//! Interface between the scripted mapper and an embedded evaluator.

use std::collections::BTreeMap;

use monres_common::MonitoredResource;

use crate::error::{ScriptCompileError, ScriptInvocationError};

/// Name of the function every mapping script must declare.
pub const MAP_FUNCTION: &str = "map_resource";

/// Name of the host constructor exposed to scripts.
pub const CONSTRUCTOR: &str = "MonitoredResource";

/// Argument passed to the mapping function: every attribute, string-rendered.
pub type ScriptInput = BTreeMap<String, String>;

/// An embedded language able to run resource mapping scripts.
///
/// `compile` runs once at configuration time. `invoke` runs once per
/// resource, possibly from many threads at once against the same program,
/// and must not carry state from one call to the next.
pub trait ScriptEngine: Send + Sync {
    /// Compiled, validated form of a script.
    type Program: Send + Sync;

    fn compile(&self, source: &str) -> Result<Self::Program, ScriptCompileError>;

    fn invoke(
        &self,
        program: &Self::Program,
        input: ScriptInput,
    ) -> Result<MonitoredResource, ScriptInvocationError>;
}
