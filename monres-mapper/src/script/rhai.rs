//! Rhai-backed script engine.
//!
//! Scripts see a raw sandbox: no module resolution, no `eval`, no I/O, and
//! `print`/`debug` go to the log. The only host function is the
//! `MonitoredResource` constructor, which produces a plain data value:
//!
//! ```text
//! fn map_resource(attrs) {
//!     MonitoredResource("generic_task", #{ location: attrs["cloud.region"] })
//! }
//! ```
//!
//! The named-argument form `MonitoredResource(#{ "type": t, "labels": l })`
//! is accepted too.
//!
//! Top-level statements run once, when the script is loaded. Top-level
//! `const` values stay visible to every function through the `global`
//! namespace (`global::DEFAULT_LOCATION`); plain `let` bindings do not.
//!
//! The engine is built with the `sync` feature, so one compiled program is
//! shared by concurrent invocations; each call gets its own scope.

use monres_common::{Labels, MonitoredResource};
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{
    AST, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Map, Module, Position, Scope,
};
use tracing::debug;

use super::SandboxLimits;
use super::engine::{CONSTRUCTOR, MAP_FUNCTION, ScriptEngine, ScriptInput};
use crate::error::{ScriptCompileError, ScriptInvocationError};

/// Value produced by the `MonitoredResource` constructor inside a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptResource {
    resource_type: String,
    labels: Labels,
}

impl From<ScriptResource> for MonitoredResource {
    fn from(r: ScriptResource) -> Self {
        MonitoredResource {
            resource_type: r.resource_type,
            labels: r.labels,
        }
    }
}

/// Raised by the constructor when a label value is not a string.
#[derive(Debug, Clone)]
struct LabelTypeError {
    key: String,
    found: String,
}

/// Exported closure forwarding to `map_resource`. Calling through it keeps
/// the constants captured at load time in reach of the script's functions.
const ENTRY: &str = "map_resource_entry";

/// A compiled mapping script.
#[derive(Debug, Clone)]
pub struct RhaiProgram {
    ast: AST,
    entry: FnPtr,
}

/// Sandboxed Rhai evaluator with the `MonitoredResource` constructor registered.
pub struct RhaiEngine {
    engine: Engine,
    max_map_size: usize,
}

impl std::fmt::Debug for RhaiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiEngine").finish_non_exhaustive()
    }
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new(&SandboxLimits::default())
    }
}

impl RhaiEngine {
    /// Build a sandboxed engine enforcing `limits`.
    pub fn new(limits: &SandboxLimits) -> Self {
        let mut engine = Engine::new();

        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.on_print(|text| debug!(target: "monres_mapper::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            debug!(
                target: "monres_mapper::script",
                source = source.unwrap_or_default(),
                position = %pos,
                "{}",
                text
            )
        });

        engine.register_type_with_name::<ScriptResource>(CONSTRUCTOR);
        engine.register_fn(CONSTRUCTOR, construct);
        engine.register_fn(CONSTRUCTOR, construct_named);

        Self {
            engine,
            max_map_size: limits.max_map_size,
        }
    }
}

impl ScriptEngine for RhaiEngine {
    type Program = RhaiProgram;

    fn compile(&self, source: &str) -> Result<RhaiProgram, ScriptCompileError> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| ScriptCompileError::Parse(e.to_string()))?;

        let arities: Vec<usize> = ast
            .iter_functions()
            .filter(|f| f.name == MAP_FUNCTION)
            .map(|f| f.params.len())
            .collect();

        match arities.as_slice() {
            [] => {
                return Err(ScriptCompileError::MissingFunction {
                    name: MAP_FUNCTION.to_string(),
                });
            }
            a if a.contains(&1) => {}
            [params, ..] => {
                return Err(ScriptCompileError::WrongArity {
                    name: MAP_FUNCTION.to_string(),
                    params: *params,
                });
            }
        }

        let driver = self
            .engine
            .compile(format!("export const {ENTRY} = |attrs| {MAP_FUNCTION}(attrs);"))
            .map_err(|e| ScriptCompileError::Parse(e.to_string()))?;
        let ast = ast.merge(&driver);

        // Top-level statements run once here and never per call.
        let module = Module::eval_ast_as_new(Scope::new(), &ast, &self.engine)
            .map_err(|e| ScriptCompileError::Load(e.to_string()))?;

        let entry = module.get_var_value::<FnPtr>(ENTRY).ok_or_else(|| {
            ScriptCompileError::Load(format!("'{}' missing after load", ENTRY))
        })?;

        Ok(RhaiProgram { ast, entry })
    }

    fn invoke(
        &self,
        program: &RhaiProgram,
        input: ScriptInput,
    ) -> Result<MonitoredResource, ScriptInvocationError> {
        // The host-built attribute map is itself subject to max_map_size.
        if input.len() > self.max_map_size {
            return Err(ScriptInvocationError::BudgetExceeded {
                message: format!(
                    "resource has {} attributes, sandbox max_map_size is {}",
                    input.len(),
                    self.max_map_size
                ),
            });
        }

        let attrs: Map = input
            .into_iter()
            .map(|(k, v)| (k.into(), Dynamic::from(ImmutableString::from(v))))
            .collect();

        let result = program
            .entry
            .call::<Dynamic>(&self.engine, &program.ast, (attrs,))
            .map_err(|e| invocation_error(*e))?;

        let found = self.engine.map_type_name(result.type_name()).to_string();
        let resource: MonitoredResource = result
            .try_cast::<ScriptResource>()
            .ok_or(ScriptInvocationError::InvalidReturn { found })?
            .into();

        resource
            .validate()
            .map_err(|reason| ScriptInvocationError::InvalidResource { reason })?;

        Ok(resource)
    }
}

/// `MonitoredResource(type, labels)`.
fn construct(
    resource_type: ImmutableString,
    labels: Map,
) -> Result<ScriptResource, Box<EvalAltResult>> {
    let mut converted = Labels::new();

    for (key, value) in labels {
        let found = value.type_name();
        match value.try_cast::<ImmutableString>() {
            Some(v) => {
                converted.insert(key.to_string(), v.to_string());
            }
            None => {
                let err = LabelTypeError {
                    key: key.to_string(),
                    found: found.to_string(),
                };
                return Err(Box::new(EvalAltResult::ErrorRuntime(
                    Dynamic::from(err),
                    Position::NONE,
                )));
            }
        }
    }

    Ok(ScriptResource {
        resource_type: resource_type.to_string(),
        labels: converted,
    })
}

/// `MonitoredResource(#{ "type": type, "labels": labels })`.
fn construct_named(mut args: Map) -> Result<ScriptResource, Box<EvalAltResult>> {
    let resource_type = args
        .remove("type")
        .ok_or_else(|| format!("{}: missing argument 'type'", CONSTRUCTOR))?;
    let labels = args
        .remove("labels")
        .ok_or_else(|| format!("{}: missing argument 'labels'", CONSTRUCTOR))?;

    if let Some(extra) = args.keys().next() {
        return Err(format!("{}: unexpected argument '{}'", CONSTRUCTOR, extra).into());
    }

    let type_found = resource_type.type_name();
    let resource_type = resource_type.try_cast::<ImmutableString>().ok_or_else(|| {
        format!(
            "{}: argument 'type' must be a string, got {}",
            CONSTRUCTOR, type_found
        )
    })?;

    let labels_found = labels.type_name();
    let labels = labels.try_cast::<Map>().ok_or_else(|| {
        format!(
            "{}: argument 'labels' must be a map, got {}",
            CONSTRUCTOR, labels_found
        )
    })?;

    construct(resource_type, labels)
}

/// Classify an evaluation failure, looking through function-call wrappers.
fn invocation_error(err: EvalAltResult) -> ScriptInvocationError {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => invocation_error(*inner),
        EvalAltResult::ErrorTooManyOperations(_)
        | EvalAltResult::ErrorStackOverflow(_)
        | EvalAltResult::ErrorDataTooLarge(..) => ScriptInvocationError::BudgetExceeded {
            message: err.to_string(),
        },
        EvalAltResult::ErrorRuntime(ref value, _) if value.is::<LabelTypeError>() => {
            let LabelTypeError { key, found } = value.clone_cast::<LabelTypeError>();
            ScriptInvocationError::InvalidLabel { key, found }
        }
        other => ScriptInvocationError::Runtime {
            message: other.to_string(),
        },
    }
}
