//! Error types for the mapping engine.
//!
//! Setup failures ([`ConfigError`]) reject the configuration. Per-resource
//! failures ([`MappingError`]) are scoped to the resource being mapped.

use thiserror::Error;

/// Configuration-time errors. The pipeline must not start when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid resource filter (prefix '{prefix}', regex '{regex}'): {source}")]
    InvalidFilter {
        prefix: String,
        regex: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid resource mapping script: {0}")]
    Script(#[from] ScriptCompileError),
}

/// Errors raised while loading a resource mapping script.
#[derive(Debug, Clone, Error)]
pub enum ScriptCompileError {
    #[error("failed to parse script: {0}")]
    Parse(String),

    #[error("script failed while loading: {0}")]
    Load(String),

    #[error("script did not declare a function named {name}")]
    MissingFunction { name: String },

    #[error("function {name} must take exactly one argument, found {params}")]
    WrongArity { name: String, params: usize },
}

/// Failure reported by the resource classification collaborator.
#[derive(Debug, Clone)]
pub struct ClassificationError {
    /// Resource type the classifier was attempting, if known.
    pub resource_type: Option<String>,
    /// Description of the failure.
    pub message: String,
}

impl std::fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.resource_type {
            Some(t) => write!(f, "failed to classify resource as {}: {}", t, self.message),
            None => write!(f, "failed to classify resource: {}", self.message),
        }
    }
}

impl std::error::Error for ClassificationError {}

impl ClassificationError {
    /// Create a classification error with no resource type context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            resource_type: None,
            message: message.into(),
        }
    }

    /// Attach the resource type being attempted.
    pub fn for_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }
}

/// Per-call failure of a scripted mapping.
#[derive(Debug, Clone, Error)]
pub enum ScriptInvocationError {
    #[error("script raised an error: {message}")]
    Runtime { message: String },

    #[error("script exceeded its execution budget: {message}")]
    BudgetExceeded { message: String },

    #[error("map_resource must return a MonitoredResource, got {found}")]
    InvalidReturn { found: String },

    #[error("label '{key}' must be a string, got {found}")]
    InvalidLabel { key: String, found: String },

    #[error("invalid monitored resource: {reason}")]
    InvalidResource { reason: String },
}

/// Error returned by a single `map` call.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Script(#[from] ScriptInvocationError),
}
