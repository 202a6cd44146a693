//! Monitored-resource mapping engine.
//!
//! Converts a resource's attributes into the identity a monitoring backend
//! files its time series under, and selects which attributes are kept as
//! exported labels.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────┐
//!              ┌────>│  LabelSelector   │────> resource labels
//! ┌──────────┐ │     └──────────────────┘
//! │ resource │─┤     ┌──────────────────┐
//! │  attrs   │ └────>│ DefaultMapper or │────> MonitoredResource
//! └──────────┘       │  ScriptedMapper  │
//!                    └──────────────────┘
//! ```
//!
//! # Mapping paths
//!
//! - **default**: a [`ResourceClassifier`] picks the resource type and labels,
//!   then every label value is sanitized to valid UTF-8.
//! - **script**: a user script declaring `fn map_resource(attrs)` runs in a
//!   bounded Rhai sandbox for every resource.
//!
//! # Configuration
//!
//! See [`config::MapperConfig`] for configuration options.

pub mod classify;
pub mod config;
pub mod default_mapper;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod script;

pub use classify::{GcmClassifier, ResourceClassifier};
pub use config::{MapperConfig, ResourceMappingConfig};
pub use default_mapper::DefaultMapper;
pub use error::{
    ClassificationError, ConfigError, MappingError, ScriptCompileError, ScriptInvocationError,
};
pub use filter::{LabelSelector, ResourceFilter};
pub use mapper::{MapResource, MapperStatsSnapshot, MappingMode, ResourceMapper};
pub use script::{RhaiEngine, SandboxLimits, ScriptEngine, ScriptedMapper};
