//! monres Common Library
//!
//! This crate provides the shared data model and utilities for monitored-resource mapping:
//!
//! - [`attributes`] - Read-only view over a resource's attributes (`AttributeView`)
//! - [`resource`] - The monitored-resource identity (`MonitoredResource`, `Labels`)
//! - [`sanitize`] - UTF-8 sanitization of label values
//! - [`semconv`] - Well-known resource attribute keys
//! - [`logging`] - Logging configuration and subscriber setup
//! - [`error`] - Error types

pub mod attributes;
pub mod error;
pub mod logging;
pub mod resource;
pub mod sanitize;
pub mod semconv;

// Re-export commonly used types at the crate root
pub use attributes::{AttributeIter, AttributeView};
pub use error::{Error, Result};
pub use logging::{LogFormat, LoggingConfig, init_tracing};
pub use resource::{Labels, MonitoredResource};
pub use sanitize::sanitize_utf8;
