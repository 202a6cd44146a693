//! Command-line resource mapper.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use anyhow::Context;
use clap::Parser;
use serde_json::{Value, json};
use tracing::{info, warn};

use monres_mapper::{MapperConfig, ResourceMapper};

/// Map resource attributes to monitored-resource identities.
#[derive(Parser, Debug)]
#[command(name = "monres-mapper")]
#[command(about = "Map resource attributes to monitored-resource identities")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// JSON array of attribute objects, or "-" for stdin.
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Mapping script file (switches to script mode, overrides config).
    #[arg(long)]
    script: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides config.
    #[arg(long)]
    log_level: Option<String>,
}

fn read_input(input: &str) -> anyhow::Result<Vec<BTreeMap<String, String>>> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    let resources: Vec<BTreeMap<String, Value>> =
        json5::from_str(&content).context("Input must be an array of attribute objects")?;

    Ok(resources
        .into_iter()
        .map(|attrs| {
            attrs
                .into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k, s),
                    other => (k, other.to_string()),
                })
                .collect()
        })
        .collect())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        MapperConfig::load_from_file(config_path)?
    } else {
        MapperConfig::default()
    };

    // Apply CLI overrides
    if let Some(script) = &args.script {
        config.resource_mapping.use_script_file(script);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    monres_common::init_tracing(&config.logging)?;

    let mapper = ResourceMapper::from_config(&config.resource_mapping)?;
    let resources = read_input(&args.input)?;

    info!(
        mode = %mapper.mode(),
        resources = resources.len(),
        "Mapping resources"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (index, attrs) in resources.iter().enumerate() {
        let resource = match mapper.map(attrs) {
            Ok(resource) => resource,
            Err(e) => {
                warn!(index, error = %e, "Skipping resource");
                continue;
            }
        };

        let line = json!({
            "index": index,
            "monitored_resource": resource,
            "resource_labels": mapper.resource_labels(attrs),
        });
        writeln!(out, "{}", line)?;
    }

    let stats = mapper.stats();
    info!(
        resources_mapped = stats.resources_mapped,
        mapping_errors = stats.mapping_errors,
        "Mapping complete"
    );

    Ok(())
}
