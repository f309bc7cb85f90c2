/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! This module implements `stache render`, which renders one template file
//! against a JSON or YAML data file. Partials are loaded from a directory
//! (by default the template's own), using the template's file extension.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use stache_template::{Engine, EngineOptions, EscapeMode, FileSystemResolver, Value, render_error};

use super::parse_delimiters;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,
    /// JSON or YAML data file
    pub data: Option<PathBuf>,
    /// Partials directory
    pub partials: Option<PathBuf>,
    /// Starting delimiters
    pub delimiters: Option<String>,
    /// Disable HTML escaping
    pub no_escape: bool,
    /// Output file path
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let output = render_to_string(&args)?;

    match &args.output {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        _ => print!("{output}"),
    }
    Ok(())
}

/// Render the template named by `args` and return the output text.
pub fn render_to_string(args: &RenderArgs) -> Result<String> {
    let source = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;

    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => Value::Map(Default::default()),
    };

    let engine = Engine::with_options(EngineOptions {
        delimiters: parse_delimiters(args.delimiters.as_deref())?,
        escape: if args.no_escape {
            EscapeMode::None
        } else {
            EscapeMode::Html
        },
        ..EngineOptions::default()
    });

    let partials = match &args.partials {
        Some(dir) => {
            let extension = args
                .template
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            FileSystemResolver::new(dir).with_extension(extension)
        }
        None => FileSystemResolver::for_template(&args.template),
    };

    debug!("Rendering: {}", args.template.display());
    engine
        .render_with_partials(&source, &data, &partials)
        .map_err(|e| {
            let name = args.template.display().to_string();
            anyhow::anyhow!("{}", render_error(&e, &name, &source, false))
        })
}

/// Load render data from a JSON or YAML file.
///
/// The format is chosen by extension; files with any other extension are
/// tried as JSON and then as YAML.
pub fn load_data(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;

    let json: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
        _ => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => serde_yaml::from_str(&text).with_context(|| {
                format!("Data file {} is neither JSON nor YAML", path.display())
            })?,
        },
    };
    Ok(Value::from(json))
}
