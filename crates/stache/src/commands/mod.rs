//! Command implementations for the Stache CLI
//!
//! Each command module handles the CLI interface and delegates to
//! stache-template for parsing and rendering.

pub mod check;
pub mod render;

use anyhow::{Result, anyhow};
use stache_template::Delimiters;

/// Parse a `--delimiters` argument, falling back to `{{ }}`.
pub fn parse_delimiters(spec: Option<&str>) -> Result<Delimiters> {
    match spec {
        None => Ok(Delimiters::default()),
        Some(spec) => Delimiters::parse(spec).ok_or_else(|| {
            anyhow!(
                "Invalid delimiters '{}': expected two tokens separated by whitespace, without '='",
                spec
            )
        }),
    }
}
