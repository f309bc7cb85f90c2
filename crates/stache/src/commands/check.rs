/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Check command implementation
 */

//! Check command implementation.
//!
//! `stache check` parses each template and prints a source-annotated report
//! for every syntax error. The command fails if any template does.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use stache_template::{Delimiters, Template, render_error};

use super::parse_delimiters;

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    /// Template files
    pub templates: Vec<PathBuf>,
    /// Starting delimiters
    pub delimiters: Option<String>,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let delimiters = parse_delimiters(args.delimiters.as_deref())?;

    let mut failed = 0;
    for path in &args.templates {
        match check_file(path, &delimiters)? {
            None => info!("{}: ok", path.display()),
            Some(report) => {
                eprintln!("{report}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} templates have syntax errors",
            failed,
            args.templates.len()
        );
    }
    Ok(())
}

/// Parse one template file, returning a rendered report if it is malformed.
pub fn check_file(path: &Path, delimiters: &Delimiters) -> Result<Option<String>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;

    Ok(Template::compile_with_delimiters(&source, delimiters)
        .err()
        .map(|e| render_error(&e, &path.display().to_string(), &source, false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_valid_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ok.mustache");
        fs::write(&path, "{{#a}}{{b}}{{/a}}").unwrap();

        assert!(check_file(&path, &Delimiters::default()).unwrap().is_none());
    }

    #[test]
    fn test_check_reports_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.mustache");
        fs::write(&path, "{{#a}}\n{{/b}}\n").unwrap();

        let report = check_file(&path, &Delimiters::default())
            .unwrap()
            .expect("report");
        assert!(report.contains("bad.mustache"));
        assert!(report.contains("{{/b}}"));
    }

    #[test]
    fn test_check_respects_delimiters() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.mustache");
        fs::write(&path, "<%#a%>{{#b}}<%/a%>").unwrap();

        assert!(check_file(&path, &Delimiters::default()).unwrap().is_some());
        assert!(
            check_file(&path, &Delimiters::new("<%", "%>"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_check_reports_excessive_nesting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep.mustache");
        let levels = 12_000;
        let source = format!("{}{}", "{{#a}}".repeat(levels), "{{/a}}".repeat(levels));
        fs::write(&path, source).unwrap();

        let report = check_file(&path, &Delimiters::default())
            .unwrap()
            .expect("report");
        assert!(report.contains("nested deeper than"));
        assert!(report.contains("deep.mustache"));
    }

    #[test]
    fn test_execute_fails_on_any_error() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.mustache");
        let bad = temp.path().join("bad.mustache");
        fs::write(&good, "hi").unwrap();
        fs::write(&bad, "{{x").unwrap();

        let result = execute(CheckArgs {
            templates: vec![good.clone(), bad],
            delimiters: None,
        });
        assert!(result.is_err());

        execute(CheckArgs {
            templates: vec![good],
            delimiters: None,
        })
        .unwrap();
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(check_file(&temp.path().join("nope"), &Delimiters::default()).is_err());
    }
}
