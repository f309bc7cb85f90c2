/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template resolution.
//!
//! This module provides the trait the evaluator uses to look up `{{> name}}`
//! partials, and implementations backed by memory, the filesystem, or
//! nothing at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default file extension for templates and partials on disk.
pub const DEFAULT_EXTENSION: &str = "mustache";

/// Trait for loading partial templates.
///
/// Returning `None` means the partial does not exist; the evaluator renders
/// nothing in its place.
pub trait PartialResolver {
    /// Load a partial template's source text by name.
    fn get_partial(&self, name: &str) -> Option<String>;
}

/// Resolver that returns nothing.
///
/// Use this resolver when rendering templates that don't use partials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Resolver that loads partials from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    partials: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial to the resolver.
    ///
    /// The name should match what will be used in the template (e.g., "header").
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    /// Create a resolver with the given partials.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in partials {
            resolver.add(name, content);
        }
        resolver
    }
}

impl PartialResolver for MemoryResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.partials.get(name).cloned()
    }
}

impl From<HashMap<String, String>> for MemoryResolver {
    fn from(partials: HashMap<String, String>) -> Self {
        Self { partials }
    }
}

impl<F> PartialResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get_partial(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Resolver that loads partials from files in a directory.
///
/// Path resolution:
/// - If the partial name has no extension, the resolver's extension is added
/// - If the partial name has an extension, it is used as-is
/// - Names are resolved relative to the resolver's directory
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    dir: PathBuf,
    extension: String,
}

impl FileSystemResolver {
    /// Resolve partials as `<dir>/<name>.mustache`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Resolve partials next to `template_path`, using its extension.
    pub fn for_template(template_path: &Path) -> Self {
        let dir = template_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let extension = template_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::new(dir).with_extension(extension)
    }

    /// Use a different extension for names that have none. An empty
    /// extension means names are used verbatim.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The file a partial name maps to.
    pub fn partial_path(&self, name: &str) -> PathBuf {
        resolve_partial_path(name, &self.dir, &self.extension)
    }
}

impl PartialResolver for FileSystemResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        let path = self.partial_path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::trace!(partial = name, path = %path.display(), error = %e, "Partial not loaded");
                None
            }
        }
    }
}

/// Resolve the path to a partial file.
///
/// # Examples
///
/// ```ignore
/// // Dir: /templates, ext: mustache, Partial: "header" → /templates/header.mustache
/// // Dir: /templates, ext: mustache, Partial: "header.html" → /templates/header.html
/// // Dir: /templates, ext: mustache, Partial: "inc/header" → /templates/inc/header.mustache
/// ```
pub fn resolve_partial_path(partial_name: &str, dir: &Path, extension: &str) -> PathBuf {
    let path = dir.join(partial_name);
    if Path::new(partial_name).extension().is_some() || extension.is_empty() {
        path
    } else {
        path.with_extension(extension)
    }
}

/// Prefix every line of `content` with `indent`.
///
/// A trailing newline does not start a new (indented) line.
pub fn indent_lines(content: &str, indent: &str) -> String {
    if indent.is_empty() {
        return content.to_string();
    }
    let mut result = String::with_capacity(content.len() + indent.len());
    for line in content.split_inclusive('\n') {
        result.push_str(indent);
        result.push_str(line);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_partial_path_no_extension() {
        let result = resolve_partial_path("header", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/header.mustache"));
    }

    #[test]
    fn test_resolve_partial_path_with_extension() {
        let result = resolve_partial_path("header.html", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/header.html"));
    }

    #[test]
    fn test_resolve_partial_path_subdirectory() {
        let result = resolve_partial_path("inc/header", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/inc/header.mustache"));
    }

    #[test]
    fn test_resolve_partial_path_no_extension_configured() {
        let result = resolve_partial_path("header", Path::new("/templates"), "");
        assert_eq!(result, PathBuf::from("/templates/header"));
    }

    #[test]
    fn test_for_template_uses_template_extension() {
        let resolver = FileSystemResolver::for_template(Path::new("/site/page.html"));
        assert_eq!(
            resolver.partial_path("nav"),
            PathBuf::from("/site/nav.html")
        );
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\nb\n", "  "), "  a\n  b\n");
        assert_eq!(indent_lines("a\nb", "  "), "  a\n  b");
        assert_eq!(indent_lines("a", ""), "a");
        assert_eq!(indent_lines("", "  "), "");
    }

    #[test]
    fn test_null_resolver() {
        assert!(NullResolver.get_partial("anything").is_none());
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new();
        resolver.add("header", "<h1>{{title}}</h1>");
        resolver.add("footer", "<footer>End</footer>");

        assert_eq!(
            resolver.get_partial("header"),
            Some("<h1>{{title}}</h1>".to_string())
        );
        assert_eq!(
            resolver.get_partial("footer"),
            Some("<footer>End</footer>".to_string())
        );
        assert!(resolver.get_partial("missing").is_none());
    }

    #[test]
    fn test_memory_resolver_with_partials() {
        let resolver = MemoryResolver::with_partials([("a", "content a"), ("b", "content b")]);

        assert_eq!(resolver.get_partial("a"), Some("content a".to_string()));
        assert_eq!(resolver.get_partial("b"), Some("content b".to_string()));
    }

    #[test]
    fn test_memory_resolver_from_hash_map() {
        let mut partials = HashMap::new();
        partials.insert("x".to_string(), "X".to_string());
        let resolver = MemoryResolver::from(partials);
        assert_eq!(resolver.get_partial("x"), Some("X".to_string()));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| (name == "dynamic").then(|| format!("<{name}>"));
        assert_eq!(resolver.get_partial("dynamic"), Some("<dynamic>".to_string()));
        assert!(resolver.get_partial("other").is_none());
    }

    #[test]
    fn test_file_system_resolver() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("footer.mustache"), "Powered by {{name}}\n").unwrap();

        let resolver = FileSystemResolver::new(dir.path());
        assert_eq!(
            resolver.get_partial("footer"),
            Some("Powered by {{name}}\n".to_string())
        );
        assert!(resolver.get_partial("missing").is_none());
    }
}
