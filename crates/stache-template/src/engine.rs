/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Rendering engine and the process-wide default instance.
//!
//! An [`Engine`] owns a [`ParseCache`] and the options every render goes
//! through. The crate-root functions ([`parse`], [`render`],
//! [`clear_cache`], ...) use a lazily created default engine.

use crate::ast::Delimiters;
use crate::cache::ParseCache;
use crate::context::Value;
use crate::error::TemplateResult;
use crate::eval_context::EvalContext;
use crate::evaluator::render_nodes;
use crate::parser::Template;
use crate::resolver::{NullResolver, PartialResolver};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::sync::Arc;

/// Default limit on nested sections, partials and lambda renders.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How escaped interpolations (`{{name}}`) are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Encode `& < > " '` as HTML entities.
    #[default]
    Html,
    /// Output text unchanged (for non-HTML output such as plain text).
    None,
}

impl EscapeMode {
    pub fn escape<'t>(self, text: &'t str) -> Cow<'t, str> {
        match self {
            EscapeMode::Html => escape_html(text),
            EscapeMode::None => Cow::Borrowed(text),
        }
    }
}

/// Encode the five HTML-significant characters.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Delimiters templates and partials start with.
    pub delimiters: Delimiters,
    pub escape: EscapeMode,
    /// Maximum nesting of sections, partials and lambda renders.
    pub max_depth: usize,
    /// When `false`, every parse goes straight to the parser.
    pub cache_enabled: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            escape: EscapeMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            cache_enabled: true,
        }
    }
}

/// A template engine: options plus a parse cache.
#[derive(Debug, Default)]
pub struct Engine {
    options: EngineOptions,
    cache: ParseCache,
}

impl Engine {
    /// Create an engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            cache: ParseCache::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// Parse `source` with the engine's delimiters, consulting the cache.
    pub fn parse(&self, source: &str) -> TemplateResult<Arc<Template>> {
        self.parse_with_delimiters(source, &self.options.delimiters)
    }

    /// Parse `source` starting with the given delimiters, consulting the
    /// cache.
    pub fn parse_with_delimiters(
        &self,
        source: &str,
        delimiters: &Delimiters,
    ) -> TemplateResult<Arc<Template>> {
        if self.options.cache_enabled {
            self.cache.get_or_parse(source, delimiters)
        } else {
            Template::compile_with_delimiters(source, delimiters).map(Arc::new)
        }
    }

    /// Render template text against `data`, with no partials.
    pub fn render(&self, source: &str, data: &Value) -> TemplateResult<String> {
        self.render_with_partials(source, data, &NullResolver)
    }

    /// Render template text against `data`, resolving `{{> name}}` through
    /// `partials`.
    pub fn render_with_partials(
        &self,
        source: &str,
        data: &Value,
        partials: &dyn PartialResolver,
    ) -> TemplateResult<String> {
        let template = self.parse(source)?;
        self.render_template(&template, data, partials)
    }

    /// Render an already parsed template.
    pub fn render_template(
        &self,
        template: &Template,
        data: &Value,
        partials: &dyn PartialResolver,
    ) -> TemplateResult<String> {
        let mut ctx = EvalContext::new(self, partials);
        render_nodes(template.nodes(), data, &mut ctx)
    }

    /// Empty this engine's parse cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// The process-wide engine behind the crate-root functions.
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Parse (or fetch from the default cache) a template using `{{ }}`.
pub fn parse(source: &str) -> TemplateResult<Arc<Template>> {
    DEFAULT_ENGINE.parse(source)
}

/// Parse (or fetch from the default cache) a template starting with the
/// given delimiters.
pub fn parse_with_delimiters(
    source: &str,
    delimiters: &Delimiters,
) -> TemplateResult<Arc<Template>> {
    DEFAULT_ENGINE.parse_with_delimiters(source, delimiters)
}

/// Render template text with the default engine.
pub fn render(source: &str, data: &Value) -> TemplateResult<String> {
    DEFAULT_ENGINE.render(source, data)
}

/// Render template text with the default engine and a partial resolver.
pub fn render_with_partials(
    source: &str,
    data: &Value,
    partials: &dyn PartialResolver,
) -> TemplateResult<String> {
    DEFAULT_ENGINE.render_with_partials(source, data, partials)
}

/// Empty the default engine's parse cache.
pub fn clear_cache() {
    DEFAULT_ENGINE.clear_cache();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_mode_none() {
        assert_eq!(EscapeMode::None.escape("<b>"), "<b>");
    }

    #[test]
    fn test_engine_renders_and_caches() {
        let engine = Engine::new();
        let data = Value::from(json!({"name": "Dani"}));

        assert_eq!(engine.render("Hello {{name}}", &data).unwrap(), "Hello Dani");
        assert_eq!(engine.cache().len(), 1);
        assert_eq!(engine.render("Hello {{name}}", &data).unwrap(), "Hello Dani");
        assert_eq!(engine.cache().len(), 1);

        engine.clear_cache();
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_engine_without_cache() {
        let engine = Engine::with_options(EngineOptions {
            cache_enabled: false,
            ..EngineOptions::default()
        });
        let data = Value::from(json!({"x": 1}));
        assert_eq!(engine.render("{{x}}", &data).unwrap(), "1");
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_engine_custom_delimiters() {
        let engine = Engine::with_options(EngineOptions {
            delimiters: Delimiters::new("<%", "%>"),
            ..EngineOptions::default()
        });
        let data = Value::from(json!({"x": "y"}));
        assert_eq!(engine.render("<% x %> {{x}}", &data).unwrap(), "y {{x}}");
    }

    #[test]
    fn test_engine_plain_text_escape() {
        let engine = Engine::with_options(EngineOptions {
            escape: EscapeMode::None,
            ..EngineOptions::default()
        });
        let data = Value::from(json!({"x": "<b>"}));
        assert_eq!(engine.render("{{x}}", &data).unwrap(), "<b>");
    }

    #[test]
    fn test_parsed_tree_renders_like_text() {
        let engine = Engine::new();
        let data = Value::from(json!({"a": {"b": "v"}}));
        let template = engine.parse("{{a.b}}!").unwrap();
        assert_eq!(
            engine
                .render_template(&template, &data, &NullResolver)
                .unwrap(),
            engine.render("{{a.b}}!", &data).unwrap()
        );
    }
}
