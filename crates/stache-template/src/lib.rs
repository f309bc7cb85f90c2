/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Logic-less Mustache template engine.
//!
//! This crate parses Mustache template text into a node tree and renders it
//! against a stack of data scopes. It supports:
//!
//! - Variable interpolation: `{{name}}` (HTML-escaped)
//! - Raw interpolation: `{{{name}}}` or `{{& name}}`
//! - Dotted names and the implicit iterator: `{{person.name}}`, `{{.}}`
//! - Sections: `{{#items}}...{{/items}}` (lists, objects, truthy values, lambdas)
//! - Inverted sections: `{{^items}}...{{/items}}`
//! - Partials: `{{> header}}`, indented when standalone
//! - Delimiter changes: `{{=<% %>=}}`
//! - Comments: `{{! ignored }}`
//!
//! # Architecture
//!
//! Parsing and rendering are separate steps. [`parse`] produces an immutable
//! [`Template`] that is memoized in a [`ParseCache`] keyed by source text and
//! starting delimiters; [`render`] walks the tree with a [`ContextStack`]
//! built over a [`Value`]. An [`Engine`] bundles options with its own cache;
//! the crate-root functions share a process-wide default engine.
//!
//! # Example
//!
//! ```ignore
//! use stache_template::{MemoryResolver, Value, render, render_with_partials};
//! use serde_json::json;
//!
//! let data = Value::from(json!({"name": "Dani"}));
//! assert_eq!(render("Hello {{name}}", &data)?, "Hello Dani");
//!
//! let partials = MemoryResolver::with_partials([("footer", "Powered by {{name}}")]);
//! let output = render_with_partials("{{> footer}}", &data, &partials)?;
//! assert_eq!(output, "Powered by Dani");
//! ```

pub mod ast;
pub mod cache;
pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod eval_context;
pub mod evaluator;
pub mod parser;
pub mod resolver;

// Re-export main types at crate root
pub use ast::{
    Comment, DelimiterChange, Delimiters, Partial, Section, TemplateNode, Text, Variable,
};
pub use cache::ParseCache;
pub use context::{ContextStack, RenderFn, SectionLambda, SimpleLambda, Value};
pub use diagnostic::render_error;
pub use engine::{
    Engine, EngineOptions, EscapeMode, clear_cache, default_engine, escape_html, parse,
    parse_with_delimiters, render, render_with_partials,
};
pub use error::{SourceLocation, TemplateError, TemplateResult};
pub use eval_context::EvalContext;
pub use parser::{MAX_NESTING_DEPTH, Template};
pub use resolver::{FileSystemResolver, MemoryResolver, NullResolver, PartialResolver};
