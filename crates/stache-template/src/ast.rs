/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! This module defines the node tree produced by the parser. Each node
//! records where its tag started so errors and tooling can point back into
//! the template source.

use crate::error::SourceLocation;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// The pair of tokens that open and close a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parse a delimiter specification such as `"<% %>"`.
    ///
    /// The text must contain exactly two whitespace-separated
    /// tokens, neither of which may contain `=`.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let open = parts.next()?;
        let close = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let delimiters = Self::new(open, close);
        delimiters.is_valid().then_some(delimiters)
    }

    /// Whether both tokens are non-empty and free of whitespace and `=`.
    pub fn is_valid(&self) -> bool {
        let valid = |token: &str| {
            !token.is_empty() && !token.chars().any(|c| c.is_whitespace() || c == '=')
        };
        valid(&self.open) && valid(&self.close)
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text to be output as-is.
    Text(Text),

    /// Variable interpolation: `{{name}}`, `{{{name}}}` or `{{&name}}`
    Variable(Variable),

    /// Section: `{{#name}}...{{/name}}` or inverted `{{^name}}...{{/name}}`
    Section(Section),

    /// Partial inclusion: `{{> name}}`
    Partial(Partial),

    /// Comment (not rendered): `{{! comment}}`
    Comment(Comment),

    /// Delimiter change: `{{=<% %>=}}`
    DelimiterChange(DelimiterChange),
}

impl TemplateNode {
    /// Location of the tag (or text run) this node came from.
    pub fn location(&self) -> SourceLocation {
        match self {
            TemplateNode::Text(n) => n.location,
            TemplateNode::Variable(n) => n.location,
            TemplateNode::Section(n) => n.location,
            TemplateNode::Partial(n) => n.location,
            TemplateNode::Comment(n) => n.location,
            TemplateNode::DelimiterChange(n) => n.location,
        }
    }
}

/// Literal text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub location: SourceLocation,
}

/// Variable interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Name as written, e.g. `person.name` or `.`.
    pub name: String,
    /// Whether the rendered value is HTML-escaped.
    pub escaped: bool,
    pub location: SourceLocation,
}

/// A section block.
#[derive(Clone)]
pub struct Section {
    pub name: String,
    /// `true` for `{{^name}}` blocks.
    pub inverted: bool,
    pub children: Vec<TemplateNode>,
    /// Byte range of the unrendered text between the open and close tags.
    pub raw: Range<usize>,
    /// The whole template source, shared by every section of one parse.
    pub source: Arc<str>,
    /// Delimiters active at the open tag; used when a lambda renders text.
    pub delimiters: Delimiters,
    pub location: SourceLocation,
}

impl Section {
    /// The unrendered text between the open and close tags. Section lambdas
    /// receive this text.
    pub fn raw_text(&self) -> &str {
        self.source.get(self.raw.clone()).unwrap_or_default()
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.name)
            .field("inverted", &self.inverted)
            .field("children", &self.children)
            .field("raw", &self.raw)
            .field("delimiters", &self.delimiters)
            .field("location", &self.location)
            .finish()
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.inverted == other.inverted
            && self.delimiters == other.delimiters
            && self.location == other.location
            && self.raw_text() == other.raw_text()
            && self.children == other.children
    }
}

/// Partial inclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub name: String,
    /// Whitespace preceding a standalone partial tag. Prefixed to every line
    /// of the partial when it is rendered.
    pub indent: String,
    pub location: SourceLocation,
}

/// Comment (not rendered).
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub location: SourceLocation,
}

/// Delimiter change directive.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimiterChange {
    /// The delimiters in effect after this directive.
    pub delimiters: Delimiters,
    pub location: SourceLocation,
}
