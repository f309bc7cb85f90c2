/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! A single left-to-right scan over the source. Text up to the next open
//! delimiter becomes a [`Text`] node; the tag that follows is classified by
//! its sigil. Sections are built with an explicit stack of open sections,
//! so nesting depth never grows the native call stack during parsing.

use crate::ast::{
    Comment, DelimiterChange, Delimiters, Partial, Section, TemplateNode, Text, Variable,
};
use crate::error::{SourceLocation, TemplateError, TemplateResult};
use std::path::Path;
use std::sync::Arc;

/// Deepest section nesting the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 512;

/// A compiled template ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The parsed template AST.
    pub(crate) nodes: Vec<TemplateNode>,

    /// Original source, shared with the sections parsed from it.
    pub(crate) source: Arc<str>,

    /// Delimiters in effect at the start of the source.
    pub(crate) delimiters: Delimiters,
}

impl Template {
    /// Compile a template from source text using the default `{{ }}`
    /// delimiters.
    ///
    /// This does not consult the parse cache; see [`crate::parse`] for the
    /// cached entry point.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        Self::compile_with_delimiters(source, &Delimiters::default())
    }

    /// Compile a template whose first tag uses the given delimiters.
    pub fn compile_with_delimiters(source: &str, delimiters: &Delimiters) -> TemplateResult<Self> {
        let source: Arc<str> = Arc::from(source);
        let nodes = parse_shared(Arc::clone(&source), delimiters)?;
        Ok(Template {
            nodes,
            source,
            delimiters: delimiters.clone(),
        })
    }

    /// Read and compile a template file.
    pub fn compile_from_file(path: &Path) -> TemplateResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::compile(&source)
    }

    /// Get the AST nodes of this template.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// The source text this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The delimiters the source was parsed with.
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }
}

/// Parse template source into a node tree.
pub fn parse(source: &str, delimiters: &Delimiters) -> TemplateResult<Vec<TemplateNode>> {
    parse_shared(Arc::from(source), delimiters)
}

fn parse_shared(source: Arc<str>, delimiters: &Delimiters) -> TemplateResult<Vec<TemplateNode>> {
    Parser::new(&source, Arc::clone(&source), delimiters.clone()).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Variable { escaped: bool },
    SectionOpen { inverted: bool },
    SectionClose,
    Partial,
    Comment,
    DelimiterChange,
}

impl TagKind {
    /// Variables are never standalone; every other tag kind is.
    fn can_be_standalone(self) -> bool {
        !matches!(self, TagKind::Variable { .. })
    }
}

/// A scanned tag. `start` is the offset of the open delimiter and `end` the
/// offset just past the close delimiter.
#[derive(Debug)]
struct Tag<'s> {
    kind: TagKind,
    content: &'s str,
    start: usize,
    end: usize,
}

/// A section whose close tag has not been seen yet.
struct OpenSection {
    name: String,
    inverted: bool,
    location: SourceLocation,
    inner_start: usize,
    delimiters: Delimiters,
    /// Nodes of the enclosing block, restored when the section closes.
    parent: Vec<TemplateNode>,
}

struct Parser<'s> {
    source: &'s str,
    /// Owned handle to `source`, cloned into each section.
    shared: Arc<str>,
    delimiters: Delimiters,
    /// Offsets at which each line begins.
    line_starts: Vec<usize>,
    pos: usize,
    /// Start of the line `pos` is on.
    line_start: usize,
    /// Whether a tag has already been seen on the current line.
    line_has_tag: bool,
    nodes: Vec<TemplateNode>,
    open: Vec<OpenSection>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, shared: Arc<str>, delimiters: Delimiters) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            shared,
            delimiters,
            line_starts,
            pos: 0,
            line_start: 0,
            line_has_tag: false,
            nodes: Vec::new(),
            open: Vec::new(),
        }
    }

    fn run(mut self) -> TemplateResult<Vec<TemplateNode>> {
        while let Some(found) = self.source[self.pos..].find(self.delimiters.open.as_str()) {
            let tag_start = self.pos + found;
            let tag = self.read_tag(tag_start)?;

            if let Some(newline) = self.source[self.pos..tag_start].rfind('\n') {
                self.line_start = self.pos + newline + 1;
                self.line_has_tag = false;
            }

            if tag.kind.can_be_standalone() && self.is_standalone(&tag) {
                let source = self.source;
                let indent = &source[self.line_start..tag.start];
                self.push_text(self.pos, self.line_start);
                self.pos = self.end_of_line(tag.end);
                self.line_start = self.pos;
                self.line_has_tag = false;
                self.apply_tag(tag, indent)?;
            } else {
                self.push_text(self.pos, tag.start);
                self.pos = tag.end;
                self.line_has_tag = true;
                self.apply_tag(tag, "")?;
            }
        }

        self.push_text(self.pos, self.source.len());

        if let Some(open) = self.open.pop() {
            return Err(TemplateError::UnclosedSection {
                name: open.name,
                location: open.location,
            });
        }
        Ok(self.nodes)
    }

    /// Scan the tag whose open delimiter starts at `start`.
    fn read_tag(&self, start: usize) -> TemplateResult<Tag<'s>> {
        let source = self.source;
        let after_open = start + self.delimiters.open.len();
        let close = self.delimiters.close.as_str();

        let (kind, body_start, close_token) = match source[after_open..].chars().next() {
            Some('{') => (
                TagKind::Variable { escaped: false },
                after_open + 1,
                format!("}}{close}"),
            ),
            Some('&') => (
                TagKind::Variable { escaped: false },
                after_open + 1,
                close.to_string(),
            ),
            Some('#') => (
                TagKind::SectionOpen { inverted: false },
                after_open + 1,
                close.to_string(),
            ),
            Some('^') => (
                TagKind::SectionOpen { inverted: true },
                after_open + 1,
                close.to_string(),
            ),
            Some('/') => (TagKind::SectionClose, after_open + 1, close.to_string()),
            Some('!') => (TagKind::Comment, after_open + 1, close.to_string()),
            Some('>') => (TagKind::Partial, after_open + 1, close.to_string()),
            Some('=') => (TagKind::DelimiterChange, after_open + 1, format!("={close}")),
            _ => (
                TagKind::Variable { escaped: true },
                after_open,
                close.to_string(),
            ),
        };

        let close_at = source[body_start..]
            .find(close_token.as_str())
            .map(|i| body_start + i)
            .ok_or_else(|| TemplateError::UnclosedTag {
                location: self.location(start),
            })?;

        let content = source[body_start..close_at].trim();
        if content.is_empty() && kind != TagKind::Comment {
            return Err(TemplateError::EmptyTag {
                location: self.location(start),
            });
        }

        Ok(Tag {
            kind,
            content,
            start,
            end: close_at + close_token.len(),
        })
    }

    /// A tag is standalone when it is the only tag on its line and is
    /// surrounded by nothing but horizontal whitespace.
    fn is_standalone(&self, tag: &Tag<'_>) -> bool {
        if self.line_has_tag {
            return false;
        }
        let before = &self.source[self.line_start..tag.start];
        let rest = &self.source[tag.end..];
        let after = &rest[..rest.find('\n').unwrap_or(rest.len())];
        is_blank(before) && is_blank(after.strip_suffix('\r').unwrap_or(after))
    }

    /// Offset just past the newline ending the line that contains `offset`.
    fn end_of_line(&self, offset: usize) -> usize {
        self.source[offset..]
            .find('\n')
            .map_or(self.source.len(), |i| offset + i + 1)
    }

    fn location(&self, offset: usize) -> SourceLocation {
        let line = self.line_starts.partition_point(|&s| s <= offset);
        let line_start = self.line_starts[line - 1];
        SourceLocation {
            offset,
            line,
            column: self.source[line_start..offset].chars().count() + 1,
        }
    }

    fn push_text(&mut self, start: usize, end: usize) {
        if start < end {
            self.nodes.push(TemplateNode::Text(Text {
                text: self.source[start..end].to_string(),
                location: self.location(start),
            }));
        }
    }

    fn apply_tag(&mut self, tag: Tag<'s>, indent: &str) -> TemplateResult<()> {
        let location = self.location(tag.start);
        match tag.kind {
            TagKind::Variable { escaped } => {
                self.nodes.push(TemplateNode::Variable(Variable {
                    name: tag.content.to_string(),
                    escaped,
                    location,
                }));
            }

            TagKind::SectionOpen { inverted } => {
                if self.open.len() >= MAX_NESTING_DEPTH {
                    return Err(TemplateError::NestingTooDeep {
                        limit: MAX_NESTING_DEPTH,
                        location,
                    });
                }
                let parent = std::mem::take(&mut self.nodes);
                self.open.push(OpenSection {
                    name: tag.content.to_string(),
                    inverted,
                    location,
                    inner_start: tag.end,
                    delimiters: self.delimiters.clone(),
                    parent,
                });
            }

            TagKind::SectionClose => {
                let open = self
                    .open
                    .pop()
                    .ok_or_else(|| TemplateError::UnopenedSection {
                        name: tag.content.to_string(),
                        location,
                    })?;
                if open.name != tag.content {
                    return Err(TemplateError::MismatchedSection {
                        expected: open.name,
                        found: tag.content.to_string(),
                        location,
                    });
                }
                let children = std::mem::replace(&mut self.nodes, open.parent);
                self.nodes.push(TemplateNode::Section(Section {
                    name: open.name,
                    inverted: open.inverted,
                    children,
                    raw: open.inner_start..tag.start,
                    source: Arc::clone(&self.shared),
                    delimiters: open.delimiters,
                    location: open.location,
                }));
            }

            TagKind::Partial => {
                self.nodes.push(TemplateNode::Partial(Partial {
                    name: tag.content.to_string(),
                    indent: indent.to_string(),
                    location,
                }));
            }

            TagKind::Comment => {
                self.nodes.push(TemplateNode::Comment(Comment {
                    text: tag.content.to_string(),
                    location,
                }));
            }

            TagKind::DelimiterChange => {
                let delimiters = Delimiters::parse(tag.content).ok_or_else(|| {
                    TemplateError::InvalidDelimiters {
                        tags: tag.content.to_string(),
                        location,
                    }
                })?;
                self.delimiters = delimiters.clone();
                self.nodes
                    .push(TemplateNode::DelimiterChange(DelimiterChange {
                        delimiters,
                        location,
                    }));
            }
        }
        Ok(())
    }
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t')
}
