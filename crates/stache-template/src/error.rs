/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and evaluation.

use std::fmt;
use thiserror::Error;

/// A position in template source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based, with the
/// column counted in characters. Locations are computed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A tag was opened but its closing delimiter never appeared.
    #[error("Unclosed tag at {location}")]
    UnclosedTag { location: SourceLocation },

    /// A section was still open at end of input.
    #[error("Unclosed section \"{name}\" at {location}")]
    UnclosedSection {
        name: String,
        location: SourceLocation,
    },

    /// A closing tag appeared with no section open.
    #[error("Unopened section \"{name}\" at {location}")]
    UnopenedSection {
        name: String,
        location: SourceLocation,
    },

    /// A closing tag named a different section than the innermost open one.
    #[error("Unclosed section \"{expected}\" at {location}: found closing tag for \"{found}\"")]
    MismatchedSection {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    /// A `{{=... ...=}}` directive that does not name exactly two delimiters.
    #[error("Invalid delimiters \"{tags}\" at {location}")]
    InvalidDelimiters {
        tags: String,
        location: SourceLocation,
    },

    /// A tag with no name, e.g. `{{}}` or `{{#}}`.
    #[error("Empty tag at {location}")]
    EmptyTag { location: SourceLocation },

    /// Sections nested deeper than the parser accepts.
    #[error("Sections nested deeper than {limit} levels at {location}")]
    NestingTooDeep {
        limit: usize,
        location: SourceLocation,
    },

    /// A partial's text failed to parse. `text` is the text that was
    /// parsed, so `error`'s location points into it.
    #[error("In partial \"{name}\": {error}")]
    InPartial {
        name: String,
        text: String,
        #[source]
        error: Box<TemplateError>,
    },

    /// Text rendered by a section lambda failed to parse.
    #[error("In text rendered by lambda \"{name}\": {error}")]
    InLambda {
        name: String,
        text: String,
        #[source]
        error: Box<TemplateError>,
    },

    /// Sections, partials or lambdas nested deeper than the engine allows.
    #[error("Recursion limit of {limit} exceeded while rendering \"{name}\"")]
    RecursionLimit { name: String, limit: usize },

    /// I/O error (e.g., reading a template or partial file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Whether this error describes malformed template structure, either in
    /// the template itself or in a partial or lambda text it pulled in.
    pub fn is_syntax_error(&self) -> bool {
        self.innermost().location().is_some()
    }

    /// The error inside any partial or lambda wrappers.
    pub fn innermost(&self) -> &TemplateError {
        let mut error = self;
        while let TemplateError::InPartial { error: inner, .. }
        | TemplateError::InLambda { error: inner, .. } = error
        {
            error = inner.as_ref();
        }
        error
    }

    /// The location of a syntax error in the text that was being parsed.
    ///
    /// `None` for wrapped errors, whose location refers to the partial or
    /// lambda text rather than the enclosing template.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            TemplateError::UnclosedTag { location }
            | TemplateError::UnclosedSection { location, .. }
            | TemplateError::UnopenedSection { location, .. }
            | TemplateError::MismatchedSection { location, .. }
            | TemplateError::InvalidDelimiters { location, .. }
            | TemplateError::EmptyTag { location }
            | TemplateError::NestingTooDeep { location, .. } => Some(*location),
            TemplateError::InPartial { .. }
            | TemplateError::InLambda { .. }
            | TemplateError::RecursionLimit { .. }
            | TemplateError::Io(_) => None,
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_classification() {
        let err = TemplateError::UnclosedTag {
            location: SourceLocation::default(),
        };
        assert!(err.is_syntax_error());

        let err = TemplateError::RecursionLimit {
            name: "x".to_string(),
            limit: 4,
        };
        assert!(!err.is_syntax_error());
        assert!(err.location().is_none());
    }

    #[test]
    fn test_wrapped_error_classification() {
        let inner = TemplateError::UnclosedSection {
            name: "x".to_string(),
            location: SourceLocation::default(),
        };
        let err = TemplateError::InPartial {
            name: "outer".to_string(),
            text: "{{> inner}}".to_string(),
            error: Box::new(TemplateError::InLambda {
                name: "wrap".to_string(),
                text: "{{#x}}".to_string(),
                error: Box::new(inner),
            }),
        };

        assert!(err.location().is_none());
        assert!(err.is_syntax_error());
        assert!(matches!(
            err.innermost(),
            TemplateError::UnclosedSection { name, .. } if name == "x"
        ));
        assert_eq!(
            err.to_string(),
            "In partial \"outer\": In text rendered by lambda \"wrap\": \
             Unclosed section \"x\" at line 0, column 0"
        );
    }

    #[test]
    fn test_error_message() {
        let err = TemplateError::UnopenedSection {
            name: "person".to_string(),
            location: SourceLocation {
                offset: 0,
                line: 2,
                column: 5,
            },
        };
        assert_eq!(
            err.to_string(),
            "Unopened section \"person\" at line 2, column 5"
        );
    }
}
