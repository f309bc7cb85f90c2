/*
 * diagnostic.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Human-readable rendering of template errors.
//!
//! Syntax errors are shown as an ariadne report with the offending tag
//! highlighted in the template source. Errors raised while parsing a partial
//! or lambda text are drawn against that text instead. Errors without a
//! source location fall back to their `Display` text.

use crate::error::TemplateError;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};

/// Render `error` against the template text it came from.
///
/// `source_name` labels the report (usually the template's file path).
/// Set `color` to `false` for output that is not a terminal.
pub fn render_error(error: &TemplateError, source_name: &str, source: &str, color: bool) -> String {
    match error {
        TemplateError::InPartial { name, text, error } => {
            return render_error(error, &format!("{source_name} > {name}"), text, color);
        }
        TemplateError::InLambda { name, text, error } => {
            return render_error(error, &format!("{source_name} #{name}"), text, color);
        }
        _ => {}
    }

    let Some(location) = error.location() else {
        return error.to_string();
    };

    // ariadne spans count characters, not bytes
    let byte_offset = location.offset.min(source.len());
    let start = source
        .get(..byte_offset)
        .map_or(0, |prefix| prefix.chars().count());
    let total = source.chars().count();
    let end = (start + 1).min(total).max(start);

    let name = source_name.to_string();
    let report = Report::build(ReportKind::Error, name.clone(), start)
        .with_config(Config::default().with_color(color))
        .with_message(error.to_string())
        .with_label(
            Label::new((name.clone(), start..end))
                .with_message(label_message(error))
                .with_color(Color::Red),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((name, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }
    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

fn label_message(error: &TemplateError) -> String {
    match error {
        TemplateError::UnclosedTag { .. } => "tag opened here is never closed".to_string(),
        TemplateError::UnclosedSection { name, .. } => {
            format!("section \"{name}\" opened here is never closed")
        }
        TemplateError::UnopenedSection { name, .. } => {
            format!("no open section named \"{name}\"")
        }
        TemplateError::MismatchedSection {
            expected, found, ..
        } => format!("expected {{{{/{expected}}}}}, found {{{{/{found}}}}}"),
        TemplateError::InvalidDelimiters { tags, .. } => {
            format!("\"{tags}\" is not two delimiters separated by whitespace")
        }
        TemplateError::EmptyTag { .. } => "tag has no name".to_string(),
        TemplateError::NestingTooDeep { limit, .. } => {
            format!("section opened here is nested more than {limit} levels deep")
        }
        TemplateError::InPartial { .. }
        | TemplateError::InLambda { .. }
        | TemplateError::RecursionLimit { .. }
        | TemplateError::Io(_) => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Value;
    use crate::engine::Engine;
    use crate::parser::Template;
    use crate::resolver::MemoryResolver;

    #[test]
    fn test_syntax_error_report_mentions_source() {
        let source = "Hello\n{{#person}}{{name}}";
        let err = Template::compile(source).unwrap_err();
        let report = render_error(&err, "hello.mustache", source, false);

        assert!(report.contains("hello.mustache"));
        assert!(report.contains("Unclosed section \"person\""));
        assert!(report.contains("{{#person}}{{name}}"));
    }

    #[test]
    fn test_mismatched_label() {
        let source = "{{#a}}{{/b}}";
        let err = Template::compile(source).unwrap_err();
        let report = render_error(&err, "t", source, false);
        assert!(report.contains("expected {{/a}}, found {{/b}}"));
    }

    #[test]
    fn test_non_syntax_error_falls_back_to_display() {
        let err = TemplateError::RecursionLimit {
            name: "loop".to_string(),
            limit: 3,
        };
        assert_eq!(render_error(&err, "t", "", false), err.to_string());
    }

    #[test]
    fn test_multibyte_source() {
        let source = "héllo {{";
        let err = Template::compile(source).unwrap_err();
        let report = render_error(&err, "t", source, false);
        assert!(report.contains("Unclosed tag"));
    }

    #[test]
    fn test_partial_error_drawn_against_partial_text() {
        let source = "line one\n{{> bad}}\n";
        let partials = MemoryResolver::with_partials([("bad", "{{#x}}oops")]);
        let err = Engine::new()
            .render_with_partials(source, &Value::Null, &partials)
            .unwrap_err();
        let report = render_error(&err, "page.mustache", source, false);

        assert!(report.contains("page.mustache > bad"));
        assert!(report.contains("{{#x}}oops"));
        assert!(report.contains("section \"x\" opened here is never closed"));
        assert!(!report.contains("line one"));
    }

    #[test]
    fn test_lambda_error_drawn_against_lambda_text() {
        let data: Value = [(
            "wrap",
            Value::section_lambda(|_text, render| render("before {{/nope}}")),
        )]
        .into_iter()
        .collect();
        let source = "{{#wrap}}{{/wrap}}";
        let err = Engine::new().render(source, &data).unwrap_err();
        let report = render_error(&err, "t", source, false);

        assert!(report.contains("t #wrap"));
        assert!(report.contains("before {{/nope}}"));
        assert!(report.contains("no open section named \"nope\""));
    }
}
