/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation engine.
//!
//! This module walks a parsed node tree against a [`ContextStack`] and
//! appends the rendered text to a single output buffer.

use crate::ast::{Delimiters, Partial, Section, TemplateNode, Variable};
use crate::context::{ContextStack, SectionLambda, Value};
use crate::engine::default_engine;
use crate::error::{TemplateError, TemplateResult};
use crate::eval_context::EvalContext;
use crate::parser::Template;
use crate::resolver::{NullResolver, PartialResolver, indent_lines};

impl Template {
    /// Render this template with the default engine and no partials.
    ///
    /// # Arguments
    /// * `data` - The root context frame
    ///
    /// # Returns
    /// The rendered output string, or an error if a lambda or partial
    /// supplies malformed template text.
    pub fn render(&self, data: &Value) -> TemplateResult<String> {
        self.render_with_partials(data, &NullResolver)
    }

    /// Render this template with the default engine, resolving partials
    /// through `partials`.
    pub fn render_with_partials(
        &self,
        data: &Value,
        partials: &dyn PartialResolver,
    ) -> TemplateResult<String> {
        default_engine().render_template(self, data, partials)
    }
}

/// Render a node list with `data` as the only context frame.
pub fn render_nodes(
    nodes: &[TemplateNode],
    data: &Value,
    ctx: &mut EvalContext<'_>,
) -> TemplateResult<String> {
    let mut stack = ContextStack::new(data);
    let mut out = String::new();
    evaluate(nodes, &mut stack, ctx, &mut out)?;
    Ok(out)
}

/// Evaluate a list of template nodes, appending to `out`.
pub fn evaluate<'a>(
    nodes: &[TemplateNode],
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    for node in nodes {
        evaluate_node(node, stack, ctx, out)?;
    }
    Ok(())
}

/// Evaluate a single template node.
fn evaluate_node<'a>(
    node: &TemplateNode,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    match node {
        TemplateNode::Text(text) => {
            out.push_str(&text.text);
            Ok(())
        }

        TemplateNode::Variable(var) => render_variable(var, stack, ctx, out),

        TemplateNode::Section(section) if section.inverted => {
            evaluate_inverted(section, stack, ctx, out)
        }

        TemplateNode::Section(section) => evaluate_section(section, stack, ctx, out),

        TemplateNode::Partial(partial) => evaluate_partial(partial, stack, ctx, out),

        // Comments and delimiter changes produce no output
        TemplateNode::Comment(_) | TemplateNode::DelimiterChange(_) => Ok(()),
    }
}

/// Render a variable interpolation.
fn render_variable<'a>(
    var: &Variable,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let Some(value) = stack.lookup(&var.name) else {
        tracing::trace!(name = %var.name, "Unresolved variable");
        return Ok(());
    };

    let text = match value {
        Value::SimpleLambda(lambda) => lambda.call(),
        Value::SectionLambda(lambda) => {
            let delimiters = ctx.engine.options().delimiters.clone();
            call_section_lambda(lambda, "", &var.name, &delimiters, stack, ctx)?
        }
        other => other.render(),
    };

    if var.escaped {
        out.push_str(&ctx.escape(&text));
    } else {
        out.push_str(&text);
    }
    Ok(())
}

/// Evaluate a `{{#name}}` section.
fn evaluate_section<'a>(
    section: &Section,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let Some(value) = stack.lookup(&section.name) else {
        tracing::trace!(name = %section.name, "Unresolved section");
        return Ok(());
    };
    if value.is_falsy() {
        return Ok(());
    }

    ctx.nested(&section.name, |ctx| match value {
        Value::List(items) => {
            for item in items {
                stack.push(item);
                let result = evaluate(&section.children, stack, ctx, out);
                stack.pop();
                result?;
            }
            Ok(())
        }

        Value::Map(_) => {
            stack.push(value);
            let result = evaluate(&section.children, stack, ctx, out);
            stack.pop();
            result
        }

        Value::SectionLambda(lambda) => {
            let text = call_section_lambda(
                lambda,
                section.raw_text(),
                &section.name,
                &section.delimiters,
                stack,
                ctx,
            )?;
            out.push_str(&text);
            Ok(())
        }

        // The lambda's text is the section's value
        Value::SimpleLambda(lambda) => {
            if lambda.call().is_empty() {
                Ok(())
            } else {
                evaluate(&section.children, stack, ctx, out)
            }
        }

        // Truthy scalar: render once in the current scope
        _ => evaluate(&section.children, stack, ctx, out),
    })
}

/// Evaluate a `{{^name}}` section: the body renders once, in the current
/// scope, exactly when the value is absent or falsy.
fn evaluate_inverted<'a>(
    section: &Section,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let render_body = match stack.lookup(&section.name) {
        None => true,
        Some(Value::SimpleLambda(lambda)) => lambda.call().is_empty(),
        Some(value) => value.is_falsy(),
    };
    if !render_body {
        return Ok(());
    }
    ctx.nested(&section.name, |ctx| {
        evaluate(&section.children, stack, ctx, out)
    })
}

/// Invoke a section lambda with `raw` text and a callback that renders
/// template text against the current stack.
fn call_section_lambda<'a>(
    lambda: &SectionLambda,
    raw: &str,
    name: &str,
    delimiters: &Delimiters,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
) -> TemplateResult<String> {
    let engine = ctx.engine;
    let mut render = |text: &str| -> TemplateResult<String> {
        let template = engine
            .parse_with_delimiters(text, delimiters)
            .map_err(|e| TemplateError::InLambda {
                name: name.to_string(),
                text: text.to_string(),
                error: Box::new(e),
            })?;
        ctx.nested(name, |ctx| {
            let mut rendered = String::new();
            evaluate(template.nodes(), stack, ctx, &mut rendered)?;
            Ok(rendered)
        })
    };
    lambda.call(raw, &mut render)
}

/// Evaluate a `{{> name}}` partial against the current stack.
fn evaluate_partial<'a>(
    partial: &Partial,
    stack: &mut ContextStack<'a>,
    ctx: &mut EvalContext<'_>,
    out: &mut String,
) -> TemplateResult<()> {
    let Some(source) = ctx.partials.get_partial(&partial.name) else {
        tracing::trace!(name = %partial.name, "Partial not found");
        return Ok(());
    };
    let source = indent_lines(&source, &partial.indent);
    let template = ctx
        .engine
        .parse(&source)
        .map_err(|e| TemplateError::InPartial {
            name: partial.name.clone(),
            text: source.clone(),
            error: Box::new(e),
        })?;
    ctx.nested(&partial.name, |ctx| {
        evaluate(template.nodes(), stack, ctx, out)
    })
}
