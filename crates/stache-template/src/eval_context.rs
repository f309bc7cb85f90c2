/*
 * eval_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation context for template rendering.
//!
//! This module provides [`EvalContext`], which is threaded through all evaluation
//! functions to supply:
//!
//! 1. **Collaborators**: the engine (options and parse cache) and the partial resolver
//! 2. **State tracking**: nesting depth for recursion protection

use crate::engine::Engine;
use crate::error::{TemplateError, TemplateResult};
use crate::resolver::PartialResolver;
use std::borrow::Cow;

/// Context for template evaluation.
pub struct EvalContext<'e> {
    /// Engine supplying options and the parse cache.
    pub engine: &'e Engine,

    /// Source of `{{> name}}` partials.
    pub partials: &'e dyn PartialResolver,

    /// Current nesting depth of sections, partials and lambda renders.
    pub depth: usize,

    /// Maximum nesting depth before error.
    pub max_depth: usize,
}

impl<'e> EvalContext<'e> {
    /// Create a new evaluation context.
    pub fn new(engine: &'e Engine, partials: &'e dyn PartialResolver) -> Self {
        Self {
            engine,
            partials,
            depth: 0,
            max_depth: engine.options().max_depth,
        }
    }

    /// Run `f` one nesting level deeper.
    ///
    /// Fails with [`TemplateError::RecursionLimit`] instead of running `f`
    /// when the limit is already reached. `name` identifies the section or
    /// partial being entered.
    pub fn nested<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> TemplateResult<T>,
    ) -> TemplateResult<T> {
        if self.depth >= self.max_depth {
            return Err(TemplateError::RecursionLimit {
                name: name.to_string(),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Escape interpolated text according to the engine's escape mode.
    pub fn escape<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.engine.options().escape.escape(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, EscapeMode};
    use crate::resolver::NullResolver;

    #[test]
    fn test_eval_context_new() {
        let engine = Engine::new();
        let ctx = EvalContext::new(&engine, &NullResolver);

        assert_eq!(ctx.depth, 0);
        assert_eq!(ctx.max_depth, crate::engine::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_nested_tracks_depth() {
        let engine = Engine::new();
        let mut ctx = EvalContext::new(&engine, &NullResolver);

        let inner_depth = ctx
            .nested("a", |ctx| ctx.nested("b", |ctx| Ok(ctx.depth)))
            .unwrap();
        assert_eq!(inner_depth, 2);
        assert_eq!(ctx.depth, 0);
    }

    #[test]
    fn test_nested_limit() {
        let engine = Engine::new();
        let mut ctx = EvalContext::new(&engine, &NullResolver);
        ctx.max_depth = 1;

        let err = ctx
            .nested("outer", |ctx| ctx.nested("inner", |_| Ok(())))
            .unwrap_err();
        match err {
            TemplateError::RecursionLimit { name, limit } => {
                assert_eq!(name, "inner");
                assert_eq!(limit, 1);
            }
            other => panic!("Expected RecursionLimit, got {:?}", other),
        }
        // Depth is restored even when the inner call fails
        assert_eq!(ctx.depth, 0);
    }

    #[test]
    fn test_escape_follows_engine() {
        let engine = Engine::with_options(EngineOptions {
            escape: EscapeMode::None,
            ..EngineOptions::default()
        });
        let ctx = EvalContext::new(&engine, &NullResolver);
        assert_eq!(ctx.escape("<i>"), "<i>");
    }
}
