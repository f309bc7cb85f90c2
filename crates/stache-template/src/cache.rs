/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parse cache.
//!
//! Parsed templates are memoized by their exact source text and the
//! delimiters active at the start of the parse, since the same text can
//! parse differently under different delimiters. Entries are never evicted;
//! the cache only shrinks through [`ParseCache::clear`].

use crate::ast::Delimiters;
use crate::error::TemplateResult;
use crate::parser::Template;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entries grouped by delimiters, then by source text. The two-level map
/// lets lookups borrow the source instead of building an owned key.
type Entries = HashMap<Delimiters, HashMap<String, Arc<Template>>>;

/// Thread-safe memo of parsed templates.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: Mutex<Entries>,
}

impl ParseCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached template for `source`, parsing and storing it on a
    /// miss.
    ///
    /// Parsing happens outside the lock. If two threads miss on the same
    /// source at once, both parse and the first insert is kept; parsing is
    /// deterministic so either tree is equivalent.
    pub fn get_or_parse(
        &self,
        source: &str,
        delimiters: &Delimiters,
    ) -> TemplateResult<Arc<Template>> {
        if let Some(template) = self.get(source, delimiters) {
            tracing::trace!(len = source.len(), "Parse cache hit");
            return Ok(template);
        }

        tracing::debug!(len = source.len(), delimiters = %delimiters, "Parse cache miss");
        let parsed = Arc::new(Template::compile_with_delimiters(source, delimiters)?);

        let mut entries = self.lock();
        let template = entries
            .entry(delimiters.clone())
            .or_default()
            .entry(source.to_string())
            .or_insert(parsed);
        Ok(Arc::clone(template))
    }

    /// Look up a template without parsing.
    pub fn get(&self, source: &str, delimiters: &Delimiters) -> Option<Arc<Template>> {
        self.lock()
            .get(delimiters)
            .and_then(|by_source| by_source.get(source))
            .cloned()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        tracing::debug!(entries = count(&entries), "Clearing parse cache");
        entries.clear();
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        count(&self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn count(entries: &Entries) -> usize {
    entries.values().map(HashMap::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;

    #[test]
    fn test_miss_then_hit() {
        let cache = ParseCache::new();
        assert!(cache.is_empty());

        let first = cache
            .get_or_parse("Hello {{name}}", &Delimiters::default())
            .unwrap();
        assert_eq!(cache.len(), 1);

        let second = cache
            .get_or_parse("Hello {{name}}", &Delimiters::default())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_includes_delimiters() {
        let cache = ParseCache::new();
        let source = "<%x%>{{y}}";

        let default = cache.get_or_parse(source, &Delimiters::default()).unwrap();
        let custom = cache
            .get_or_parse(source, &Delimiters::new("<%", "%>"))
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_ne!(default.nodes(), custom.nodes());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ParseCache::new();
        let err = cache
            .get_or_parse("{{#a}}", &Delimiters::default())
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnclosedSection { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_does_not_parse() {
        let cache = ParseCache::new();
        assert!(cache.get("x", &Delimiters::default()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ParseCache::new();
        cache.get_or_parse("a", &Delimiters::default()).unwrap();
        cache.get_or_parse("b", &Delimiters::default()).unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a", &Delimiters::default()).is_none());
    }

    #[test]
    fn test_concurrent_parses_converge() {
        let cache = Arc::new(ParseCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_parse("{{#xs}}{{.}}{{/xs}}", &Delimiters::default())
                        .unwrap()
                })
            })
            .collect();

        let trees: Vec<Arc<Template>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.len(), 1);
        assert!(trees.windows(2).all(|w| w[0].nodes() == w[1].nodes()));
    }
}
