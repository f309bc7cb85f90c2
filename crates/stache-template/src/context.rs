/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template values and the context stack.
//!
//! [`Value`] is the data model templates render against. Callables are
//! ordinary variants ([`Value::SimpleLambda`], [`Value::SectionLambda`]) so
//! the evaluator can branch on them directly.
//!
//! [`ContextStack`] holds the frames searched during name resolution,
//! innermost first.

use crate::error::TemplateResult;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback handed to a section lambda. Renders template text against the
/// context stack active at the section.
pub type RenderFn<'r> = dyn FnMut(&str) -> TemplateResult<String> + 'r;

/// A zero-argument procedure whose result is interpolated as text.
#[derive(Clone)]
pub struct SimpleLambda(Arc<dyn Fn() -> String + Send + Sync>);

impl SimpleLambda {
    pub fn new(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> String {
        (self.0)()
    }
}

/// A procedure receiving a section's raw inner text and a render callback.
///
/// Its return value replaces the whole section in the output, verbatim.
#[derive(Clone)]
pub struct SectionLambda(
    Arc<dyn Fn(&str, &mut RenderFn<'_>) -> TemplateResult<String> + Send + Sync>,
);

impl SectionLambda {
    pub fn new(
        f: impl Fn(&str, &mut RenderFn<'_>) -> TemplateResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, text: &str, render: &mut RenderFn<'_>) -> TemplateResult<String> {
        (self.0)(text, render)
    }
}

impl fmt::Debug for SimpleLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SimpleLambda")
    }
}

impl fmt::Debug for SectionLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SectionLambda")
    }
}

// Lambdas compare by identity.
impl PartialEq for SimpleLambda {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SectionLambda {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A value that can be used in template evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A number, kept in JSON form so integers print without a fraction.
    Number(serde_json::Number),

    /// A string value.
    String(String),

    /// A list of values.
    List(Vec<Value>),

    /// A map of string keys to values.
    Map(HashMap<String, Value>),

    /// Zero-argument procedure returning text.
    SimpleLambda(SimpleLambda),

    /// Procedure taking `(text, render)`.
    SectionLambda(SectionLambda),
}

impl Value {
    /// Build a value from anything serde can serialize.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Wrap a closure as a [`Value::SimpleLambda`].
    pub fn lambda(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Value::SimpleLambda(SimpleLambda::new(f))
    }

    /// Wrap a closure as a [`Value::SectionLambda`].
    pub fn section_lambda(
        f: impl Fn(&str, &mut RenderFn<'_>) -> TemplateResult<String> + Send + Sync + 'static,
    ) -> Self {
        Value::SectionLambda(SectionLambda::new(f))
    }

    /// Check if this value is "falsy" for section evaluation.
    ///
    /// Falsy values are null, `false`, numeric zero, the empty string and
    /// the empty list. Maps (even empty ones) and lambdas are truthy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(_) | Value::SimpleLambda(_) | Value::SectionLambda(_) => false,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["employee", "salary"])` on a Map containing
    /// `{"employee": {"salary": 50000}}` returns the salary value.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Render this value as text for interpolation.
    ///
    /// - String: returned as-is
    /// - Bool: "true" or "false"
    /// - Number: decimal form; whole floats print without a fraction
    ///   (`1.0` as `1`)
    /// - List: elements joined with ","
    /// - Map, Null: ""
    ///
    /// Lambdas are invoked by the evaluator, never stringified here.
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => render_number(n),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) | Value::Null | Value::SimpleLambda(_) | Value::SectionLambda(_) => {
                String::new()
            }
        }
    }
}

fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        // Below 1e21 a whole float has a plain decimal form
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n.into())
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The chain of scopes used to resolve names during a render.
///
/// Frames borrow from the data being rendered; the stack lives only for the
/// duration of one render call.
#[derive(Debug, Clone, Default)]
pub struct ContextStack<'a> {
    frames: Vec<&'a Value>,
}

impl<'a> ContextStack<'a> {
    /// Create a stack whose only frame is `root`.
    pub fn new(root: &'a Value) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, frame: &'a Value) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<&'a Value> {
        self.frames.pop()
    }

    /// The innermost frame.
    pub fn top(&self) -> Option<&'a Value> {
        self.frames.last().copied()
    }

    /// Resolve a (possibly dotted) name.
    ///
    /// `.` names the innermost frame. Otherwise the first segment is
    /// searched from the innermost frame outward; the remaining segments
    /// descend into the value found there, without searching the stack
    /// again.
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        if name == "." {
            return self.top();
        }
        let mut segments = name.split('.');
        let first = segments.next()?;
        let found = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(first))?;
        segments.try_fold(found, |value, key| value.get(key))
    }
}
