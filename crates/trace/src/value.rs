//! TraceValue: the closed value domain the tracer knows how to render
//!
//! Host engines convert whatever their machine manipulates into a `TraceValue`
//! at the instrumentation boundary. From there on, dispatch is an exhaustive
//! pattern match instead of ad hoc runtime type checks, and the classification
//! order of the preview serializer becomes an explicit, testable priority list.
//!
//! Composite variants (`Bytes`, `List`, `Map`) hold their payload behind `Arc`
//! so the same node can appear at several points in a value graph with O(1)
//! cloning. The preview serializer keys its visited set on the identity of
//! that shared allocation, which is what makes cycle/re-entry detection work.

use std::sync::Arc;

/// A runtime value snapshot, as seen by the tracer.
///
/// This is pure data: constructing one never touches the host engine again,
/// so a `TraceValue` stays valid after the traced step has moved on.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    /// Explicit null (the host's "empty" marker)
    Null,

    /// Undefined / uninitialized (the host's second "no value" state)
    Undefined,

    /// Integer value
    Int(i64),

    /// Floating-point value (IEEE 754 double precision)
    Float(f64),

    /// Boolean value
    Bool(bool),

    /// Text value
    Str(String),

    /// Error/exception value carrying a kind and a message
    Error { name: String, message: String },

    /// Ordinary callable; an empty name means anonymous
    Function { name: String },

    /// Compiled instruction block exposing its byte size
    Bytecode { size: usize },

    /// Binary buffer view (fixed-length byte sequence)
    Bytes(Arc<[u8]>),

    /// Ordered sequence of nested values
    List(Arc<[TraceValue]>),

    /// Keyed mapping with string keys, insertion order preserved.
    /// Also the fallback representation for arbitrary composite data.
    Map(Arc<Vec<(String, TraceValue)>>),
}

impl TraceValue {
    /// Build a text value
    pub fn str(s: impl Into<String>) -> Self {
        TraceValue::Str(s.into())
    }

    /// Build an error value
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        TraceValue::Error {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Build a named callable; pass "" for anonymous
    pub fn function(name: impl Into<String>) -> Self {
        TraceValue::Function { name: name.into() }
    }

    /// Build a compiled-block callable from its byte size
    pub fn bytecode(size: usize) -> Self {
        TraceValue::Bytecode { size }
    }

    /// Build a binary buffer view
    pub fn bytes(data: impl Into<Arc<[u8]>>) -> Self {
        TraceValue::Bytes(data.into())
    }

    /// Build an ordered sequence
    pub fn list(items: Vec<TraceValue>) -> Self {
        TraceValue::List(Arc::from(items))
    }

    /// Build a keyed mapping from (key, value) pairs, keeping their order
    pub fn map(entries: Vec<(String, TraceValue)>) -> Self {
        TraceValue::Map(Arc::new(entries))
    }

    /// Direct child/element count for composites, `None` for scalars.
    ///
    /// This is the `N` the preview serializer reports in `len=N` tokens and
    /// in the over-depth `{len=N}` summary.
    pub fn child_count(&self) -> Option<usize> {
        match self {
            TraceValue::Bytes(b) => Some(b.len()),
            TraceValue::List(items) => Some(items.len()),
            TraceValue::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Identity of the shared allocation backing a composite, `None` for
    /// scalars. Two values share an identity exactly when they are clones of
    /// the same `Arc`, which is what the preview's visited set tracks.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            TraceValue::Bytes(b) => Some(b.as_ptr() as usize),
            TraceValue::List(items) => Some(items.as_ptr() as usize),
            TraceValue::Map(entries) => Some(Arc::as_ptr(entries) as usize),
            _ => None,
        }
    }
}

impl From<i64> for TraceValue {
    fn from(n: i64) -> Self {
        TraceValue::Int(n)
    }
}

impl From<f64> for TraceValue {
    fn from(f: f64) -> Self {
        TraceValue::Float(f)
    }
}

impl From<bool> for TraceValue {
    fn from(b: bool) -> Self {
        TraceValue::Bool(b)
    }
}

impl From<&str> for TraceValue {
    fn from(s: &str) -> Self {
        TraceValue::Str(s.to_string())
    }
}

impl From<String> for TraceValue {
    fn from(s: String) -> Self {
        TraceValue::Str(s)
    }
}
