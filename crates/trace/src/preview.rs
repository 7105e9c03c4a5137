//! Bounded single-line previews of runtime values
//!
//! Converts any [`TraceValue`] into a compact token that is safe to embed in a
//! trace line: rendering always terminates, never panics outward, and output
//! size is bounded no matter how large, deep, or tangled the input is.
//!
//! # Token Shapes
//!
//! - Absence: `null` / `undefined`
//! - Text: `"hello"` (JSON-quoted, truncated to the length limit first)
//! - Scalars: `42`, `3.14`, `true`
//! - Error: `[Error TypeError: boom]`
//! - Callables: `[fn name]`, `[fn <>]`, `[vm#128]`
//! - Bytes: `[len=3 0x01 0xff 0x10]`
//! - Sequence: `[len=2 1 2]`
//! - Mapping: `{len=1 a:1}`
//! - Re-entered node: `{Circular}`; over-depth node: `{len=N}`

use crate::value::TraceValue;
use std::borrow::Cow;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Default character limit for text and error-message previews
pub const DEFAULT_MAX_STR: usize = 500;

/// Nesting depth at which composites are summarized instead of expanded
pub const MAX_DEPTH: usize = 3;

/// Maximum bytes shown for a binary buffer view
pub const BYTE_DISPLAY_LIMIT: usize = 500;

/// Maximum elements shown for a sequence
pub const LIST_DISPLAY_LIMIT: usize = 500;

/// Maximum entries shown for a mapping
pub const MAP_DISPLAY_LIMIT: usize = 100;

/// Sentinel returned when rendering fails internally
pub const FAILURE_TOKEN: &str = "[?]";

const ELLIPSIS: char = '\u{2026}';

/// Render a value as a bounded single-line token using the default limits.
///
/// Total: never panics. Any internal failure surfaces only as [`FAILURE_TOKEN`].
pub fn preview(value: &TraceValue) -> String {
    preview_with_limit(value, DEFAULT_MAX_STR)
}

/// Render a value with an explicit character limit for text previews.
///
/// The limit applies to text values and error messages (counted in characters,
/// before quoting); structural limits (depth, element counts) are fixed.
pub fn preview_with_limit(value: &TraceValue, max_str: usize) -> String {
    // No-throw boundary: internal helpers panic normally, suppression happens
    // exactly once, here.
    catch_unwind(AssertUnwindSafe(|| {
        let mut seen = HashSet::new();
        let mut buf = String::new();
        format_value(value, max_str, 0, &mut seen, &mut buf);
        buf
    }))
    .unwrap_or_else(|_| FAILURE_TOKEN.to_string())
}

/// Recursive formatter. Classification is an explicit priority list: scalars
/// first, then the cycle and depth guards, then the composite shapes.
fn format_value(
    value: &TraceValue,
    max_str: usize,
    depth: usize,
    seen: &mut HashSet<usize>,
    buf: &mut String,
) {
    match value {
        TraceValue::Null => buf.push_str("null"),
        TraceValue::Undefined => buf.push_str("undefined"),
        TraceValue::Str(s) => format_text(s, max_str, buf),
        TraceValue::Int(n) => buf.push_str(&n.to_string()),
        TraceValue::Float(f) => buf.push_str(&f.to_string()),
        TraceValue::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        TraceValue::Error { name, message } => {
            buf.push_str("[Error ");
            buf.push_str(name);
            buf.push_str(": ");
            buf.push_str(&truncate_chars(message, max_str));
            buf.push(']');
        }
        TraceValue::Bytecode { size } => {
            buf.push_str("[vm#");
            buf.push_str(&size.to_string());
            buf.push(']');
        }
        TraceValue::Function { name } => {
            buf.push_str("[fn ");
            buf.push_str(if name.is_empty() { "<>" } else { name });
            buf.push(']');
        }
        composite => {
            let id = composite
                .identity()
                .expect("non-scalar variants carry an identity");

            // Guards run before this node is marked visited: the set protects
            // children against re-entry, not the node's own first visit.
            if seen.contains(&id) {
                buf.push_str("{Circular}");
                return;
            }
            if depth >= MAX_DEPTH {
                let count = composite
                    .child_count()
                    .expect("non-scalar variants have a child count");
                buf.push_str("{len=");
                buf.push_str(&count.to_string());
                buf.push('}');
                return;
            }
            seen.insert(id);

            match composite {
                TraceValue::Bytes(data) => format_bytes(data, buf),
                TraceValue::List(items) => format_list(items, max_str, depth, seen, buf),
                TraceValue::Map(entries) => format_map(entries, max_str, depth, seen, buf),
                _ => unreachable!("scalar variants handled above"),
            }
        }
    }
}

/// Truncate first, then quote: the character limit applies to the raw text,
/// not to the escaped form.
fn format_text(s: &str, max_str: usize, buf: &mut String) {
    let head = truncate_chars(s, max_str);
    let quoted =
        serde_json::to_string(head.as_ref()).expect("JSON string encoding cannot fail for str");
    buf.push_str(&quoted);
}

/// Take at most `max` characters, appending the ellipsis marker if anything
/// was cut.
fn truncate_chars(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => {
            let mut head = s[..cut].to_string();
            head.push(ELLIPSIS);
            Cow::Owned(head)
        }
    }
}

fn format_bytes(data: &[u8], buf: &mut String) {
    buf.push_str("[len=");
    buf.push_str(&data.len().to_string());
    buf.push(' ');
    for (i, b) in data.iter().take(BYTE_DISPLAY_LIMIT).enumerate() {
        if i > 0 {
            buf.push(' ');
        }
        buf.push_str(&format!("0x{b:02x}"));
    }
    if data.len() > BYTE_DISPLAY_LIMIT {
        buf.push(' ');
        buf.push(ELLIPSIS);
    }
    buf.push(']');
}

fn format_list(
    items: &[TraceValue],
    max_str: usize,
    depth: usize,
    seen: &mut HashSet<usize>,
    buf: &mut String,
) {
    buf.push_str("[len=");
    buf.push_str(&items.len().to_string());
    buf.push(' ');
    for (i, item) in items.iter().take(LIST_DISPLAY_LIMIT).enumerate() {
        if i > 0 {
            buf.push(' ');
        }
        format_value(item, max_str, depth + 1, seen, buf);
    }
    if items.len() > LIST_DISPLAY_LIMIT {
        buf.push(' ');
        buf.push(ELLIPSIS);
    }
    buf.push(']');
}

fn format_map(
    entries: &[(String, TraceValue)],
    max_str: usize,
    depth: usize,
    seen: &mut HashSet<usize>,
    buf: &mut String,
) {
    buf.push_str("{len=");
    buf.push_str(&entries.len().to_string());
    buf.push(' ');
    for (i, (key, val)) in entries.iter().take(MAP_DISPLAY_LIMIT).enumerate() {
        if i > 0 {
            buf.push_str(", ");
        }
        buf.push_str(key);
        buf.push(':');
        format_value(val, max_str, depth + 1, seen, buf);
    }
    if entries.len() > MAP_DISPLAY_LIMIT {
        buf.push_str(", ");
        buf.push(ELLIPSIS);
    }
    buf.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pairs(entries: &[(&str, TraceValue)]) -> Vec<(String, TraceValue)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_null() {
        assert_eq!(preview(&TraceValue::Null), "null");
    }

    #[test]
    fn test_undefined() {
        assert_eq!(preview(&TraceValue::Undefined), "undefined");
    }

    #[test]
    fn test_int() {
        assert_eq!(preview(&TraceValue::Int(-42)), "-42");
    }

    #[test]
    fn test_float() {
        assert_eq!(preview(&TraceValue::Float(3.14)), "3.14");
    }

    #[test]
    fn test_float_whole_number() {
        assert_eq!(preview(&TraceValue::Float(42.0)), "42");
    }

    #[test]
    fn test_bool() {
        assert_eq!(preview(&TraceValue::Bool(true)), "true");
        assert_eq!(preview(&TraceValue::Bool(false)), "false");
    }

    #[test]
    fn test_string_simple() {
        assert_eq!(preview(&TraceValue::str("hello")), r#""hello""#);
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            preview(&TraceValue::str("say \"hi\"\n")),
            r#""say \"hi\"\n""#
        );
    }

    #[test]
    fn test_string_truncation() {
        let long: String = "a".repeat(600);
        let token = preview(&TraceValue::Str(long));
        assert_eq!(token, format!("\"{}\u{2026}\"", "a".repeat(500)));
    }

    #[test]
    fn test_string_truncation_custom_limit() {
        let token = preview_with_limit(&TraceValue::str("abcdef"), 3);
        assert_eq!(token, "\"abc\u{2026}\"");
    }

    #[test]
    fn test_string_at_limit_not_truncated() {
        let token = preview_with_limit(&TraceValue::str("abc"), 3);
        assert_eq!(token, "\"abc\"");
    }

    #[test]
    fn test_string_truncation_is_char_aware() {
        // Multi-byte characters must be cut at character boundaries.
        let token = preview_with_limit(&TraceValue::str("ééééé"), 2);
        assert_eq!(token, "\"éé\u{2026}\"");
    }

    #[test]
    fn test_error() {
        let v = TraceValue::error("TypeError", "x is not a function");
        assert_eq!(preview(&v), "[Error TypeError: x is not a function]");
    }

    #[test]
    fn test_error_message_truncated() {
        let v = TraceValue::error("RangeError", "b".repeat(501));
        assert_eq!(
            preview(&v),
            format!("[Error RangeError: {}\u{2026}]", "b".repeat(500))
        );
    }

    #[test]
    fn test_function_named() {
        assert_eq!(preview(&TraceValue::function("dispatch")), "[fn dispatch]");
    }

    #[test]
    fn test_function_anonymous() {
        assert_eq!(preview(&TraceValue::function("")), "[fn <>]");
    }

    #[test]
    fn test_bytecode() {
        assert_eq!(preview(&TraceValue::bytecode(128)), "[vm#128]");
    }

    #[test]
    fn test_bytes() {
        let v = TraceValue::bytes(vec![1u8, 255, 16]);
        assert_eq!(preview(&v), "[len=3 0x01 0xff 0x10]");
    }

    #[test]
    fn test_bytes_empty() {
        assert_eq!(preview(&TraceValue::bytes(Vec::<u8>::new())), "[len=0 ]");
    }

    #[test]
    fn test_bytes_truncated() {
        let v = TraceValue::bytes(vec![0u8; 501]);
        let token = preview(&v);
        assert!(token.starts_with("[len=501 0x00"));
        assert!(token.ends_with(" \u{2026}]"));
        assert_eq!(token.matches("0x00").count(), 500);
    }

    #[test]
    fn test_bytes_at_limit_no_marker() {
        let v = TraceValue::bytes(vec![0u8; 500]);
        assert!(!preview(&v).contains('\u{2026}'));
    }

    #[test]
    fn test_list() {
        let v = TraceValue::list(vec![
            TraceValue::Int(1),
            TraceValue::str("a"),
            TraceValue::Bool(false),
        ]);
        assert_eq!(preview(&v), "[len=3 1 \"a\" false]");
    }

    #[test]
    fn test_list_empty() {
        assert_eq!(preview(&TraceValue::list(vec![])), "[len=0 ]");
    }

    #[test]
    fn test_list_truncated() {
        let v = TraceValue::list((0..501).map(TraceValue::Int).collect());
        let token = preview(&v);
        assert!(token.starts_with("[len=501 0 1 2"));
        assert!(token.ends_with("499 \u{2026}]"));
    }

    #[test]
    fn test_list_at_limit_no_marker() {
        let v = TraceValue::list((0..500).map(TraceValue::Int).collect());
        assert!(!preview(&v).contains('\u{2026}'));
    }

    #[test]
    fn test_map() {
        let v = TraceValue::map(pairs(&[
            ("a", TraceValue::Int(1)),
            ("b", TraceValue::str("x")),
        ]));
        assert_eq!(preview(&v), "{len=2 a:1, b:\"x\"}");
    }

    #[test]
    fn test_map_empty() {
        assert_eq!(preview(&TraceValue::map(vec![])), "{len=0 }");
    }

    #[test]
    fn test_map_truncated() {
        let entries: Vec<_> = (0..101)
            .map(|i| (format!("k{i}"), TraceValue::Int(i)))
            .collect();
        let token = preview(&TraceValue::Map(Arc::new(entries)));
        assert!(token.starts_with("{len=101 k0:0, k1:1"));
        assert!(token.ends_with(", \u{2026}}"));
        assert!(token.contains("k99:99"));
        assert!(!token.contains("k100:100"));
    }

    #[test]
    fn test_nested_within_depth() {
        let inner = TraceValue::list(vec![TraceValue::Int(7)]);
        let mid = TraceValue::map(pairs(&[("xs", inner)]));
        let outer = TraceValue::list(vec![mid]);
        assert_eq!(preview(&outer), "[len=1 {len=1 xs:[len=1 7]}]");
    }

    #[test]
    fn test_depth_guard_summarizes() {
        // Depth 0..2 expand, depth 3 collapses to {len=N}.
        let deepest = TraceValue::list(vec![TraceValue::Int(1), TraceValue::Int(2)]);
        let d2 = TraceValue::list(vec![deepest]);
        let d1 = TraceValue::list(vec![d2]);
        let d0 = TraceValue::list(vec![d1]);
        assert_eq!(preview(&d0), "[len=1 [len=1 [len=1 {len=2}]]]");
    }

    #[test]
    fn test_depth_guard_counts_map_keys() {
        let deepest = TraceValue::map(pairs(&[
            ("a", TraceValue::Int(1)),
            ("b", TraceValue::Int(2)),
            ("c", TraceValue::Int(3)),
        ]));
        let d2 = TraceValue::list(vec![deepest]);
        let d1 = TraceValue::list(vec![d2]);
        let d0 = TraceValue::list(vec![d1]);
        assert_eq!(preview(&d0), "[len=1 [len=1 [len=1 {len=3}]]]");
    }

    #[test]
    fn test_shared_node_renders_circular() {
        // The visited set is keyed on allocation identity, so the second
        // occurrence of the same shared node short-circuits.
        let shared = TraceValue::list(vec![TraceValue::Int(1)]);
        let v = TraceValue::map(pairs(&[("a", shared.clone()), ("b", shared)]));
        assert_eq!(preview(&v), "{len=2 a:[len=1 1], b:{Circular}}");
    }

    #[test]
    fn test_equal_but_distinct_nodes_not_circular() {
        let a = TraceValue::list(vec![TraceValue::Int(1)]);
        let b = TraceValue::list(vec![TraceValue::Int(1)]);
        let v = TraceValue::map(pairs(&[("a", a), ("b", b)]));
        assert_eq!(preview(&v), "{len=2 a:[len=1 1], b:[len=1 1]}");
    }

    #[test]
    fn test_visited_set_fresh_per_call() {
        let shared = TraceValue::list(vec![TraceValue::Int(1)]);
        let v = TraceValue::map(pairs(&[("a", shared)]));
        // Two top-level calls must not observe each other's visited set.
        assert_eq!(preview(&v), preview(&v));
        assert_eq!(preview(&v), "{len=1 a:[len=1 1]}");
    }

    #[test]
    fn test_deterministic() {
        let v = TraceValue::map(pairs(&[
            ("z", TraceValue::Int(1)),
            ("a", TraceValue::list(vec![TraceValue::str("s")])),
        ]));
        let first = preview(&v);
        for _ in 0..10 {
            assert_eq!(preview(&v), first);
        }
    }
}
