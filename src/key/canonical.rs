//! Canonical Rendering Module
//!
//! Renders argument values to a deterministic JSON byte string. Object keys
//! are emitted in sorted order at every nesting level, so two structurally
//! equal values always render identically regardless of how their maps were
//! built or which map-ordering features `serde_json` was compiled with.

use std::collections::BTreeMap;

use serde_json::Value;

// == Payload Rendering ==
/// Renders `(positional, keyword)` as a canonical two-element JSON array.
///
/// Keyword arguments arrive in a `BTreeMap`, already sorted by name; nested
/// objects inside any argument are sorted during rendering.
pub(crate) fn canonical_payload(positional: &[Value], keyword: &BTreeMap<String, Value>) -> String {
    let mut out = String::new();
    out.push('[');
    out.push('[');
    for (i, value) in positional.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        render(value, &mut out);
    }
    out.push(']');
    out.push(',');
    out.push('{');
    for (i, (name, value)) in keyword.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        render_string(name, &mut out);
        out.push(':');
        render(value, &mut out);
    }
    out.push('}');
    out.push(']');
    out
}

// == Value Rendering ==
/// Writes a single JSON value with recursively sorted object keys.
fn render(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        // serde_json::Number's Display is the canonical JSON rendering
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => render_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(name, _)| *name);

            out.push('{');
            for (i, (name, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render_string(name, out);
                out.push(':');
                render(item, out);
            }
            out.push('}');
        }
    }
}

/// Writes a JSON string literal with the escapes required by RFC 8259.
fn render_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
