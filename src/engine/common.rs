//! Common utilities for the patch engine
//!
//! Literal rendering for generated code and payload collision checks.

use serde_json::Value;

use crate::engine::rewrite::{residual_delimiter, TokenRewriter};
use crate::error::PatchError;
use crate::input::DummyRule;

/// Render a JSON value as a Python literal
///
/// Object field order is preserved.
pub fn render_literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, value);
    out
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote_str(s)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&quote_str(key));
                out.push_str(": ");
                write_literal(out, item);
            }
            out.push('}');
        }
    }
}

/// Quote a string the way Python 2's `repr` does
///
/// Non-ASCII text becomes a `u''` literal with `\x`/`\u`/`\U` escapes, which
/// both Python 2 (without a coding line) and Python 3 accept.
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 3);
    if !s.is_ascii() {
        out.push('u');
    }
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if !c.is_ascii() => push_unicode_escape(&mut out, c),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Escape only the non-ASCII characters of `s`
pub fn escape_non_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            push_unicode_escape(&mut out, c);
        }
    }
    out
}

fn push_unicode_escape(out: &mut String, c: char) {
    let code = c as u32;
    let escaped = match code {
        0..=0xff => format!("\\x{:02x}", code),
        0x100..=0xffff => format!("\\u{:04x}", code),
        _ => format!("\\U{:08x}", code),
    };
    out.push_str(&escaped);
}

/// Shorten text for error context
pub fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Check whether a rule's payload survives raw quoting and token rewriting
///
/// Strings spliced between single quotes must not contain a quote or a line
/// break. Rendered literals must not keep delimiter sequences after the
/// rewrite pass, since those are stray markers no rule consumes.
pub fn find_collision(
    index: usize,
    rule: &DummyRule,
    rewriter: &TokenRewriter,
) -> Option<PatchError> {
    let collision = |fragment: String| PatchError::SubstitutionCollision {
        index,
        action_id: rule.action_id.clone(),
        fragment,
    };

    let raw_fields = [
        Some(("action", rule.action_id.as_str())),
        Some(("message", rule.payload.message.as_str())),
        rule.guard_parameter.as_deref().map(|p| ("parameter", p)),
        rule.guard_value.as_deref().map(|v| ("value", v)),
    ];

    for (name, text) in raw_fields.into_iter().flatten() {
        if text.contains(['\'', '\n', '\r', '\\']) {
            return Some(collision(format!(
                "{} `{}` contains a quote, backslash or line break",
                name,
                excerpt(text, 40)
            )));
        }
        if let Some(delim) = residual_delimiter(text) {
            if name != "message" {
                return Some(collision(format!(
                    "{} `{}` contains `{}`",
                    name,
                    excerpt(text, 40),
                    delim
                )));
            }
        }
    }

    let rendered = std::iter::once(&rule.payload.summary)
        .chain(rule.payload.data.iter())
        .map(render_literal);

    for literal in rendered.chain(std::iter::once(quote_str(&rule.payload.message))) {
        let rewritten = rewriter.rewrite(&literal);
        if let Some(delim) = residual_delimiter(&rewritten) {
            return Some(collision(format!(
                "stray `{}` in `{}`",
                delim,
                excerpt(&literal, 60)
            )));
        }
    }

    None
}
