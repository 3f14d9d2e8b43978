//! Prompt template rendering.
//!
//! Templates use `{{field}}` or `{{{field}}}` placeholders keyed by the wire
//! name of an input field. Both forms substitute the raw value; no escaping
//! is applied. `{{outputSchema}}` is reserved and expands to the task's
//! output schema as JSON.

use serde_json::{Map, Value};

/// Placeholder that expands to the output schema.
pub const OUTPUT_SCHEMA_PLACEHOLDER: &str = "outputSchema";

/// Substitute every placeholder in `template` with the matching field of
/// `input` (a JSON object).
///
/// Returns `Err` for an unterminated placeholder or a key the input does not
/// carry.
pub fn render(template: &str, input: &Value, output_schema: &Value) -> Result<String, String> {
    let fields = input
        .as_object()
        .ok_or_else(|| "prompt input must be a JSON object".to_string())?;

    let mut out = String::with_capacity(template.len() + 256);
    for segment in segments(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(key) => out.push_str(&lookup(key, fields, output_schema)?),
        }
    }
    Ok(out)
}

/// All placeholder keys in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, String> {
    Ok(segments(template)?
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(key) => Some(key),
            Segment::Literal(_) => None,
        })
        .collect())
}

/// String form of a field value as it appears in a prompt.
///
/// Strings are inserted verbatim, integers without a decimal point, and
/// floats in their shortest form (`0.6`, `10000`).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut out = Vec::new();
    let mut rest = template;
    let mut offset = 0;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            out.push(Segment::Literal(&rest[..start]));
        }
        let tail = &rest[start..];
        let (open, close) = if tail.starts_with("{{{") {
            (3, "}}}")
        } else {
            (2, "}}")
        };
        let body = &tail[open..];
        let end = body
            .find(close)
            .ok_or_else(|| format!("unterminated placeholder at byte {}", offset + start))?;
        let key = body[..end].trim();
        if key.is_empty() {
            return Err(format!("empty placeholder at byte {}", offset + start));
        }
        out.push(Segment::Placeholder(key));
        let consumed = start + open + end + close.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    Ok(out)
}

fn lookup(key: &str, fields: &Map<String, Value>, output_schema: &Value) -> Result<String, String> {
    if key == OUTPUT_SCHEMA_PLACEHOLDER {
        return Ok(output_schema.to_string());
    }
    fields
        .get(key)
        .map(display_value)
        .ok_or_else(|| format!("template references unknown field '{key}'"))
}
