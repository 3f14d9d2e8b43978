//! Reply parsing and JSON Schema validation.

use serde_json::Value;

/// Parse a model reply into JSON.
///
/// Models sometimes wrap structured output in a Markdown code fence even
/// when asked not to; a single surrounding fence is stripped.
pub fn parse_reply(content: &str) -> Result<Value, String> {
    let trimmed = strip_code_fence(content.trim());
    let value: Value = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(format!("expected a JSON object, got {}", kind_of(&value)))
    }
}

/// Validate `instance` against `schema`.
///
/// Returns one line per violation, each prefixed with the instance path.
/// An empty vector means the instance conforms.
pub fn schema_violations(schema: &Value, instance: &Value) -> Vec<String> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => return vec![format!("invalid schema: {e}")],
    };

    validator
        .iter_errors(instance)
        .map(|e| {
            let path = e.instance_path().to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect()
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop an optional language tag on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_and_fenced_json() {
        assert_eq!(parse_reply(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            parse_reply("```json\n{\"a\": 1}\n```").unwrap(),
            json!({"a": 1})
        );
        assert_eq!(parse_reply("```\n{\"a\": 2}\n```\n").unwrap(), json!({"a": 2}));
    }

    #[test]
    fn rejects_non_objects_and_garbage() {
        assert!(parse_reply("[1, 2]").unwrap_err().contains("an array"));
        assert!(parse_reply("I think the score is 80").is_err());
        assert!(parse_reply("").is_err());
    }

    #[test]
    fn violations_report_paths() {
        let schema = json!({
            "type": "object",
            "properties": { "score": { "type": "number", "maximum": 100 } },
            "required": ["score", "reason"]
        });
        let errors = schema_violations(&schema, &json!({"score": 140}));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("/score")));
        assert!(errors.iter().any(|e| e.contains("reason")));
    }

    #[test]
    fn conforming_instance_has_no_violations() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert!(schema_violations(&schema, &json!({"a": "x"})).is_empty());
    }
}
