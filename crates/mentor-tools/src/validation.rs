//! Generic argument checks against a tool's published JSON schema.

use mentor_core::ToolError;
use serde_json::Value;

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks required fields and the JSON type of every supplied property.
///
/// Only `type`, `properties` and `required` are interpreted. Unknown
/// properties are allowed.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let Some(fields) = args.as_object() else {
        return Err(ToolError::InvalidArguments(format!(
            "expected an object, got {}",
            json_type_name(args)
        )));
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|n| n.as_str()) {
            match fields.get(name) {
                None | Some(Value::Null) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required field '{name}'"
                    )))
                }
                Some(_) => {}
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        for (name, value) in fields {
            let Some(expected) = properties
                .get(name)
                .and_then(|property| property.get("type"))
                .and_then(|t| t.as_str())
            else {
                continue;
            };
            if !type_matches(expected, value) {
                return Err(ToolError::InvalidArguments(format!(
                    "field '{name}' must be of type {expected}, got {}",
                    json_type_name(value)
                )));
            }
        }
    }

    Ok(())
}
