//! Tool domain traits
//!
//! Argument validation runs before any call reaches the backend. A failed
//! check is reported back to the model as a flagged tool result; the backend
//! never sees the call.

use super::entities::ToolDescriptor;
use serde_json::Value;

/// Validator for tool-call arguments
///
/// This is a pure domain trait that checks arguments against a descriptor's
/// declared parameter schema without any I/O.
pub trait ToolValidator: Send + Sync {
    /// Validate `arguments` for `descriptor`
    fn validate(&self, descriptor: &ToolDescriptor, arguments: &Value) -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Checks that arguments form an object, that every `required` property is
/// present, and that top-level values match their declared JSON `type`.
/// Undeclared arguments are allowed through; backends commonly accept
/// optional extras that the published schema omits.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, descriptor: &ToolDescriptor, arguments: &Value) -> Result<(), String> {
        let empty = serde_json::Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(format!(
                    "Arguments for tool '{}' must be an object, got {}",
                    descriptor.name,
                    json_type_name(other)
                ));
            }
        };

        for name in descriptor.required_parameters() {
            if !args.contains_key(name) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    name, descriptor.name
                ));
            }
        }

        let Some(properties) = descriptor.properties() else {
            return Ok(());
        };

        for (name, value) in args {
            let Some(declared) = properties.get(name).and_then(|p| p.get("type")) else {
                continue;
            };
            if !type_matches(declared, value) {
                return Err(format!(
                    "Parameter '{}' for tool '{}' expected {}, got {}",
                    name,
                    descriptor.name,
                    declared,
                    json_type_name(value)
                ));
            }
        }

        Ok(())
    }
}

fn type_matches(declared: &Value, value: &Value) -> bool {
    match declared {
        Value::String(t) => single_type_matches(t, value),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| single_type_matches(t, value)),
        // Unrecognized declarations are not enforced
        _ => true,
    }
}

fn single_type_matches(declared: &str, value: &Value) -> bool {
    match declared {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
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
