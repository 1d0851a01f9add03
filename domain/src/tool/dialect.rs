//! Schema Translator: provider tool-declaration dialects.
//!
//! Translation is a pure, total function from a [`ToolDescriptor`] to the JSON
//! shape a provider expects in its `tools` array. It never fails: malformed or
//! missing parameter schemas degrade to an empty object schema.
//!
//! | Dialect | Shape |
//! |---------|-------|
//! | OpenAI  | `{type:"function", function:{name, description, parameters}}` |
//! | Claude  | `{name, description, input_schema}` |
//! | Gemini  | `{name, description, parameters}` with unsupported keywords removed |

use super::entities::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// A provider's tool-schema convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    OpenAi,
    Claude,
    Gemini,
}

impl Dialect {
    pub fn all() -> [Dialect; 3] {
        [Dialect::OpenAi, Dialect::Claude, Dialect::Gemini]
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::OpenAi => write!(f, "openai"),
            Dialect::Claude => write!(f, "claude"),
            Dialect::Gemini => write!(f, "gemini"),
        }
    }
}

/// Schema keywords Gemini's function-declaration subset accepts.
///
/// Anything else (`additionalProperties`, `$ref`, `oneOf`, `anyOf`, `allOf`,
/// `$schema`, `default`, ...) is removed at every depth.
const GEMINI_KEYWORDS: &[&str] = &[
    "type",
    "format",
    "title",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minItems",
    "maxItems",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
];

/// Translate one descriptor into `dialect`.
pub fn translate(descriptor: &ToolDescriptor, dialect: Dialect) -> Value {
    let parameters = normalize_parameters(descriptor.parameter_schema.as_ref());

    match dialect {
        Dialect::OpenAi => json!({
            "type": "function",
            "function": {
                "name": descriptor.name,
                "description": descriptor.description,
                "parameters": parameters,
            }
        }),
        Dialect::Claude => json!({
            "name": descriptor.name,
            "description": descriptor.description,
            "input_schema": parameters,
        }),
        Dialect::Gemini => json!({
            "name": descriptor.name,
            "description": descriptor.description,
            "parameters": clean_gemini_schema(&parameters),
        }),
    }
}

/// Coerce a declared parameter schema into a valid object schema.
///
/// Existing keys are kept as-is; only missing or malformed `type`,
/// `properties` and `required` entries are filled in.
pub fn normalize_parameters(schema: Option<&Value>) -> Value {
    let mut map = match schema {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    if !map.get("type").is_some_and(Value::is_string) {
        map.insert("type".into(), json!("object"));
    }
    if !map.get("properties").is_some_and(Value::is_object) {
        map.insert("properties".into(), json!({}));
    }
    if !map.get("required").is_some_and(Value::is_array) {
        map.insert("required".into(), json!([]));
    }

    Value::Object(map)
}

/// Recursively reduce a schema to the Gemini keyword subset.
pub fn clean_gemini_schema(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return json!({});
    };

    let mut cleaned = Map::new();
    for (key, value) in map {
        if !GEMINI_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        match key.as_str() {
            // Keys under `properties` are property names, not keywords.
            "properties" => {
                if let Value::Object(props) = value {
                    let props = props
                        .iter()
                        .map(|(name, sub)| (name.clone(), clean_gemini_schema(sub)))
                        .collect::<Map<_, _>>();
                    cleaned.insert(key.clone(), Value::Object(props));
                }
            }
            "items" => {
                let item = match value {
                    Value::Array(tuple) => tuple.first().cloned().unwrap_or_else(|| json!({})),
                    other => other.clone(),
                };
                cleaned.insert(key.clone(), clean_gemini_schema(&item));
            }
            "type" => match value {
                Value::Array(types) => {
                    let mut nullable = false;
                    let mut primary = None;
                    for t in types.iter().filter_map(Value::as_str) {
                        if t == "null" {
                            nullable = true;
                        } else if primary.is_none() {
                            primary = Some(t.to_string());
                        }
                    }
                    cleaned.insert(
                        key.clone(),
                        json!(primary.unwrap_or_else(|| "string".to_string())),
                    );
                    if nullable {
                        cleaned.insert("nullable".into(), json!(true));
                    }
                }
                other => {
                    cleaned.insert(key.clone(), other.clone());
                }
            },
            _ => {
                cleaned.insert(key.clone(), value.clone());
            }
        }
    }

    // Gemini rejects `required` entries that name undeclared properties.
    if let Some(Value::Array(required)) = cleaned.get("required") {
        let declared = cleaned.get("properties").and_then(Value::as_object);
        let kept: Vec<Value> = required
            .iter()
            .filter(|name| {
                name.as_str()
                    .is_some_and(|n| declared.is_some_and(|props| props.contains_key(n)))
            })
            .cloned()
            .collect();
        cleaned.insert("required".into(), Value::Array(kept));
    }

    Value::Object(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIPPED: &[&str] = &["additionalProperties", "$ref", "oneOf", "anyOf", "allOf"];

    fn contains_stripped_keyword(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.iter().any(|(k, v)| {
                // property names are not keywords
                let is_keyword = STRIPPED.contains(&k.as_str());
                let nested = if k == "properties" {
                    v.as_object()
                        .is_some_and(|props| props.values().any(contains_stripped_keyword))
                } else {
                    contains_stripped_keyword(v)
                };
                is_keyword || nested
            }),
            Value::Array(items) => items.iter().any(contains_stripped_keyword),
            _ => false,
        }
    }

    fn nested_descriptor() -> ToolDescriptor {
        ToolDescriptor::new("search_tickets", "Search tickets").with_schema(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "filter": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "status": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                        "tags": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "oneOf": [{ "$ref": "#/definitions/tag" }],
                                "properties": { "name": { "type": "string", "allOf": [] } }
                            }
                        }
                    }
                },
                "limit": { "type": ["integer", "null"], "default": 10 }
            },
            "required": ["filter", "ghost"]
        }))
    }

    #[test]
    fn test_parameterless_tool_yields_empty_object_schema_in_every_dialect() {
        let tool = ToolDescriptor::new("sync_tickets", "Sync");
        for dialect in Dialect::all() {
            let translated = translate(&tool, dialect);
            let schema = match dialect {
                Dialect::OpenAi => &translated["function"]["parameters"],
                Dialect::Claude => &translated["input_schema"],
                Dialect::Gemini => &translated["parameters"],
            };
            assert_eq!(schema["type"], "object", "{dialect}");
            assert_eq!(schema["properties"], json!({}), "{dialect}");
            assert_eq!(schema["required"], json!([]), "{dialect}");
        }
    }

    #[test]
    fn test_malformed_schema_degrades_to_empty_object() {
        let tool = ToolDescriptor::new("broken", "Broken").with_schema(json!("not a schema"));
        let translated = translate(&tool, Dialect::Claude);
        assert_eq!(
            translated["input_schema"],
            json!({ "type": "object", "properties": {}, "required": [] })
        );
    }

    #[test]
    fn test_openai_passes_schema_through() {
        let tool = nested_descriptor();
        let translated = translate(&tool, Dialect::OpenAi);
        assert_eq!(translated["type"], "function");
        assert_eq!(translated["function"]["name"], "search_tickets");
        assert_eq!(
            translated["function"]["parameters"],
            tool.parameter_schema.clone().unwrap()
        );
    }

    #[test]
    fn test_claude_uses_input_schema_key() {
        let tool = nested_descriptor();
        let translated = translate(&tool, Dialect::Claude);
        assert_eq!(translated["name"], "search_tickets");
        assert_eq!(translated["description"], "Search tickets");
        assert_eq!(translated["input_schema"], tool.parameter_schema.clone().unwrap());
        assert!(translated.get("parameters").is_none());
    }

    #[test]
    fn test_gemini_strips_unsupported_keywords_at_every_depth() {
        let translated = translate(&nested_descriptor(), Dialect::Gemini);
        let params = &translated["parameters"];

        assert!(!contains_stripped_keyword(params), "{params:#}");
        assert!(params.get("$schema").is_none());
        assert_eq!(
            params["properties"]["filter"]["properties"]["tags"]["items"]["properties"]["name"]
                ["type"],
            "string"
        );
    }

    #[test]
    fn test_gemini_keeps_property_named_like_keyword() {
        let tool = ToolDescriptor::new("t", "").with_schema(json!({
            "type": "object",
            "properties": { "anyOf": { "type": "string", "additionalProperties": true } },
            "required": ["anyOf"]
        }));
        let params = translate(&tool, Dialect::Gemini)["parameters"].clone();
        assert_eq!(params["properties"]["anyOf"], json!({ "type": "string" }));
        assert_eq!(params["required"], json!(["anyOf"]));
    }

    #[test]
    fn test_gemini_collapses_nullable_type_union() {
        let params = translate(&nested_descriptor(), Dialect::Gemini)["parameters"].clone();
        assert_eq!(
            params["properties"]["limit"],
            json!({ "type": "integer", "nullable": true })
        );
    }

    #[test]
    fn test_gemini_drops_required_names_without_properties() {
        let params = translate(&nested_descriptor(), Dialect::Gemini)["parameters"].clone();
        assert_eq!(params["required"], json!(["filter"]));
    }

    #[test]
    fn test_gemini_tuple_items_use_first_schema() {
        let cleaned = clean_gemini_schema(&json!({
            "type": "array",
            "items": [{ "type": "number", "oneOf": [] }, { "type": "string" }]
        }));
        assert_eq!(cleaned["items"], json!({ "type": "number" }));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let tool = nested_descriptor();
        for dialect in Dialect::all() {
            assert_eq!(translate(&tool, dialect), translate(&tool, dialect));
        }
    }

    #[test]
    fn test_dialect_serialization() {
        assert_eq!(serde_json::to_string(&Dialect::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(Dialect::Gemini.to_string(), "gemini");
    }
}
