//! Tool entities: descriptors and the session catalog.

use super::dialect::{Dialect, translate};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Provider-neutral description of a callable tool.
///
/// Deserializes directly from a backend `tools/list` entry, where the
/// parameter schema is published as `inputSchema`.
///
/// # Example
///
/// ```
/// use relay_domain::tool::entities::ToolDescriptor;
/// use serde_json::json;
///
/// let tool = ToolDescriptor::new("get_count", "Count tickets")
///     .with_schema(json!({
///         "type": "object",
///         "properties": { "days": { "type": "number" } },
///         "required": ["days"]
///     }));
///
/// assert_eq!(tool.required_parameters(), vec!["days"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,
    /// Human-readable description shown to the model
    #[serde(default)]
    pub description: String,
    /// JSON-schema-like parameter tree, absent for parameterless tools
    #[serde(
        default,
        rename = "inputSchema",
        alias = "parameterSchema",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameter_schema = Some(schema);
        self
    }

    /// Names listed in the schema's top-level `required` array.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameter_schema
            .as_ref()
            .and_then(|s| s.get("required"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The declared top-level property schemas, if any.
    pub fn properties(&self) -> Option<&serde_json::Map<String, Value>> {
        self.parameter_schema
            .as_ref()
            .and_then(|s| s.get("properties"))
            .and_then(Value::as_object)
    }
}

/// Immutable, ordered set of [`ToolDescriptor`]s keyed by name.
///
/// Built once per session from the backend. A catalog is never partially
/// populated: construction fails on the first duplicate name.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (position, tool) in tools.iter().enumerate() {
            if index.insert(tool.name.clone(), position).is_some() {
                return Err(DomainError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(Self { tools, index })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Every descriptor translated into `dialect`, in catalog order.
    pub fn translate_all(&self, dialect: Dialect) -> Vec<Value> {
        self.tools.iter().map(|t| translate(t, dialect)).collect()
    }
}
