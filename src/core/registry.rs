/// Tool Registry
///
/// Tools are registered once during startup and the registry is then frozen
/// behind an `Arc` and shared read-only with every worker. Each tool carries a
/// descriptor (name, description, input shape) used for discovery and argument
/// validation, and a handler that runs only on validated arguments.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::core::error::{RegistryError, ToolError, ValidationError};

/// Primitive type of a tool input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
}

impl FieldKind {
    /// JSON Schema type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
        }
    }
}

/// A single named input field.
#[derive(Debug, Clone)]
pub struct Field {
    /// Key in the arguments object
    pub name: String,
    /// Expected JSON type
    pub kind: FieldKind,
    /// Shown to clients in the input schema
    pub description: Option<String>,
}

/// Declared shape of a tool's arguments.
///
/// Every field is required. Keys not declared here are ignored.
#[derive(Debug, Clone, Default)]
pub struct InputShape {
    fields: Vec<Field>,
}

impl InputShape {
    /// Shape with no fields; any object (or no arguments at all) is accepted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a required numeric field.
    ///
    /// # Arguments
    /// * `name` - Key in the arguments object
    /// * `description` - Shown to clients in the input schema
    pub fn number(mut self, name: &str, description: &str) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            kind: FieldKind::Number,
            description: Some(description.to_string()),
        });
        self
    }

    /// Render the shape as a JSON Schema object for `tools/list`.
    pub fn to_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                let mut property = serde_json::json!({ "type": field.kind.as_str() });
                if let Some(description) = &field.description {
                    property["description"] = Value::from(description.as_str());
                }
                (field.name.clone(), property)
            })
            .collect();

        let mut schema = serde_json::json!({
            "type": "object",
            "properties": properties,
        });
        if !self.fields.is_empty() {
            let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
            schema["required"] = serde_json::json!(required);
        }
        schema
    }

    /// Check raw arguments against the shape.
    ///
    /// `Null` stands for "no arguments supplied" and is treated as `{}`.
    pub fn validate(&self, args: &Value) -> Result<ToolArguments, ValidationError> {
        let object = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => return Err(ValidationError::NotAnObject(json_type_name(other))),
        };

        for field in &self.fields {
            let value = object
                .get(&field.name)
                .ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
            if !field.kind.accepts(value) {
                return Err(ValidationError::WrongType {
                    field: field.name.clone(),
                    expected: field.kind.as_str(),
                    found: json_type_name(value),
                });
            }
        }

        Ok(ToolArguments(object))
    }
}

impl Serialize for InputShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_schema().serialize(serializer)
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

/// Arguments that passed validation against a tool's input shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    /// Numeric argument by name.
    pub fn number(&self, name: &str) -> Result<f64, ToolError> {
        self.0
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ValidationError::MissingField(name.to_string()).into())
    }
}

/// MCP tool definition, serialized as-is in `tools/list` responses.
#[derive(Serialize, Debug, Clone)]
pub struct ToolDescriptor {
    /// Unique tool identifier (e.g., "add")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// Declared arguments, rendered as JSON Schema
    #[serde(rename = "inputSchema")]
    pub input_shape: InputShape,
}

/// Tool handler function type.
///
/// Handlers receive validated arguments and return the JSON value that will
/// be serialized into the text content of the response. They must be
/// Send + Sync to be shared across HTTP worker threads.
pub type ToolHandler = Box<dyn Fn(&ToolArguments) -> Result<Value, ToolError> + Send + Sync>;

/// A descriptor bound to its handler.
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

impl RegisteredTool {
    /// Descriptor used for discovery.
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Check raw arguments against this tool's input shape.
    ///
    /// # Arguments
    /// * `args` - The `arguments` member of a tools/call request, or `Null`
    ///   when it was omitted
    pub fn validate(&self, args: &Value) -> Result<ToolArguments, ValidationError> {
        self.descriptor.input_shape.validate(args)
    }

    /// Run the handler.
    ///
    /// # Arguments
    /// * `args` - Arguments returned by `validate`
    pub fn invoke(&self, args: &ToolArguments) -> Result<Value, ToolError> {
        (self.handler)(args)
    }
}

/// Registry of available MCP tools.
#[derive(Default)]
pub struct ToolRegistry {
    /// Registration order, for tools/list
    order: Vec<String>,
    /// Tools keyed by name
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails without modifying the registry if the name is already taken.
    ///
    /// # Arguments
    /// * `descriptor` - Name, description and input shape of the tool
    /// * `handler` - Called with validated arguments on every tools/call
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: ToolHandler,
    ) -> Result<(), RegistryError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        let name = descriptor.name.clone();
        self.order.push(name.clone());
        self.tools.insert(name, RegisteredTool { descriptor, handler });
        Ok(())
    }

    /// Look up a tool by name.
    ///
    /// # Arguments
    /// * `name` - Tool name as sent by the client
    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.tools
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(RegisteredTool::descriptor)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tool has been registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair_shape() -> InputShape {
        InputShape::empty()
            .number("a", "First number")
            .number("b", "Second number")
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_shape: pair_shape(),
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry
            .register(descriptor("first"), Box::new(|_: &ToolArguments| Ok(json!(1))))
            .unwrap();

        let tool = registry.resolve("first").unwrap();
        assert_eq!(tool.descriptor().name, "first");
        let args = tool.validate(&json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(tool.invoke(&args).unwrap(), json!(1));
    }

    #[test]
    fn duplicate_registration_keeps_the_original() {
        let mut registry = ToolRegistry::new();
        registry
            .register(descriptor("dup"), Box::new(|_: &ToolArguments| Ok(json!("original"))))
            .unwrap();

        let err = registry
            .register(descriptor("dup"), Box::new(|_: &ToolArguments| Ok(json!("replacement"))))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("dup".into()));
        assert_eq!(registry.len(), 1);

        let tool = registry.resolve("dup").unwrap();
        let args = tool.validate(&json!({ "a": 0, "b": 0 })).unwrap();
        assert_eq!(tool.invoke(&args).unwrap(), json!("original"));
    }

    #[test]
    fn resolve_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve("missing"),
            Err(RegistryError::NotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn tools_are_listed_in_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(descriptor(name), Box::new(|_: &ToolArguments| Ok(Value::Null)))
                .unwrap();
        }
        let names: Vec<&str> = registry.tools().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn validate_rejects_non_numeric_fields() {
        let err = pair_shape().validate(&json!({ "a": "5", "b": 3 })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "a".into(),
                expected: "number",
                found: "string",
            }
        );
    }

    #[test]
    fn validate_rejects_missing_fields_and_non_objects() {
        assert_eq!(
            pair_shape().validate(&json!({ "a": 1 })).unwrap_err(),
            ValidationError::MissingField("b".into())
        );
        assert_eq!(
            pair_shape().validate(&json!([1, 2])).unwrap_err(),
            ValidationError::NotAnObject("array")
        );
        assert_eq!(
            pair_shape().validate(&Value::Null).unwrap_err(),
            ValidationError::MissingField("a".into())
        );
    }

    #[test]
    fn validate_ignores_extra_keys() {
        let args = pair_shape()
            .validate(&json!({ "a": 1.5, "b": -2, "note": "ignored" }))
            .unwrap();
        assert_eq!(args.number("a").unwrap(), 1.5);
        assert_eq!(args.number("b").unwrap(), -2.0);
    }

    #[test]
    fn empty_shape_accepts_missing_arguments() {
        assert!(InputShape::empty().validate(&Value::Null).is_ok());
        assert!(InputShape::empty().validate(&json!({})).is_ok());
    }

    #[test]
    fn schema_lists_required_fields() {
        assert_eq!(
            pair_shape().to_schema(),
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number", "description": "First number" },
                    "b": { "type": "number", "description": "Second number" }
                },
                "required": ["a", "b"]
            })
        );
        assert_eq!(
            InputShape::empty().to_schema(),
            json!({ "type": "object", "properties": {} })
        );
    }

    #[test]
    fn descriptor_serializes_camel_case_schema() {
        let value = serde_json::to_value(descriptor("add")).unwrap();
        assert_eq!(value["name"], "add");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_shape").is_none());
    }
}
