use std::path::Path;

use serde_json::Value;

use crate::types::{DispatchError, ParamKind, ParamSpec, ToolDescriptor};

/// Load tool definitions from a JSON file on disk.
pub fn load_tools(path: impl AsRef<Path>) -> Result<Vec<ToolDescriptor>, DispatchError> {
    let data = std::fs::read(path)?;
    parse_tools(&data)
}

/// Parse tool definitions from raw JSON bytes.
///
/// Expects an array of `{"name", "description", "inputSchema"}` objects
/// where `inputSchema` follows the JSON Schema object convention. The
/// original schema value is kept verbatim for clients; the typed
/// parameter tree used for validation is extracted from it.
pub fn parse_tools(data: &[u8]) -> Result<Vec<ToolDescriptor>, DispatchError> {
    let raw: Vec<Value> = serde_json::from_slice(data)?;
    let mut tools = Vec::with_capacity(raw.len());

    for val in raw {
        let name = val["name"].as_str().unwrap_or_default().to_string();
        let description = val["description"].as_str().unwrap_or_default().to_string();
        let input_schema = val["inputSchema"].clone();
        let params = parse_schema(&input_schema);
        tools.push(ToolDescriptor::from_parts(name, description, input_schema, params));
    }

    Ok(tools)
}

/// Extract the typed parameter tree from a JSON Schema object node.
fn parse_schema(schema: &Value) -> Vec<ParamSpec> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut specs = Vec::new();
    for (name, prop) in properties {
        let kind = prop
            .get("type")
            .and_then(Value::as_str)
            .and_then(ParamKind::from_name)
            .unwrap_or(ParamKind::String);

        let mut spec = match kind {
            ParamKind::Object => ParamSpec::object(name, parse_schema(prop)),
            _ => ParamSpec::new(name, kind),
        };
        if required.contains(&name.as_str()) {
            spec = spec.required();
        }
        if let Some(text) = prop.get("description").and_then(Value::as_str) {
            spec = spec.describe(text);
        }
        if let Some(choices) = prop.get("enum").and_then(Value::as_array) {
            spec = spec.one_of(choices.clone());
        }
        if let Some(min) = prop.get("minimum").and_then(Value::as_f64) {
            spec = spec.minimum(min);
        }
        if let Some(max) = prop.get("maximum").and_then(Value::as_f64) {
            spec = spec.maximum(max);
        }
        if let Some(default) = prop.get("default") {
            spec = spec.default_value(default.clone());
        }
        specs.push(spec);
    }
    specs
}
