use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ── Result envelope ──

/// Normalized result envelope produced by every dispatch path.
///
/// `data` is present iff `success` is true; `error` carries the failure
/// message otherwise. `errorHint` optionally names a registered prompt
/// that a calling agent can render for remediation guidance — the
/// dispatcher never renders it itself.
///
/// This is the wire-visible contract: it round-trips losslessly through
/// JSON, and no dispatch path returns a differently shaped outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_hint: Option<String>,
}

impl Envelope {
    /// Attach a remediation prompt name as the envelope's `errorHint`.
    #[must_use]
    pub fn with_hint(mut self, prompt: impl Into<String>) -> Self {
        self.error_hint = Some(prompt.into());
        self
    }
}

/// Create a success envelope wrapping the handler's value unmodified.
pub fn ok_envelope(data: Value) -> Envelope {
    Envelope {
        success: true,
        data: Some(data),
        error: None,
        error_hint: None,
    }
}

/// Create a failure envelope carrying a human-readable message.
pub fn error_envelope(message: impl Into<String>) -> Envelope {
    Envelope {
        success: false,
        data: None,
        error: Some(message.into()),
        error_hint: None,
    }
}

// ── Schema descriptor ──

/// Type tag a parameter value must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl ParamKind {
    /// The JSON Schema name for this tag.
    pub fn name(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
        }
    }

    /// Parse a JSON Schema type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamKind::String),
            "number" => Some(ParamKind::Number),
            "integer" => Some(ParamKind::Integer),
            "boolean" => Some(ParamKind::Boolean),
            "object" => Some(ParamKind::Object),
            _ => None,
        }
    }

    pub(crate) fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
        }
    }
}

/// One node in a descriptor's parameter tree: a named parameter with its
/// type tag and declared constraints. `Object` parameters carry their own
/// property tree in `properties`.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
    pub choices: Option<Vec<Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub properties: Vec<ParamSpec>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        ParamSpec {
            name: name.into(),
            kind,
            description: None,
            required: false,
            default: None,
            choices: None,
            minimum: None,
            maximum: None,
            properties: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    /// An object parameter with a nested property tree.
    pub fn object(name: impl Into<String>, properties: Vec<ParamSpec>) -> Self {
        let mut spec = Self::new(name, ParamKind::Object);
        spec.properties = properties;
        spec
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Default applied when the parameter is absent from a call.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict the parameter to an enumerated set of values.
    #[must_use]
    pub fn one_of(mut self, choices: Vec<Value>) -> Self {
        self.choices = Some(choices);
        self
    }

    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Render this parameter as a JSON Schema property.
    fn render(&self) -> Value {
        let mut obj = match self.kind {
            ParamKind::Object => render_schema(&self.properties),
            _ => {
                let mut m = Map::new();
                m.insert("type".into(), json!(self.kind.name()));
                m
            }
        };
        if let Some(text) = &self.description {
            obj.insert("description".into(), json!(text));
        }
        if let Some(choices) = &self.choices {
            obj.insert("enum".into(), Value::Array(choices.clone()));
        }
        if let Some(min) = self.minimum {
            obj.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            obj.insert("maximum".into(), json!(max));
        }
        if let Some(default) = &self.default {
            obj.insert("default".into(), default.clone());
        }
        Value::Object(obj)
    }
}

/// Render a parameter tree as a JSON Schema object node.
fn render_schema(specs: &[ParamSpec]) -> Map<String, Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in specs {
        if spec.required {
            required.push(Value::String(spec.name.clone()));
        }
        properties.insert(spec.name.clone(), spec.render());
    }
    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema
}

/// Describes a tool: its unique name, human-readable description, and the
/// argument shape it accepts. Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema shape of the accepted arguments, as surfaced to clients.
    pub input_schema: Value,
    /// Typed parameter tree used for validation (not serialized).
    #[serde(skip)]
    params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Build a descriptor from typed parameter specs. The serialized
    /// `inputSchema` is rendered from the same specs, so the two views
    /// cannot drift.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
    ) -> Self {
        let input_schema = Value::Object(render_schema(&params));
        ToolDescriptor {
            name: name.into(),
            description: description.into(),
            input_schema,
            params,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        description: String,
        input_schema: Value,
        params: Vec<ParamSpec>,
    ) -> Self {
        ToolDescriptor {
            name,
            description,
            input_schema,
            params,
        }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

// ── Errors ──

/// Which registry a failed lookup was against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tool,
    Prompt,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Tool => f.write_str("Tool"),
            EntryKind::Prompt => f.write_str("Prompt"),
        }
    }
}

/// Error type for the crate.
///
/// Registration-time variants (`DuplicateName`, `InvalidTemplate`) surface
/// synchronously to the registering code. Dispatch-time variants are
/// caught at the dispatcher boundary and converted into failure
/// envelopes; they never escape to the transport layer as faults.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("'{0}' is already registered")]
    DuplicateName(String),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntryKind, name: String },
    #[error("invalid resource template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
    #[error("no resource template matches '{0}'")]
    NoMatch(String),
    #[error("missing required argument '{0}'")]
    MissingArgument(String),
    #[error("argument '{name}': expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("argument '{name}': {reason}")]
    ConstraintViolation { name: String, reason: String },
    #[error("invocation of '{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    /// Opaque fault raised by a handler's own logic.
    #[error("{0}")]
    Handler(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON type name of a value, for mismatch messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
