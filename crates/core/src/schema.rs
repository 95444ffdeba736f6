//! Canonical tool-argument schema.
//!
//! A [`Schema`] is declared once per tool and used twice: to validate the
//! arguments the model sends, and to project a JSON-schema document that each
//! vendor's tool declaration format embeds.

use serde_json::{Map, Value, json};

/// A tagged description of a JSON value shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<String>,
    },
    Number {
        description: Option<String>,
    },
    Integer {
        description: Option<String>,
    },
    Boolean {
        description: Option<String>,
    },
    Array {
        items: Box<Schema>,
        description: Option<String>,
    },
    /// A string restricted to a fixed set of values.
    Enum {
        values: Vec<String>,
        description: Option<String>,
    },
    Object {
        /// Declaration order is kept for readable error messages.
        properties: Vec<(String, Schema)>,
        required: Vec<String>,
        description: Option<String>,
    },
    /// Free-form value (records, request bodies). Projected as an object.
    Any {
        description: Option<String>,
    },
}

impl Schema {
    pub fn string() -> Self {
        Self::String { description: None }
    }

    pub fn number() -> Self {
        Self::Number { description: None }
    }

    pub fn integer() -> Self {
        Self::Integer { description: None }
    }

    pub fn boolean() -> Self {
        Self::Boolean { description: None }
    }

    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
            description: None,
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn object() -> Self {
        Self::Object {
            properties: Vec::new(),
            required: Vec::new(),
            description: None,
        }
    }

    pub fn any() -> Self {
        Self::Any { description: None }
    }

    /// Attach a description shown to the model.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Self::String { description }
            | Self::Number { description }
            | Self::Integer { description }
            | Self::Boolean { description }
            | Self::Array { description, .. }
            | Self::Enum { description, .. }
            | Self::Object { description, .. }
            | Self::Any { description } => *description = text,
        }
        self
    }

    /// Add a required property. No-op on non-object schemas.
    pub fn field(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_property(name.into(), schema, true)
    }

    /// Add an optional property. No-op on non-object schemas.
    pub fn optional(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_property(name.into(), schema, false)
    }

    fn with_property(mut self, name: String, schema: Schema, is_required: bool) -> Self {
        if let Self::Object {
            properties,
            required,
            ..
        } = &mut self
        {
            properties.retain(|(existing, _)| existing != &name);
            required.retain(|existing| existing != &name);
            if is_required {
                required.push(name.clone());
            }
            properties.push((name, schema));
        }
        self
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } | Self::Enum { .. } => "string",
            Self::Number { .. } => "number",
            Self::Integer { .. } => "integer",
            Self::Boolean { .. } => "boolean",
            Self::Array { .. } => "array",
            Self::Object { .. } | Self::Any { .. } => "object",
        }
    }

    /// Validate tool-call arguments against an object schema.
    pub fn validate_args(&self, args: &Map<String, Value>) -> Result<(), String> {
        self.validate_at(&Value::Object(args.clone()), "")
    }

    /// Validate any JSON value against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.validate_at(value, "")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), String> {
        let mismatch = || {
            let at = if path.is_empty() {
                "arguments".to_string()
            } else {
                format!("field '{path}'")
            };
            Err(format!(
                "{at}: expected {}, got {}",
                self.type_name(),
                json_kind(value)
            ))
        };

        match self {
            Self::String { .. } => {
                if !value.is_string() {
                    return mismatch();
                }
            }
            Self::Number { .. } => {
                if !value.is_number() {
                    return mismatch();
                }
            }
            Self::Integer { .. } => {
                let whole = value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.fract() == 0.0);
                if !whole {
                    return mismatch();
                }
            }
            Self::Boolean { .. } => {
                if !value.is_boolean() {
                    return mismatch();
                }
            }
            Self::Enum { values, .. } => {
                let Some(text) = value.as_str() else {
                    return mismatch();
                };
                if !values.iter().any(|v| v == text) {
                    return Err(format!(
                        "field '{path}': '{text}' is not one of [{}]",
                        values.join(", ")
                    ));
                }
            }
            Self::Array { items, .. } => {
                let Some(elements) = value.as_array() else {
                    return mismatch();
                };
                for (index, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{path}[{index}]"))?;
                }
            }
            Self::Object {
                properties,
                required,
                ..
            } => {
                let Some(object) = value.as_object() else {
                    return mismatch();
                };
                for name in required {
                    if object.get(name).is_none_or(Value::is_null) {
                        return Err(format!("missing required field '{}'", join(path, name)));
                    }
                }
                for (name, schema) in properties {
                    match object.get(name) {
                        None | Some(Value::Null) => {}
                        Some(child) => schema.validate_at(child, &join(path, name))?,
                    }
                }
            }
            Self::Any { .. } => {}
        }
        Ok(())
    }

    /// Project into a JSON-schema document (the `parameters` / `input_schema`
    /// body of a vendor tool declaration).
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), json!(self.type_name()));

        let description = match self {
            Self::String { description }
            | Self::Number { description }
            | Self::Integer { description }
            | Self::Boolean { description }
            | Self::Array { description, .. }
            | Self::Enum { description, .. }
            | Self::Object { description, .. }
            | Self::Any { description } => description,
        };
        if let Some(text) = description {
            out.insert("description".into(), json!(text));
        }

        match self {
            Self::Enum { values, .. } => {
                out.insert("enum".into(), json!(values));
            }
            Self::Array { items, .. } => {
                out.insert("items".into(), items.to_json_schema());
            }
            Self::Object {
                properties,
                required,
                ..
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                out.insert("required".into(), json!(required));
            }
            _ => {}
        }

        Value::Object(out)
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
