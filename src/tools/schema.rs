//! Declarative input schemas for tools.
//!
//! A schema lists named parameters with a type, a required flag, an
//! optional default and a description. It does two jobs: validate raw
//! arguments (applying defaults and dropping undeclared keys) and render
//! itself as the JSON Schema advertised by `tools/list`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::{FieldViolation, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    fn json_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    /// The value as this type, or `None` if it does not fit.
    ///
    /// Integers may arrive with a zero fraction (`5.0`); those are
    /// normalized to an integer so typed argument structs deserialize.
    fn coerce(self, value: &Value) -> Option<Value> {
        let fits = match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer if value.is_i64() || value.is_u64() => true,
            Self::Integer => return whole_number(value).map(Value::from),
            Self::Boolean => value.is_boolean(),
        };
        fits.then(|| value.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: &'static str,
}

/// Ordered set of parameters accepted by one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    params: Vec<ParamSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, spec: ParamSpec) -> Self {
        self.params.retain(|p| p.name != spec.name);
        self.params.push(spec);
        self
    }

    pub fn required(self, name: &'static str, kind: ParamType, description: &'static str) -> Self {
        self.push(ParamSpec {
            name,
            kind,
            required: true,
            default: None,
            description,
        })
    }

    pub fn optional(self, name: &'static str, kind: ParamType, description: &'static str) -> Self {
        self.push(ParamSpec {
            name,
            kind,
            required: false,
            default: None,
            description,
        })
    }

    /// Optional parameter filled with `default` when absent.
    pub fn with_default(
        self,
        name: &'static str,
        kind: ParamType,
        default: impl Into<Value>,
        description: &'static str,
    ) -> Self {
        self.push(ParamSpec {
            name,
            kind,
            required: false,
            default: Some(default.into()),
            description,
        })
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate raw arguments.
    ///
    /// On success the returned map holds exactly the declared parameters
    /// that were supplied or defaulted. `null` counts as absent. Every
    /// violation is reported, not just the first.
    pub fn validate(&self, raw: &Value) -> Result<Map<String, Value>, Vec<FieldViolation>> {
        let empty = Map::new();
        let args = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(vec![FieldViolation::new(
                    "arguments",
                    "expected an object",
                )]);
            }
        };

        let mut validated = Map::with_capacity(self.params.len());
        let mut violations = Vec::new();

        for spec in &self.params {
            match args.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => match spec.kind.coerce(value) {
                    Some(value) => {
                        validated.insert(spec.name.to_string(), value);
                    }
                    None => violations.push(FieldViolation::new(
                        spec.name,
                        format!("expected {}, got {}", spec.kind.json_name(), kind_of(value)),
                    )),
                },
                None => {
                    if let Some(default) = &spec.default {
                        validated.insert(spec.name.to_string(), default.clone());
                    } else if spec.required {
                        violations.push(FieldViolation::new(spec.name, "is required"));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(violations)
        }
    }

    /// JSON Schema object for `tools/list`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::with_capacity(self.params.len());
        let mut required = Vec::new();

        for spec in &self.params {
            let mut prop = json!({
                "type": spec.kind.json_name(),
                "description": spec.description,
            });
            if let (Some(default), Some(obj)) = (&spec.default, prop.as_object_mut()) {
                obj.insert("default".to_string(), default.clone());
            }
            properties.insert(spec.name.to_string(), prop);
            if spec.required {
                required.push(Value::from(spec.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Deserialize validated arguments into a handler's typed struct.
pub fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::Validation {
        violations: vec![FieldViolation::new("arguments", e.to_string())],
    })
}

fn whole_number(value: &Value) -> Option<i64> {
    let f = value.as_f64()?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
