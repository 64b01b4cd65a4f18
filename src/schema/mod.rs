//! Schema validation module
//!
//! Validates raw request values (path segments, query strings, JSON bodies)
//! against a declared shape, coercing compatible scalars to the declared type.
//!
//! Validation reports every missing required field, plus the first field whose
//! value cannot be coerced.

mod coerce;
mod error;

pub use coerce::coerce;
pub use error::{FieldError, Location, ValidationErrors};

use serde_json::{Map, Value};
use std::fmt;

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Float,
    Str,
}

impl FieldType {
    /// Parse a type name as written in path templates (`int`, `float`, `str`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
        }
    }
}

/// A single declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    /// `None` marks the field as required
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: FieldType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }
}

/// Ordered set of field declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    #[must_use]
    pub fn required(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(FieldSpec::required(name, ty))
    }

    #[must_use]
    pub fn optional(self, name: impl Into<String>, ty: FieldType, default: Value) -> Self {
        self.field(FieldSpec::optional(name, ty, default))
    }

    /// Validate a JSON object against this schema.
    ///
    /// Returns the coerced values for every declared field (defaults filled in).
    /// Undeclared keys are dropped.
    pub fn validate(
        &self,
        location: Location,
        values: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let mut validated = Map::new();
        let mut errors = Vec::new();
        let mut coercion_failed = false;

        for spec in &self.fields {
            match (values.get(&spec.name), &spec.default) {
                (None | Some(Value::Null), Some(default)) => {
                    validated.insert(spec.name.clone(), default.clone());
                }
                (None, None) => errors.push(FieldError::Missing {
                    location,
                    field: spec.name.clone(),
                }),
                // Only the first coercion failure is reported
                (Some(_), _) if coercion_failed => {}
                (Some(raw), _) => match coerce(spec.ty, raw) {
                    Some(value) => {
                        validated.insert(spec.name.clone(), value);
                    }
                    None => {
                        coercion_failed = true;
                        errors.push(FieldError::Coercion {
                            location,
                            field: spec.name.clone(),
                            expected: spec.ty,
                        });
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(ValidationErrors::new(errors))
        }
    }

    /// Validate string pairs (query string or path segments).
    ///
    /// When a key repeats, the last value wins.
    pub fn validate_strings(
        &self,
        location: Location,
        pairs: &[(String, String)],
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let values: Map<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.validate(location, &values)
    }
}
