// Validation error types
// Each field error renders to one `{"loc", "msg", "type"}` detail entry

use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

use super::FieldType;

/// Where a value came from in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Body,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Required field absent and no default declared
    #[error("{location}.{field}: field required")]
    Missing { location: Location, field: String },

    /// Value present but not convertible to the declared type
    #[error("{location}.{field}: value is not a valid {expected}")]
    Coercion {
        location: Location,
        field: String,
        expected: FieldType,
    },

    /// A body was declared but the request carried none
    #[error("body: field required")]
    MissingBody,

    #[error("body: invalid JSON at line {line} column {column}: {message}")]
    JsonDecode {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{location}: value is not a valid dict")]
    NotAnObject { location: Location },

    /// A value derived from the input overflowed to infinity
    #[error("{location}.{field}: ensure this value is a finite number")]
    NotFinite { location: Location, field: String },
}

impl FieldError {
    /// Render as a client-facing detail entry
    pub fn to_detail(&self) -> Value {
        match self {
            Self::Missing { location, field } => json!({
                "loc": [location.to_string(), field],
                "msg": "field required",
                "type": "value_error.missing",
            }),
            Self::Coercion {
                location,
                field,
                expected,
            } => {
                let (msg, kind) = match expected {
                    FieldType::Int => ("value is not a valid integer", "type_error.integer"),
                    FieldType::Float => ("value is not a valid float", "type_error.float"),
                    FieldType::Str => ("str type expected", "type_error.str"),
                };
                json!({
                    "loc": [location.to_string(), field],
                    "msg": msg,
                    "type": kind,
                })
            }
            Self::MissingBody => json!({
                "loc": ["body"],
                "msg": "field required",
                "type": "value_error.missing",
            }),
            Self::JsonDecode {
                line,
                column,
                message,
            } => json!({
                "loc": ["body", line, column],
                "msg": message,
                "type": "value_error.jsondecode",
            }),
            Self::NotAnObject { location } => json!({
                "loc": [location.to_string()],
                "msg": "value is not a valid dict",
                "type": "type_error.dict",
            }),
            Self::NotFinite { location, field } => json!({
                "loc": [location.to_string(), field],
                "msg": "ensure this value is a finite number",
                "type": "value_error.number.not_finite_number",
            }),
        }
    }
}

/// Non-empty list of field errors from one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        if let Some(first) = self.0.first() {
            write!(f, ", first: {first}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    /// Concatenate the errors of several failed stages, in order
    pub(crate) fn merge(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::new(parts.into_iter().flat_map(|part| part.0).collect())
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Build the `{"detail": [...]}` response body
    pub fn to_body(&self) -> Value {
        json!({ "detail": self.0.iter().map(FieldError::to_detail).collect::<Vec<_>>() })
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(err: FieldError) -> Self {
        Self(vec![err])
    }
}
