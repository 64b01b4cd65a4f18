// Validated handler arguments

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::HandlerError;

/// Validated, type-coerced arguments passed to a handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteArgs {
    params: Map<String, Value>,
    body: Option<Value>,
}

impl RouteArgs {
    pub(crate) const fn new(params: Map<String, Value>, body: Option<Value>) -> Self {
        Self { params, body }
    }

    /// Integer path or query parameter
    pub fn int(&self, name: &str) -> Result<i64, HandlerError> {
        self.param(name)?
            .as_i64()
            .ok_or_else(|| unvalidated(name))
    }

    /// String path or query parameter
    pub fn str(&self, name: &str) -> Result<&str, HandlerError> {
        self.param(name)?
            .as_str()
            .ok_or_else(|| unvalidated(name))
    }

    /// Raw request body (routes declared with a body)
    pub fn body(&self) -> Result<&Value, HandlerError> {
        self.body
            .as_ref()
            .ok_or_else(|| HandlerError::Internal("route declares no body".to_string()))
    }

    /// Deserialize the validated body into a typed model
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(T::deserialize(self.body()?)?)
    }

    fn param(&self, name: &str) -> Result<&Value, HandlerError> {
        self.params.get(name).ok_or_else(|| unvalidated(name))
    }
}

fn unvalidated(name: &str) -> HandlerError {
    HandlerError::Internal(format!("parameter '{name}' was not validated"))
}
