// Routing error types

use hyper::Method;
use thiserror::Error;

use crate::schema::ValidationErrors;

/// Router table configuration errors, raised by `RouterBuilder::build`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("duplicate route {method} {template} (same shape as {existing})")]
    Duplicate {
        method: Method,
        template: String,
        existing: String,
    },
}

/// Errors returned by route handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Reported to the client as 404 with the message as detail
    #[error("{0}")]
    NotFound(String),

    /// Input passed schema validation but the handler rejected it; 422
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// Reported to the client as a generic 500
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
