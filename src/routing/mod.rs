//! Routing module
//!
//! Provides the router table and request dispatch:
//! - Path templates with typed parameter segments
//! - Builder-style route registration with duplicate detection
//! - Validate-then-invoke dispatch over decoupled request parts

mod args;
mod error;
mod router;
mod template;

pub use args::RouteArgs;
pub use error::{HandlerError, RouteError};
pub use router::{BodyKind, Dispatch, RequestParts, Router, RouterBuilder};
pub use template::PathTemplate;
