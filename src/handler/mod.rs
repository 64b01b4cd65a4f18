//! Request handler module
//!
//! Entry point for HTTP requests and the demo route table they dispatch to.

pub mod demo;
pub mod router;

pub use demo::{build_router, DemoState};
pub use router::handle_request;
