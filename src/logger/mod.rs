//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Subscriber setup from configuration
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use anyhow::Context;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{Config, LogFormat};
use crate::schema::ValidationErrors;

/// Initialize the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` overrides
/// `logging.level`.
pub fn init(config: &Config) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level)
            .with_context(|| format!("Invalid log level '{}'", config.logging.level))?,
    };

    let fmt_layer = match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: usize) {
    tracing::info!(
        %addr,
        routes,
        workers = ?config.server.workers,
        max_body_size = config.http.max_body_size,
        max_connections = ?config.performance.max_connections,
        "Server listening on http://{addr}"
    );
}

pub fn log_shutdown() {
    tracing::info!("Shutdown signal received, no longer accepting connections");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "Connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    tracing::debug!(%method, %uri, ?version, "Request received");
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        tracing::info!(count, "Request headers");
    }
}

pub fn log_validation_failure(method: &Method, path: &str, errors: &ValidationErrors) {
    tracing::info!(%method, path, "Request rejected: {errors}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
