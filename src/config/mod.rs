// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use config::builder::DefaultState;
use config::ConfigBuilder;
use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, LogFormat};

impl Config {
    /// Load configuration from the given file path (extension optional).
    ///
    /// Sources, lowest priority first: built-in defaults, the file (optional),
    /// `APP_*` environment variables with `__` between nested keys
    /// (e.g. `APP_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only
    #[cfg(test)]
    pub fn defaults() -> Result<Self, config::ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.backlog", 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "route-demo/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576) // 1MB
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
