// Application state module
// Shared by every connection task

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::handler::DemoState;
use crate::routing::Router;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Router table; owns the injected demo state
    pub router: Router<DemoState>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, router: Router<DemoState>) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            router,
            cached_access_log,
        }
    }
}
