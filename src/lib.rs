pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod expansion;
pub mod types;

use api::{HighlightsApi, HttpHighlightsApi};
use cache::HighlightCache;
use config::Config;
use discovery::DiscoveryOrchestrator;
use error::ApiError;
use expansion::ExpansionTracker;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Session state, built once at startup and handed to every command.
pub struct AppState {
    pub expansion: ExpansionTracker,
    pub discovery: DiscoveryOrchestrator,
}

impl AppState {
    pub fn new(api: Arc<dyn HighlightsApi>) -> Self {
        let cache = Arc::new(HighlightCache::new());
        Self {
            expansion: ExpansionTracker::new(),
            discovery: DiscoveryOrchestrator::new(api, cache),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api = HttpHighlightsApi::new(config)?;
        Ok(Self::new(Arc::new(api)))
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hilites_core=info,hilites=info"));
    // A subscriber may already be installed (tests, embedding apps).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
