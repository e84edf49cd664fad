use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::agent::{default_registry, AgentBridge, ToolContext};
use crate::config::AppConfig;
use crate::data::Fixtures;
use crate::market::MarketStore;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Tool registry plus its in-memory logs
    pub bridge: Arc<AgentBridge>,

    /// Farmer and consumer records
    pub store: Arc<MarketStore>,

    pub config: Arc<AppConfig>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let fixtures = Fixtures::new(config.data.dir.clone());
        let bridge = AgentBridge::new(
            Arc::new(default_registry()),
            ToolContext::new(fixtures.clone()),
            config.watsonx.is_configured(),
        );

        Self {
            bridge: Arc::new(bridge),
            store: Arc::new(MarketStore::load(fixtures)),
            config: Arc::new(config),
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
