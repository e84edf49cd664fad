pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod market;

pub use agent::{default_registry, AgentBridge, AgentRequest, AgentResponse, ToolContext};
pub use config::AppConfig;
pub use data::Fixtures;
pub use error::{HarvestError, Result};
pub use market::MarketStore;
