use serde::{Deserialize, Serialize};

use crate::agent::ToolSpec;
use crate::data::{Consumer, Farmer, Market};
use crate::market::FarmerCard;

// ============================================================================
// System Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub ibm_connected: bool,
    pub project: String,
    /// RFC 3339 with milliseconds
    pub time: String,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub count: usize,
    pub tools: Vec<ToolSpec>,
}

/// `{ ok:false, error }` for non-agent endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

// ============================================================================
// Market Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FarmerGridResponse {
    pub count: usize,
    pub cards: Vec<FarmerCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumersResponse {
    pub count: usize,
    pub consumers: Vec<Consumer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingCreated {
    pub ok: bool,
    pub farmer: Farmer,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketIndexResponse {
    pub markets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketResponse {
    pub ok: bool,
    pub market: Market,
}
