use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};

use crate::api::{state::AppState, types::*};

pub const PROJECT_NAME: &str = "Harvest Q";

/// GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ibm_connected: state.bridge.model_enabled(),
        project: PROJECT_NAME.to_string(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_secs: state.uptime_seconds(),
    })
}

/// GET /api/tools
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let tools: Vec<_> = state.bridge.registry().specs().cloned().collect();
    Json(ToolsResponse {
        count: tools.len(),
        tools,
    })
}
