use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use tracing::{debug, error};

use crate::agent::{AgentRequest, AgentResponse};
use crate::api::state::AppState;
use crate::error::HarvestError;

/// An empty body is an empty request; anything else must be a JSON object
fn parse_request(body: &[u8]) -> Result<AgentRequest, HarvestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AgentRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| HarvestError::Validation(format!("malformed request body: {}", e)))
}

/// POST /api/agent
///
/// Tool handlers are synchronous and may read fixtures from disk, so each
/// call runs on the blocking pool.
pub async fn agent_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<AgentResponse>) {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "rejecting agent request");
            return (StatusCode::BAD_REQUEST, Json(AgentResponse::failure(None, &e)));
        }
    };
    let tool = req.tool.clone();
    let bridge = state.bridge.clone();

    let outcome = tokio::task::spawn_blocking(move || bridge.dispatch(req))
        .await
        .unwrap_or_else(|e| Err(HarvestError::Internal(format!("agent task aborted: {}", e))));

    match outcome {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                error!(tool = ?tool, error = %e, "agent error");
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(AgentResponse::failure(tool.as_deref(), &e)))
        }
    }
}
