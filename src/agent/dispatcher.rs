use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::context::ToolContext;
use crate::agent::registry::ToolRegistry;
use crate::error::{HarvestError, Result};

pub const ONLINE_TEXT: &str = "Agent service online.";
pub const MODEL_INIT_TEXT: &str = "IBM session initialized.";

/// Body of `POST /api/agent`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AgentRequest {
    pub fn tool(name: &str, args: Value) -> Self {
        Self {
            tool: Some(name.to_string()),
            args: Some(args),
            message: None,
        }
    }
}

/// Envelope returned for every agent call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn result(tool: &str, result: Value) -> Self {
        Self {
            ok: true,
            tool: Some(tool.to_string()),
            result: Some(result),
            text: None,
            model: None,
            error: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            ok: true,
            tool: None,
            result: None,
            text: Some(text.to_string()),
            model: None,
            error: None,
        }
    }

    pub fn failure(tool: Option<&str>, error: &HarvestError) -> Self {
        Self {
            ok: false,
            tool: tool.map(str::to_string),
            result: None,
            text: None,
            model: None,
            error: Some(error.to_string()),
        }
    }
}

/// Routes agent requests to the registry
#[derive(Debug, Clone)]
pub struct AgentBridge {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    model_enabled: bool,
}

impl AgentBridge {
    pub fn new(registry: Arc<ToolRegistry>, ctx: ToolContext, model_enabled: bool) -> Self {
        Self {
            registry,
            ctx,
            model_enabled,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    pub fn model_enabled(&self) -> bool {
        self.model_enabled
    }

    /// Resolve one request. Errors are only ever tool errors; unknown tools ack.
    pub fn dispatch(&self, req: AgentRequest) -> Result<AgentResponse> {
        if let Some(name) = req.tool.as_deref().filter(|n| self.registry.contains(n)) {
            let started = Instant::now();
            let args = req.args.unwrap_or(Value::Null);
            let outcome = self
                .registry
                .invoke(&self.ctx, name, args)
                .unwrap_or_else(|| Err(HarvestError::Internal(format!("{} vanished", name))));
            let elapsed_ms = started.elapsed().as_millis() as u64;
            return match outcome {
                Ok(result) => {
                    info!(tool = name, elapsed_ms, "tool call ok");
                    Ok(AgentResponse::result(name, result))
                }
                Err(e) => {
                    warn!(tool = name, elapsed_ms, error = %e, "tool call failed");
                    Err(e)
                }
            };
        }

        if let Some(tool) = req.tool.as_deref() {
            debug!(tool, "unknown tool, falling back to ack");
        }

        if self.model_enabled && req.message.as_deref().is_some_and(|m| !m.trim().is_empty()) {
            return Ok(AgentResponse {
                model: Some(true),
                ..AgentResponse::text(MODEL_INIT_TEXT)
            });
        }

        Ok(AgentResponse::text(ONLINE_TEXT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::default_registry;
    use crate::data::Fixtures;
    use serde_json::json;

    fn bridge(model_enabled: bool) -> AgentBridge {
        AgentBridge::new(
            Arc::new(default_registry()),
            ToolContext::new(Fixtures::new("does-not-exist")),
            model_enabled,
        )
    }

    #[test]
    fn test_unknown_tool_acks() {
        for name in ["", "dropTables", "FINDSUPPLIERS"] {
            let resp = bridge(false)
                .dispatch(AgentRequest::tool(name, json!({})))
                .unwrap();
            assert!(resp.ok);
            assert_eq!(resp.text.as_deref(), Some(ONLINE_TEXT));
            assert!(resp.result.is_none());
        }
    }

    #[test]
    fn test_message_path_requires_model() {
        let req = AgentRequest {
            message: Some("Initialize Harvest Q agents".to_string()),
            ..Default::default()
        };
        let off = bridge(false).dispatch(req.clone()).unwrap();
        assert_eq!(off.text.as_deref(), Some(ONLINE_TEXT));
        assert_eq!(off.model, None);

        let on = bridge(true).dispatch(req).unwrap();
        assert_eq!(on.text.as_deref(), Some(MODEL_INIT_TEXT));
        assert_eq!(on.model, Some(true));
    }

    #[test]
    fn test_registered_tool_wraps_result() {
        let resp = bridge(false)
            .dispatch(AgentRequest::tool(
                "calcBreakeven",
                json!({"unit": "kg", "quantity": 500, "labor": 120, "seed": 60}),
            ))
            .unwrap();
        assert!(resp.ok);
        assert_eq!(resp.tool.as_deref(), Some("calcBreakeven"));
        assert_eq!(resp.result.unwrap()["breakevenPerUnit"], json!(0.36));
    }

    #[test]
    fn test_bad_args_surface_as_error() {
        let err = bridge(false)
            .dispatch(AgentRequest::tool("suggestPrice", json!({"region": "Kenya"})))
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
