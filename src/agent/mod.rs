//! Demo agent bridge for the marketplace
//!
//! This module provides:
//! - A typed tool registry (`findSuppliers`, `suggestPrice`, ...)
//! - The `POST /api/agent` dispatcher and its response envelope
//! - Shared in-memory logs for notifications and quality issues
//! - Deterministic heuristics used across tool groups

pub mod context;
pub mod dispatcher;
pub mod heuristics;
pub mod registry;
pub mod tools;

pub use context::{CappedLog, Channel, ToolContext, LOG_CAPACITY};
pub use dispatcher::{AgentBridge, AgentRequest, AgentResponse, MODEL_INIT_TEXT, ONLINE_TEXT};
pub use registry::{ToolCategory, ToolRegistry, ToolSpec};
pub use tools::default_registry;
