//! Name -> typed handler registry behind `POST /api/agent`.
//!
//! Handlers are plain functions over a typed argument struct. The registry
//! owns the JSON boundary: arguments that do not decode are rejected with
//! [`HarvestError::InvalidArgs`] before the handler runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::agent::context::ToolContext;
use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Matching,
    Pricing,
    Barter,
    Grants,
    Logistics,
    Notify,
    Translator,
    Insights,
    Risk,
    Coop,
    Quality,
    Farmer,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub category: ToolCategory,
    pub description: &'static str,
}

impl ToolSpec {
    pub const fn new(name: &'static str, category: ToolCategory, description: &'static str) -> Self {
        Self {
            name,
            category,
            description,
        }
    }
}

type ErasedHandler = Box<dyn Fn(&ToolContext, Value) -> Result<Value> + Send + Sync>;

struct RegisteredTool {
    spec: ToolSpec,
    handler: ErasedHandler,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, RegisteredTool>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `spec.name`, replacing any previous entry
    pub fn register<A, R>(&mut self, spec: ToolSpec, handler: fn(&ToolContext, A) -> Result<R>) -> &mut Self
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
    {
        let name = spec.name;
        let erased: ErasedHandler = Box::new(move |ctx, raw| {
            let args: A = decode_args(name, raw)?;
            let out = handler(ctx, args)?;
            Ok(serde_json::to_value(out)?)
        });
        if self
            .tools
            .insert(name, RegisteredTool { spec, handler: erased })
            .is_some()
        {
            warn!(tool = name, "tool registered twice; keeping the later handler");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Specs in name order
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values().map(|t| &t.spec)
    }

    /// Run a tool. `None` when no tool has that name.
    pub fn invoke(&self, ctx: &ToolContext, name: &str, args: Value) -> Option<Result<Value>> {
        self.tools.get(name).map(|tool| (tool.handler)(ctx, args))
    }
}

fn decode_args<A: DeserializeOwned>(tool: &str, raw: Value) -> Result<A> {
    let raw = match raw {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(raw).map_err(|e| HarvestError::InvalidArgs {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Fixtures;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoArgs {
        word: String,
        #[serde(default = "default_times")]
        times: usize,
    }

    fn default_times() -> usize {
        2
    }

    fn echo(_ctx: &ToolContext, args: EchoArgs) -> Result<String> {
        Ok(args.word.repeat(args.times))
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(ToolSpec::new("echo", ToolCategory::Farmer, "repeat a word"), echo);
        r
    }

    fn ctx() -> ToolContext {
        ToolContext::new(Fixtures::new("does-not-exist"))
    }

    #[test]
    fn test_invoke_decodes_typed_args() {
        let out = registry()
            .invoke(&ctx(), "echo", json!({"word": "ab"}))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!("abab"));
    }

    #[test]
    fn test_unknown_tool_is_none() {
        assert!(registry().invoke(&ctx(), "nope", json!({})).is_none());
    }

    #[test]
    fn test_bad_args_fail_fast() {
        let err = registry()
            .invoke(&ctx(), "echo", json!({"times": "many"}))
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, HarvestError::InvalidArgs { ref tool, .. } if tool == "echo"));
    }

    #[test]
    fn test_null_args_treated_as_empty_object() {
        let err = registry()
            .invoke(&ctx(), "echo", Value::Null)
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("missing field `word`"));
    }
}
