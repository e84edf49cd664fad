use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::agent::{AgentBridge, AgentRequest, ToolRegistry};
use crate::error::{HarvestError, Result};

#[derive(Parser)]
#[command(name = "harvestq")]
#[command(author = "Harvest Q Team")]
#[command(version = "0.1.0")]
#[command(about = "Harvest Q marketplace and agent tool bridge", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <env>.toml)
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Override the fixture directory
    #[arg(long, env = "HARVESTQ_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Listen port, overrides config
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List registered agent tools
    Tools,
    /// Invoke one tool and print the agent response
    Call {
        /// Tool name, e.g. suggestPrice
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

/// Print the tool catalogue grouped by category
pub fn print_tools(registry: &ToolRegistry) {
    let mut specs: Vec<_> = registry.specs().collect();
    specs.sort_by_key(|s| (s.category, s.name));

    let mut current = None;
    for spec in specs {
        if current != Some(spec.category) {
            let label = serde_json::to_value(spec.category)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            println!("\n[{}]", label);
            current = Some(spec.category);
        }
        println!("  {:<24} {}", spec.name, spec.description);
    }
    println!("\n{} tools", registry.len());
}

/// Run a tool through the same dispatcher the API uses
pub fn call_tool(bridge: &AgentBridge, tool: &str, raw_args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(raw_args).map_err(|e| HarvestError::InvalidArgs {
        tool: tool.to_string(),
        reason: format!("--args is not JSON: {}", e),
    })?;
    let resp = bridge.dispatch(AgentRequest::tool(tool, args))?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_command() {
        let cli = Cli::parse_from([
            "harvestq",
            "call",
            "suggestPrice",
            "--args",
            r#"{"crop":"Tomatoes"}"#,
        ]);
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "suggestPrice");
                assert!(args.contains("Tomatoes"));
            }
            _ => panic!("expected call"),
        }
        assert_eq!(cli.config, PathBuf::from("config"));
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["harvestq", "--config", "/etc/harvestq"]);
        assert!(cli.command.is_none());
    }
}
