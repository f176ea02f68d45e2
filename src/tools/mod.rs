//! Host-facing tools: generic adapters for discovered MCP tools and the typed Athena proxies.

pub mod adapter;
pub mod athena;
pub mod proxy;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::lib::errors::ToolExecutionError;

pub use adapter::{adapt, empty_object_schema, synthesize_tool_name, ToolAdapter};
pub use athena::athena_tools;
pub use proxy::{NoParams, ProxyTool, ProxyToolDef};

/// A self-describing callable unit handed to the agent host.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted parameters.
    fn parameters(&self) -> Value;

    /// Prefix shown in front of a failure when the host renders it.
    fn failure_prefix(&self) -> &str {
        "Error"
    }

    async fn execute(&self, params: Value) -> Result<String, ToolExecutionError>;
}

/// Convert a tool result into the text handed back to the agent.
///
/// Failures are logged here and degrade to a descriptive string.
pub fn render_outcome(
    tool: &dyn AgentTool,
    outcome: Result<String, ToolExecutionError>,
) -> String {
    match outcome {
        Ok(text) => text,
        Err(err) => {
            error!(
                target: "mcp_relay::tools",
                tool = %tool.name(),
                error = %err,
                "Tool call failed"
            );
            format!("{}: {err}", tool.failure_prefix())
        }
    }
}
