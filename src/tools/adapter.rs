use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{
    client::{ConnectionRegistry, ToolDescriptor},
    lib::errors::ToolExecutionError,
    tools::AgentTool,
};

/// Prefix applied to every synthesized tool name.
pub const TOOL_NAME_PREFIX: &str = "mcp";

/// `mcp_<server>_<tool>` with every character outside `[A-Za-z0-9_]` replaced by `_`.
pub fn synthesize_tool_name(server: &str, tool: &str) -> String {
    format!("{TOOL_NAME_PREFIX}_{server}_{tool}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Wraps one tool of one connection as an [`AgentTool`].
pub struct ToolAdapter {
    name: String,
    description: String,
    parameters: Value,
    server: String,
    tool: String,
    registry: Arc<ConnectionRegistry>,
}

/// Build the host-facing adapter for `descriptor` exposed by `server`.
pub fn adapt(
    registry: Arc<ConnectionRegistry>,
    server: &str,
    descriptor: &ToolDescriptor,
) -> ToolAdapter {
    ToolAdapter {
        name: synthesize_tool_name(server, &descriptor.name),
        description: descriptor
            .description
            .clone()
            .unwrap_or_else(|| format!("MCP tool: {} from {server}", descriptor.name)),
        parameters: descriptor
            .input_schema
            .clone()
            .map(Value::Object)
            .unwrap_or_else(empty_object_schema),
        server: server.to_string(),
        tool: descriptor.name.clone(),
        registry,
    }
}

#[async_trait]
impl AgentTool for ToolAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, params: Value) -> Result<String, ToolExecutionError> {
        let args = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolExecutionError::InvalidArguments {
                    tool: self.name.clone(),
                    message: format!("expected a JSON object, got {other}"),
                })
            }
        };

        let result = self.registry.invoke(&self.server, &self.tool, args).await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}
