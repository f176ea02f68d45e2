use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::{ClientIdentity, ServerLaunchConfig},
    lib::errors::McpClientError,
};

/// A tool advertised by an MCP server, captured once at connect time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Map<String, Value>>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Map<String, Value>) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

impl From<rmcp::model::Tool> for ToolDescriptor {
    fn from(tool: rmcp::model::Tool) -> Self {
        let schema = tool.input_schema.as_ref().clone();
        Self {
            name: tool.name.into_owned(),
            description: tool
                .description
                .map(|description| description.into_owned())
                .filter(|description| !description.is_empty()),
            input_schema: (!schema.is_empty()).then_some(schema),
        }
    }
}

/// Launches an MCP server and completes the initialize handshake.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &ServerLaunchConfig,
        identity: &ClientIdentity,
    ) -> Result<Box<dyn Session>, McpClientError>;
}

/// A live, initialized MCP session.
#[async_trait]
pub trait Session: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpClientError>;

    /// Forward a tool call and return the raw result document.
    async fn call_tool(&self, tool: &str, args: Map<String, Value>)
        -> Result<Value, McpClientError>;

    /// Close the session. Closing twice is a no-op.
    async fn close(&self) -> Result<(), McpClientError>;
}
