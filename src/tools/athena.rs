//! The nine Athena memory tools, each proxying one remote tool of the Athena MCP server.
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::{
    client::ConnectionRegistry,
    config::ServerLaunchConfig,
    tools::{
        proxy::{render_json, NoParams, ProxyTool, ProxyToolDef},
        AgentTool,
    },
};

pub const QUICKSAVE_CONFIRMATION: &str = "✅ Session saved to Athena memory";
pub const SECRET_MODE_ENABLED: &str =
    "🔒 Secret mode enabled - sensitive content will be redacted";
pub const SECRET_MODE_DISABLED: &str = "🔓 Secret mode disabled - full access restored";

fn default_search_limit() -> Number {
    Number::from(5)
}

fn default_recall_limit() -> Number {
    Number::from(1)
}

// An explicit `null` falls back to the default like a missing field.
fn search_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Number, D::Error> {
    Ok(Option::<Number>::deserialize(deserializer)?.unwrap_or_else(default_search_limit))
}

fn recall_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Number, D::Error> {
    Ok(Option::<Number>::deserialize(deserializer)?.unwrap_or_else(default_recall_limit))
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SmartSearchParams {
    /// Search query to find relevant information from memory
    pub query: String,
    /// Maximum number of results (default: 5)
    #[serde(default = "default_search_limit", deserialize_with = "search_limit")]
    pub limit: Number,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AgenticSearchParams {
    /// Complex search query to decompose and search
    pub query: String,
    /// Maximum number of results per sub-query (default: 5)
    #[serde(default = "default_search_limit", deserialize_with = "search_limit")]
    pub limit: Number,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct QuicksaveParams {
    /// Summary of current state to save
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RecallSessionParams {
    /// Number of recent sessions to recall
    #[serde(default = "default_recall_limit", deserialize_with = "recall_limit")]
    pub limit: Number,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SecretModeParams {
    /// Enable secret mode (true) or disable (false)
    pub enabled: bool,
}

fn render_quicksave(_params: &QuicksaveParams, _result: &Value) -> Result<String, serde_json::Error> {
    Ok(QUICKSAVE_CONFIRMATION.to_string())
}

fn render_secret_mode(params: &SecretModeParams, _result: &Value) -> Result<String, serde_json::Error> {
    let message = if params.enabled {
        SECRET_MODE_ENABLED
    } else {
        SECRET_MODE_DISABLED
    };
    Ok(message.to_string())
}

/// Build the Athena tools bound to `server`, all sharing `registry`.
pub fn athena_tools(
    registry: &Arc<ConnectionRegistry>,
    server: &Arc<ServerLaunchConfig>,
) -> Vec<Arc<dyn AgentTool>> {
    fn proxy<P>(
        def: ProxyToolDef<P>,
        registry: &Arc<ConnectionRegistry>,
        server: &Arc<ServerLaunchConfig>,
    ) -> Arc<dyn AgentTool>
    where
        P: serde::de::DeserializeOwned + Serialize + JsonSchema + Send + Sync + 'static,
    {
        Arc::new(ProxyTool::new(def, Arc::clone(server), Arc::clone(registry)))
    }

    vec![
        proxy(
            ProxyToolDef::<SmartSearchParams> {
                name: "athena_smart_search",
                description: "Search Athena's memory using hybrid RAG (vector + keyword + graph)",
                remote_tool: "smart_search",
                failure_prefix: "Error searching memory",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<AgenticSearchParams> {
                name: "athena_agentic_search",
                description: "Multi-step query decomposition with parallel search across all memory sources",
                remote_tool: "agentic_search",
                failure_prefix: "Error in agentic search",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<QuicksaveParams> {
                name: "athena_quicksave",
                description: "Save a checkpoint to Athena's session log",
                remote_tool: "quicksave",
                failure_prefix: "Error saving session",
                render: render_quicksave,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<RecallSessionParams> {
                name: "athena_recall_session",
                description: "Recall recent session log content from Athena",
                remote_tool: "recall_session",
                failure_prefix: "Error recalling session",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<NoParams> {
                name: "athena_health_check",
                description: "Check Athena system health (database, vector API)",
                remote_tool: "health_check",
                failure_prefix: "Error checking health",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<NoParams> {
                name: "athena_governance_status",
                description: "Check Athena's Triple-Lock compliance state and governance settings",
                remote_tool: "governance_status",
                failure_prefix: "Error checking governance",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<NoParams> {
                name: "athena_list_memory_paths",
                description: "List all active memory directories and their contents",
                remote_tool: "list_memory_paths",
                failure_prefix: "Error listing memory paths",
                render: render_json,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<SecretModeParams> {
                name: "athena_set_secret_mode",
                description: "Toggle Athena's secret/demo mode (redacts sensitive content)",
                remote_tool: "set_secret_mode",
                failure_prefix: "Error setting secret mode",
                render: render_secret_mode,
            },
            registry,
            server,
        ),
        proxy(
            ProxyToolDef::<NoParams> {
                name: "athena_permission_status",
                description: "Show current access state and available tool manifest",
                remote_tool: "permission_status",
                failure_prefix: "Error checking permissions",
                render: render_json,
            },
            registry,
            server,
        ),
    ]
}
