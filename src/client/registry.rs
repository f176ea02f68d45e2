//! Named MCP connections with connect-once semantics.
use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn, Instrument};

use crate::{
    client::session::{Connector, Session, ToolDescriptor},
    config::{ClientIdentity, ServerLaunchConfig},
    lib::{errors::McpClientError, telemetry::CallSpan},
};

/// One live connection and the tool list captured when it was opened.
struct Connection {
    name: String,
    session: Box<dyn Session>,
    tools: Vec<ToolDescriptor>,
}

/// Registry of MCP connections keyed by server name.
///
/// Connections are kept in the order they were first established. `connect`
/// is serialized per name, so concurrent first calls for the same server run
/// a single handshake.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    identity: ClientIdentity,
    connections: RwLock<IndexMap<String, Arc<Connection>>>,
    connect_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>, identity: ClientIdentity) -> Self {
        Self {
            connector,
            identity,
            connections: RwLock::new(IndexMap::new()),
            connect_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Connect to `config.name` unless a connection with that name already exists.
    ///
    /// An existing entry is reused without checking that it is still alive. On
    /// failure nothing is registered.
    pub async fn connect(&self, config: &ServerLaunchConfig) -> Result<(), McpClientError> {
        if self.is_connected(&config.name).await {
            info!(
                target: "mcp_relay::registry",
                server = %config.name,
                "MCP server already connected"
            );
            return Ok(());
        }

        let gate = self.connect_gate(&config.name).await;
        let _permit = gate.lock().await;
        if self.is_connected(&config.name).await {
            return Ok(());
        }

        info!(
            target: "mcp_relay::registry",
            server = %config.name,
            command = %config.command,
            args = ?config.args,
            cwd = ?config.cwd,
            "Connecting to MCP server"
        );

        let connection = self.open(config).await.map_err(|err| {
            error!(
                target: "mcp_relay::registry",
                server = %config.name,
                error = %err,
                "Failed to connect to MCP server"
            );
            err
        })?;

        info!(
            target: "mcp_relay::registry",
            server = %config.name,
            tool_count = connection.tools.len(),
            tools = %connection
                .tools
                .iter()
                .map(|tool| tool.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            "Connected to MCP server"
        );

        self.connections
            .write()
            .await
            .insert(config.name.clone(), Arc::new(connection));
        Ok(())
    }

    /// Connect on first use. Shared by every lazily-connecting tool.
    pub async fn ensure_connected(&self, config: &ServerLaunchConfig) -> Result<(), McpClientError> {
        if self.is_connected(&config.name).await {
            return Ok(());
        }
        info!(
            target: "mcp_relay::registry",
            server = %config.name,
            "Connecting to MCP server on first use"
        );
        self.connect(config).await
    }

    async fn open(&self, config: &ServerLaunchConfig) -> Result<Connection, McpClientError> {
        let session = self.connector.connect(config, &self.identity).await?;
        let tools = match session.list_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                if let Err(close_err) = session.close().await {
                    warn!(
                        target: "mcp_relay::registry",
                        server = %config.name,
                        error = %close_err,
                        "Failed to close MCP session after setup failure"
                    );
                }
                return Err(err);
            }
        };

        Ok(Connection {
            name: config.name.clone(),
            session,
            tools,
        })
    }

    async fn connect_gate(&self, name: &str) -> Arc<Mutex<()>> {
        let mut gates = self.connect_gates.lock().await;
        Arc::clone(gates.entry(name.to_string()).or_default())
    }

    /// Close and forget `name`. Unknown names are ignored.
    pub async fn disconnect(&self, name: &str) -> Result<(), McpClientError> {
        let gate = self.connect_gate(name).await;
        let _permit = gate.lock().await;

        let removed = self.connections.write().await.shift_remove(name);
        let Some(connection) = removed else {
            return Ok(());
        };

        connection.session.close().await?;
        info!(
            target: "mcp_relay::registry",
            server = %name,
            "Disconnected from MCP server"
        );
        Ok(())
    }

    /// Close every connection in registry order and clear the registry.
    ///
    /// Teardown is best-effort: a failed close is logged and the remaining
    /// connections are still closed. All failures are returned together.
    ///
    /// Connects already in flight finish first and are torn down with the rest.
    pub async fn disconnect_all(&self) -> Result<(), McpClientError> {
        let mut gates = self
            .connect_gates
            .lock()
            .await
            .iter()
            .map(|(name, gate)| (name.clone(), Arc::clone(gate)))
            .collect::<Vec<_>>();
        gates.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut permits = Vec::with_capacity(gates.len());
        for (_, gate) in gates {
            permits.push(gate.lock_owned().await);
        }

        let drained = std::mem::take(&mut *self.connections.write().await);
        drop(permits);

        let mut failures = Vec::new();
        for (name, connection) in drained {
            match connection.session.close().await {
                Ok(()) => info!(
                    target: "mcp_relay::registry",
                    server = %name,
                    "Disconnected from MCP server"
                ),
                Err(err) => {
                    warn!(
                        target: "mcp_relay::registry",
                        server = %name,
                        error = %err,
                        "Failed to close MCP connection"
                    );
                    failures.push(err);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(McpClientError::Teardown { failures })
        }
    }

    pub async fn is_connected(&self, name: &str) -> bool {
        self.connections.read().await.contains_key(name)
    }

    pub async fn connection_names(&self) -> Vec<String> {
        self.connections.read().await.keys().cloned().collect()
    }

    /// Tools captured for `name` at connect time.
    pub async fn capabilities(&self, name: &str) -> Option<Vec<ToolDescriptor>> {
        self.connections
            .read()
            .await
            .get(name)
            .map(|connection| connection.tools.clone())
    }

    /// Every `(server, tool)` pair in registry order, then discovery order.
    pub async fn list_all_capabilities(&self) -> Vec<(String, ToolDescriptor)> {
        self.connections
            .read()
            .await
            .values()
            .flat_map(|connection| {
                connection
                    .tools
                    .iter()
                    .map(|tool| (connection.name.clone(), tool.clone()))
            })
            .collect()
    }

    /// Forward a tool call to `server` and return the raw result.
    pub async fn invoke(
        &self,
        server: &str,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, McpClientError> {
        let connection = self
            .connections
            .read()
            .await
            .get(server)
            .cloned()
            .ok_or_else(|| McpClientError::NotConnected {
                server: server.to_string(),
            })?;

        info!(
            target: "mcp_relay::registry",
            server = %server,
            tool = %tool,
            "Calling MCP tool"
        );

        let span = CallSpan::start(server, tool);
        let result = connection
            .session
            .call_tool(tool, args)
            .instrument(span.span().clone())
            .await;
        span.finish(if result.is_ok() { "ok" } else { "error" });
        result
    }
}
