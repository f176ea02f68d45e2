use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, IntoTransport, TokioChildProcess},
    ServiceExt,
};
use serde_json::{Map, Value};
use tokio::{process::Command, sync::RwLock};

use crate::{
    client::session::{Connector, Session, ToolDescriptor},
    config::{ClientIdentity, ServerLaunchConfig},
    lib::errors::McpClientError,
};

type ClientService = RunningService<RoleClient, ClientInfo>;

/// Launches stdio MCP servers as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmcpConnector;

#[async_trait]
impl Connector for RmcpConnector {
    async fn connect(
        &self,
        config: &ServerLaunchConfig,
        identity: &ClientIdentity,
    ) -> Result<Box<dyn Session>, McpClientError> {
        let command = Command::new(&config.command).configure(|cmd| {
            cmd.args(&config.args);
            cmd.envs(&config.env);
            if let Some(cwd) = &config.cwd {
                cmd.current_dir(cwd);
            }
        });
        let transport = TokioChildProcess::new(command).map_err(|source| McpClientError::Spawn {
            server: config.name.clone(),
            source,
        })?;

        let session = RmcpSession::handshake(config.name.clone(), identity, transport).await?;
        Ok(Box::new(session))
    }
}

/// Session backed by an rmcp client service.
pub struct RmcpSession {
    server: String,
    service: RwLock<Option<ClientService>>,
}

impl RmcpSession {
    /// Run the initialize handshake over any rmcp client transport.
    pub async fn handshake<T, E, A>(
        server: impl Into<String>,
        identity: &ClientIdentity,
        transport: T,
    ) -> Result<Self, McpClientError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let server = server.into();
        let service = client_info(identity)
            .serve(transport)
            .await
            .map_err(|err| McpClientError::Handshake {
                server: server.clone(),
                message: err.to_string(),
            })?;

        Ok(Self {
            server,
            service: RwLock::new(Some(service)),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn inactive(&self) -> McpClientError {
        McpClientError::NotConnected {
            server: self.server.clone(),
        }
    }
}

#[async_trait]
impl Session for RmcpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpClientError> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|err| McpClientError::ListTools {
                server: self.server.clone(),
                message: err.to_string(),
            })?;
        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, McpClientError> {
        let invocation_error = |message: String| McpClientError::Invocation {
            server: self.server.clone(),
            tool: tool.to_string(),
            message,
        };

        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;

        let result = service
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments: Some(args),
            })
            .await
            .map_err(|err| invocation_error(err.to_string()))?;

        serde_json::to_value(result).map_err(|err| invocation_error(err.to_string()))
    }

    async fn close(&self) -> Result<(), McpClientError> {
        let service = self.service.write().await.take();
        if let Some(service) = service {
            service.cancel().await.map_err(|err| McpClientError::Close {
                server: self.server.clone(),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

fn client_info(identity: &ClientIdentity) -> ClientInfo {
    let mut implementation = Implementation::from_build_env();
    implementation.name = identity.name.clone();
    implementation.version = identity.version.clone();

    let mut info = ClientInfo::default();
    info.capabilities = ClientCapabilities::default();
    info.client_info = implementation;
    info
}
