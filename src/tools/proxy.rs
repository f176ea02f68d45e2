use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::ConnectionRegistry,
    config::ServerLaunchConfig,
    lib::errors::ToolExecutionError,
    tools::AgentTool,
};

/// Turns the typed parameters and the raw remote result into the agent-facing text.
pub type RenderFn<P> = fn(&P, &Value) -> Result<String, serde_json::Error>;

/// Parameters of tools that take none.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct NoParams {}

/// Static description of one proxy tool.
pub struct ProxyToolDef<P> {
    pub name: &'static str,
    pub description: &'static str,
    pub remote_tool: &'static str,
    pub failure_prefix: &'static str,
    pub render: RenderFn<P>,
}

/// Pretty-printed JSON of the raw result.
pub fn render_json<P>(_params: &P, result: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// A tool bound to one remote tool of a fixed server, connecting on first use.
///
/// `P` defines the accepted arguments: its JSON schema is published as the tool
/// parameters, and its serialized form (defaults applied) is what the remote
/// tool receives.
pub struct ProxyTool<P> {
    def: ProxyToolDef<P>,
    parameters: Value,
    server: Arc<ServerLaunchConfig>,
    registry: Arc<ConnectionRegistry>,
    _params: PhantomData<fn() -> P>,
}

impl<P> ProxyTool<P>
where
    P: JsonSchema,
{
    pub fn new(
        def: ProxyToolDef<P>,
        server: Arc<ServerLaunchConfig>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            parameters: schema_for!(P).to_value(),
            def,
            server,
            registry,
            _params: PhantomData,
        }
    }
}

impl<P> ProxyTool<P>
where
    P: DeserializeOwned + Serialize,
{
    fn invalid(&self, message: impl Into<String>) -> ToolExecutionError {
        ToolExecutionError::InvalidArguments {
            tool: self.def.name.to_string(),
            message: message.into(),
        }
    }

    fn remote_arguments(&self, params: Value) -> Result<(P, Map<String, Value>), ToolExecutionError> {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let typed: P =
            serde_json::from_value(params).map_err(|err| self.invalid(err.to_string()))?;
        let args = match serde_json::to_value(&typed)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(self.invalid(format!("expected an object, got {other}"))),
        };
        Ok((typed, args))
    }
}

#[async_trait]
impl<P> AgentTool for ProxyTool<P>
where
    P: DeserializeOwned + Serialize + JsonSchema + Send + Sync,
{
    fn name(&self) -> &str {
        self.def.name
    }

    fn description(&self) -> &str {
        self.def.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn failure_prefix(&self) -> &str {
        self.def.failure_prefix
    }

    async fn execute(&self, params: Value) -> Result<String, ToolExecutionError> {
        let (typed, args) = self.remote_arguments(params)?;
        self.registry.ensure_connected(&self.server).await?;
        let result = self
            .registry
            .invoke(&self.server.name, self.def.remote_tool, args)
            .await?;
        Ok((self.def.render)(&typed, &result)?)
    }
}
