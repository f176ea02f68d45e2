use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use mcp_relay::{
    client::{ConnectionRegistry, Connector, Session, ToolDescriptor},
    config::{ClientIdentity, ServerLaunchConfig},
    lib::errors::McpClientError,
};
use serde_json::{json, Map, Value};

/// Shared, observable state of the fake provider.
#[derive(Default)]
pub struct ProviderState {
    pub connects: AtomicUsize,
    pub calls: AtomicUsize,
    pub closes: AtomicUsize,
    pub failing_connects: AtomicUsize,
    pub fail_calls: AtomicBool,
    pub tools: Mutex<Vec<ToolDescriptor>>,
}

impl ProviderState {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn fail_next_connects(&self, count: usize) {
        self.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn set_tools(&self, names: &[&str]) {
        let tools = names.iter().map(|name| ToolDescriptor::new(*name)).collect();
        *self.tools.lock().expect("tools lock") = tools;
    }
}

/// Test double standing in for a stdio MCP server.
///
/// `echo` returns its arguments unchanged; any other tool returns
/// `{"tool": <name>, "args": <arguments>}`.
pub struct FakeProvider {
    pub state: Arc<ProviderState>,
    connect_delay: Duration,
}

impl FakeProvider {
    pub fn new(tools: &[&str]) -> Self {
        let state = Arc::new(ProviderState::default());
        state.set_tools(tools);
        Self {
            state,
            connect_delay: Duration::ZERO,
        }
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

#[async_trait]
impl Connector for FakeProvider {
    async fn connect(
        &self,
        config: &ServerLaunchConfig,
        _identity: &ClientIdentity,
    ) -> Result<Box<dyn Session>, McpClientError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let should_fail = self
            .state
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(McpClientError::Handshake {
                server: config.name.clone(),
                message: "connection closed before initialize".into(),
            });
        }

        Ok(Box::new(FakeSession {
            server: config.name.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    server: String,
    state: Arc<ProviderState>,
}

#[async_trait]
impl Session for FakeSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpClientError> {
        Ok(self.state.tools.lock().expect("tools lock").clone())
    }

    async fn call_tool(&self, tool: &str, args: Map<String, Value>) -> Result<Value, McpClientError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_calls.load(Ordering::SeqCst) {
            return Err(McpClientError::Invocation {
                server: self.server.clone(),
                tool: tool.to_string(),
                message: "tool raised an exception".into(),
            });
        }
        if tool == "echo" {
            return Ok(Value::Object(args));
        }
        Ok(json!({ "tool": tool, "args": args }))
    }

    async fn close(&self) -> Result<(), McpClientError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn registry_with(provider: FakeProvider) -> (Arc<ConnectionRegistry>, Arc<ProviderState>) {
    let state = Arc::clone(&provider.state);
    let registry = Arc::new(ConnectionRegistry::new(
        Arc::new(provider),
        ClientIdentity::default(),
    ));
    (registry, state)
}

pub fn server(name: &str) -> ServerLaunchConfig {
    ServerLaunchConfig::new(name, "fake-mcp-server")
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("value should be a JSON object")
}
