//! Host-side plugin API and an in-process host implementing it.
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde_json::Value;
use tracing::{info, warn};

use crate::tools::{render_outcome, AgentTool};

/// Lifecycle event emitted when the host gateway stops.
pub const GATEWAY_STOP: &str = "gateway_stop";

pub type ToolFactory = Box<dyn Fn() -> Arc<dyn AgentTool> + Send + Sync>;
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type LifecycleHook = Box<dyn Fn() -> HookFuture + Send + Sync>;

/// Registration surface a plugin receives from its host.
pub trait PluginApi {
    /// Register a factory the host calls whenever it resolves its tool set.
    fn register_tool(&mut self, factory: ToolFactory);

    /// Run `hook` when the host emits `event`.
    fn on(&mut self, event: &str, hook: LifecycleHook);
}

/// Minimal agent host: resolves registered tools, executes them by name and
/// runs lifecycle hooks.
#[derive(Default)]
pub struct ToolHost {
    factories: Vec<ToolFactory>,
    hooks: HashMap<String, Vec<LifecycleHook>>,
    stopping: AtomicBool,
}

impl ToolHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every registered factory, in registration order.
    pub fn tools(&self) -> Vec<Arc<dyn AgentTool>> {
        self.factories.iter().map(|factory| factory()).collect()
    }

    pub fn tool(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools().into_iter().find(|tool| tool.name() == name)
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Execute `name` and return the text shown to the agent. Never fails.
    pub async fn execute(&self, name: &str, params: Value) -> String {
        if self.is_stopping() {
            warn!(
                target: "mcp_relay::plugin",
                tool = %name,
                "Refusing tool call during shutdown"
            );
            return "Host is shutting down".to_string();
        }

        let Some(tool) = self.tool(name) else {
            return format!("Unknown tool: {name}");
        };
        let outcome = tool.execute(params).await;
        render_outcome(tool.as_ref(), outcome)
    }

    /// Run every hook registered for `event`, one after another.
    ///
    /// After `gateway_stop` the host refuses further tool calls.
    pub async fn emit(&self, event: &str) {
        if event == GATEWAY_STOP {
            self.stopping.store(true, Ordering::SeqCst);
        }
        let Some(hooks) = self.hooks.get(event) else {
            return;
        };
        info!(
            target: "mcp_relay::plugin",
            event = %event,
            hooks = hooks.len(),
            "Running lifecycle hooks"
        );
        for hook in hooks {
            hook().await;
        }
    }
}

impl PluginApi for ToolHost {
    fn register_tool(&mut self, factory: ToolFactory) {
        self.factories.push(factory);
    }

    fn on(&mut self, event: &str, hook: LifecycleHook) {
        self.hooks.entry(event.to_string()).or_default().push(hook);
    }
}
