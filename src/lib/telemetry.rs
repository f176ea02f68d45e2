//! Telemetry initialization and per-call span helpers.

use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs on stderr.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span covering one forwarded tool call.
pub struct CallSpan {
    span: Span,
    started_at: Instant,
    call_id: Uuid,
}

impl CallSpan {
    /// Start a span for a call of `tool` on `server`.
    pub fn start(server: &str, tool: &str) -> Self {
        let call_id = Uuid::new_v4();
        let span = info_span!(
            target: "mcp_relay::registry",
            "mcp_call",
            %call_id,
            server,
            tool
        );
        Self {
            span,
            started_at: Instant::now(),
            call_id,
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span, recording the outcome and elapsed time.
    pub fn finish(self, status: &'static str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "mcp_relay::registry",
            call_id = %self.call_id,
            status = status,
            elapsed_ms = elapsed_ms,
            "Completed MCP call"
        );
    }
}
