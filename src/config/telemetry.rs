use tracing::{debug, info};

use super::{RelayConfig, CONFIG_ENV_KEY};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "mcp_relay::config",
            path = %path.display(),
            "Loading configuration using MCP_RELAY_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "mcp_relay::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "Loading configuration from explicit path"
        );
    }
}

pub fn log_defaults() {
    debug!(
        target: "mcp_relay::config",
        env = CONFIG_ENV_KEY,
        "No configuration file given; using built-in defaults"
    );
}

pub fn log_loaded(config: &RelayConfig) {
    info!(
        target: "mcp_relay::config",
        path = %config.source_label(),
        client_name = %config.client.name,
        athena_command = %config.athena.command,
        athena_cwd = ?config.athena.cwd,
        extra_servers = config.servers.len(),
        "Configuration loaded successfully"
    );
}
