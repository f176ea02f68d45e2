use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures raised by the connection registry and the capability invoker.
#[derive(Debug, Error)]
pub enum McpClientError {
    #[error("Failed to launch MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: io::Error,
    },
    #[error("Handshake with MCP server '{server}' failed: {message}")]
    Handshake { server: String, message: String },
    #[error("Failed to list tools of MCP server '{server}': {message}")]
    ListTools { server: String, message: String },
    #[error("MCP server '{server}' not connected")]
    NotConnected { server: String },
    #[error("MCP tool '{tool}' on server '{server}' failed: {message}")]
    Invocation {
        server: String,
        tool: String,
        message: String,
    },
    #[error("Failed to close MCP server '{server}': {message}")]
    Close { server: String, message: String },
    #[error("{count} MCP connection(s) failed to close: {joined}", count = .failures.len(), joined = join_failures(.failures))]
    Teardown { failures: Vec<McpClientError> },
}

impl McpClientError {
    /// True for failures raised while establishing a connection.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::Handshake { .. } | Self::ListTools { .. }
        )
    }

    /// Server name the failure relates to, when there is exactly one.
    pub fn server(&self) -> Option<&str> {
        match self {
            Self::Spawn { server, .. }
            | Self::Handshake { server, .. }
            | Self::ListTools { server, .. }
            | Self::NotConnected { server }
            | Self::Invocation { server, .. }
            | Self::Close { server, .. } => Some(server),
            Self::Teardown { .. } => None,
        }
    }
}

fn join_failures(failures: &[McpClientError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a single host tool call.
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error("invalid arguments for `{tool}`: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error(transparent)]
    Client(#[from] McpClientError),
    #[error("failed to serialize tool result: {0}")]
    Serialize(#[from] serde_json::Error),
}
