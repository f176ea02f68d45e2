use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lib::errors::ConfigError;

pub const DEFAULT_CLIENT_NAME: &str = "mcp-relay";
pub const DEFAULT_CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity announced to MCP servers during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            version: DEFAULT_CLIENT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawClientSection {
    pub name: Option<String>,
    pub version: Option<String>,
}

pub fn parse_client_section(
    raw: Option<RawClientSection>,
    path: &Path,
) -> Result<ClientIdentity, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = ClientIdentity::default();
    let name = raw.name.unwrap_or(defaults.name);
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "client.name",
            message: "Client name cannot be empty".into(),
        });
    }
    let version = raw.version.unwrap_or(defaults.version);
    if version.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "client.version",
            message: "Client version cannot be empty".into(),
        });
    }
    Ok(ClientIdentity { name, version })
}
