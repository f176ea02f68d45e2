//! Load and validate relay configuration.
use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod client;
pub mod servers;
pub mod telemetry;

pub use client::{
    parse_client_section, ClientIdentity, RawClientSection, DEFAULT_CLIENT_NAME,
    DEFAULT_CLIENT_VERSION,
};
pub use servers::{
    parse_athena_section, parse_servers_section, RawAthenaSection, RawServerSection,
    ServerLaunchConfig, ATHENA_PATH_ENV, ATHENA_SERVER_NAME,
};

pub const CONFIG_ENV_KEY: &str = "MCP_RELAY_CONFIG";

/// Top-level configuration container.
#[derive(Debug, Clone, Serialize)]
pub struct RelayConfig {
    pub client: ClientIdentity,
    pub athena: ServerLaunchConfig,
    pub servers: Vec<ServerLaunchConfig>,
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawRelayConfig {
    client: Option<RawClientSection>,
    athena: Option<RawAthenaSection>,
    servers: Option<Vec<RawServerSection>>,
}

/// Shape written by [`RelayConfig::to_toml`]; `athena` carries no `name` key.
#[derive(Serialize)]
struct RenderedConfig<'a> {
    client: &'a ClientIdentity,
    athena: RenderedAthena<'a>,
    servers: &'a [ServerLaunchConfig],
}

#[derive(Serialize)]
struct RenderedAthena<'a> {
    command: &'a str,
    args: &'a [String],
    env: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a PathBuf>,
}

impl RelayConfig {
    /// Built-in configuration: default client identity and Athena from `ATHENA_PATH`.
    pub fn defaults() -> Self {
        Self {
            client: ClientIdentity::default(),
            athena: ServerLaunchConfig::athena_from_env(),
            servers: Vec::new(),
            source_path: None,
        }
    }

    /// Resolve the file in the order: explicit path → `MCP_RELAY_CONFIG` → built-in defaults.
    pub fn load(override_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = override_path {
            telemetry::log_env_source(&path, false);
            return Self::load_from_path(path);
        }

        match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => {
                let path = PathBuf::from(value);
                telemetry::log_env_source(&path, true);
                Self::load_from_path(path)
            }
            _ => {
                telemetry::log_defaults();
                let config = Self::defaults();
                telemetry::log_loaded(&config);
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "mcp_relay::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder().add_source(config::File::from(path.clone()));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "mcp_relay::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawRelayConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "mcp_relay::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "mcp_relay::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawRelayConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let client = parse_client_section(raw.client, &path)?;
        let athena = parse_athena_section(raw.athena, &path)?;
        let servers = parse_servers_section(raw.servers, &path)?;

        Ok(Self {
            client,
            athena,
            servers,
            source_path: Some(path),
        })
    }

    /// Athena followed by every `[[servers]]` entry.
    pub fn all_servers(&self) -> impl Iterator<Item = &ServerLaunchConfig> {
        std::iter::once(&self.athena).chain(self.servers.iter())
    }

    pub fn source_label(&self) -> String {
        self.source_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_string())
    }

    /// Render the effective configuration in the file format accepted by `load_from_path`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let rendered = RenderedConfig {
            client: &self.client,
            athena: RenderedAthena {
                command: &self.athena.command,
                args: &self.athena.args,
                env: self
                    .athena
                    .env
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect(),
                cwd: self.athena.cwd.as_ref(),
            },
            servers: &self.servers,
        };
        toml::to_string_pretty(&rendered)
    }
}
