use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, Serializer};

use crate::lib::{errors::ConfigError, paths};

pub const ATHENA_SERVER_NAME: &str = "athena";
pub const ATHENA_PATH_ENV: &str = "ATHENA_PATH";
pub const DEFAULT_ATHENA_COMMAND: &str = "python";
pub const DEFAULT_ATHENA_ARGS: &[&str] = &["-m", "athena.mcp_server"];
pub const DEFAULT_ATHENA_CWD: &str = "/opt/athena";
pub const DEFAULT_ATHENA_PYTHONPATH: &str = "/opt/athena/src";

/// Launch parameters for one stdio MCP server.
///
/// `env` holds overrides only; the child inherits the rest of the parent
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerLaunchConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    #[serde(serialize_with = "serialize_env")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl ServerLaunchConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Athena launch profile derived from `ATHENA_PATH`.
    ///
    /// The variable is the working directory and also the `PYTHONPATH`; when it
    /// is unset the two fall back to separate fixed locations.
    pub fn athena_from_env() -> Self {
        let athena_path = paths::env_path(ATHENA_PATH_ENV);
        let cwd = athena_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ATHENA_CWD));
        let python_path = athena_path.unwrap_or_else(|| PathBuf::from(DEFAULT_ATHENA_PYTHONPATH));

        Self::new(ATHENA_SERVER_NAME, DEFAULT_ATHENA_COMMAND)
            .with_args(DEFAULT_ATHENA_ARGS.iter().copied())
            .with_cwd(cwd)
            .with_env("PYTHONPATH", python_path.to_string_lossy())
    }
}

/// `env` as written in a server section.
///
/// Only the `["KEY=VALUE"]` list is accepted. The table form is read so it can
/// be rejected with a usable message: the loader does not keep the case of
/// table keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawEnvSection {
    Entries(Vec<String>),
    Table(BTreeMap<String, String>),
}

/// `[athena]` overrides; every field falls back to the environment-derived default.
#[derive(Debug, Deserialize, Default)]
pub struct RawAthenaSection {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<RawEnvSection>,
    pub cwd: Option<PathBuf>,
}

/// One `[[servers]]` entry.
#[derive(Debug, Deserialize)]
pub struct RawServerSection {
    pub name: Option<String>,
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<RawEnvSection>,
    pub cwd: Option<PathBuf>,
}

pub fn parse_athena_section(
    raw: Option<RawAthenaSection>,
    path: &Path,
) -> Result<ServerLaunchConfig, ConfigError> {
    let mut athena = ServerLaunchConfig::athena_from_env();
    let Some(raw) = raw else {
        return Ok(athena);
    };

    if let Some(command) = raw.command {
        athena.command = command;
    }
    if let Some(args) = raw.args {
        athena.args = args;
    }
    if let Some(env) = raw.env {
        athena.env.extend(parse_env_section(env, "athena.env", path)?);
    }
    if let Some(cwd) = raw.cwd {
        athena.cwd = Some(cwd);
    }

    validate_command(&athena.command, "athena.command", path)?;
    validate_cwd(athena.cwd.as_deref(), "athena.cwd", path)?;
    Ok(athena)
}

pub fn parse_servers_section(
    raw: Option<Vec<RawServerSection>>,
    path: &Path,
) -> Result<Vec<ServerLaunchConfig>, ConfigError> {
    let mut seen: HashSet<String> = HashSet::from([ATHENA_SERVER_NAME.to_string()]);
    let mut servers = Vec::new();

    for entry in raw.unwrap_or_default() {
        let name = entry.name.ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "servers.name",
        })?;
        validate_server_name(&name, path)?;
        if !seen.insert(name.clone()) {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "servers.name",
                message: format!("Duplicate server name: {name}"),
            });
        }

        let command = entry.command.ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "servers.command",
        })?;
        validate_command(&command, "servers.command", path)?;
        validate_cwd(entry.cwd.as_deref(), "servers.cwd", path)?;

        let env = match entry.env {
            Some(env) => parse_env_section(env, "servers.env", path)?,
            None => BTreeMap::new(),
        };

        servers.push(ServerLaunchConfig {
            name,
            command,
            args: entry.args.unwrap_or_default(),
            env,
            cwd: entry.cwd,
        });
    }

    Ok(servers)
}

fn parse_env_section(
    env: RawEnvSection,
    field: &'static str,
    path: &Path,
) -> Result<BTreeMap<String, String>, ConfigError> {
    match env {
        RawEnvSection::Entries(entries) => parse_env_entries(&entries, field, path),
        RawEnvSection::Table(_) => Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: "Write environment overrides as a list: env = [\"KEY=VALUE\"]".into(),
        }),
    }
}

/// Parse `KEY=VALUE` entries. Keys keep their case.
fn parse_env_entries(
    entries: &[String],
    field: &'static str,
    path: &Path,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut env = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidField {
                path: path.to_path_buf(),
                field,
                message: format!("Expected KEY=VALUE, got `{entry}`"),
            })?;
        env.insert(key.trim().to_string(), value.to_string());
    }
    Ok(env)
}

fn validate_server_name(name: &str, path: &Path) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "servers.name",
        message: format!("Use letters, digits, `_`, `-` or `.` only: `{name}`"),
    })
}

fn validate_command(command: &str, field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if command.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: "Command cannot be empty".into(),
        });
    }
    Ok(())
}

fn validate_cwd(cwd: Option<&Path>, field: &'static str, path: &Path) -> Result<(), ConfigError> {
    match cwd {
        Some(dir) if dir.as_os_str().is_empty() => Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: "Working directory cannot be empty".into(),
        }),
        _ => Ok(()),
    }
}

fn serialize_env<S>(env: &BTreeMap<String, String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(env.iter().map(|(key, value)| format!("{key}={value}")))
}
