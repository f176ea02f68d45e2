//! Shared helpers for resolving paths from the environment.

use std::{env, path::PathBuf};

/// Read `key` as a path, ignoring unset or blank values.
pub fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.to_string_lossy().trim().is_empty())
        .map(PathBuf::from)
}
