//! Shared library modules providing error types, environment path helpers, and telemetry initialization.

pub mod errors;
pub mod paths;
pub mod telemetry;
