//! Library crate root re-exporting the client, tool, plugin and CLI modules.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cli;
pub mod client;
pub mod config;
pub mod plugin;
pub mod tools;
