#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! mcp-proxmox library: the building blocks behind the `mcp-proxmox` binary.
//!
//! - `config` - environment / JSON file configuration
//! - `client` - Proxmox VE REST client (API token auth)
//! - `validate` - node name and VM id checks
//! - `tools` - MCP tool definitions and the [`Gateway`] that serves them
//! - `mcp` - JSON-RPC over stdio
//! - `logging` - tracing subscriber setup
//! - `error` - startup error type

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod tools;
pub mod validate;

pub use client::ProxmoxClient;
pub use config::Config;
pub use error::Error;
pub use tools::Gateway;
