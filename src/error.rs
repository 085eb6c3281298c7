//! Startup errors. Any of these ends the process with exit code 1.
//!
//! Per-call failures live in [`ToolError`](crate::tools::ToolError) and never
//! reach this type.

use std::path::PathBuf;

use crate::client::ClientError;
use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot connect to Proxmox API: {0}")]
    Connection(#[source] ClientError),
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
