//! # mcp-proxmox
//!
//! MCP (Model Context Protocol) server exposing read-only Proxmox VE
//! inspection tools. Runs as a stdio JSON-RPC server, designed to be
//! launched by an AI agent host.
//!
//! ## Architecture
//!
//! ```text
//! main.rs      - entry point, config loading, signal handling, MCP server launch
//! config.rs    - env-var / JSON file configuration loading
//! client.rs    - HTTP client for the Proxmox REST API
//! validate.rs  - input checks for node names and VM ids
//! tools.rs     - tool definitions and handlers
//! mcp.rs       - MCP JSON-RPC protocol handler (stdio)
//! logging.rs   - tracing subscriber setup (stderr or file)
//! ```
//!
//! ## Tools
//!
//! `get_nodes`, `get_node_status`, `get_vms`, `get_storage`,
//! `get_cluster_status`. All read-only.

use clap::Parser;
use tracing::{error, info, warn};

use mcp_proxmox::config::{self, Cli};
use mcp_proxmox::{logging, mcp, Error, Gateway, ProxmoxClient};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("mcp-proxmox: {e}");
            1
        }
    };
    // Exit directly: the stdin reader may still be parked in a blocking read,
    // which would otherwise hold up runtime shutdown.
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let config = config::load_config(cli)?;
    logging::init(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.proxmox.host,
        port = config.proxmox.port,
        service = %config.proxmox.service,
        user = %config.auth.user,
        "mcp-proxmox starting"
    );
    if !config.proxmox.verify_ssl {
        warn!("TLS certificate verification is disabled");
    }

    let client = match ProxmoxClient::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "cannot connect to Proxmox API");
            return Err(Error::Connection(e));
        }
    };
    let gateway = Gateway::new(client);

    tokio::select! {
        res = mcp::run_stdio(&gateway) => res?,
        () = shutdown_signal() => {}
    }

    info!("mcp-proxmox stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot register SIGTERM handler");
                ctrl_c.await.ok();
                info!("Received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT, shutting down");
    }
}
