//! HTTP client for the Proxmox VE REST API.
//!
//! [`ProxmoxClient`] wraps `reqwest::Client` and provides one method per
//! read-only endpoint the tools need. Proxmox wraps every payload as
//! `{"data": ...}`; the envelope is stripped here so callers see the bare
//! value.
//!
//! ## Authentication
//!
//! API tokens only. PVE expects `PVEAPIToken=user@realm!name=secret`, PBS
//! expects `PBSAPIToken=user@realm!name:secret`. PMG has no token support.
//!
//! ## Error handling
//!
//! Non-2xx responses carry their reason either in an `errors` object (one
//! message per parameter), a `message` string, or only in the status line.
//! The first of those that is present becomes the error message.

use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Config, Service};

/// Errors returned by [`ProxmoxClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure (connection refused, TLS, timeout, DNS, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with a non-2xx status.
    #[error("Proxmox API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// The response body was not the expected JSON envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Invalid CA certificate {}: {reason}", .path.display())]
    Certificate { path: PathBuf, reason: String },
    #[error("Invalid API token: {0}")]
    Credential(String),
    #[error("{0} does not support API token authentication")]
    Unsupported(Service),
}

/// Authenticated session against one Proxmox API endpoint.
pub struct ProxmoxClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxmoxClient {
    /// Build a client from configuration and verify it with `GET /version`.
    pub async fn connect(config: &Config) -> Result<Self, ClientError> {
        Self::from_config(config)?.handshake().await
    }

    /// Build a client from configuration without contacting the server.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let token = token_header(config)?;
        let base_url = format!(
            "https://{}:{}/api2/json",
            url_host(&config.proxmox.host),
            config.proxmox.port
        );
        Self::with_base_url(
            base_url,
            &token,
            config.proxmox.verify_ssl,
            config.proxmox.ssl_cert.as_deref(),
        )
    }

    /// Build a client for an explicit API base URL (e.g. `https://pve:8006/api2/json`).
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: &str,
        verify_ssl: bool,
        ca_cert: Option<&Path>,
    ) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(token)
            .map_err(|e| ClientError::Credential(e.to_string()))?;
        auth.set_sensitive(true);
        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers)
            .danger_accept_invalid_certs(!verify_ssl)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30));
        if let Some(path) = ca_cert {
            builder = builder.add_root_certificate(load_certificate(path)?);
        }
        let http = builder.build()?;

        // Strip trailing slash for consistent URL construction
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Confirm the endpoint is reachable and the token is accepted.
    pub async fn handshake(self) -> Result<Self, ClientError> {
        let info = self.version().await?;
        let version = info
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(url = %self.base_url, version, "connected to Proxmox API");
        Ok(self)
    }

    /// The API base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /version`
    pub async fn version(&self) -> Result<Value, ClientError> {
        self.get("/version").await
    }

    /// `GET /nodes` - cluster members with their online state.
    pub async fn nodes(&self) -> Result<Value, ClientError> {
        self.get("/nodes").await
    }

    /// `GET /nodes/{node}/status`
    pub async fn node_status(&self, node: &str) -> Result<Value, ClientError> {
        self.get(&format!("/nodes/{node}/status")).await
    }

    /// `GET /nodes/{node}/qemu` - QEMU guests on one node.
    pub async fn node_vms(&self, node: &str) -> Result<Value, ClientError> {
        self.get(&format!("/nodes/{node}/qemu")).await
    }

    /// `GET /storage`
    pub async fn storage(&self) -> Result<Value, ClientError> {
        self.get("/storage").await
    }

    /// `GET /cluster/status` - quorum and membership.
    pub async fn cluster_status(&self) -> Result<Value, ClientError> {
        self.get("/cluster/status").await
    }

    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    /// Parse an HTTP response: the `data` member on success, a
    /// [`ClientError::Api`] with the best available message otherwise.
    async fn handle_response(resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            let value: Value = serde_json::from_str(&body)
                .map_err(|e| ClientError::Protocol(format!("Invalid JSON from Proxmox: {e}")))?;
            match value {
                Value::Object(mut map) => map
                    .remove("data")
                    .ok_or_else(|| ClientError::Protocol("Response has no data member".into())),
                _ => Err(ClientError::Protocol(
                    "Response is not a JSON object".into(),
                )),
            }
        } else {
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(String::from))
                .unwrap_or_else(|| "unknown error".to_string());
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Format the `Authorization` header value for the configured service.
pub fn token_header(config: &Config) -> Result<String, ClientError> {
    let auth = &config.auth;
    match config.proxmox.service {
        Service::Pve => Ok(format!(
            "PVEAPIToken={}!{}={}",
            auth.user, auth.token_name, auth.token_value
        )),
        Service::Pbs => Ok(format!(
            "PBSAPIToken={}!{}:{}",
            auth.user, auth.token_name, auth.token_value
        )),
        Service::Pmg => Err(ClientError::Unsupported(Service::Pmg)),
    }
}

/// Bracket bare IPv6 literals so they can sit in a URL authority.
fn url_host(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

fn load_certificate(path: &Path) -> Result<reqwest::Certificate, ClientError> {
    let pem = std::fs::read(path).map_err(|e| ClientError::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| ClientError::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Extract a readable message from an error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return (!trimmed.is_empty()).then(|| trimmed.to_string());
    };

    if let Some(errors) = value.get("errors").and_then(Value::as_object) {
        let joined = errors
            .iter()
            .map(|(field, msg)| match msg.as_str() {
                Some(s) => format!("{field}: {}", s.trim()),
                None => format!("{field}: {msg}"),
            })
            .collect::<Vec<_>>()
            .join("; ");
        if !joined.is_empty() {
            return Some(joined);
        }
    }
    value
        .get("message")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
