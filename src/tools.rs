//! MCP tool definitions and handlers.
//!
//! Each tool is defined as a JSON schema (returned by [`tool_definitions`])
//! and handled by [`Gateway::call`], which validates arguments and makes a
//! single read-only request (two levels of requests for `get_vms`) through
//! [`ProxmoxClient`].
//!
//! ## Tools
//!
//! - `get_nodes`, `get_node_status`
//! - `get_vms`
//! - `get_storage`
//! - `get_cluster_status`
//!
//! There is deliberately no tool that runs commands inside guests.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::{ClientError, ProxmoxClient};
use crate::validate::{validate_node, ValidationError};

/// Every registered tool, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetNodes,
    GetNodeStatus,
    GetVms,
    GetStorage,
    GetClusterStatus,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::GetNodes,
        Tool::GetNodeStatus,
        Tool::GetVms,
        Tool::GetStorage,
        Tool::GetClusterStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::GetNodes => "get_nodes",
            Tool::GetNodeStatus => "get_node_status",
            Tool::GetVms => "get_vms",
            Tool::GetStorage => "get_storage",
            Tool::GetClusterStatus => "get_cluster_status",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Tool::GetNodes => {
                "List all nodes in the Proxmox cluster with their status, CPU, memory and uptime."
            }
            Tool::GetNodeStatus => {
                "Get detailed status for one Proxmox node: CPU, memory, root filesystem, load average, kernel and PVE versions, uptime."
            }
            Tool::GetVms => {
                "List QEMU virtual machines across all cluster nodes. Each entry carries the owning node, VM ID, name, status and resource usage."
            }
            Tool::GetStorage => {
                "List storage pools configured in the cluster with their type and content types."
            }
            Tool::GetClusterStatus => {
                "Get cluster membership and quorum status (quorate flag, node list, cluster name)."
            }
        }
    }

    fn input_schema(self) -> Value {
        match self {
            Tool::GetNodeStatus => json!({
                "type": "object",
                "properties": {
                    "node": {
                        "type": "string",
                        "description": "Name/ID of node to query (e.g. 'pve1', 'proxmox-node2')."
                    }
                },
                "required": ["node"],
                "additionalProperties": false
            }),
            _ => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }

    /// MCP tool definition as returned by `tools/list`.
    pub fn definition(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema()
        })
    }
}

/// Why a tool call failed. Never fatal for the server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Bad argument; rejected before any request is made.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// The Proxmox API call failed.
    #[error(transparent)]
    Remote(#[from] ClientError),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Returns all tool definitions.
pub fn tool_definitions() -> Vec<Value> {
    Tool::ALL.into_iter().map(Tool::definition).collect()
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn success(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }
}

/// Server-lifetime context: owns the Proxmox session and serves tool calls.
pub struct Gateway {
    client: ProxmoxClient,
}

impl Gateway {
    pub fn new(client: ProxmoxClient) -> Self {
        Self { client }
    }

    /// Handle a tool call and return MCP content.
    pub async fn call(&self, name: &str, args: &Value) -> ToolResult {
        debug!(tool = name, "tool call");
        match self.dispatch(name, args).await {
            Ok(value) => ToolResult::success(&value),
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                ToolResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        match tool {
            Tool::GetNodes => Ok(self.client.nodes().await?),
            Tool::GetNodeStatus => {
                let node = validate_node(required_str(args, "node")?)?;
                Ok(self.client.node_status(node).await?)
            }
            Tool::GetVms => self.get_vms().await,
            Tool::GetStorage => Ok(self.client.storage().await?),
            Tool::GetClusterStatus => Ok(self.client.cluster_status().await?),
        }
    }

    /// VMs of every node, in node order then listing order. Each entry is
    /// tagged with its node so ids stay unambiguous across the cluster.
    async fn get_vms(&self) -> Result<Value, ToolError> {
        let nodes = into_array(self.client.nodes().await?, "/nodes")?;
        let mut vms = Vec::new();

        for entry in &nodes {
            let node = entry
                .get("node")
                .and_then(Value::as_str)
                .ok_or_else(|| ClientError::Protocol("Node entry without a name".into()))?;
            // Names from the API become path segments too.
            let node = validate_node(node).map_err(|e| ClientError::Protocol(e.to_string()))?;

            let listed = into_array(self.client.node_vms(node).await?, "/nodes/{node}/qemu")?;
            for mut vm in listed {
                if let Value::Object(map) = &mut vm {
                    map.entry("node").or_insert_with(|| json!(node));
                }
                vms.push(vm);
            }
        }

        Ok(Value::Array(vms))
    }
}

fn required_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ValidationError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ValidationError::MissingParameter(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::WrongType {
            name,
            expected: "string",
        }),
    }
}

fn into_array(value: Value, endpoint: &str) -> Result<Vec<Value>, ClientError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ClientError::Protocol(format!(
            "Expected a list from {endpoint}"
        ))),
    }
}
