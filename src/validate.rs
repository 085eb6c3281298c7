//! Syntactic checks for caller-supplied identifiers.
//!
//! Node names and VM ids end up as path segments in Proxmox API URLs, so
//! anything outside a conservative character set is rejected before it
//! reaches [`ProxmoxClient`](crate::client::ProxmoxClient).

use once_cell::sync::Lazy;
use regex::Regex;

static NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{0,63}$").expect("valid node regex"));

static VMID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{0,8}$").expect("valid vmid regex"));

/// A caller-supplied identifier failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter {name} must be a {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },
    #[error("Invalid node name: {0:?}")]
    NodeName(String),
    #[error("Invalid VM ID: {0:?}")]
    VmId(String),
}

/// Accept a node name: alphanumeric first character, then up to 63 of
/// `[a-zA-Z0-9._-]`.
pub fn validate_node(node: &str) -> Result<&str, ValidationError> {
    if NODE_RE.is_match(node) {
        Ok(node)
    } else {
        Err(ValidationError::NodeName(node.to_string()))
    }
}

/// Accept a VM id: positive decimal, no leading zero, at most 9 digits.
pub fn validate_vmid(vmid: &str) -> Result<&str, ValidationError> {
    if VMID_RE.is_match(vmid) {
        Ok(vmid)
    } else {
        Err(ValidationError::VmId(vmid.to_string()))
    }
}
