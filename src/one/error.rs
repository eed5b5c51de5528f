// ABOUTME: Error types for the OpenNebula XML-RPC collaborator.
// ABOUTME: Separates transport, protocol, and OpenNebula-reported failures.

use std::time::Duration;

/// OpenNebula error code for "object does not exist".
pub const NO_EXISTS: i64 = 0x0400;

/// Errors from calls against the OpenNebula RPC endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("RPC endpoint returned HTTP {status}")]
    Http { status: u16 },

    #[error("RPC request timed out after {0:?}")]
    Timeout(Duration),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// OpenNebula answered but reported the call as failed.
    #[error("{method} failed: {message}")]
    Call {
        method: String,
        code: i64,
        message: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RpcError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        RpcError::Malformed(message.into())
    }

    /// True when OpenNebula reports that the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::Call { code, .. } if *code == NO_EXISTS)
    }
}
