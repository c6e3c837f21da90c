//! Error types for the service bindings.

use thiserror::Error;
use triage_core::TriageError;

/// gRPC status codes that pRPC reports in its response header.
pub mod code {
    pub const OK: i32 = 0;
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const DEADLINE_EXCEEDED: i32 = 4;
    pub const NOT_FOUND: i32 = 5;
    pub const PERMISSION_DENIED: i32 = 7;
    pub const INTERNAL: i32 = 13;
    pub const UNAVAILABLE: i32 = 14;
    pub const UNAUTHENTICATED: i32 = 16;
}

/// Errors that can occur when calling the build, test, and log services.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-OK pRPC response.
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i32, message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Response decoded but violates the service contract.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Returns true if the service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rpc { code: code::NOT_FOUND, .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<ClientError> for TriageError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Rpc {
                code: code::INVALID_ARGUMENT,
                message,
            } => TriageError::Argument(message),
            e if e.is_not_found() => TriageError::NotFound(e.to_string()),
            e => TriageError::Service(e.to_string()),
        }
    }
}

/// Map an HTTP status to the gRPC code pRPC would have sent.
pub(crate) fn code_from_http(status: reqwest::StatusCode) -> i32 {
    match status.as_u16() {
        400 => code::INVALID_ARGUMENT,
        401 => code::UNAUTHENTICATED,
        403 => code::PERMISSION_DENIED,
        404 => code::NOT_FOUND,
        503 => code::UNAVAILABLE,
        504 => code::DEADLINE_EXCEEDED,
        _ => code::INTERNAL,
    }
}
