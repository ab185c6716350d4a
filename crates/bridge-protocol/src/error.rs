use std::result::Result as StdResult;

use permissions::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience type alias for command results.
pub type Result<T> = StdResult<T, BridgeError>;

/// Stable error codes surfaced to the UI.
///
/// Use `to_string()` (Display) to produce the canonical code string.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A capability check failed.
    #[error("PERMISSION_DENIED")]
    PermissionDenied,
    /// Malformed or missing input.
    #[error("INVALID_ARGUMENT")]
    InvalidArgument,
    /// A lookup yielded nothing.
    #[error("NOT_FOUND")]
    NotFound,
    /// Unknown method, or not available on this platform version.
    #[error("UNSUPPORTED")]
    Unsupported,
    /// A best-effort resource is temporarily absent.
    #[error("UNAVAILABLE")]
    Unavailable,
    /// Unexpected native failure.
    #[error("INTERNAL")]
    Internal,
}

/// Typed failure returned for a command.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct BridgeError {
    /// Stable error kind.
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl BridgeError {
    /// Construct from a kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// `PermissionDenied` naming the missing capability.
    pub fn permission_denied(capability: Capability) -> Self {
        Self::new(
            ErrorKind::PermissionDenied,
            format!("Missing {capability} permission"),
        )
    }

    /// `InvalidArgument` with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// `NotFound` with a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// `Unsupported` with a message.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// `Unavailable` with a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// `Internal`, wrapping the underlying cause.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::PermissionDenied.to_string(), "PERMISSION_DENIED");
        assert_eq!(ErrorKind::Unsupported.to_string(), "UNSUPPORTED");
        let e = BridgeError::permission_denied(Capability::Telephony);
        assert_eq!(e.to_string(), "PERMISSION_DENIED: Missing telephony permission");
    }

    #[test]
    fn serializes_with_code_field() {
        let e = BridgeError::not_found("App not found");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["code"], "NOT_FOUND");
        assert_eq!(v["message"], "App not found");
    }
}
