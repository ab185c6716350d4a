use std::result::Result as StdResult;

use bridge_protocol::BridgeError;
use thiserror::Error;

/// Convenient result type for device operations.
pub type Result<T> = StdResult<T, Error>;

/// Failures reported by a device implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The platform rejected or failed the operation.
    #[error("{op} failed: {message}")]
    Native {
        /// Operation name.
        op: &'static str,
        /// Platform message.
        message: String,
    },

    /// No activity can handle the intent.
    #[error("no activity found to handle {0}")]
    ActivityNotFound(String),

    /// A resource the operation needs is missing (e.g. no camera).
    #[error("{0} unavailable")]
    Unavailable(String),
}

impl Error {
    /// Shorthand for [`Error::Native`].
    pub fn native(op: &'static str, message: impl Into<String>) -> Self {
        Self::Native {
            op,
            message: message.into(),
        }
    }
}

/// Device failures surface to the UI as `INTERNAL`, except missing resources
/// which are `UNAVAILABLE`.
impl From<Error> for BridgeError {
    fn from(err: Error) -> Self {
        match err {
            Error::Unavailable(_) => Self::unavailable(err.to_string()),
            Error::Native { .. } | Error::ActivityNotFound(_) => Self::internal(err.to_string()),
        }
    }
}
