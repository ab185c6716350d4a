use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for engine internals.
pub type Result<T> = StdResult<T, Error>;

/// Engine-internal failures that never reach the UI as command errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The outbound event channel has been closed by the receiver.
    #[error("event channel closed")]
    ChannelClosed,

    /// A task had to be spawned outside a tokio runtime.
    #[error("no async runtime: {0}")]
    NoRuntime(String),

    /// Device layer failure.
    #[error(transparent)]
    Device(#[from] device_ops::Error),
}

impl From<Error> for bridge_protocol::BridgeError {
    fn from(err: Error) -> Self {
        match err {
            Error::Device(e) => e.into(),
            Error::ChannelClosed => Self::internal("event channel closed"),
            Error::NoRuntime(msg) => Self::internal(format!("no async runtime: {msg}")),
        }
    }
}
