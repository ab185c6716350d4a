use std::{io::Error as IoError, result::Result as StdResult};

use thiserror::Error;

/// Errors that end a serving session.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading requests or writing frames failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// A frame could not be encoded.
    #[error("Serialization error: {0}")]
    Codec(#[from] bridge_protocol::ipc::codec::Error),

    /// `serve` was called while another session owns the event stream.
    #[error("server is already serving a client")]
    AlreadyServing,
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = StdResult<T, Error>;
