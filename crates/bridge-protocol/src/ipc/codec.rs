use serde_json::Value;
use thiserror::Error;

use crate::{
    BridgeError, BridgeEvent,
    rpc::{Frame, Outcome, Request, Response},
};

/// Errors from encoding/decoding frames.
#[derive(Debug, Error)]
pub enum Error {
    /// The line was not a JSON object.
    #[error("expected a JSON object, got {0}")]
    InvalidValueType(Value),
    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// An object with a usable `id` whose other fields are wrong.
    #[error("request {id}: {source}")]
    InvalidRequest {
        /// The request's `id`.
        id: u64,
        /// What failed to decode.
        source: serde_json::Error,
    },
}

impl Error {
    /// Id of the request that failed to decode, when it could be read.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::InvalidRequest { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Encode a frame as a single line (no trailing newline).
pub fn frame_to_line(frame: &Frame) -> Result<String, Error> {
    Ok(serde_json::to_string(frame)?)
}

/// Encode a command outcome for request `id`.
pub fn response_to_line(id: Option<u64>, result: Result<Value, BridgeError>) -> Result<String, Error> {
    let outcome = match result {
        Ok(v) => Outcome::Ok(v),
        Err(e) => Outcome::Error(e),
    };
    frame_to_line(&Frame::Response(Response { id, outcome }))
}

/// Encode an outbound event.
pub fn event_to_line(event: &BridgeEvent) -> Result<String, Error> {
    frame_to_line(&Frame::Event(event.clone()))
}

/// Decode one request line.
///
/// # Errors
/// Returns an error if the line is not a JSON object or lacks `id`/`method`.
pub fn line_to_request(line: &str) -> Result<Request, Error> {
    let value: Value = serde_json::from_str(line)?;
    if !value.is_object() {
        return Err(Error::InvalidValueType(value));
    }
    let id = value.get("id").and_then(Value::as_u64);
    serde_json::from_value(value).map_err(|source| match id {
        Some(id) => Error::InvalidRequest { id, source },
        None => Error::Json(source),
    })
}

/// Decode any frame written by the bridge (client side).
pub fn line_to_frame(line: &str) -> Result<Frame, Error> {
    Ok(serde_json::from_str(line)?)
}
