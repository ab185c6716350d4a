//! Line-delimited JSON front end for the bridge.
//!
//! A client writes one request object per line and reads back one frame per
//! line: exactly one response per request, plus unsolicited events.
//!
//! ```text
//! -> {"id": 1, "method": "startListener"}
//! <- {"id": 1, "ok": true}
//! <- {"event": "callStateChanged", "payload": {"state": "RINGING", "number": "555", "name": "Ann"}}
//! -> {"id": 2, "method": "openApp", "args": {"appName": "zzz"}}
//! <- {"id": 2, "error": {"code": "NOT_FOUND", "message": "App 'zzz' not found (installed: ...)"}}
//! ```
//!
//! Responses may arrive out of request order; match them by `id`. A line
//! that is not a valid request gets an `INVALID_ARGUMENT` response with
//! `"id": null`.
#![warn(missing_docs)]

mod error;
mod service;

pub use error::{Error, Result};
pub use service::LineServer;
