//! Shared protocol types for the Rex bridge.
//!
//! Everything that crosses the boundary between the UI client and the bridge
//! lives here: inbound [`Command`]s with their [`Args`], the typed
//! [`BridgeError`] taxonomy, the value types returned by commands
//! ([`Contact`], [`LocationFix`]) and the unsolicited [`BridgeEvent`]s pushed
//! back to the UI.

use serde::{Deserialize, Serialize};

mod args;
mod error;
pub mod rpc;

pub use args::Args;
pub use error::{BridgeError, ErrorKind, Result};

/// One inbound request: a method name plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Method name as sent by the UI (e.g. `dialNumber`).
    pub method: String,
    /// Named arguments; empty when the UI sent none.
    #[serde(default)]
    pub args: Args,
}

impl Command {
    /// Build a command from parts.
    pub fn new(method: impl Into<String>, args: Args) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Normalized telephony state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallState {
    /// No call activity.
    #[default]
    Idle,
    /// An incoming call is ringing.
    Ringing,
    /// A call is active or being dialed.
    Offhook,
}

impl CallState {
    /// Raw platform code for idle.
    pub const RAW_IDLE: i32 = 0;
    /// Raw platform code for ringing.
    pub const RAW_RINGING: i32 = 1;
    /// Raw platform code for off-hook.
    pub const RAW_OFFHOOK: i32 = 2;

    /// Map a raw platform code. Anything unrecognized collapses to `Idle`.
    pub fn from_raw(code: i32) -> Self {
        match code {
            Self::RAW_RINGING => Self::Ringing,
            Self::RAW_OFFHOOK => Self::Offhook,
            _ => Self::Idle,
        }
    }

    /// Whether the caller identity should be resolved for this state.
    pub fn carries_identity(self) -> bool {
        matches!(self, Self::Ringing | Self::Offhook)
    }

    /// Whether `self -> next` is one of the expected transitions.
    ///
    /// Legal: `Idle -> Ringing`, `Ringing -> Offhook`, `Offhook -> Idle` and
    /// `Idle -> Offhook` (self-originated calls).
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Ringing)
                | (Self::Idle, Self::Offhook)
                | (Self::Ringing, Self::Offhook)
                | (Self::Offhook, Self::Idle)
        )
    }
}

/// One observed telephony transition plus the resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Mapped state.
    pub state: CallState,
    /// Number reported by the platform, or `"Unknown"`.
    pub number: String,
    /// Resolved display name; empty for `Idle`.
    pub name: String,
}

/// Read-only projection of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name.
    pub name: String,
    /// Phone number as stored in the directory.
    pub number: String,
}

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Unsolicited messages pushed from the bridge to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// The telephony state changed.
    CallStateChanged(CallEvent),

    /// Streaming log message from the bridge.
    Log {
        /// Severity level.
        level: String,
        /// Event target (module path).
        target: String,
        /// Rendered message.
        message: String,
    },
}

impl BridgeEvent {
    /// Stable channel name used when the event is published.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallStateChanged(_) => "callStateChanged",
            Self::Log { .. } => "log",
        }
    }
}

/// IPC-related helpers: channel aliases and line codec.
pub mod ipc {
    use super::BridgeEvent;

    /// Tokio unbounded sender for outbound events.
    pub type EventTx = tokio::sync::mpsc::UnboundedSender<BridgeEvent>;
    /// Tokio unbounded receiver for outbound events.
    pub type EventRx = tokio::sync::mpsc::UnboundedReceiver<BridgeEvent>;

    /// Create the standard outbound event channel (sender, receiver).
    ///
    /// Unbounded so that call-state transitions are never dropped or
    /// coalesced under backpressure.
    pub fn event_channel() -> (EventTx, EventRx) {
        tokio::sync::mpsc::unbounded_channel::<BridgeEvent>()
    }

    /// Codec for encoding/decoding frames used by the line server.
    pub mod codec;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_map_with_idle_fallback() {
        assert_eq!(CallState::from_raw(0), CallState::Idle);
        assert_eq!(CallState::from_raw(1), CallState::Ringing);
        assert_eq!(CallState::from_raw(2), CallState::Offhook);
        assert_eq!(CallState::from_raw(7), CallState::Idle);
        assert_eq!(CallState::from_raw(-1), CallState::Idle);
    }

    #[test]
    fn transition_table() {
        use CallState::*;
        assert!(Idle.can_transition_to(Ringing));
        assert!(Idle.can_transition_to(Offhook));
        assert!(Ringing.can_transition_to(Offhook));
        assert!(Offhook.can_transition_to(Idle));
        assert!(!Offhook.can_transition_to(Ringing));
        assert!(!Ringing.can_transition_to(Ringing));
        assert!(!Ringing.can_transition_to(Idle));
    }

    #[test]
    fn call_event_serializes_uppercase_state() {
        let ev = BridgeEvent::CallStateChanged(CallEvent {
            state: CallState::Ringing,
            number: "555".into(),
            name: "Ann".into(),
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "callStateChanged");
        assert_eq!(json["payload"]["state"], "RINGING");
        assert_eq!(ev.name(), "callStateChanged");
    }
}
