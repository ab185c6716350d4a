//! Typed RPC definitions for the bridge protocol.
//!
//! This module defines the method names and the request/response frames
//! exchanged between the UI client and the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Args, BridgeError, BridgeEvent};

/// Methods the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Accept the ringing call.
    AnswerCall,
    /// Hang up the active call.
    EndCall,
    /// Place a call to a number.
    DialNumber,
    /// Launch an installed app by free-text name.
    OpenApp,
    /// Return to the home screen.
    GoHome,
    /// Search contacts by display-name substring.
    SearchContacts,
    /// List every contact.
    GetContacts,
    /// Open a WhatsApp conversation with a prefilled message.
    SendWhatsApp,
    /// Open a messaging app with a prefilled message.
    SendMessage,
    /// Place text on the clipboard.
    SetClipboard,
    /// Switch the torch on or off.
    ToggleFlash,
    /// Set the ring volume as a percentage.
    SetVolume,
    /// Enable or disable do-not-disturb.
    SetDnd,
    /// Start streaming call-state events.
    StartListener,
    /// Fetch the current position.
    GetLocation,
}

impl Method {
    /// Every method, in table order.
    pub const ALL: [Self; 15] = [
        Self::AnswerCall,
        Self::EndCall,
        Self::DialNumber,
        Self::OpenApp,
        Self::GoHome,
        Self::SearchContacts,
        Self::GetContacts,
        Self::SendWhatsApp,
        Self::SendMessage,
        Self::SetClipboard,
        Self::ToggleFlash,
        Self::SetVolume,
        Self::SetDnd,
        Self::StartListener,
        Self::GetLocation,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnswerCall => "answerCall",
            Self::EndCall => "endCall",
            Self::DialNumber => "dialNumber",
            Self::OpenApp => "openApp",
            Self::GoHome => "goHome",
            Self::SearchContacts => "searchContacts",
            Self::GetContacts => "getContacts",
            Self::SendWhatsApp => "sendWhatsApp",
            Self::SendMessage => "sendMessage",
            Self::SetClipboard => "setClipboard",
            Self::ToggleFlash => "toggleFlash",
            Self::SetVolume => "setVolume",
            Self::SetDnd => "setDND",
            Self::StartListener => "startListener",
            Self::GetLocation => "getLocation",
        }
    }

    /// Parse a method name received from the UI.
    pub fn try_from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// Inbound request frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id chosen by the client.
    pub id: u64,
    /// Method name.
    pub method: String,
    /// Arguments; may be omitted.
    #[serde(default)]
    pub args: Args,
}

/// Outcome carried by a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Command succeeded with a value.
    Ok(Value),
    /// Command failed.
    Error(BridgeError),
}

/// Response frame; `id` is `None` when the request could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the request.
    pub id: Option<u64>,
    /// Result or error.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Anything written to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    /// Reply to a request.
    Response(Response),
    /// Unsolicited event.
    Event(BridgeEvent),
}
