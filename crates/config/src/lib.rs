//! Configuration for the Rex bridge.
//!
//! The bridge reads a single RON file. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration:
//!
//! ```ron
//! (
//!     strict_permissions: false,
//!     default_volume: 50,
//!     default_message_platform: "whatsapp",
//! )
//! ```

use std::{
    env,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

mod error;
mod loader;

#[cfg(test)]
mod test_parse;

pub use error::{Error, excerpt_at};
pub use loader::{load, load_from_path, load_from_str};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REXBRIDGE_CONFIG";

/// Messaging platforms `sendMessage` knows how to reach.
pub const MESSAGE_PLATFORMS: &[&str] = &["whatsapp", "telegram", "signal", "sms"];

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Report `PERMISSION_DENIED` from `answerCall` and `startListener`
    /// instead of succeeding silently when telephony is not granted.
    pub strict_permissions: bool,
    /// Volume percentage used when `setVolume` omits `level`.
    pub default_volume: u8,
    /// Platform used when `sendMessage` omits `platform`.
    pub default_message_platform: String,
    /// How many installed app labels to include when `openApp` finds nothing.
    pub not_found_sample: usize,
    /// Lowest API level with programmatic call answering.
    pub answer_call_min_api: u32,
    /// Lowest API level with direct end-call support.
    pub end_call_min_api: u32,
    /// Lowest API level with notification-policy control.
    pub dnd_min_api: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            strict_permissions: false,
            default_volume: 50,
            default_message_platform: "whatsapp".to_string(),
            not_found_sample: 10,
            answer_call_min_api: 26,
            end_call_min_api: 28,
            dnd_min_api: 23,
        }
    }
}

/// Determine the preferred user config path (`~/.rexbridge/config.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".rexbridge");
    p.push("config.ron");
    p
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `$REXBRIDGE_CONFIG` when set and non-empty.
/// 3) Else use `~/.rexbridge/config.ron` when it exists.
/// 4) Else `None`: run with defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(from_env) = env::var_os(CONFIG_ENV)
        && !from_env.is_empty()
    {
        return Some(PathBuf::from(from_env));
    }
    let preferred = default_config_path();
    preferred.exists().then_some(preferred)
}
