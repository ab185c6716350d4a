//! Device operations behind a single trait.
//!
//! Every native effect the bridge can trigger is a method on [`DeviceOps`].
//! The production implementation lives on the device side of the channel;
//! this crate ships the trait, its value types, and [`sim::SimDevice`], an
//! in-memory device that records what was asked of it.
//!
//! Streaming and deferred results are expressed with owned values instead of
//! callbacks:
//! - [`DeviceOps::watch_call_state`] takes a channel sender and returns a
//!   [`Subscription`]; dropping the subscription unregisters the listener.
//! - [`DeviceOps::request_single_update`] takes a [`LocationListener`], which
//!   is consumed when it fires and therefore fires at most once.

use std::collections::BTreeMap;

use bridge_protocol::{Contact, LocationFix};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc::UnboundedSender, oneshot};

mod error;
pub mod sim;

pub use error::{Error, Result};

/// One installed application considered during name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCandidate {
    /// User-visible label.
    pub label: String,
    /// Package identifier.
    pub identifier: String,
}

/// What an [`Intent`] asks the platform to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Open `uri` in whatever handles it.
    View,
    /// Compose to `uri` (e.g. `smsto:`).
    SendTo,
    /// Place a call to the `tel:` uri.
    Call,
    /// Bring up the launcher.
    Home,
    /// Start the main entry point of a package.
    Launch(String),
    /// Open the notification-policy access settings screen.
    NotificationPolicySettings,
}

/// A request to start some platform activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// What to do.
    pub action: Action,
    /// Target uri, when the action takes one.
    pub uri: Option<String>,
    /// String extras.
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl Intent {
    /// Intent without a uri.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            uri: None,
            extras: BTreeMap::new(),
        }
    }

    /// Intent with a uri.
    pub fn with_uri(action: Action, uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::new(action)
        }
    }

    /// Builder-style extra.
    pub fn extra(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extras.insert(key.to_string(), value.into());
        self
    }

    /// Launcher home screen.
    pub fn home() -> Self {
        Self::new(Action::Home)
    }

    /// Direct call to `number`.
    pub fn call(number: &str) -> Self {
        Self::with_uri(Action::Call, format!("tel:{number}"))
    }
}

/// Do-not-disturb interruption filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionFilter {
    /// All notifications interrupt.
    All,
    /// Nothing interrupts.
    None,
}

/// A raw telephony notification as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCallState {
    /// Platform state code (see `CallState::from_raw`).
    pub code: i32,
    /// Accompanying number, if the platform disclosed one.
    pub number: Option<String>,
}

/// Sender half handed to the platform for call-state notifications.
pub type RawCallTx = UnboundedSender<RawCallState>;

/// Live platform registration. Dropping it unregisters the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancel action to run on drop.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// One-shot location listener. Firing consumes it.
#[derive(Debug)]
pub struct LocationListener {
    tx: oneshot::Sender<LocationFix>,
}

impl LocationListener {
    /// Create a listener and the receiver its fix will arrive on.
    pub fn new() -> (Self, oneshot::Receiver<LocationFix>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the fix. A receiver that has gone away is ignored.
    pub fn fire(self, fix: LocationFix) {
        let _ignored = self.tx.send(fix);
    }
}

/// Trait abstraction over device operations to improve testability.
pub trait DeviceOps: Send + Sync {
    /// Platform API level, read once at bridge startup.
    fn api_level(&self) -> u32;

    // ---- telephony ----
    /// Accept the currently ringing call.
    fn accept_ringing_call(&self) -> Result<()>;
    /// End the active call.
    fn end_call(&self) -> Result<()>;
    /// Register for call-state notifications.
    fn watch_call_state(&self, tx: RawCallTx) -> Result<Subscription>;

    // ---- contacts ----
    /// Exact directory lookup by phone number.
    fn lookup_contact_name(&self, number: &str) -> Result<Option<String>>;
    /// Every directory entry with a phone number.
    fn list_contacts(&self) -> Result<Vec<Contact>>;

    // ---- apps and activities ----
    /// Enumerate installed applications, in platform order.
    fn installed_apps(&self) -> Result<Vec<AppCandidate>>;
    /// Launch entry point for a package, if it has one.
    fn launch_intent_for(&self, identifier: &str) -> Option<Intent>;
    /// Start an activity.
    fn start(&self, intent: &Intent) -> Result<()>;

    // ---- misc device state ----
    /// Replace the primary clip.
    fn set_clipboard(&self, label: &str, text: &str) -> Result<()>;
    /// Camera ids that have a flash unit.
    fn flash_cameras(&self) -> Result<Vec<String>>;
    /// Switch the torch of `camera_id`.
    fn set_torch(&self, camera_id: &str, enable: bool) -> Result<()>;
    /// Maximum index of the ring stream.
    fn max_ring_volume(&self) -> u32;
    /// Set the ring stream index.
    fn set_ring_volume(&self, index: u32) -> Result<()>;
    /// Whether the app may change the interruption filter.
    fn notification_policy_access(&self) -> bool;
    /// Change the interruption filter.
    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<()>;

    // ---- location ----
    /// Most recent cached fix from the GPS provider.
    fn last_known_location(&self) -> Result<Option<LocationFix>>;
    /// Register a one-shot listener for the next fix.
    fn request_single_update(&self, listener: LocationListener) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn subscription_cancels_once_on_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = Subscription::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        drop(sub);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        drop(Subscription::noop());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn location_listener_delivers_once() {
        let (listener, rx) = LocationListener::new();
        listener.fire(LocationFix { lat: 1.5, lng: -2.0 });
        assert_eq!(rx.await.unwrap(), LocationFix { lat: 1.5, lng: -2.0 });
    }

    #[test]
    fn call_intent_uses_tel_scheme() {
        let i = Intent::call("+15551234");
        assert_eq!(i.action, Action::Call);
        assert_eq!(i.uri.as_deref(), Some("tel:+15551234"));
    }
}
