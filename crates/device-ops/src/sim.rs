//! In-memory simulated device.
//!
//! [`SimDevice`] implements [`DeviceOps`] against a mutable in-memory state
//! seeded from a [`SimFixture`]. Every operation is recorded by name so tests
//! can assert what was (and was not) asked of the device, and individual
//! operations can be made to fail or panic.

use std::{
    collections::{HashMap, HashSet},
    mem,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use bridge_protocol::{Contact, LocationFix};
use parking_lot::Mutex;
use permissions::{Capability, PermissionStatus, StaticPermissions};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    Action, AppCandidate, DeviceOps, Error, Intent, InterruptionFilter, LocationListener,
    RawCallState, RawCallTx, Result, Subscription,
};

/// An installed app in a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimApp {
    /// User-visible label.
    pub label: String,
    /// Package identifier.
    pub identifier: String,
    /// Whether the package has a launch entry point.
    #[serde(default = "default_true")]
    pub launchable: bool,
}

fn default_true() -> bool {
    true
}

/// Serializable description of a simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimFixture {
    /// Platform API level.
    pub api_level: u32,
    /// Capability grants; unset entries read as `NotRequested`.
    pub permissions: HashMap<Capability, PermissionStatus>,
    /// Directory contents.
    pub contacts: Vec<Contact>,
    /// Installed apps in enumeration order.
    pub apps: Vec<SimApp>,
    /// Camera ids with a flash unit.
    pub flash_cameras: Vec<String>,
    /// Maximum ring stream index.
    pub max_ring_volume: u32,
    /// Whether notification-policy access has been granted.
    pub notification_policy_access: bool,
    /// Cached GPS fix.
    pub last_known_location: Option<LocationFix>,
    /// Uri schemes no installed activity handles.
    pub unhandled_schemes: Vec<String>,
}

impl Default for SimFixture {
    fn default() -> Self {
        Self {
            api_level: 34,
            permissions: HashMap::new(),
            contacts: Vec::new(),
            apps: Vec::new(),
            flash_cameras: vec!["0".to_string()],
            max_ring_volume: 7,
            notification_policy_access: true,
            last_known_location: None,
            unhandled_schemes: Vec::new(),
        }
    }
}

impl SimFixture {
    /// Build the device and a permission gate seeded from this fixture.
    pub fn build(self) -> (SimDevice, StaticPermissions) {
        let gate = StaticPermissions::from_entries(self.permissions.clone());
        (SimDevice::new(self), gate)
    }
}

/// Mutable device state.
#[derive(Default)]
struct State {
    /// Fixture-derived data (contacts, apps, hardware).
    fixture: SimFixture,
    /// Activities started, in order.
    intents: Vec<Intent>,
    /// Current primary clip.
    clipboard: Option<String>,
    /// Last torch request.
    torch: Option<(String, bool)>,
    /// Last ring volume index set.
    ring_volume: Option<u32>,
    /// Current interruption filter.
    interruption_filter: Option<InterruptionFilter>,
    /// Outstanding one-shot location listeners.
    location_listeners: Vec<LocationListener>,
}

/// Shared interior of a [`SimDevice`].
#[derive(Default)]
struct Inner {
    /// Device state.
    state: Mutex<State>,
    /// Operation names in call order.
    calls: Mutex<Vec<String>>,
    /// Operations that return an error.
    failing: Mutex<HashSet<&'static str>>,
    /// Operations that panic.
    panicking: Mutex<HashSet<&'static str>>,
    /// Registered call-state watchers by id.
    watchers: Mutex<Vec<(u64, RawCallTx)>>,
    /// Next watcher id.
    next_watcher: AtomicU64,
}

/// Simulated device for tests and the CLI.
#[derive(Clone, Default)]
pub struct SimDevice {
    inner: Arc<Inner>,
}

impl SimDevice {
    /// Device seeded from `fixture`.
    pub fn new(fixture: SimFixture) -> Self {
        let dev = Self::default();
        dev.inner.state.lock().fixture = fixture;
        dev
    }

    fn note(&self, op: &str) {
        self.inner.calls.lock().push(op.to_string());
    }

    /// Record `op` and apply any injected failure.
    fn enter(&self, op: &'static str) -> Result<()> {
        self.note(op);
        trace!(op, "sim_op");
        if self.inner.panicking.lock().contains(op) {
            panic!("simulated panic in {op}");
        }
        if self.inner.failing.lock().contains(op) {
            return Err(Error::native(op, "simulated failure"));
        }
        Ok(())
    }

    /// Operation names recorded so far.
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().clone()
    }

    /// Whether `op` was invoked at least once.
    pub fn calls_contains(&self, op: &str) -> bool {
        self.inner.calls.lock().iter().any(|x| x == op)
    }

    /// Number of times `op` was invoked.
    pub fn call_count(&self, op: &str) -> usize {
        self.inner.calls.lock().iter().filter(|x| *x == op).count()
    }

    /// Make `op` return an error (or stop doing so).
    pub fn set_fail(&self, op: &'static str, fail: bool) {
        let mut g = self.inner.failing.lock();
        if fail {
            g.insert(op);
        } else {
            g.remove(op);
        }
    }

    /// Make `op` panic.
    pub fn set_panic(&self, op: &'static str) {
        self.inner.panicking.lock().insert(op);
    }

    /// Replace the installed app list.
    pub fn set_apps(&self, apps: Vec<SimApp>) {
        self.inner.state.lock().fixture.apps = apps;
    }

    /// Replace the directory.
    pub fn set_contacts(&self, contacts: Vec<Contact>) {
        self.inner.state.lock().fixture.contacts = contacts;
    }

    /// Change the cached GPS fix.
    pub fn set_last_known(&self, fix: Option<LocationFix>) {
        self.inner.state.lock().fixture.last_known_location = fix;
    }

    /// Grant or revoke notification-policy access.
    pub fn set_policy_access(&self, granted: bool) {
        self.inner.state.lock().fixture.notification_policy_access = granted;
    }

    /// Push a raw call-state notification to every registered watcher.
    /// Returns the number of watchers reached.
    pub fn emit_call_state(&self, code: i32, number: Option<&str>) -> usize {
        let raw = RawCallState {
            code,
            number: number.map(str::to_string),
        };
        let watchers = self.inner.watchers.lock();
        watchers
            .iter()
            .filter(|(_, tx)| tx.send(raw.clone()).is_ok())
            .count()
    }

    /// Number of live call-state registrations.
    pub fn active_call_watchers(&self) -> usize {
        self.inner.watchers.lock().len()
    }

    /// Number of location listeners waiting for a fix.
    pub fn pending_location_listeners(&self) -> usize {
        self.inner.state.lock().location_listeners.len()
    }

    /// Fire every pending location listener with `fix`. Returns how many fired.
    pub fn deliver_location(&self, fix: LocationFix) -> usize {
        let listeners = mem::take(&mut self.inner.state.lock().location_listeners);
        let n = listeners.len();
        for l in listeners {
            l.fire(fix);
        }
        n
    }

    /// Drop every pending location listener without a fix.
    pub fn abandon_location_listeners(&self) {
        self.inner.state.lock().location_listeners.clear();
    }

    /// Activities started so far.
    pub fn intents(&self) -> Vec<Intent> {
        self.inner.state.lock().intents.clone()
    }

    /// Current clipboard text.
    pub fn clipboard(&self) -> Option<String> {
        self.inner.state.lock().clipboard.clone()
    }

    /// Last torch request.
    pub fn torch(&self) -> Option<(String, bool)> {
        self.inner.state.lock().torch.clone()
    }

    /// Last ring volume index set.
    pub fn ring_volume(&self) -> Option<u32> {
        self.inner.state.lock().ring_volume
    }

    /// Current interruption filter.
    pub fn interruption_filter(&self) -> Option<InterruptionFilter> {
        self.inner.state.lock().interruption_filter
    }
}

impl DeviceOps for SimDevice {
    fn api_level(&self) -> u32 {
        self.inner.state.lock().fixture.api_level
    }

    fn accept_ringing_call(&self) -> Result<()> {
        self.enter("accept_ringing_call")
    }

    fn end_call(&self) -> Result<()> {
        self.enter("end_call")
    }

    fn watch_call_state(&self, tx: RawCallTx) -> Result<Subscription> {
        self.enter("watch_call_state")?;
        let id = self.inner.next_watcher.fetch_add(1, Ordering::SeqCst);
        self.inner.watchers.lock().push((id, tx));
        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.watchers.lock().retain(|(w, _)| *w != id);
                debug!(id, "sim call watcher removed");
            }
        }))
    }

    fn lookup_contact_name(&self, number: &str) -> Result<Option<String>> {
        self.enter("lookup_contact_name")?;
        Ok(self
            .inner
            .state
            .lock()
            .fixture
            .contacts
            .iter()
            .find(|c| c.number == number)
            .map(|c| c.name.clone()))
    }

    fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.enter("list_contacts")?;
        Ok(self.inner.state.lock().fixture.contacts.clone())
    }

    fn installed_apps(&self) -> Result<Vec<AppCandidate>> {
        self.enter("installed_apps")?;
        Ok(self
            .inner
            .state
            .lock()
            .fixture
            .apps
            .iter()
            .map(|a| AppCandidate {
                label: a.label.clone(),
                identifier: a.identifier.clone(),
            })
            .collect())
    }

    fn launch_intent_for(&self, identifier: &str) -> Option<Intent> {
        self.note("launch_intent_for");
        let st = self.inner.state.lock();
        st.fixture
            .apps
            .iter()
            .find(|a| a.identifier == identifier && a.launchable)
            .map(|a| Intent::new(Action::Launch(a.identifier.clone())))
    }

    fn start(&self, intent: &Intent) -> Result<()> {
        self.enter("start")?;
        let mut st = self.inner.state.lock();
        if let Some(uri) = &intent.uri {
            let scheme = uri.split(':').next().unwrap_or_default();
            if st.fixture.unhandled_schemes.iter().any(|s| s == scheme) {
                return Err(Error::ActivityNotFound(uri.clone()));
            }
        }
        st.intents.push(intent.clone());
        Ok(())
    }

    fn set_clipboard(&self, _label: &str, text: &str) -> Result<()> {
        self.enter("set_clipboard")?;
        self.inner.state.lock().clipboard = Some(text.to_string());
        Ok(())
    }

    fn flash_cameras(&self) -> Result<Vec<String>> {
        self.enter("flash_cameras")?;
        Ok(self.inner.state.lock().fixture.flash_cameras.clone())
    }

    fn set_torch(&self, camera_id: &str, enable: bool) -> Result<()> {
        self.enter("set_torch")?;
        self.inner.state.lock().torch = Some((camera_id.to_string(), enable));
        Ok(())
    }

    fn max_ring_volume(&self) -> u32 {
        self.inner.state.lock().fixture.max_ring_volume
    }

    fn set_ring_volume(&self, index: u32) -> Result<()> {
        self.enter("set_ring_volume")?;
        self.inner.state.lock().ring_volume = Some(index);
        Ok(())
    }

    fn notification_policy_access(&self) -> bool {
        self.inner.state.lock().fixture.notification_policy_access
    }

    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<()> {
        self.enter("set_interruption_filter")?;
        self.inner.state.lock().interruption_filter = Some(filter);
        Ok(())
    }

    fn last_known_location(&self) -> Result<Option<LocationFix>> {
        self.enter("last_known_location")?;
        Ok(self.inner.state.lock().fixture.last_known_location)
    }

    fn request_single_update(&self, listener: LocationListener) -> Result<()> {
        self.enter("request_single_update")?;
        self.inner.state.lock().location_listeners.push(listener);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use permissions::PermissionGate;

    #[test]
    fn fixture_parses_from_ron() {
        let text = r#"(
            api_level: 27,
            permissions: { contacts: granted, telephony: denied },
            contacts: [(name: "Ann", number: "555")],
            apps: [(label: "Maps", identifier: "com.maps", launchable: false)],
        )"#;
        let fixture: SimFixture = ron::from_str(text).unwrap();
        assert_eq!(fixture.api_level, 27);
        assert_eq!(fixture.max_ring_volume, 7);
        let (dev, gate) = fixture.build();
        assert!(gate.granted(Capability::Contacts));
        assert_eq!(gate.check(Capability::Telephony), PermissionStatus::Denied);
        assert_eq!(dev.lookup_contact_name("555").unwrap().as_deref(), Some("Ann"));
        assert!(dev.launch_intent_for("com.maps").is_none());
    }

    #[test]
    fn dropping_subscription_removes_watcher() {
        let dev = SimDevice::default();
        let (tx, mut rx) = unbounded_channel();
        let sub = dev.watch_call_state(tx).unwrap();
        assert_eq!(dev.active_call_watchers(), 1);
        assert_eq!(dev.emit_call_state(1, Some("555")), 1);
        assert_eq!(rx.try_recv().unwrap().code, 1);
        drop(sub);
        assert_eq!(dev.active_call_watchers(), 0);
        assert_eq!(dev.emit_call_state(0, None), 0);
    }

    #[test]
    fn injected_failure_is_recorded_and_returned() {
        let dev = SimDevice::default();
        dev.set_fail("set_clipboard", true);
        assert!(dev.set_clipboard("x", "hello").is_err());
        assert!(dev.calls_contains("set_clipboard"));
        assert_eq!(dev.clipboard(), None);
        dev.set_fail("set_clipboard", false);
        dev.set_clipboard("x", "hello").unwrap();
        assert_eq!(dev.clipboard().as_deref(), Some("hello"));
    }

    #[test]
    fn unhandled_scheme_is_activity_not_found() {
        let dev = SimDevice::new(SimFixture {
            unhandled_schemes: vec!["tg".into()],
            ..SimFixture::default()
        });
        let err = dev
            .start(&Intent::with_uri(Action::View, "tg://msg?text=hi"))
            .unwrap_err();
        assert!(matches!(err, Error::ActivityNotFound(_)));
        assert!(dev.intents().is_empty());
    }
}
