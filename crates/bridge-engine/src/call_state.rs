//! Call State Machine.
//!
//! Holds at most one live telephony registration. A single pump task drains
//! the platform channel in order, maps raw codes to [`CallState`], resolves
//! the caller name and publishes one [`CallEvent`] per notification.
//!
//! Restarting swaps the registration but keeps the channel and the pump, so
//! notifications queued before the swap are still delivered, ahead of any
//! that arrive after it.

use std::sync::Arc;

use bridge_protocol::{CallEvent, CallState};
use device_ops::{DeviceOps, RawCallState, Subscription};
use parking_lot::Mutex;
use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    Error, Result,
    contacts::{ContactResolver, UNKNOWN_NUMBER},
    events::EventSink,
};

/// A live registration plus the task draining it.
struct ActiveSubscription {
    /// Platform registration; dropped first so no new notifications arrive.
    registration: Option<Subscription>,
    /// Sender handed to each registration; keeps the pump's channel open.
    tx: UnboundedSender<RawCallState>,
    token: CancellationToken,
    pump: JoinHandle<()>,
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        drop(self.registration.take());
        self.token.cancel();
        self.pump.abort();
    }
}

/// Observes telephony state and publishes call events.
pub struct CallStateMachine {
    device: Arc<dyn DeviceOps>,
    contacts: ContactResolver,
    events: EventSink,
    active: Mutex<Option<ActiveSubscription>>,
}

impl CallStateMachine {
    /// Machine publishing onto `events`.
    pub fn new(device: Arc<dyn DeviceOps>, contacts: ContactResolver, events: EventSink) -> Self {
        Self {
            device,
            contacts,
            events,
            active: Mutex::new(None),
        }
    }

    /// Start listening, replacing any previous registration.
    ///
    /// On a restart the new watcher is registered before the old one is
    /// released; if registration fails the previous one stays live.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let handle = Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?;

        let mut active = self.active.lock();
        if let Some(live) = active.as_mut() {
            let registration = match self.device.watch_call_state(live.tx.clone()) {
                Ok(r) => r,
                Err(e) => {
                    warn!("call listener restart failed, keeping previous: {}", e);
                    return Err(e.into());
                }
            };
            drop(live.registration.replace(registration));
            debug!("call listener replaced");
            return Ok(());
        }

        let (tx, rx) = unbounded_channel();
        let registration = self.device.watch_call_state(tx.clone())?;
        let token = CancellationToken::new();
        let pump = handle.spawn(pump(
            rx,
            token.clone(),
            self.contacts.clone(),
            self.events.clone(),
        ));
        *active = Some(ActiveSubscription {
            registration: Some(registration),
            tx,
            token,
            pump,
        });
        debug!("call listener started");
        Ok(())
    }

    /// Tear down the active subscription, if any.
    pub fn stop(&self) {
        if self.active.lock().take().is_some() {
            debug!("call listener stopped");
        }
    }

    /// Whether a subscription is live.
    pub fn is_listening(&self) -> bool {
        self.active.lock().is_some()
    }
}

/// Build the event for one raw notification.
pub(crate) fn to_event(raw: &RawCallState, contacts: &ContactResolver) -> CallEvent {
    let state = CallState::from_raw(raw.code);
    let number = raw.number.as_deref().filter(|n| !n.is_empty());
    let name = if state.carries_identity() {
        contacts.by_number(number)
    } else {
        String::new()
    };
    CallEvent {
        state,
        number: number.unwrap_or(UNKNOWN_NUMBER).to_string(),
        name,
    }
}

async fn pump(
    mut rx: UnboundedReceiver<RawCallState>,
    token: CancellationToken,
    contacts: ContactResolver,
    events: EventSink,
) {
    let mut last: Option<CallState> = None;
    loop {
        let raw = tokio::select! {
            _ = token.cancelled() => break,
            raw = rx.recv() => match raw {
                Some(raw) => raw,
                None => break,
            },
        };
        let event = to_event(&raw, &contacts);
        match last {
            None => debug!(state = ?event.state, "initial call state"),
            Some(prev) if !prev.can_transition_to(event.state) => {
                warn!(from = ?prev, to = ?event.state, "unexpected call state transition");
            }
            Some(_) => {}
        }
        last = Some(event.state);
        if events.call_state_changed(event).is_err() {
            debug!("event stream closed; call pump exiting");
            break;
        }
    }
    trace!("call pump finished");
}

#[cfg(test)]
mod tests {
    use bridge_protocol::{BridgeEvent, Contact, ipc::event_channel};
    use device_ops::sim::{SimDevice, SimFixture};
    use permissions::{Capability, PermissionStatus, StaticPermissions};

    use super::*;

    fn machine(contacts_granted: bool) -> (CallStateMachine, SimDevice, bridge_protocol::ipc::EventRx) {
        let dev = SimDevice::new(SimFixture {
            contacts: vec![Contact {
                name: "Ann".into(),
                number: "555".into(),
            }],
            ..SimFixture::default()
        });
        let gate = StaticPermissions::new();
        if contacts_granted {
            gate.set(Capability::Contacts, PermissionStatus::Granted);
        }
        let device: Arc<dyn DeviceOps> = Arc::new(dev.clone());
        let contacts = ContactResolver::new(device.clone(), Arc::new(gate));
        let (tx, rx) = event_channel();
        (
            CallStateMachine::new(device, contacts, EventSink::new(tx)),
            dev,
            rx,
        )
    }

    fn call_event(ev: BridgeEvent) -> CallEvent {
        match ev {
            BridgeEvent::CallStateChanged(e) => e,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn resolves_names_for_identity_states_only() {
        let (m, dev, mut rx) = machine(true);
        m.start().unwrap();
        dev.emit_call_state(CallState::RAW_RINGING, Some("555"));
        dev.emit_call_state(CallState::RAW_IDLE, Some("555"));

        let e = call_event(rx.recv().await.unwrap());
        assert_eq!((e.state, e.number.as_str(), e.name.as_str()), (CallState::Ringing, "555", "Ann"));
        let e = call_event(rx.recv().await.unwrap());
        assert_eq!((e.state, e.name.as_str()), (CallState::Idle, ""));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_number_reads_unknown() {
        let (m, dev, mut rx) = machine(true);
        m.start().unwrap();
        dev.emit_call_state(CallState::RAW_RINGING, None);
        dev.emit_call_state(42, Some(""));
        let e = call_event(rx.recv().await.unwrap());
        assert_eq!((e.number.as_str(), e.name.as_str()), ("Unknown", "Unknown"));
        let e = call_event(rx.recv().await.unwrap());
        assert_eq!((e.state, e.number.as_str()), (CallState::Idle, "Unknown"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn restart_keeps_a_single_registration() {
        let (m, dev, _rx) = machine(false);
        m.start().unwrap();
        m.start().unwrap();
        m.start().unwrap();
        assert_eq!(dev.active_call_watchers(), 1);
        assert_eq!(dev.call_count("watch_call_state"), 3);
        m.stop();
        assert!(!m.is_listening());
        assert_eq!(dev.active_call_watchers(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_registration_leaves_machine_idle() {
        let (m, dev, _rx) = machine(false);
        dev.set_fail("watch_call_state", true);
        assert!(m.start().is_err());
        assert!(!m.is_listening());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_restart_keeps_previous_registration() {
        let (m, dev, mut rx) = machine(false);
        m.start().unwrap();
        dev.set_fail("watch_call_state", true);
        assert!(m.start().is_err());
        assert!(m.is_listening());
        assert_eq!(dev.active_call_watchers(), 1);

        dev.emit_call_state(CallState::RAW_RINGING, Some("555"));
        let e = call_event(rx.recv().await.unwrap());
        assert_eq!((e.state, e.number.as_str()), (CallState::Ringing, "555"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn restart_delivers_queued_notifications_in_order() {
        let (m, dev, mut rx) = machine(false);
        m.start().unwrap();
        dev.emit_call_state(CallState::RAW_RINGING, Some("555"));
        m.start().unwrap();
        dev.emit_call_state(CallState::RAW_OFFHOOK, Some("555"));

        assert_eq!(call_event(rx.recv().await.unwrap()).state, CallState::Ringing);
        assert_eq!(call_event(rx.recv().await.unwrap()).state, CallState::Offhook);
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let (m, dev, _rx) = machine(false);
        assert!(m.start().is_err());
        assert!(!dev.calls_contains("watch_call_state"));
    }
}
