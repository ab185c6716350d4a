//! Bridge Engine
//!
//! The engine turns named UI commands into device effects:
//! - routes each command to its handler and validates arguments
//! - consults the permission gate before privileged operations
//! - resolves free-text app names and contact names
//! - observes telephony state and pushes call events to the UI
//!
//! The public surface is small:
//! - [`Bridge`]: construct once, then call [`Bridge::dispatch`] per request
//! - [`CallStateMachine`], [`ContactResolver`], [`apps::resolve`]: the
//!   building blocks, exposed for direct use and testing
//!
//! Handler modules are crate-private.
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use bridge_protocol::{
    Args, BridgeError, Command, ErrorKind, Result as CommandResult, ipc::EventTx, rpc::Method,
};
use config::BridgeConfig;
use device_ops::DeviceOps;
use futures::FutureExt;
use permissions::{Capability, PermissionGate};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info, info_span, warn};

pub mod apps;
mod call_state;
mod contacts;
mod device;
mod error;
mod events;
mod features;
mod location;
mod messaging;
mod telephony;

pub use call_state::CallStateMachine;
pub use contacts::{ContactResolver, SEARCH_LIMIT, UNKNOWN_NUMBER};
pub use device::{CLIPBOARD_LABEL, volume_index};
pub use error::{Error, Result};
pub use events::EventSink;
pub use features::Features;
pub use messaging::MessagePlatform;

/// Permission checks with the configured strictness.
#[derive(Clone)]
pub(crate) struct Gate {
    permissions: Arc<dyn PermissionGate>,
    strict: bool,
}

impl Gate {
    /// Live read of `capability`.
    pub(crate) fn permits(&self, capability: Capability) -> bool {
        self.permissions.granted(capability)
    }

    /// Fail with `PERMISSION_DENIED` unless `capability` is granted.
    pub(crate) fn require(&self, capability: Capability) -> CommandResult<()> {
        if self.permits(capability) {
            return Ok(());
        }
        info!(%capability, status = ?self.permissions.check(capability), "permission denied");
        Err(BridgeError::permission_denied(capability))
    }

    /// Like [`Gate::require`], but a denial is `Ok(false)` unless the gate
    /// is strict.
    pub(crate) fn soft_require(&self, capability: Capability) -> CommandResult<bool> {
        if self.permits(capability) {
            return Ok(true);
        }
        if self.strict {
            return self.require(capability).map(|()| false);
        }
        debug!(%capability, "capability missing; silent no-op");
        Ok(false)
    }
}

struct Inner {
    device: Arc<dyn DeviceOps>,
    gate: Gate,
    config: BridgeConfig,
    features: Features,
    contacts: ContactResolver,
    calls: CallStateMachine,
}

/// Command dispatcher and owner of the call-state subscription.
///
/// Cheap to clone; clones share the same subscription. Dropping the last
/// clone tears the subscription down.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    /// Create a bridge over `device`.
    ///
    /// Platform features are resolved here, once, from the device API level.
    pub fn new(
        device: Arc<dyn DeviceOps>,
        permissions: Arc<dyn PermissionGate>,
        config: BridgeConfig,
        event_tx: EventTx,
    ) -> Self {
        let features = Features::resolve(device.api_level(), &config);
        info!(
            api_level = features.api_level,
            answer_call = features.answer_call,
            direct_end_call = features.direct_end_call,
            dnd_policy = features.dnd_policy,
            strict = config.strict_permissions,
            "bridge features"
        );
        let contacts = ContactResolver::new(device.clone(), permissions.clone());
        let calls = CallStateMachine::new(device.clone(), contacts.clone(), EventSink::new(event_tx));
        let gate = Gate {
            permissions,
            strict: config.strict_permissions,
        };
        Self {
            inner: Arc::new(Inner {
                device,
                gate,
                config,
                features,
                contacts,
                calls,
            }),
        }
    }

    /// Platform features resolved at construction.
    pub fn features(&self) -> Features {
        self.inner.features
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// The call-state machine.
    pub fn call_state(&self) -> &CallStateMachine {
        &self.inner.calls
    }

    /// The contact resolver.
    pub fn contacts(&self) -> &ContactResolver {
        &self.inner.contacts
    }

    /// Execute a [`Command`].
    pub async fn dispatch_command(&self, command: &Command) -> CommandResult<Value> {
        self.dispatch(&command.method, &command.args).await
    }

    /// Execute one named command.
    ///
    /// Produces exactly one value or one error. Unknown names are
    /// `UNSUPPORTED`; a panic raised below the dispatcher becomes `INTERNAL`.
    pub async fn dispatch(&self, method: &str, args: &Args) -> CommandResult<Value> {
        let Some(m) = Method::try_from_str(method) else {
            warn!(method, "unsupported method");
            return Err(BridgeError::unsupported(format!("Unknown method '{method}'")));
        };
        let span = info_span!("dispatch", method = m.as_str());
        let outcome = AssertUnwindSafe(self.handle(m, args))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|panic| {
                Err(BridgeError::internal(format!(
                    "{} panicked: {}",
                    m.as_str(),
                    panic_message(panic.as_ref())
                )))
            });
        match &outcome {
            Ok(_) => debug!(method = m.as_str(), "ok"),
            Err(e) => warn!(method = m.as_str(), code = %e.kind, message = %e.message, "command failed"),
        }
        outcome
    }

    async fn handle(&self, method: Method, args: &Args) -> CommandResult<Value> {
        let inner = &*self.inner;
        let dev = inner.device.as_ref();
        let gate = &inner.gate;
        let features = &inner.features;
        let value = match method {
            Method::AnswerCall => json!(telephony::answer_call(dev, gate, features.answer_call)?),
            Method::EndCall => json!(telephony::end_call(dev, gate, features.direct_end_call)?),
            Method::DialNumber => json!(telephony::dial_number(dev, gate, args.str("number")?)?),
            Method::OpenApp => {
                apps::open_app(dev, args.str("appName")?, inner.config.not_found_sample)?;
                json!(true)
            }
            Method::GoHome => json!(device::go_home(dev)?),
            Method::SearchContacts => {
                let query = args.opt_str("query")?.unwrap_or_default();
                json!(inner.contacts.search(query))
            }
            Method::GetContacts => json!(inner.contacts.all()),
            Method::SendWhatsApp => json!(self.send(args, Some(MessagePlatform::WhatsApp))?),
            Method::SendMessage => json!(self.send(args, None)?),
            Method::SetClipboard => json!(device::set_clipboard(dev, args.str("text")?)?),
            Method::ToggleFlash => {
                let enable = args.opt_bool("enable")?.unwrap_or(false);
                json!(device::toggle_flash(dev, gate, enable)?)
            }
            Method::SetVolume => {
                let level = args
                    .opt_i64("level")?
                    .unwrap_or_else(|| i64::from(inner.config.default_volume));
                json!(device::set_volume(dev, level)?)
            }
            Method::SetDnd => {
                let enable = args.opt_bool("enable")?.unwrap_or(false);
                json!(device::set_dnd(dev, features.dnd_policy, enable)?)
            }
            Method::StartListener => json!(self.start_listener()?),
            Method::GetLocation => {
                let pending = location::begin(dev, gate)?;
                json!(location::finish(pending).await?)
            }
        };
        Ok(value)
    }

    fn send(&self, args: &Args, platform: Option<MessagePlatform>) -> CommandResult<bool> {
        let number = args.str("number")?;
        let message = args.str("message")?;
        if number.trim().is_empty() || message.is_empty() {
            return Err(BridgeError::invalid_argument("Number and message required"));
        }
        let platform = match platform {
            Some(p) => p,
            None => args
                .opt_str("platform")?
                .unwrap_or(self.inner.config.default_message_platform.as_str())
                .parse()?,
        };
        let intent = platform.intent(number, message)?;
        self.inner.device.start(&intent).map_err(|e| {
            BridgeError::new(
                ErrorKind::Internal,
                format!("{platform} not installed or failed: {e}"),
            )
        })?;
        info!(%platform, number, "message composer opened");
        Ok(true)
    }

    fn start_listener(&self) -> CommandResult<bool> {
        if !self.inner.gate.soft_require(Capability::Telephony)? {
            return Ok(true);
        }
        self.inner.calls.start()?;
        Ok(true)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
