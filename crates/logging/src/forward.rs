//! Relay of tracing records to a connected client.
//!
//! While a session runs, the server installs the bridge's event sender with
//! [`set_sink`]; every record at or above the layer's threshold then goes out
//! as a `log` event. [`clear_sink`] detaches it. Without a sink the layer does
//! nothing beyond a level check and a lock.

use bridge_protocol::{BridgeEvent, ipc::EventTx};
use parking_lot::{Mutex, const_mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::fmt::render_event;

static SINK: Mutex<Option<EventTx>> = const_mutex(None);

/// Route subsequent records to `tx`.
pub fn set_sink(tx: EventTx) {
    SINK.lock().replace(tx);
}

/// Stop routing records.
pub fn clear_sink() {
    SINK.lock().take();
}

/// Layer that turns records into [`BridgeEvent::Log`].
pub struct ForwardLayer {
    threshold: Level,
}

impl ForwardLayer {
    /// Forward records at `threshold` or more severe.
    pub fn new(threshold: Level) -> Self {
        Self { threshold }
    }
}

impl<S: Subscriber> Layer<S> for ForwardLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() > self.threshold {
            return;
        }
        let mut slot = SINK.lock();
        let Some(tx) = slot.as_ref() else { return };
        let log = render_event(event);
        let sent = tx.send(BridgeEvent::Log {
            level: log.level,
            target: log.target,
            message: log.message,
        });
        if sent.is_err() {
            // Receiver gone.
            *slot = None;
        }
    }
}

/// [`ForwardLayer`] at `INFO`.
pub fn layer() -> ForwardLayer {
    ForwardLayer::new(Level::INFO)
}
