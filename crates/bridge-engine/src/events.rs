use bridge_protocol::{BridgeEvent, CallEvent, ipc::EventTx};
use tracing::debug;

use crate::{Error, Result};

/// Pushes unsolicited events onto the outbound stream.
#[derive(Clone)]
pub struct EventSink {
    tx: EventTx,
}

impl EventSink {
    /// Wrap the outbound channel.
    pub fn new(tx: EventTx) -> Self {
        Self { tx }
    }

    /// Publish a call-state transition.
    pub fn call_state_changed(&self, event: CallEvent) -> Result<()> {
        debug!(state = ?event.state, "call_state_changed");
        self.tx
            .send(BridgeEvent::CallStateChanged(event))
            .map_err(|_| Error::ChannelClosed)
    }

    /// Clone of the raw sender (for log forwarding).
    pub fn sender(&self) -> EventTx {
        self.tx.clone()
    }
}
