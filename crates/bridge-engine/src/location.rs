use bridge_protocol::{BridgeError, LocationFix, Result};
use device_ops::{DeviceOps, LocationListener};
use permissions::Capability;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::Gate;

/// The cached fix, or a freshly registered one-shot listener to await.
pub(crate) enum Pending {
    Ready(LocationFix),
    Waiting(oneshot::Receiver<LocationFix>),
}

/// Synchronous half of `getLocation`: never suspends.
pub(crate) fn begin(device: &dyn DeviceOps, gate: &Gate) -> Result<Pending> {
    if !gate.permits(Capability::Location) {
        return Err(unavailable());
    }
    match device.last_known_location() {
        Ok(Some(fix)) => return Ok(Pending::Ready(fix)),
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "last known location failed");
            return Err(unavailable());
        }
    }
    let (listener, rx) = LocationListener::new();
    device.request_single_update(listener).map_err(|e| {
        warn!(error = %e, "location request failed");
        unavailable()
    })?;
    debug!("waiting for a location fix");
    Ok(Pending::Waiting(rx))
}

/// Resolve a pending location.
pub(crate) async fn finish(pending: Pending) -> Result<LocationFix> {
    match pending {
        Pending::Ready(fix) => Ok(fix),
        Pending::Waiting(rx) => rx.await.map_err(|_| {
            debug!("location listener dropped without a fix");
            unavailable()
        }),
    }
}

fn unavailable() -> BridgeError {
    BridgeError::unavailable("Location not available")
}
