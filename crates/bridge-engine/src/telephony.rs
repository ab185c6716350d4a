use bridge_protocol::{BridgeError, Result};
use device_ops::{DeviceOps, Intent};
use permissions::Capability;
use tracing::{debug, info};

use crate::Gate;

/// Accept the ringing call.
///
/// Without telephony, or below the platform floor, this succeeds without
/// touching the device unless the gate is strict.
pub(crate) fn answer_call(device: &dyn DeviceOps, gate: &Gate, supported: bool) -> Result<bool> {
    if !gate.soft_require(Capability::Telephony)? {
        return Ok(true);
    }
    if !supported {
        debug!("answer_call below platform floor; ignored");
        return Ok(true);
    }
    device.accept_ringing_call()?;
    info!("call answered");
    Ok(true)
}

/// End the active call.
pub(crate) fn end_call(device: &dyn DeviceOps, gate: &Gate, supported: bool) -> Result<bool> {
    gate.require(Capability::Telephony)?;
    if !supported {
        return Err(BridgeError::unsupported(
            "Auto-end not supported on this platform version",
        ));
    }
    device.end_call()?;
    info!("call ended");
    Ok(true)
}

/// Place a call directly.
pub(crate) fn dial_number(device: &dyn DeviceOps, gate: &Gate, number: &str) -> Result<bool> {
    if number.trim().is_empty() {
        return Err(BridgeError::invalid_argument("'number' cannot be empty"));
    }
    gate.require(Capability::Telephony)?;
    device.start(&Intent::call(number))?;
    info!(number, "dialing");
    Ok(true)
}
