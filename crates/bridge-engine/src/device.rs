use bridge_protocol::{BridgeError, Result};
use device_ops::{Action, DeviceOps, Intent, InterruptionFilter};
use permissions::Capability;
use tracing::{debug, info};

use crate::Gate;

/// Label attached to clips the bridge places on the clipboard.
pub const CLIPBOARD_LABEL: &str = "REX Clipboard";

pub(crate) fn go_home(device: &dyn DeviceOps) -> Result<bool> {
    device.start(&Intent::home())?;
    Ok(true)
}

pub(crate) fn set_clipboard(device: &dyn DeviceOps, text: &str) -> Result<bool> {
    device.set_clipboard(CLIPBOARD_LABEL, text)?;
    debug!(len = text.len(), "clipboard set");
    Ok(true)
}

/// Switch the torch on the first camera that has a flash unit.
pub(crate) fn toggle_flash(device: &dyn DeviceOps, gate: &Gate, enable: bool) -> Result<bool> {
    gate.require(Capability::Camera)?;
    let cameras = device.flash_cameras()?;
    let Some(camera) = cameras.first() else {
        return Err(BridgeError::unavailable("No camera with a flash unit"));
    };
    device.set_torch(camera, enable)?;
    info!(camera = %camera, enable, "torch");
    Ok(true)
}

/// Ring stream index for a percentage, after clamping to `0..=100`.
pub fn volume_index(level: i64, max: u32) -> u32 {
    let pct = level.clamp(0, 100) as u64;
    (pct * u64::from(max) / 100) as u32
}

pub(crate) fn set_volume(device: &dyn DeviceOps, level: i64) -> Result<bool> {
    let max = device.max_ring_volume();
    let index = volume_index(level, max);
    device.set_ring_volume(index)?;
    debug!(level, index, max, "ring volume");
    Ok(true)
}

/// Toggle do-not-disturb.
///
/// Below the platform floor this is a successful no-op. Without policy
/// access the settings screen is opened instead and the call still succeeds.
pub(crate) fn set_dnd(device: &dyn DeviceOps, supported: bool, enable: bool) -> Result<bool> {
    if !supported {
        debug!("dnd below platform floor; ignored");
        return Ok(true);
    }
    if !device.notification_policy_access() {
        info!("notification policy access missing; opening settings");
        device.start(&Intent::new(Action::NotificationPolicySettings))?;
        return Ok(true);
    }
    let filter = if enable {
        InterruptionFilter::None
    } else {
        InterruptionFilter::All
    };
    device.set_interruption_filter(filter)?;
    info!(?filter, "interruption filter");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_scales_and_clamps() {
        assert_eq!(volume_index(50, 7), 3);
        assert_eq!(volume_index(100, 7), 7);
        assert_eq!(volume_index(0, 7), 0);
        assert_eq!(volume_index(250, 15), 15);
        assert_eq!(volume_index(-4, 15), 0);
    }
}
