//! Capability checks for the bridge.
//!
//! This crate exposes a minimal, stable API to query whether the process has
//! been granted one of the privileged capability domains the bridge touches.
//! There is no prompting logic here: the host is responsible for guiding the
//! user to the platform settings if a capability is missing.
//!
//! Notes
//! - [`PermissionGate::check`] is a live read. Implementations must not cache,
//!   since the user can grant or revoke at any time.
//! - [`PermissionGate::snapshot`] returns every capability at once as a simple
//!   status struct.
//! - [`StaticPermissions`] is an in-memory gate backed by a mutable table. It
//!   is what the simulated device and the tests use.
//!
//! All calls are fast and side-effect free.

use std::{collections::HashMap, fmt};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Privileged permission domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Call control and phone-state observation.
    Telephony,
    /// Reading the contact directory.
    Contacts,
    /// Fine location.
    Location,
    /// Camera hardware, including the torch.
    Camera,
}

impl Capability {
    /// Every capability, in a stable order.
    pub const ALL: [Self; 4] = [
        Self::Telephony,
        Self::Contacts,
        Self::Location,
        Self::Camera,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telephony => "telephony",
            Self::Contacts => "contacts",
            Self::Location => "location",
            Self::Camera => "camera",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state grant status for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// The user granted the capability.
    Granted,
    /// The user explicitly refused.
    Denied,
    /// The capability was never requested.
    #[default]
    NotRequested,
}

impl PermissionStatus {
    /// `true` only for [`PermissionStatus::Granted`].
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Current permission status for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsStatus {
    /// Telephony capability status.
    pub telephony: PermissionStatus,
    /// Contacts capability status.
    pub contacts: PermissionStatus,
    /// Location capability status.
    pub location: PermissionStatus,
    /// Camera capability status.
    pub camera: PermissionStatus,
}

/// Read-only query against the platform's live permission state.
pub trait PermissionGate: Send + Sync {
    /// Status of a single capability, read fresh on every call.
    fn check(&self, capability: Capability) -> PermissionStatus;

    /// Convenience: `true` when `capability` is granted.
    fn granted(&self, capability: Capability) -> bool {
        self.check(capability).is_granted()
    }

    /// Query all capabilities at once.
    ///
    /// This is a convenience wrapper over [`PermissionGate::check`]; it
    /// performs no prompting and has no side effects.
    fn snapshot(&self) -> PermissionsStatus {
        PermissionsStatus {
            telephony: self.check(Capability::Telephony),
            contacts: self.check(Capability::Contacts),
            location: self.check(Capability::Location),
            camera: self.check(Capability::Camera),
        }
    }
}

/// In-memory permission table. Unset capabilities read as `NotRequested`.
#[derive(Debug, Default)]
pub struct StaticPermissions {
    table: RwLock<HashMap<Capability, PermissionStatus>>,
}

impl StaticPermissions {
    /// Empty table: everything `NotRequested`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every capability granted.
    pub fn all_granted() -> Self {
        let gate = Self::new();
        for cap in Capability::ALL {
            gate.set(cap, PermissionStatus::Granted);
        }
        gate
    }

    /// Build from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (Capability, PermissionStatus)>) -> Self {
        Self {
            table: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Simulate the user changing a capability.
    pub fn set(&self, capability: Capability, status: PermissionStatus) {
        self.table.write().insert(capability, status);
    }
}

impl PermissionGate for StaticPermissions {
    fn check(&self, capability: Capability) -> PermissionStatus {
        self.table
            .read()
            .get(&capability)
            .copied()
            .unwrap_or_default()
    }
}
