//! Contact Resolver.
//!
//! Read paths here degrade instead of failing: a missing contacts grant, a
//! directory error, or even a panicking directory implementation yields an
//! empty list or the raw number, never an error.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use bridge_protocol::Contact;
use device_ops::DeviceOps;
use permissions::{Capability, PermissionGate};
use tracing::{debug, warn};

/// Maximum number of entries returned by [`ContactResolver::search`].
pub const SEARCH_LIMIT: usize = 10;

/// Placeholder used when the platform did not disclose a number.
pub const UNKNOWN_NUMBER: &str = "Unknown";

/// Looks up display names and lists contacts.
#[derive(Clone)]
pub struct ContactResolver {
    device: Arc<dyn DeviceOps>,
    permissions: Arc<dyn PermissionGate>,
}

impl ContactResolver {
    /// Build a resolver over a device and its permission gate.
    pub fn new(device: Arc<dyn DeviceOps>, permissions: Arc<dyn PermissionGate>) -> Self {
        Self {
            device,
            permissions,
        }
    }

    fn readable(&self) -> bool {
        self.permissions.granted(Capability::Contacts)
    }

    /// Display name for `number`.
    ///
    /// Fallback chain: directory match, then the raw number, then
    /// `"Unknown"` when the number itself is absent or empty.
    pub fn by_number(&self, number: Option<&str>) -> String {
        let Some(number) = number.filter(|n| !n.is_empty()) else {
            return UNKNOWN_NUMBER.to_string();
        };
        if !self.readable() {
            return number.to_string();
        }
        let lookup = catch_unwind(AssertUnwindSafe(|| self.device.lookup_contact_name(number)));
        match lookup {
            Ok(Ok(Some(name))) => name,
            Ok(Ok(None)) => number.to_string(),
            Ok(Err(e)) => {
                warn!(error = %e, "contact lookup failed; using raw number");
                number.to_string()
            }
            Err(_) => {
                warn!("contact lookup panicked; using raw number");
                number.to_string()
            }
        }
    }

    /// Contacts whose display name contains `query` (case-insensitive), at
    /// most [`SEARCH_LIMIT`] of them, in directory order.
    pub fn search(&self, query: &str) -> Vec<Contact> {
        let needle = query.to_lowercase();
        let found: Vec<Contact> = self
            .all()
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .take(SEARCH_LIMIT)
            .collect();
        debug!(matches = found.len(), "contact_search");
        found
    }

    /// Every contact, unbounded.
    pub fn all(&self) -> Vec<Contact> {
        if !self.readable() {
            return Vec::new();
        }
        match self.device.list_contacts() {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "listing contacts failed");
                Vec::new()
            }
        }
    }
}
