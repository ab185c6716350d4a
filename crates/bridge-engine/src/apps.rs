//! Application Resolver and the `openApp` command.

use bridge_protocol::{BridgeError, Result};
use device_ops::{AppCandidate, DeviceOps};
use tracing::{debug, info};

/// Pick the installed app best matching `query`.
///
/// One pass over `candidates`, comparing case-insensitively. An exact label
/// match ends the scan immediately. Otherwise the first prefix match wins,
/// then the first substring match. Later prefix or substring matches never
/// replace an earlier one.
pub fn resolve<'a>(candidates: &'a [AppCandidate], query: &str) -> Option<&'a AppCandidate> {
    let needle = query.to_lowercase();
    let mut prefix: Option<&AppCandidate> = None;
    let mut substring: Option<&AppCandidate> = None;

    for app in candidates {
        let label = app.label.to_lowercase();
        if label == needle {
            return Some(app);
        }
        if prefix.is_none() && label.starts_with(&needle) {
            prefix = Some(app);
        }
        if substring.is_none() && label.contains(&needle) {
            substring = Some(app);
        }
    }
    prefix.or(substring)
}

/// Resolve `name` against the freshly enumerated app list and launch it.
///
/// `sample` bounds how many labels are reported when nothing matches.
pub(crate) fn open_app(device: &dyn DeviceOps, name: &str, sample: usize) -> Result<()> {
    let query = name.trim();
    if query.is_empty() {
        return Err(BridgeError::invalid_argument("App name cannot be empty"));
    }

    let candidates = device.installed_apps()?;
    let Some(app) = resolve(&candidates, query) else {
        let labels: Vec<&str> = candidates
            .iter()
            .take(sample)
            .map(|a| a.label.as_str())
            .collect();
        info!(query, installed = ?labels, "app not found");
        return Err(BridgeError::not_found(format!(
            "App '{query}' not found (installed: {})",
            labels.join(", ")
        )));
    };
    debug!(query, identifier = %app.identifier, "app resolved");

    let intent = device.launch_intent_for(&app.identifier).ok_or_else(|| {
        BridgeError::internal(format!(
            "Cannot launch {} (no launch entry point)",
            app.identifier
        ))
    })?;
    device.start(&intent)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bridge_protocol::ErrorKind;
    use device_ops::{
        Action,
        sim::{SimApp, SimDevice, SimFixture},
    };

    use super::*;

    fn apps(labels: &[&str]) -> Vec<AppCandidate> {
        labels
            .iter()
            .map(|l| AppCandidate {
                label: (*l).to_string(),
                identifier: format!("pkg.{}", l.to_lowercase().replace(' ', "_")),
            })
            .collect()
    }

    fn label_of<'a>(c: &'a [AppCandidate], q: &str) -> Option<&'a str> {
        resolve(c, q).map(|a| a.label.as_str())
    }

    #[test]
    fn exact_beats_earlier_prefix_and_substring() {
        let c = apps(&["RexApp", "Rexford Notes", "REX"]);
        assert_eq!(label_of(&c, "rex"), Some("REX"));
        let c = apps(&["REX", "RexApp", "Rexford Notes"]);
        assert_eq!(label_of(&c, "rex"), Some("REX"));
    }

    #[test]
    fn first_prefix_is_kept() {
        let c = apps(&["RexApp", "Rexford Notes"]);
        assert_eq!(label_of(&c, "rex"), Some("RexApp"));
    }

    #[test]
    fn prefix_beats_earlier_substring() {
        let c = apps(&["T-Rex Runner", "Rexford Notes"]);
        assert_eq!(label_of(&c, "rex"), Some("Rexford Notes"));
    }

    #[test]
    fn substring_tier() {
        let c = apps(&["Foo", "Bar Rex Baz", "Qux Rex"]);
        assert_eq!(label_of(&c, "rex"), Some("Bar Rex Baz"));
    }

    #[test]
    fn no_match() {
        let c = apps(&["Foo", "Bar"]);
        assert_eq!(label_of(&c, "zzz"), None);
        assert_eq!(label_of(&[], "rex"), None);
    }

    fn device(list: &[(&str, &str, bool)]) -> SimDevice {
        SimDevice::new(SimFixture {
            apps: list
                .iter()
                .map(|(label, id, launchable)| SimApp {
                    label: (*label).into(),
                    identifier: (*id).into(),
                    launchable: *launchable,
                })
                .collect(),
            ..SimFixture::default()
        })
    }

    #[test]
    fn open_app_launches_resolved_package() {
        let dev = device(&[("Maps", "com.maps", true), ("Music", "com.music", true)]);
        open_app(&dev, "mus", 10).unwrap();
        assert_eq!(dev.intents()[0].action, Action::Launch("com.music".into()));
    }

    #[test]
    fn open_app_distinguishes_not_found_from_unlaunchable() {
        let dev = device(&[("Maps", "com.maps", false)]);
        let err = open_app(&dev, "maps", 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);

        let err = open_app(&dev, "zzz", 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("Maps"));
        assert!(dev.intents().is_empty());
    }

    #[test]
    fn not_found_sample_is_bounded() {
        let many: Vec<(String, String)> = (0..30)
            .map(|i| (format!("App{i}"), format!("pkg{i}")))
            .collect();
        let list: Vec<(&str, &str, bool)> = many
            .iter()
            .map(|(l, i)| (l.as_str(), i.as_str(), true))
            .collect();
        let dev = device(&list);
        let err = open_app(&dev, "zzz", 3).unwrap_err();
        assert!(err.message.contains("App2"));
        assert!(!err.message.contains("App3,"));
        assert!(!err.message.contains("App29"));
    }

    #[test]
    fn blank_name_is_invalid() {
        let dev = device(&[("Maps", "com.maps", true)]);
        let err = open_app(&dev, "  ", 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(!dev.calls_contains("installed_apps"));
    }
}
