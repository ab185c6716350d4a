//! Parse and load bridge configuration.

use std::{fs, path::Path};

use ron::error::SpannedError;
use tracing::{debug, info};

use crate::{BridgeConfig, Error, MESSAGE_PLATFORMS, excerpt_at, resolve_config_path};

/// Parse and validate a configuration from RON text.
pub fn load_from_str(source: &str) -> Result<BridgeConfig, Error> {
    let cfg: BridgeConfig = ron::from_str(source).map_err(|e| parse_error(source, &e))?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Load a configuration file from disk.
pub fn load_from_path(path: &Path) -> Result<BridgeConfig, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let cfg = load_from_str(&source).map_err(|e| e.with_path(path))?;
    info!(path = %path.display(), "config_loaded");
    Ok(cfg)
}

/// Resolve the config path (see [`resolve_config_path`]) and load it, or
/// fall back to defaults when no file applies.
pub fn load(explicit: Option<&Path>) -> Result<BridgeConfig, Error> {
    match resolve_config_path(explicit) {
        Some(path) => load_from_path(&path),
        None => {
            debug!("no config file found; using defaults");
            Ok(BridgeConfig::default())
        }
    }
}

fn parse_error(source: &str, err: &SpannedError) -> Error {
    let line = err.span.start.line;
    let col = err.span.start.col;
    Error::Parse {
        path: None,
        line,
        col,
        message: err.code.to_string(),
        excerpt: excerpt_at(source, line, col),
    }
}

fn validate(cfg: &BridgeConfig) -> Result<(), Error> {
    if cfg.default_volume > 100 {
        return Err(Error::Validation {
            path: None,
            field: "default_volume",
            message: format!("must be within 0..=100, got {}", cfg.default_volume),
        });
    }
    if !MESSAGE_PLATFORMS.contains(&cfg.default_message_platform.as_str()) {
        return Err(Error::Validation {
            path: None,
            field: "default_message_platform",
            message: format!(
                "unknown platform '{}' (expected one of {})",
                cfg.default_message_platform,
                MESSAGE_PLATFORMS.join(", ")
            ),
        });
    }
    Ok(())
}
