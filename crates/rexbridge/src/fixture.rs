//! Load simulated-device fixtures from RON files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use device_ops::sim::SimFixture;
use thiserror::Error;
use tracing::info;

/// Failure to read or parse a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The file could not be read.
    #[error("cannot read fixture {}: {message}", path.display())]
    Read {
        /// Fixture path.
        path: PathBuf,
        /// I/O error text.
        message: String,
    },
    /// The file is not a valid fixture.
    #[error("invalid fixture {}:{line}:{col}: {message}\n{excerpt}", path.display())]
    Parse {
        /// Fixture path.
        path: PathBuf,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        col: usize,
        /// Parser message.
        message: String,
        /// Source excerpt with a caret.
        excerpt: String,
    },
}

/// Parse fixture text; `path` is only used for error reporting.
pub fn parse(source: &str, path: &Path) -> Result<SimFixture, FixtureError> {
    ron::from_str(source).map_err(|e| {
        let (line, col) = (e.span.start.line, e.span.start.col);
        FixtureError::Parse {
            path: path.to_path_buf(),
            line,
            col,
            message: e.code.to_string(),
            excerpt: config::excerpt_at(source, line, col),
        }
    })
}

/// Fixture at `path`, or the default device when no path is given.
pub fn load(path: Option<&Path>) -> Result<SimFixture, FixtureError> {
    let Some(path) = path else {
        return Ok(SimFixture::default());
    };
    let source = fs::read_to_string(path).map_err(|e| FixtureError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let fixture = parse(&source, path)?;
    info!(
        path = %path.display(),
        apps = fixture.apps.len(),
        contacts = fixture.contacts.len(),
        "fixture loaded"
    );
    Ok(fixture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_means_default_device() {
        assert_eq!(load(None).unwrap(), SimFixture::default());
    }

    #[test]
    fn parse_error_points_at_the_field() {
        let src = "(\n    api_level: 30,\n    bogus: 1,\n)";
        let err = parse(src, Path::new("dev.ron")).unwrap_err();
        match err {
            FixtureError::Parse {
                message, excerpt, ..
            } => {
                assert!(message.contains("bogus"));
                assert!(excerpt.contains("bogus"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn shipped_demos_parse() {
        let fixture = parse(include_str!("../../../demos/device.ron"), Path::new("device.ron")).unwrap();
        assert_eq!(fixture.apps.len(), 4);
        assert!(!fixture.notification_policy_access);
        let cfg = config::load_from_str(include_str!("../../../demos/config.ron")).unwrap();
        assert_eq!(cfg.default_message_platform, "sms");
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = load(Some(Path::new("/nonexistent/rexbridge/fixture.ron"))).unwrap_err();
        assert!(matches!(err, FixtureError::Read { .. }));
    }
}
