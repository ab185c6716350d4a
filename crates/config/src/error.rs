//! Config failures and their terminal rendering.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Why a configuration could not be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The file could not be read.
    #[error("{message}")]
    Read {
        /// File that failed, when known.
        path: Option<PathBuf>,
        /// Underlying I/O message.
        message: String,
    },
    /// The text is not a valid RON config.
    #[error("{message}")]
    Parse {
        /// File that failed, when known.
        path: Option<PathBuf>,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        col: usize,
        /// Parser message.
        message: String,
        /// Source lines around the failure, caret included.
        excerpt: String,
    },
    /// The text parsed but a field holds an unusable value.
    #[error("{message}")]
    Validation {
        /// File that failed, when known.
        path: Option<PathBuf>,
        /// Field name as written in the file.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl Error {
    /// Multi-line rendering for a terminal: headline, message, then excerpt.
    pub fn pretty(&self) -> String {
        let where_ = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|p| format!(" at {}", p.display()))
                .unwrap_or_default()
        };
        match self {
            Self::Read { path, message } => {
                format!("Config read error{}: {message}", where_(path))
            }
            Self::Parse {
                path: Some(p),
                line,
                col,
                message,
                excerpt,
            } => format!(
                "Config parse error at {}:{line}:{col}\n{message}\n{excerpt}",
                p.display()
            ),
            Self::Parse {
                path: None,
                line,
                col,
                message,
                excerpt,
            } => format!("Config parse error at line {line}, column {col}\n{message}\n{excerpt}"),
            Self::Validation {
                path,
                field,
                message,
            } => format!(
                "Config validation error{} in `{field}`\n{message}",
                where_(path)
            ),
        }
    }

    fn path_slot(&mut self) -> &mut Option<PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path
            }
        }
    }

    /// File the error came from, if it came from a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    /// Tag an error raised while parsing an in-memory string with its file.
    pub(crate) fn with_path(mut self, p: &Path) -> Self {
        *self.path_slot() = Some(p.to_path_buf());
        self
    }
}

/// Render the line before `line_no`, the line itself, and a caret under `col_no`.
///
/// Both positions are 1-based. Out-of-range lines render as empty.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let first = line_no.saturating_sub(1).max(1);
    let mut out = String::new();
    for (idx, text) in source
        .lines()
        .enumerate()
        .map(|(i, t)| (i + 1, t))
        .skip(first - 1)
        .take(line_no + 1 - first)
    {
        let _ignored = writeln!(out, "{idx:>5} | {text}");
        if idx == line_no {
            let _ignored = writeln!(out, "{:>5} | {:>width$}", "", "^", width = col_no.max(1));
        }
    }
    if out.is_empty() {
        let _ignored = writeln!(out, "{line_no:>5} |");
    }
    out
}
