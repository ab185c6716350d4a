#![warn(missing_docs)]

//! Log setup shared by the bridge binary and server.
//!
//! [`LogArgs`] is flattened into the CLI and turns verbosity flags into an
//! [`EnvFilter`] scoped to the bridge crates, so dependency chatter stays at
//! its default level. [`forward`] relays records to a connected client and
//! [`fmt`] renders them as logfmt text.

use std::env;

use clap::Args;
use tracing_subscriber::EnvFilter;

pub mod fmt;
pub mod forward;

/// Crate targets that `--debug`, `--trace` and `--log-level` apply to.
pub const BRIDGE_TARGETS: &[&str] = &[
    "rexbridge",
    "bridge_server",
    "bridge_engine",
    "bridge_protocol",
    "device_ops",
    "permissions",
    "config",
    "logging",
];

/// Verbosity flags for the bridge CLI.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log everything from the bridge crates
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Log bridge crates at debug
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Level for the bridge crates (error|warn|info|debug|trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Raw tracing directive, e.g. "bridge_engine=trace,bridge_server=debug"
    #[arg(long, value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Directive string these flags select.
    ///
    /// `--log-filter` is taken verbatim. Otherwise the first of `--trace`,
    /// `--debug` and `--log-level` that is set picks a level for
    /// [`BRIDGE_TARGETS`]. With no flags `RUST_LOG` is honored, and the
    /// fallback is `info` for the bridge crates.
    pub fn spec(&self) -> String {
        if let Some(raw) = &self.log_filter {
            return raw.clone();
        }
        let level = if self.trace {
            Some("trace")
        } else if self.debug {
            Some("debug")
        } else {
            self.log_level.as_deref()
        };
        match level {
            Some(level) => scoped(level),
            None => env::var("RUST_LOG")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| scoped("info")),
        }
    }

    /// Filter built from [`LogArgs::spec`].
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::new(self.spec())
    }
}

/// `target=level` for every entry of [`BRIDGE_TARGETS`], comma separated.
pub fn scoped(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    let mut out = String::new();
    for (i, target) in BRIDGE_TARGETS.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(target);
        out.push('=');
        out.push_str(&level);
    }
    out
}
