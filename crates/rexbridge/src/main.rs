//! Binary entrypoint for the Rex bridge.
use std::{
    io,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use bridge_engine::{Bridge, Features};
use bridge_protocol::ipc::event_channel;
use bridge_server::LineServer;
use clap::{Parser, Subcommand};
use config::BridgeConfig;
use device_ops::{DeviceOps, sim::SimFixture};
use logging::{self as logshared, forward};
use permissions::PermissionGate;
use serde_json::json;
use tokio::runtime::Builder;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*};

mod fixture;

#[derive(Parser, Debug)]
#[command(
    name = "rexbridge",
    about = "Command/event bridge between the Rex UI and device services",
    version
)]
/// Command-line interface for the `rexbridge` binary.
struct Cli {
    /// Optional subcommand; defaults to `serve`.
    #[command(subcommand)]
    command: Option<Command>,

    /// Logging controls
    #[command(flatten)]
    log: logshared::LogArgs,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Simulated device description (RON)
    #[arg(long, value_name = "PATH", global = true)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Serve JSON-line requests on stdin and write frames to stdout.
    Serve {
        /// Relay bridge logs to the client as `log` events
        #[arg(long)]
        forward_logs: bool,
    },
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to ~/.rexbridge/config.ron)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Print the simulated device's permission snapshot and platform features.
    Status,
}

fn main() {
    let cli = Cli::parse();

    let env_filter = cli.log.env_filter();

    // stdout carries protocol frames; human-readable logs go to stderr.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .with(forward::layer())
        .try_init()
        .ok();

    let command = cli.command.unwrap_or(Command::Serve {
        forward_logs: false,
    });
    match command {
        Command::Check { path, dump } => {
            let explicit = path.as_deref().or(cli.config.as_deref());
            check(explicit, dump);
        }
        Command::Status => {
            let cfg = load_config(cli.config.as_deref());
            status(&cfg, cli.fixture.as_deref());
        }
        Command::Serve { forward_logs } => {
            let cfg = load_config(cli.config.as_deref());
            if let Err(e) = serve(cfg, cli.fixture.as_deref(), forward_logs) {
                error!("bridge exited with error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn load_config(explicit: Option<&Path>) -> BridgeConfig {
    match config::load(explicit) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e.pretty());
            process::exit(1);
        }
    }
}

fn load_fixture(path: Option<&Path>) -> SimFixture {
    match fixture::load(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn check(explicit: Option<&Path>, dump: bool) {
    let cfg = load_config(explicit);
    if dump {
        match serde_json::to_string_pretty(&cfg) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("OK");
    }
}

fn status(cfg: &BridgeConfig, fixture_path: Option<&Path>) {
    let (device, gate) = load_fixture(fixture_path).build();
    let features = Features::resolve(device.api_level(), cfg);
    let report = json!({
        "api_level": features.api_level,
        "permissions": gate.snapshot(),
        "features": {
            "answer_call": features.answer_call,
            "direct_end_call": features.direct_end_call,
            "dnd_policy": features.dnd_policy,
        },
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize status: {e}");
            process::exit(1);
        }
    }
}

fn serve(cfg: BridgeConfig, fixture_path: Option<&Path>, forward_logs: bool) -> io::Result<()> {
    let (device, gate) = load_fixture(fixture_path).build();
    let runtime = Builder::new_multi_thread().enable_all().build()?;

    let result = runtime.block_on(async move {
        let (tx, rx) = event_channel();
        let bridge = Bridge::new(Arc::new(device), Arc::new(gate), cfg, tx.clone());
        let mut server = LineServer::new(bridge, rx);
        if forward_logs {
            server = server.forward_logs(tx);
        }

        let shutdown = server.shutdown_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received");
                shutdown.cancel();
            }
        });

        info!("serving on stdin/stdout");
        server
            .serve(tokio::io::stdin(), tokio::io::stdout())
            .await
            .map_err(|e| io::Error::other(e.to_string()))
    });
    // A pending stdin read would otherwise block runtime teardown.
    runtime.shutdown_background();
    result
}
