//! # MCS Supervisor
//!
//! Runs the supervisor against the simulated host. Commands are read from
//! stdin one byte at a time, exactly as a serial port would deliver them;
//! responses go to stdout and logs to stderr.

use clap::Parser;
use mcs_common::config::{LogLevel, McsConfig, load_config};
use mcs_common::consts::DEFAULT_CONFIG_PATH;
use mcs_supervisor::Supervisor;
use mcs_supervisor::sim::SimHost;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// MCS Supervisor, simulated host
#[derive(Parser, Debug)]
#[command(name = "mcs_supervisor")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "CNC controller supervisor: state, realtime signals, probe and `$` commands")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Z height [mm] at which the simulated probe touches. No contact if unset.
    #[arg(long, value_name = "MM", allow_negative_numbers = true)]
    probe_surface: Option<f32>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // The configured level only applies once the file is read.
    let config = load_config(&args.config);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("MCS Supervisor v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("MCS Supervisor shutdown complete");
}

fn run(args: &Args, config: McsConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        kinematics = ?config.supervisor.kinematics,
        line_buffer = config.supervisor.line_buffer_size,
        "config OK from {}",
        args.config.display()
    );

    let mut supervisor = Supervisor::new(&config.supervisor);
    supervisor.power_up(config.settings.flags());
    info!(state = %supervisor.runtime().machine_state(), "powered up");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut host = SimHost::new(
        &config,
        supervisor.shared(),
        stdin.lock(),
        stdout.lock(),
        args.probe_surface,
    );
    supervisor.run(&mut host);
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = EnvFilter::from_default_env();
    let filter = if args.verbose {
        filter.add_directive(Level::DEBUG.into())
    } else {
        match configured.as_directive().parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter.add_directive(Level::INFO.into()),
        }
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}
