//! # autosim
//!
//! Runs the demo drivetrain against the simulated drivetrain model.
//!
//! # Usage
//!
//! ```bash
//! # 250 cycles (5 s) at half speed, turning slightly right
//! autosim --ticks 250 --forward 0.5 --turn 0.2
//!
//! # Paced at the control period until Ctrl-C, with debug logs
//! autosim --realtime --ticks 0 -v
//!
//! # Final state as JSON
//! autosim --config drivetrain.toml --report
//!
//! # Real hardware: binding is skipped
//! autosim --real
//! ```

#![deny(warnings)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use autosim_common::config::{ConfigError, ConfigLoader, LogLevel};
use autosim_common::consts::DEFAULT_CONFIG_PATH;
use autosim_common::simdev::{ChannelValue, SimDeviceBus};
use autosim_hal::binding::{ExecutionMode, SensorKinds, initialize_with};
use autosim_hal::config::DrivetrainConfig;
use autosim_hal::platform::{DemoDrivetrain, Pose2d};
use autosim_hal::update::TickSample;
use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// autosim - drivetrain hardware-to-simulation binding demo
#[derive(Parser, Debug)]
#[command(name = "autosim")]
#[command(version)]
#[command(about = "Bind a demo drivetrain to a physics model and drive it")]
#[command(long_about = None)]
struct Args {
    /// Drivetrain configuration (TOML). Defaults apply when the default
    /// path does not exist.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of control cycles to run (0 = until Ctrl-C, needs --realtime)
    #[arg(short, long, default_value_t = 250)]
    ticks: u64,

    /// Arcade forward speed in [-1, 1]
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    forward: f64,

    /// Arcade rotation in [-1, 1], clockwise positive
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    turn: f64,

    /// Pretend to run on real hardware
    #[arg(long)]
    real: bool,

    /// Pace cycles at the control period
    #[arg(long)]
    realtime: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Print the final state as JSON on stdout
    #[arg(long)]
    report: bool,
}

/// Final state of a run.
#[derive(Debug, Serialize)]
struct RunReport {
    service_name: String,
    bound: bool,
    cycles: u64,
    simulated_s: f64,
    sensors: Option<SensorKinds>,
    last_sample: Option<TickSample>,
    pose: Pose2d,
    channels: Vec<ChannelValue>,
}

fn main() {
    if let Err(e) = run() {
        error!("autosim failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loaded = load_config(&args);
    let level = loaded
        .as_ref()
        .map(|(config, _)| config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);
    let (config, defaulted) = loaded?;
    let _span = tracing::info_span!("autosim", service = %config.shared.service_name).entered();

    info!("autosim v{} starting", env!("CARGO_PKG_VERSION"));
    if defaulted {
        info!("no config at {}, using defaults", DEFAULT_CONFIG_PATH);
    }
    config.validate()?;

    let bus = SimDeviceBus::new();
    let mut drivetrain = DemoDrivetrain::new(&bus);
    let mode = if args.real {
        ExecutionMode::Real
    } else {
        ExecutionMode::Simulated
    };

    let bound = initialize_with(&drivetrain, config.build_model(), mode, config.to_options())?;
    let Some(mut ctx) = bound else {
        info!("real hardware, nothing to simulate");
        if args.report {
            print_report(&RunReport {
                service_name: config.shared.service_name.clone(),
                bound: false,
                cycles: 0,
                simulated_s: 0.0,
                sensors: None,
                last_sample: None,
                pose: drivetrain.pose(),
                channels: bus.snapshot(),
            })?;
        }
        return Ok(());
    };

    let running = Arc::new(AtomicBool::new(true));
    if args.realtime {
        let flag = running.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            flag.store(false, Ordering::SeqCst);
        })?;
    } else if args.ticks == 0 {
        warn!("--ticks 0 without --realtime runs nothing");
    }

    let dt = config.run.control_period_s;
    let period = Duration::try_from_secs_f64(dt)?;
    let mut overruns = 0u64;

    while running.load(Ordering::SeqCst) {
        if args.ticks != 0 && ctx.cycles() >= args.ticks {
            break;
        }
        if args.ticks == 0 && !args.realtime {
            break;
        }
        let start = Instant::now();

        drivetrain.arcade_drive(args.forward, args.turn);
        drivetrain.periodic();
        ctx.tick(dt);

        if args.realtime {
            let elapsed = start.elapsed();
            match period.checked_sub(elapsed) {
                Some(remaining) => std::thread::sleep(remaining),
                None => {
                    overruns += 1;
                    debug!(
                        cycle = ctx.cycles(),
                        elapsed_us = elapsed.as_micros() as u64,
                        "cycle overrun"
                    );
                }
            }
        }
    }
    drivetrain.stop();

    let pose = drivetrain.periodic();
    info!(
        cycles = ctx.cycles(),
        overruns,
        x = pose.x,
        y = pose.y,
        heading_deg = pose.heading.to_degrees(),
        "run complete"
    );

    if args.report {
        print_report(&RunReport {
            service_name: config.shared.service_name.clone(),
            bound: true,
            cycles: ctx.cycles(),
            simulated_s: ctx.cycles() as f64 * dt,
            sensors: Some(ctx.sensor_kinds()),
            last_sample: Some(*ctx.last_sample()),
            pose,
            channels: bus.snapshot(),
        })?;
    }
    Ok(())
}

/// Explicit `--config` must exist; the default path may be absent.
fn load_config(args: &Args) -> Result<(DrivetrainConfig, bool), ConfigError> {
    match &args.config {
        Some(path) => DrivetrainConfig::load(path).map(|c| (c, false)),
        None => match DrivetrainConfig::load(std::path::Path::new(DEFAULT_CONFIG_PATH)) {
            Ok(config) => Ok((config, false)),
            Err(ConfigError::FileNotFound(_)) => Ok((DrivetrainConfig::default(), true)),
            Err(e) => Err(e),
        },
    }
}

fn print_report(report: &RunReport) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.as_tracing_level()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
