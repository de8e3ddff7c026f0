//! Coop door controller entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  RppalPins / SimPins  NoaaSunset  SystemClock  LogEventSink  │
//! │  (PinPort)            (Sunset)    (Clock)      (EventSink)   │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ─────────────────   │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Daemon ─▶ ActuationScheduler ─▶ SolarClock            │  │
//! │  │                       └────────▶ MotorDriver           │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use coopdoor::adapters::log_sink::LogEventSink;
use coopdoor::adapters::sim::SimPins;
use coopdoor::adapters::sun::NoaaSunset;
use coopdoor::adapters::time::{StdDelay, SystemClock};
use coopdoor::app::commands::MotorCommand;
use coopdoor::app::ports::PinPort;
use coopdoor::config::{self, Configuration, DEFAULT_CONFIG_PATH, LogConfig};
use coopdoor::daemon::Daemon;
use coopdoor::drivers::motor::MotorDriver;
use coopdoor::logging;
use coopdoor::scheduler::ActuationScheduler;
use coopdoor::shutdown::ShutdownFlag;
use coopdoor::solar::SolarClock;

#[derive(Parser, Debug)]
#[command(name = "coopdoor", version, about = "Opens the coop door once a day after sunset")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "COOPDOOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log pin writes instead of driving GPIO
    #[arg(short, long)]
    simulate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the daily schedule until interrupted (default)
    Run,
    /// Run the motor once in the open direction and exit
    Open,
    /// Run the motor once in the close direction and exit
    Close,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            // The file never got far enough to say how to log.
            let _ = logging::init(&LogConfig::default());
            error!("{e:#}");
            return Err(e);
        }
    };
    logging::init(&cfg.log).context("installing logger")?;

    info!("coopdoor {} starting", env!("CARGO_PKG_VERSION"));
    info!("Config: loaded from {}", cli.config.display());
    cfg.log_summary();

    let shutdown = ShutdownFlag::new();
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("Signal received, shutting down");
        handler_flag.trigger();
    })
    .context("installing signal handler")?;

    let command = cli.command.unwrap_or(Command::Run);
    if cli.simulate {
        info!("Simulation mode: GPIO writes are logged only");
        return execute(SimPins::new(cfg.pins), &cfg, command, shutdown);
    }
    run_on_hardware(&cfg, command, shutdown)
}

#[cfg(feature = "rpi")]
fn run_on_hardware(cfg: &Configuration, command: Command, shutdown: ShutdownFlag) -> Result<()> {
    use coopdoor::adapters::hardware::RppalPins;
    use coopdoor::error::Error;

    let pins = RppalPins::new(cfg.pins)
        .map_err(Error::from)
        .context("claiming GPIO lines")?;
    execute(pins, cfg, command, shutdown)
}

#[cfg(not(feature = "rpi"))]
fn run_on_hardware(_cfg: &Configuration, _command: Command, _shutdown: ShutdownFlag) -> Result<()> {
    anyhow::bail!("built without GPIO support (feature `rpi`); pass --simulate")
}

fn execute<P: PinPort>(
    pins: P,
    cfg: &Configuration,
    command: Command,
    shutdown: ShutdownFlag,
) -> Result<()> {
    let mut driver = MotorDriver::new(pins, cfg.pins, cfg.frequency_hz, StdDelay, shutdown.clone());
    driver.park().context("parking motor at startup")?;

    match command {
        Command::Run => {
            let solar = SolarClock::new(
                NoaaSunset::new(cfg.location),
                cfg.buffer_after_sunset,
                cfg.earliest_open,
            );
            let open = MotorCommand {
                direction: cfg.open_direction,
                duty_cycle: cfg.duty_cycle,
                duration: cfg.time_to_open,
            };
            let mut scheduler = ActuationScheduler::new(solar, driver, open);
            let mut daemon = Daemon::new(
                SystemClock,
                LogEventSink::new(),
                StdDelay,
                cfg.sleep_duration,
                shutdown,
            );
            daemon.run(&mut scheduler);
            scheduler
                .driver_mut()
                .park()
                .context("parking motor on exit")?;
        }
        Command::Open | Command::Close => {
            let direction = if command == Command::Open {
                cfg.open_direction
            } else {
                cfg.open_direction.opposite()
            };
            info!("Manual {command:?}: running {direction} for {}s", cfg.time_to_open.as_secs());
            driver
                .actuate(&MotorCommand {
                    direction,
                    duty_cycle: cfg.duty_cycle,
                    duration: cfg.time_to_open,
                })
                .with_context(|| format!("manual {command:?}"))?;
        }
    }

    info!("coopdoor stopped");
    Ok(())
}
