//! recal daemon - fixed-interval acquisition and recalibration loop
//!
//! Startup: resume from the persisted snapshot when one exists, otherwise
//! seed from the bootstrap corpus and persist it before serving. A snapshot
//! that exists but does not load is fatal; there is no state to fall back
//! to. After that, one cycle per poll interval until interrupted.

mod cli;
mod cycle;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use recal_connectors::{AcquisitionSource, HttpSource, SerialSource, UnconfiguredSource};
use recal_core::{CalibrationDataset, CalibrationEngine, FileStore};

use cli::{AcquisitionMode, Cli};

/// Shutdown poll granularity while sleeping between cycles
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

fn main() {
    if let Err(err) = run() {
        eprintln!("recal: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if !args.poll_interval.is_finite() || args.poll_interval < 0.0 {
        return Err(format!("invalid poll interval: {}", args.poll_interval).into());
    }
    let poll_interval = Duration::from_secs_f64(args.poll_interval);

    let mut source = build_source(&args)?;
    let engine = open_engine(&args)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    info!(
        "reading real-time sensor data every {:.1}s (Ctrl-C to stop)",
        args.poll_interval
    );

    while running.load(Ordering::SeqCst) {
        cycle::run_cycle(&engine, source.as_mut());
        sleep_interruptibly(poll_interval, &running);
    }

    info!("real-time data reading stopped");
    Ok(())
}

/// Resume from the snapshot if one is persisted, otherwise seed and persist
/// the bootstrap corpus
fn open_engine(args: &Cli) -> Result<CalibrationEngine<FileStore>, Box<dyn Error>> {
    let store = FileStore::new(&args.store);
    let engine = if store.exists() {
        info!("resuming from snapshot at {}", args.store.display());
        CalibrationEngine::from_store(store)?
    } else {
        info!(
            "no snapshot at {}, seeding from the bootstrap corpus",
            args.store.display()
        );
        CalibrationEngine::bootstrap(store, CalibrationDataset::bootstrap())?
    };
    Ok(engine.with_retrain_threshold(args.retrain_threshold))
}

/// Build the acquisition source the configuration selects
fn build_source(args: &Cli) -> Result<Box<dyn AcquisitionSource>, Box<dyn Error>> {
    match args.mode {
        Some(AcquisitionMode::Serial) => {
            info!(
                "acquiring from serial port {} at {} baud",
                args.serial_port, args.baud_rate
            );
            Ok(Box::new(SerialSource::new(
                args.serial_port.clone(),
                args.baud_rate,
            )))
        }
        Some(AcquisitionMode::Api) => {
            let url = args
                .api_url
                .as_deref()
                .ok_or("--api-url is required with --mode api")?;
            info!("acquiring from gateway endpoint {url}");
            Ok(Box::new(HttpSource::new(url)?))
        }
        None => {
            warn!("no acquisition mode selected (--mode serial|api); every cycle will report the sensor as unavailable");
            Ok(Box::new(UnconfiguredSource))
        }
    }
}

/// Sleep for `interval`, waking early when the shutdown flag drops
fn sleep_interruptibly(interval: Duration, running: &AtomicBool) {
    let mut remaining = interval;
    while !remaining.is_zero() && running.load(Ordering::SeqCst) {
        let slice = remaining.min(SHUTDOWN_POLL);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}
