//! Samples simulated sensors through the sensor service and writes the CSV log into a host
//! directory standing in for the SD card.

mod simulated;

use std::{path::PathBuf, process::ExitCode, thread, time::Duration as StdDuration};

use clap::Parser;
use log::{error, info};
use sensord::{
    log::SystemLogger,
    sensors::{
        drivers::{Aht20, Ina226},
        Hub,
    },
    service::{Config, Duration, SensorService, SystemClock},
    storage::FsStorage,
    StaticCell,
};

use crate::simulated::{Climate, Rail};

/// Sensor logger demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// host directory backing the `/SD:` mount point
    #[arg(long, default_value = "sd")]
    sd_root: PathBuf,

    /// how long to run, in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// sampling interval, in milliseconds
    #[arg(long, default_value_t = 1000)]
    sample_ms: u64,

    /// snapshot log interval, in milliseconds
    #[arg(long, default_value_t = 5000)]
    log_ms: u64,

    /// CSV row interval, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    persist_ms: u64,

    /// local time offset from UTC, in hours
    #[arg(long, default_value_t = 8, allow_hyphen_values = true)]
    utc_offset: i64,

    /// miss every n-th climate measurement (0 never)
    #[arg(long, default_value_t = 7)]
    dropout: u32,

    /// enable debug messages
    #[arg(short, long)]
    verbose: bool,
}

static INA226: Ina226<Rail> = Ina226::new(Rail::new());
static HUB: Hub = Hub::new();
static LOG: SystemLogger = SystemLogger::new();

static AHT20: StaticCell<Aht20<Climate>> = StaticCell::new();
static STORAGE: StaticCell<FsStorage> = StaticCell::new();
static CLOCK: StaticCell<SystemClock> = StaticCell::new();
static SERVICE: StaticCell<SensorService> = StaticCell::new();

fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter(None, log::LevelFilter::Debug);
    } else {
        builder.filter(None, log::LevelFilter::Info);
    }
    builder.init();

    let storage: &'static FsStorage = STORAGE.init(FsStorage::new(&args.sd_root));
    if let Err(err) = storage.mount() {
        error!("cannot mount {}: {err}", args.sd_root.display());
        return ExitCode::FAILURE;
    }

    let aht20: &'static Aht20<Climate> = AHT20.init(Aht20::new(Climate::new(args.dropout)));
    if let Err(err) = HUB.register_builtin(&[&INA226, aht20]) {
        error!("cannot register sensors: {err}");
        return ExitCode::FAILURE;
    }

    let config = Config::new()
        .with_sample_period(Duration::from_millis(args.sample_ms))
        .with_log_period(Duration::from_millis(args.log_ms))
        .with_persist_period(Duration::from_millis(args.persist_ms))
        .with_stack_size(64 * 1024);
    let clock: &'static SystemClock =
        CLOCK.init(SystemClock::with_offset(args.utc_offset.saturating_mul(3600)));
    let service: &'static SensorService =
        SERVICE.init(SensorService::with_storage(&HUB, &LOG, config, storage, clock));

    if let Err(err) = service.run() {
        error!("cannot start sensor service: {err}");
        return ExitCode::FAILURE;
    }

    thread::sleep(StdDuration::from_secs(args.duration));

    match service.get_latest_ina226() {
        Ok(sample) => info!("last INA226 sample at {} ms: {} mV", sample.timestamp_ms, sample.bus_mv),
        Err(err) => info!("no INA226 sample: {err}"),
    }

    service.stop();
    if !service.wait_stopped(service.config().sample_period * 2) {
        error!("sensor service did not stop");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
