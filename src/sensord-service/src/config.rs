use embassy_time::Duration;

use sensord_utils::{str_from_env_or, u64_from_env_or, usize_from_env_or};

const SAMPLE_PERIOD_MS: u64 = u64_from_env_or!(
    "CONFIG_SENSOR_SAMPLE_PERIOD_MS",
    1000,
    "interval between two sampling rounds, in milliseconds"
);
const LOG_PERIOD_MS: u64 = u64_from_env_or!(
    "CONFIG_SENSOR_LOG_PERIOD_MS",
    5000,
    "interval between two snapshot log lines, in milliseconds"
);
const PERSIST_PERIOD_MS: u64 = u64_from_env_or!(
    "CONFIG_SENSOR_PERSIST_PERIOD_MS",
    10_000,
    "interval between two CSV rows, in milliseconds"
);
const THREAD_STACKSIZE: usize = usize_from_env_or!(
    "CONFIG_SENSOR_THREAD_STACKSIZE",
    4096,
    "stack size of the sensor service thread, in bytes"
);
const LOG_DIR: &str = str_from_env_or!(
    "CONFIG_SENSOR_LOG_DIR",
    "/SD:",
    "directory the CSV sensor logs are written to"
);
const LOG_PREFIX: &str = str_from_env_or!(
    "CONFIG_SENSOR_LOG_PREFIX",
    "SENS",
    "file name prefix of the CSV sensor logs"
);

/// Configuration of a [`SensorService`](crate::SensorService).
///
/// [`Config::new()`] takes its defaults from the `CONFIG_SENSOR_*` environment variables at
/// build time.
///
/// ```
/// # use embassy_time::Duration;
/// # use sensord_service::Config;
/// const CONFIG: Config = Config::new()
///     .with_sample_period(Duration::from_millis(200))
///     .with_log_prefix("BENCH");
/// assert_eq!(CONFIG.log_prefix, "BENCH");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Interval between two sampling rounds.
    pub sample_period: Duration,
    /// Interval between two snapshot log lines.
    pub log_period: Duration,
    /// Interval between two CSV rows.
    pub persist_period: Duration,
    /// Stack size of the worker thread, in bytes.
    pub stack_size: usize,
    /// Directory the CSV file is created in.
    pub log_dir: &'static str,
    /// File name prefix of the CSV file.
    pub log_prefix: &'static str,
}

impl Config {
    /// Returns the build-time configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sample_period: Duration::from_millis(SAMPLE_PERIOD_MS),
            log_period: Duration::from_millis(LOG_PERIOD_MS),
            persist_period: Duration::from_millis(PERSIST_PERIOD_MS),
            stack_size: THREAD_STACKSIZE,
            log_dir: LOG_DIR,
            log_prefix: LOG_PREFIX,
        }
    }

    /// Sets the sampling interval.
    #[must_use]
    pub const fn with_sample_period(self, sample_period: Duration) -> Self {
        Self {
            sample_period,
            ..self
        }
    }

    /// Sets the snapshot log interval.
    #[must_use]
    pub const fn with_log_period(self, log_period: Duration) -> Self {
        Self { log_period, ..self }
    }

    /// Sets the CSV row interval.
    #[must_use]
    pub const fn with_persist_period(self, persist_period: Duration) -> Self {
        Self {
            persist_period,
            ..self
        }
    }

    /// Sets the worker thread stack size.
    #[must_use]
    pub const fn with_stack_size(self, stack_size: usize) -> Self {
        Self { stack_size, ..self }
    }

    /// Sets the CSV directory.
    #[must_use]
    pub const fn with_log_dir(self, log_dir: &'static str) -> Self {
        Self { log_dir, ..self }
    }

    /// Sets the CSV file name prefix.
    #[must_use]
    pub const fn with_log_prefix(self, log_prefix: &'static str) -> Self {
        Self { log_prefix, ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
