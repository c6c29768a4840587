use core::{cell::RefCell, fmt};

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::Instant;
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};
use sensord_log::Logger;
use sensord_sensors::{
    Aht20Sample, Error, Hub, Ina226Sample, Sample, SensorType, MAX_DRIVERS, MAX_SAMPLE_SIZE,
};
use sensord_storage::Storage;

use crate::{
    csv,
    worker::{PersistState, Slot, Worker},
    Config, WallClock,
};

/// Errors preventing a [`SensorService`] from starting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    /// The service is already running.
    AlreadyRunning,
    /// Initializing the sensors or building the cache failed.
    Sensors(Error),
    /// Persistence is configured but the wall clock is not set.
    ClockUnavailable,
    /// The log file path does not fit its buffer.
    InvalidPath,
    /// The worker thread could not be created.
    Spawn,
}

impl RunError {
    /// Returns the negative errno-style code of this error.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::AlreadyRunning => -114, // EALREADY
            Self::Sensors(err) => err.errno(),
            Self::ClockUnavailable => -61, // ENODATA
            Self::InvalidPath => -36,      // ENAMETOOLONG
            Self::Spawn => -12,            // ENOMEM
        }
    }
}

impl From<Error> for RunError {
    fn from(err: Error) -> Self {
        Self::Sensors(err)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "sensor service already running"),
            Self::Sensors(err) => write!(f, "sensor setup failed: {err}"),
            Self::ClockUnavailable => write!(f, "wall clock unavailable"),
            Self::InvalidPath => write!(f, "sensor log path too long"),
            Self::Spawn => write!(f, "failed to create sensor service thread"),
        }
    }
}

impl core::error::Error for RunError {}

#[derive(Copy, Clone)]
pub(crate) struct Persistence {
    pub(crate) storage: &'static dyn Storage,
    pub(crate) clock: &'static dyn WallClock,
}

struct CacheEntry<const M: usize> {
    sensor_type: SensorType,
    size: usize,
    valid: bool,
    data: [u8; M],
}

/// Periodically samples every sensor of a [`Hub`] and serves the latest samples.
///
/// `N` bounds the number of cache entries and matches the hub capacity; `M` bounds the size of
/// a cached sample.
///
/// The service is meant to live in a `static`. It is driven either by `SensorService::run()`
/// (with the `std` feature), which spawns a worker thread, or by calling
/// [`SensorService::start()`] and then [`Worker::poll()`] from a task of the application.
///
/// # Examples
///
/// ```
/// # use sensord_log::SystemLogger;
/// # use sensord_sensors::{Error, Hub, SensorType};
/// # use sensord_service::{Config, SensorService};
/// static HUB: Hub = Hub::new();
/// static LOG: SystemLogger = SystemLogger::new();
/// static SERVICE: SensorService = SensorService::new(&HUB, &LOG, Config::new());
///
/// let mut buf = [0u8; 16];
/// assert_eq!(SERVICE.get_latest(SensorType::Aht20, &mut buf), Err(Error::NotFound));
/// ```
pub struct SensorService<const N: usize = MAX_DRIVERS, const M: usize = MAX_SAMPLE_SIZE> {
    hub: &'static Hub<N>,
    log: &'static dyn Logger,
    persistence: Option<Persistence>,
    config: Config,
    cache: Mutex<CriticalSectionRawMutex, RefCell<Vec<CacheEntry<M>, N>>>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    persist_disabled: AtomicBool,
    #[cfg(any(test, feature = "std"))]
    pub(crate) thread: Mutex<CriticalSectionRawMutex, RefCell<Option<std::thread::Thread>>>,
}

impl<const N: usize, const M: usize> SensorService<N, M> {
    /// Creates a stopped service sampling the drivers of `hub` and reporting to `log`.
    ///
    /// Nothing is written to storage; see [`with_storage()`](Self::with_storage).
    #[must_use]
    pub const fn new(hub: &'static Hub<N>, log: &'static dyn Logger, config: Config) -> Self {
        Self::build(hub, log, config, None)
    }

    /// Creates a stopped service that also appends a CSV row to a file of `storage` every
    /// [`Config::persist_period`]. The file is named after the `clock` time at start.
    #[must_use]
    pub const fn with_storage(
        hub: &'static Hub<N>,
        log: &'static dyn Logger,
        config: Config,
        storage: &'static dyn Storage,
        clock: &'static dyn WallClock,
    ) -> Self {
        Self::build(hub, log, config, Some(Persistence { storage, clock }))
    }

    const fn build(
        hub: &'static Hub<N>,
        log: &'static dyn Logger,
        config: Config,
        persistence: Option<Persistence>,
    ) -> Self {
        Self {
            hub,
            log,
            persistence,
            config,
            cache: Mutex::new(RefCell::new(Vec::new())),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            persist_disabled: AtomicBool::new(false),
            #[cfg(any(test, feature = "std"))]
            thread: Mutex::new(RefCell::new(None)),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn log(&self) -> &'static dyn Logger {
        self.log
    }

    pub(crate) fn hub(&self) -> &'static Hub<N> {
        self.hub
    }

    pub(crate) fn persistence(&self) -> Option<Persistence> {
        self.persistence
    }

    /// Returns whether a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns whether persistence has been disabled by a write failure during this run.
    #[must_use]
    pub fn is_persistence_disabled(&self) -> bool {
        self.persist_disabled.load(Ordering::Acquire)
    }

    /// Starts a run and returns its [`Worker`], to be polled every
    /// [`Config::sample_period`].
    ///
    /// Initializes every sensor of the hub, then lays out the cache from the drivers registered
    /// at this point: drivers registered later are only picked up by the next run. All cache
    /// entries start invalid and the snapshot log and CSV row are due on the first poll.
    ///
    /// # Errors
    ///
    /// - [`RunError::AlreadyRunning`] if the previous [`Worker`] is still alive.
    /// - [`RunError::Sensors`] if initializing a sensor fails, or with
    ///   [`Error::CapacityExceeded`] if a sample size exceeds `M`.
    /// - [`RunError::ClockUnavailable`], [`RunError::InvalidPath`] if persistence is enabled
    ///   but the log file cannot be named.
    pub fn start(&self, now: Instant) -> Result<Worker<'_, N, M>, RunError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.log.info(format_args!("sensor service already running"));
            return Err(RunError::AlreadyRunning);
        }

        match self.prepare() {
            Ok((slots, persist)) => {
                self.stop_requested.store(false, Ordering::Release);
                self.persist_disabled.store(false, Ordering::Release);
                Ok(Worker::new(self, slots, persist, now))
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    fn prepare(&self) -> Result<(Vec<Slot, N>, Option<PersistState>), RunError> {
        if let Err(err) = self.hub.init_all() {
            self.log
                .error(format_args!("failed to init sensors"), err.errno());
            return Err(err.into());
        }

        let slots = self.rebuild_cache().inspect_err(|err| {
            self.log
                .error(format_args!("failed to build sensor cache layout"), err.errno());
        })?;

        let persist = match self.persistence {
            Some(persistence) => {
                let Some(started) = persistence.clock.now() else {
                    self.log.error(
                        format_args!("wall clock unavailable, cannot name sensor log"),
                        RunError::ClockUnavailable.errno(),
                    );
                    return Err(RunError::ClockUnavailable);
                };
                let path = csv::log_path(self.config.log_dir, self.config.log_prefix, &started)
                    .map_err(|_| {
                        self.log.error(
                            format_args!("sensor log path too long"),
                            RunError::InvalidPath.errno(),
                        );
                        RunError::InvalidPath
                    })?;
                self.log.info(format_args!("sensor log file: {path}"));
                Some(PersistState::new(path))
            }
            None => None,
        };

        Ok((slots, persist))
    }

    fn rebuild_cache(&self) -> Result<Vec<Slot, N>, Error> {
        let mut slots = Vec::new();
        for index in 0..self.hub.registered_count() {
            let sensor_type = self.hub.registered_type_at(index)?;
            let size = self.hub.sample_size(sensor_type)?;
            if size > M {
                return Err(Error::CapacityExceeded);
            }
            slots
                .push(Slot::new(sensor_type, size))
                .map_err(|_| Error::CapacityExceeded)?;
        }

        self.cache.lock(|cache| {
            let mut cache = cache.borrow_mut();
            cache.clear();
            for slot in &slots {
                cache
                    .push(CacheEntry {
                        sensor_type: slot.sensor_type,
                        size: slot.size,
                        valid: false,
                        data: [0; M],
                    })
                    .map_err(|_| Error::CapacityExceeded)?;
            }
            Ok(())
        })?;

        Ok(slots)
    }

    /// Asks the worker to stop after its current round. Does not wait for it.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        #[cfg(any(test, feature = "std"))]
        self.thread.lock(|thread| {
            if let Some(thread) = thread.borrow().as_ref() {
                thread.unpark();
            }
        });
    }

    /// Returns whether [`SensorService::stop()`] was called since the run started.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub(crate) fn finish_run(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Copies the latest sample of `sensor_type` into `out`, returning its size.
    ///
    /// Never touches the hardware. A sample stays available after later acquisitions of the
    /// same sensor fail.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the type is not part of the current cache layout.
    /// - [`Error::NotReady`] if no acquisition succeeded yet.
    /// - [`Error::BufferTooSmall`] if `out` is shorter than the sample; `out` is left untouched.
    pub fn get_latest(&self, sensor_type: SensorType, out: &mut [u8]) -> Result<usize, Error> {
        self.cache.lock(|cache| {
            let cache = cache.borrow();
            let entry = cache
                .iter()
                .find(|entry| entry.sensor_type == sensor_type)
                .ok_or(Error::NotFound)?;

            if !entry.valid {
                return Err(Error::NotReady);
            }

            let src = entry.data.get(..entry.size).ok_or(Error::CapacityExceeded)?;
            out.get_mut(..entry.size)
                .ok_or(Error::BufferTooSmall)?
                .copy_from_slice(src);
            Ok(entry.size)
        })
    }

    /// Returns the latest sample of type `S`.
    ///
    /// # Errors
    ///
    /// The errors of [`SensorService::get_latest()`], and [`Error::InvalidArgument`] if the
    /// cached sample is not [`Sample::SIZE`] bytes long.
    pub fn latest<S: Sample>(&self) -> Result<S, Error> {
        let mut buf = [0u8; M];
        let len = self.get_latest(S::TYPE, &mut buf)?;
        if len != S::SIZE {
            return Err(Error::InvalidArgument);
        }
        S::decode(&buf)
    }

    /// Returns the latest INA226 sample.
    ///
    /// # Errors
    ///
    /// See [`SensorService::latest()`].
    pub fn get_latest_ina226(&self) -> Result<Ina226Sample, Error> {
        self.latest()
    }

    /// Returns the latest AHT20 sample.
    ///
    /// # Errors
    ///
    /// See [`SensorService::latest()`].
    pub fn get_latest_aht20(&self) -> Result<Aht20Sample, Error> {
        self.latest()
    }

    pub(crate) fn store(&self, index: usize, data: &[u8]) {
        self.cache.lock(|cache| {
            let mut cache = cache.borrow_mut();
            let Some(entry) = cache.get_mut(index) else {
                return;
            };
            if let Some(dest) = entry.data.get_mut(..data.len()) {
                dest.copy_from_slice(data);
                entry.valid = true;
            }
        });
    }

    /// Copies entry `index` into `out` if it holds a valid sample.
    pub(crate) fn copy_valid(&self, index: usize, out: &mut [u8; M]) -> Option<(SensorType, usize)> {
        self.cache.lock(|cache| {
            let cache = cache.borrow();
            let entry = cache.get(index).filter(|entry| entry.valid)?;
            *out = entry.data;
            Some((entry.sensor_type, entry.size))
        })
    }

    /// Latches persistence off; returns whether this call did it.
    pub(crate) fn disable_persistence(&self) -> bool {
        !self.persist_disabled.swap(true, Ordering::AcqRel)
    }
}
