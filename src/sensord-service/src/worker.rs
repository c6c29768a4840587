use embassy_time::Instant;
use heapless::{String, Vec};
use sensord_sensors::{Aht20Sample, Ina226Sample, SensorType};
use sensord_storage::WriteMode;

use crate::{
    csv::{self, PATH_CAPACITY},
    render, SensorService,
};

/// Failures of a sensor are logged on the first one of a streak, then every this many.
const FAILURE_LOG_INTERVAL: u32 = 10;

pub(crate) struct Slot {
    pub(crate) sensor_type: SensorType,
    pub(crate) size: usize,
    failures: u32,
}

impl Slot {
    pub(crate) const fn new(sensor_type: SensorType, size: usize) -> Self {
        Self {
            sensor_type,
            size,
            failures: 0,
        }
    }
}

pub(crate) struct PersistState {
    path: String<PATH_CAPACITY>,
    header_written: bool,
}

impl PersistState {
    pub(crate) const fn new(path: String<PATH_CAPACITY>) -> Self {
        Self {
            path,
            header_written: false,
        }
    }
}

/// A run of a [`SensorService`], returned by [`SensorService::start()`].
///
/// The worker is the only code path acquiring samples. Dropping it ends the run.
pub struct Worker<'a, const N: usize, const M: usize> {
    service: &'a SensorService<N, M>,
    slots: Vec<Slot, N>,
    scratch: [u8; M],
    next_log: Instant,
    next_persist: Instant,
    persist: Option<PersistState>,
}

impl<'a, const N: usize, const M: usize> Worker<'a, N, M> {
    pub(crate) fn new(
        service: &'a SensorService<N, M>,
        slots: Vec<Slot, N>,
        persist: Option<PersistState>,
        now: Instant,
    ) -> Self {
        Self {
            service,
            slots,
            scratch: [0; M],
            next_log: now,
            next_persist: now,
            persist,
        }
    }

    /// Returns the service this worker runs.
    #[must_use]
    pub fn service(&self) -> &'a SensorService<N, M> {
        self.service
    }

    /// Returns the log file path of this run, if persistence is enabled.
    #[must_use]
    pub fn log_path(&self) -> Option<&str> {
        self.persist.as_ref().map(|persist| persist.path.as_str())
    }

    /// Performs one sampling round at time `now`, then the snapshot log and CSV row if due.
    ///
    /// A due snapshot or row moves its deadline to `now` plus its period: missed periods are
    /// not caught up after a late poll.
    ///
    /// Returns when the next round is due.
    pub fn poll(&mut self, now: Instant) -> Instant {
        self.sample_all();

        if now >= self.next_log {
            self.log_snapshot();
            self.next_log = now + self.service.config().log_period;
        }

        if now >= self.next_persist {
            self.persist_row();
            self.next_persist = now + self.service.config().persist_period;
        }

        now + self.service.config().sample_period
    }

    fn sample_all(&mut self) {
        let hub = self.service.hub();
        let log = self.service.log();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(buf) = self.scratch.get_mut(..slot.size) else {
                continue;
            };

            match hub.read(slot.sensor_type, buf) {
                Ok(()) => {
                    slot.failures = 0;
                    self.service.store(index, buf);
                }
                Err(err) => {
                    slot.failures = slot.failures.saturating_add(1);
                    if slot.failures == 1 || slot.failures % FAILURE_LOG_INTERVAL == 0 {
                        log.error(
                            format_args!("sensor sample failed type={}", slot.sensor_type),
                            err.errno(),
                        );
                    }
                }
            }
        }
    }

    fn log_snapshot(&mut self) {
        let log = self.service.log();
        let mut any_valid = false;

        for index in 0..self.slots.len() {
            let Some((sensor_type, size)) = self.service.copy_valid(index, &mut self.scratch)
            else {
                continue;
            };
            any_valid = true;
            if let Some(data) = self.scratch.get(..size) {
                render::render_sample(log, sensor_type, data);
            }
        }

        if !any_valid {
            render::render_waiting(log);
        }
    }

    fn persist_row(&mut self) {
        let (Some(persistence), Some(state)) = (self.service.persistence(), self.persist.as_mut())
        else {
            return;
        };
        if self.service.is_persistence_disabled() {
            return;
        }

        if !state.header_written {
            if let Err(err) = persistence.storage.write(
                &state.path,
                csv::CSV_HEADER.as_bytes(),
                WriteMode::Truncate,
            ) {
                self.disable_persistence(err.errno());
                return;
            }
            state.header_written = true;
        }

        let ina226 = self.service.latest::<Ina226Sample>().ok();
        let aht20 = self.service.latest::<Aht20Sample>().ok();
        let Ok(row) = csv::format_row(persistence.clock.now(), ina226.as_ref(), aht20.as_ref())
        else {
            return;
        };

        if let Err(err) = persistence
            .storage
            .write(&state.path, row.as_bytes(), WriteMode::Append)
        {
            self.disable_persistence(err.errno());
        }
    }

    fn disable_persistence(&self, code: i32) {
        if self.service.disable_persistence() {
            let path = self.log_path().unwrap_or_default();
            self.service.log().error(
                format_args!("sensor log write failed, persistence disabled path={path}"),
                code,
            );
        }
    }
}

impl<const N: usize, const M: usize> Drop for Worker<'_, N, M> {
    fn drop(&mut self) {
        self.service.finish_run();
    }
}
