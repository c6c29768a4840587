//! Host thread driving a [`SensorService`].

use std::{thread, time::Duration as StdDuration};

use embassy_time::{Duration, Instant};

use crate::{RunError, SensorService, Worker};

const THREAD_NAME: &str = "sensor_service";

/// How long `run()` waits for a stopping worker beyond its sample period.
const STOP_GRACE: Duration = Duration::from_secs(1);

impl<const N: usize, const M: usize> SensorService<N, M> {
    /// Starts the service on a dedicated thread.
    ///
    /// Does nothing if the service is already running. After [`SensorService::stop()`], waits
    /// for the exiting worker first, so the new run picks up the current registrations. See
    /// [`SensorService::start()`] for what a run sets up.
    ///
    /// # Errors
    ///
    /// - The errors of [`SensorService::start()`].
    /// - [`RunError::AlreadyRunning`] only if a stopped worker is still in its round after its
    ///   sample period and a grace delay.
    /// - [`RunError::Spawn`] if the thread cannot be created.
    pub fn run(&'static self) -> Result<(), RunError> {
        if self.stop_requested() && !self.wait_stopped(self.config().sample_period + STOP_GRACE) {
            self.log().error(
                format_args!("previous sensor service run still stopping"),
                RunError::AlreadyRunning.errno(),
            );
            return Err(RunError::AlreadyRunning);
        }

        let worker = match self.start(Instant::now()) {
            Ok(worker) => worker,
            Err(RunError::AlreadyRunning) => return Ok(()),
            Err(err) => return Err(err),
        };

        let spawned = thread::Builder::new()
            .name(THREAD_NAME.into())
            .stack_size(self.config().stack_size)
            .spawn(move || worker_loop(worker));

        match spawned {
            Ok(handle) => {
                self.thread
                    .lock(|thread| *thread.borrow_mut() = Some(handle.thread().clone()));
                Ok(())
            }
            Err(_) => {
                // The worker was dropped along with the closure, ending the run.
                self.log().error(
                    format_args!("failed to create sensor service thread"),
                    RunError::Spawn.errno(),
                );
                Err(RunError::Spawn)
            }
        }
    }

    /// Waits up to `timeout` for the worker to exit; returns whether it did.
    #[must_use]
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_running() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(StdDuration::from_millis(1));
        }
    }
}

fn worker_loop<const N: usize, const M: usize>(mut worker: Worker<'static, N, M>) {
    let service = worker.service();
    service.log().info(format_args!("sensor service starting"));

    while !service.stop_requested() {
        let next = worker.poll(Instant::now());
        let now = Instant::now();
        if next > now && !service.stop_requested() {
            // `stop()` unparks early.
            thread::park_timeout(StdDuration::from_micros((next - now).as_micros()));
        }
    }

    service.thread.lock(|thread| thread.borrow_mut().take());
    service.log().info(format_args!("sensor service stopped"));
    drop(worker);
}
