//! Built-in drivers, layered over a [`ChannelSource`].
//!
//! Drivers are meant to live in `static` items owned by the board setup code:
//!
//! ```
//! # use sensord_sensors::{channel::{Channel, ChannelSource, SensorValue}, drivers::Aht20, Error, Hub};
//! # struct Bus;
//! # impl ChannelSource for Bus {
//! #     fn is_ready(&mut self) -> bool { true }
//! #     fn fetch(&mut self) -> Result<(), Error> { Ok(()) }
//! #     fn channel(&mut self, _: Channel) -> Result<SensorValue, Error> { Ok(SensorValue::new(21, 0)) }
//! # }
//! static AHT20: Aht20<Bus> = Aht20::new(Bus);
//! static HUB: Hub = Hub::new();
//!
//! HUB.register_builtin(&[&AHT20]).unwrap();
//! ```

mod aht20;
mod ina226;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use portable_atomic::{AtomicBool, Ordering};

use crate::{channel::ChannelSource, Error};

pub use aht20::Aht20;
pub use ina226::Ina226;

/// Channel source plus the readiness latch shared by the built-in drivers.
///
/// The source sits behind an async mutex, which is only ever taken with `try_lock()`: bus
/// transfers run without a critical section held, and a concurrent acquisition on the same
/// device fails with [`Error::NotReady`] instead of waiting.
struct Device<S> {
    source: Mutex<CriticalSectionRawMutex, S>,
    ready: AtomicBool,
}

impl<S: ChannelSource> Device<S> {
    const fn new(source: S) -> Self {
        Self {
            source: Mutex::new(source),
            ready: AtomicBool::new(false),
        }
    }

    fn init(&self) -> Result<(), Error> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut source = self.source.try_lock().map_err(|_| Error::NotReady)?;
        if !source.is_ready() {
            return Err(Error::DeviceFailure);
        }

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Latches a new measurement and hands the source to `f` to pick the channels.
    fn fetch<R>(&self, f: impl FnOnce(&mut S) -> Result<R, Error>) -> Result<R, Error> {
        self.init()?;
        let mut source = self.source.try_lock().map_err(|_| Error::NotReady)?;
        source.fetch()?;
        f(&mut *source)
    }
}


#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use portable_atomic::AtomicI32;

    use super::*;
    use crate::{
        channel::{Channel, SensorValue},
        Driver, Ina226Sample, Sample,
    };

    static NESTED_ERRNO: AtomicI32 = AtomicI32::new(0);
    static NESTED: Ina226<Nested> = Ina226::new(Nested);

    /// Reads its own driver again from within `fetch()`.
    struct Nested;

    impl ChannelSource for Nested {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn fetch(&mut self) -> Result<(), Error> {
            let mut buf = [0u8; Ina226Sample::SIZE];
            let errno = NESTED.read(&mut buf).err().map_or(0, Error::errno);
            NESTED_ERRNO.store(errno, Ordering::Relaxed);
            Ok(())
        }

        fn channel(&mut self, _: Channel) -> Result<SensorValue, Error> {
            Ok(SensorValue::new(1, 0))
        }
    }

    /// Needs another thread to enter a critical section to complete `fetch()`.
    struct Handoff;

    impl ChannelSource for Handoff {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn fetch(&mut self) -> Result<(), Error> {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || critical_section::with(|_| tx.send(()).ok()));
            rx.recv_timeout(Duration::from_secs(5))
                .map_err(|_| Error::DeviceFailure)
        }

        fn channel(&mut self, _: Channel) -> Result<SensorValue, Error> {
            Ok(SensorValue::new(0, 500_000))
        }
    }

    #[test]
    fn acquisition_in_progress_reports_busy() {
        let mut buf = [0u8; Ina226Sample::SIZE];

        NESTED.read(&mut buf).unwrap();

        assert_eq!(NESTED_ERRNO.load(Ordering::Relaxed), Error::NotReady.errno());
        assert_eq!(Ina226Sample::decode(&buf).unwrap().bus_mv, 1_000);
        // The device is free again afterwards.
        NESTED.read(&mut buf).unwrap();
    }

    #[test]
    fn bus_transfers_run_outside_critical_sections() {
        let driver = Ina226::new(Handoff);
        let mut buf = [0u8; Ina226Sample::SIZE];

        assert_eq!(driver.read(&mut buf), Ok(()));
        assert_eq!(Ina226Sample::decode(&buf).unwrap().power_mw, 500);
    }
}
