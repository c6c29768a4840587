//! Registry of sensor drivers, keyed by [`SensorType`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use heapless::Vec;

use crate::{Aht20Sample, Driver, Error, Ina226Sample, Sample, SensorType};

/// Default number of drivers a [`Hub`] can hold.
pub const MAX_DRIVERS: usize = 8;

/// Largest sample [`Hub::read_sample()`] can decode.
pub const MAX_SAMPLE_SIZE: usize = 64;

#[derive(Copy, Clone)]
struct DriverSlot {
    sensor_type: SensorType,
    driver: &'static dyn Driver,
    initialized: bool,
}

/// Fixed-capacity table mapping each [`SensorType`] to its [`Driver`].
///
/// Slots are appended in registration order and never removed, so an index obtained from
/// [`Hub::registered_type_at()`] stays valid for the lifetime of the hub.
///
/// The table lock is only held to look slots up or flip their state: driver calls
/// ([`Driver::init()`], [`Driver::read()`]) run outside of it.
///
/// # Examples
///
/// ```
/// # use sensord_sensors::Hub;
/// static HUB: Hub = Hub::new();
/// assert_eq!(HUB.registered_count(), 0);
/// assert_eq!(HUB.capacity(), 8);
/// ```
pub struct Hub<const N: usize = MAX_DRIVERS> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Vec<DriverSlot, N>>>,
}

impl<const N: usize> Hub<N> {
    /// Creates an empty hub.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns the maximum number of drivers.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Registers a driver.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRegistered`] if a driver of the same type is registered; the table is
    ///   left unchanged.
    /// - [`Error::CapacityExceeded`] if the table is full.
    pub fn register(&self, driver: &'static dyn Driver) -> Result<(), Error> {
        let sensor_type = driver.sensor_type();

        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();

            if slots.iter().any(|slot| slot.sensor_type == sensor_type) {
                return Err(Error::AlreadyRegistered);
            }

            slots
                .push(DriverSlot {
                    sensor_type,
                    driver,
                    initialized: false,
                })
                .map_err(|_| Error::CapacityExceeded)
        })?;

        sensord_log::debug!("registered sensor {}", sensor_type);
        Ok(())
    }

    /// Registers each of `drivers`, skipping those whose type is already registered.
    ///
    /// Meant for board setup code that may run more than once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the table fills up.
    pub fn register_builtin(&self, drivers: &[&'static dyn Driver]) -> Result<(), Error> {
        for driver in drivers {
            match self.register(*driver) {
                Ok(()) | Err(Error::AlreadyRegistered) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Initializes every registered driver that is not yet initialized, in registration order.
    ///
    /// Stops at the first failure: later drivers are not touched, and a later call resumes with
    /// the driver that failed.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing [`Driver::init()`].
    pub fn init_all(&self) -> Result<(), Error> {
        for index in 0..self.registered_count() {
            self.init_slot(index)?;
        }
        Ok(())
    }

    /// Initializes the driver of `sensor_type`; does nothing if already initialized.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no driver of that type is registered.
    /// - The error of [`Driver::init()`].
    pub fn init(&self, sensor_type: SensorType) -> Result<(), Error> {
        let (index, _) = self.find(sensor_type)?;
        self.init_slot(index)
    }

    /// Returns whether the driver of `sensor_type` has been initialized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no driver of that type is registered.
    pub fn is_initialized(&self, sensor_type: SensorType) -> Result<bool, Error> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .find(|slot| slot.sensor_type == sensor_type)
                .map(|slot| slot.initialized)
                .ok_or(Error::NotFound)
        })
    }

    /// Returns the number of registered drivers.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().len())
    }

    /// Returns the type of the `index`-th registered driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `index` is out of bounds.
    pub fn registered_type_at(&self, index: usize) -> Result<SensorType, Error> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .get(index)
                .map(|slot| slot.sensor_type)
                .ok_or(Error::NotFound)
        })
    }

    /// Returns the sample size declared by the driver of `sensor_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no driver of that type is registered.
    pub fn sample_size(&self, sensor_type: SensorType) -> Result<usize, Error> {
        let (_, driver) = self.find(sensor_type)?;
        Ok(driver.sample_size())
    }

    /// Acquires a fresh sample from the driver of `sensor_type` into `buf`.
    ///
    /// The driver is initialized first if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no driver of that type is registered.
    /// - [`Error::BufferTooSmall`] if `buf` is shorter than the declared sample size; the
    ///   driver is not touched.
    /// - The error of [`Driver::init()`] or [`Driver::read()`].
    pub fn read(&self, sensor_type: SensorType, buf: &mut [u8]) -> Result<(), Error> {
        let (index, driver) = self.find(sensor_type)?;

        if buf.len() < driver.sample_size() {
            return Err(Error::BufferTooSmall);
        }

        self.init_slot(index)?;
        driver.read(buf)
    }

    /// Acquires a fresh sample and decodes it as `S`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the driver of [`Sample::TYPE`] does not declare
    ///   [`Sample::SIZE`] as sample size.
    /// - [`Error::CapacityExceeded`] if [`Sample::SIZE`] exceeds [`MAX_SAMPLE_SIZE`].
    /// - The errors of [`Hub::read()`].
    pub fn read_sample<S: Sample>(&self) -> Result<S, Error> {
        if self.sample_size(S::TYPE)? != S::SIZE {
            return Err(Error::InvalidArgument);
        }

        let mut scratch = [0u8; MAX_SAMPLE_SIZE];
        let buf = scratch
            .get_mut(..S::SIZE)
            .ok_or(Error::CapacityExceeded)?;

        self.read(S::TYPE, buf)?;
        S::decode(buf)
    }

    /// Acquires a fresh sample from the INA226.
    ///
    /// # Errors
    ///
    /// See [`Hub::read_sample()`].
    pub fn read_ina226_once(&self) -> Result<Ina226Sample, Error> {
        self.read_sample()
    }

    /// Acquires a fresh sample from the AHT20.
    ///
    /// # Errors
    ///
    /// See [`Hub::read_sample()`].
    pub fn read_aht20_once(&self) -> Result<Aht20Sample, Error> {
        self.read_sample()
    }

    fn find(&self, sensor_type: SensorType) -> Result<(usize, &'static dyn Driver), Error> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .enumerate()
                .find(|(_, slot)| slot.sensor_type == sensor_type)
                .map(|(index, slot)| (index, slot.driver))
                .ok_or(Error::NotFound)
        })
    }

    fn init_slot(&self, index: usize) -> Result<(), Error> {
        let (driver, initialized) = self.slots.lock(|slots| {
            slots
                .borrow()
                .get(index)
                .map(|slot| (slot.driver, slot.initialized))
                .ok_or(Error::NotFound)
        })?;

        if initialized {
            return Ok(());
        }

        driver.init()?;

        self.slots.lock(|slots| {
            if let Some(slot) = slots.borrow_mut().get_mut(index) {
                slot.initialized = true;
            }
        });
        Ok(())
    }
}

impl<const N: usize> Default for Hub<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    struct FakeDriver {
        sensor_type: SensorType,
        size: usize,
        fill: u8,
        fail_init: AtomicBool,
        init_calls: AtomicUsize,
        read_calls: AtomicUsize,
    }

    impl FakeDriver {
        const fn new(sensor_type: SensorType, size: usize, fill: u8) -> Self {
            Self {
                sensor_type,
                size,
                fill,
                fail_init: AtomicBool::new(false),
                init_calls: AtomicUsize::new(0),
                read_calls: AtomicUsize::new(0),
            }
        }

        const fn failing_init(sensor_type: SensorType) -> Self {
            Self {
                sensor_type,
                size: 4,
                fill: 0,
                fail_init: AtomicBool::new(true),
                init_calls: AtomicUsize::new(0),
                read_calls: AtomicUsize::new(0),
            }
        }

        fn init_calls(&self) -> usize {
            self.init_calls.load(Ordering::Relaxed)
        }

        fn read_calls(&self) -> usize {
            self.read_calls.load(Ordering::Relaxed)
        }
    }

    impl Driver for FakeDriver {
        fn sensor_type(&self) -> SensorType {
            self.sensor_type
        }

        fn init(&self) -> Result<(), Error> {
            self.init_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_init.load(Ordering::Relaxed) {
                Err(Error::DeviceFailure)
            } else {
                Ok(())
            }
        }

        fn sample_size(&self) -> usize {
            self.size
        }

        fn read(&self, buf: &mut [u8]) -> Result<(), Error> {
            self.read_calls.fetch_add(1, Ordering::Relaxed);
            buf.get_mut(..self.size)
                .ok_or(Error::BufferTooSmall)?
                .fill(self.fill);
            Ok(())
        }
    }

    #[test]
    fn double_registration_keeps_one_entry() {
        static FIRST: FakeDriver = FakeDriver::new(SensorType::Ina226, 20, 1);
        static SECOND: FakeDriver = FakeDriver::new(SensorType::Ina226, 20, 2);
        let hub: Hub = Hub::new();

        assert_eq!(hub.register(&FIRST), Ok(()));
        assert_eq!(hub.register(&SECOND), Err(Error::AlreadyRegistered));
        assert_eq!(hub.registered_count(), 1);

        let mut buf = [0u8; 20];
        hub.read(SensorType::Ina226, &mut buf).unwrap();
        assert_eq!(buf, [1u8; 20]);
        assert_eq!(SECOND.read_calls(), 0);
    }

    #[test]
    fn ninth_registration_exceeds_capacity() {
        static DRIVERS: [FakeDriver; 9] = [
            FakeDriver::new(SensorType::Custom(0), 1, 0),
            FakeDriver::new(SensorType::Custom(1), 1, 0),
            FakeDriver::new(SensorType::Custom(2), 1, 0),
            FakeDriver::new(SensorType::Custom(3), 1, 0),
            FakeDriver::new(SensorType::Custom(4), 1, 0),
            FakeDriver::new(SensorType::Custom(5), 1, 0),
            FakeDriver::new(SensorType::Custom(6), 1, 0),
            FakeDriver::new(SensorType::Custom(7), 1, 0),
            FakeDriver::new(SensorType::Custom(8), 1, 0),
        ];
        let hub: Hub = Hub::new();

        let (first_eight, ninth) = DRIVERS.split_at(8);
        for driver in first_eight {
            assert_eq!(hub.register(driver), Ok(()));
        }
        for driver in ninth {
            assert_eq!(hub.register(driver), Err(Error::CapacityExceeded));
        }
        assert_eq!(hub.registered_count(), 8);
        assert_eq!(hub.registered_type_at(7), Ok(SensorType::Custom(7)));
        assert_eq!(hub.registered_type_at(8), Err(Error::NotFound));
    }

    #[test]
    fn init_all_stops_at_first_failure_and_resumes() {
        static A: FakeDriver = FakeDriver::new(SensorType::Custom(10), 4, 0);
        static B: FakeDriver = FakeDriver::new(SensorType::Custom(11), 4, 0);
        static C: FakeDriver = FakeDriver::failing_init(SensorType::Custom(12));
        static D: FakeDriver = FakeDriver::new(SensorType::Custom(13), 4, 0);
        let hub: Hub = Hub::new();
        for driver in [&A, &B, &C, &D] {
            hub.register(driver).unwrap();
        }

        assert_eq!(hub.init_all(), Err(Error::DeviceFailure));
        assert_eq!(
            [A.init_calls(), B.init_calls(), C.init_calls(), D.init_calls()],
            [1, 1, 1, 0]
        );
        assert_eq!(hub.is_initialized(SensorType::Custom(11)), Ok(true));
        assert_eq!(hub.is_initialized(SensorType::Custom(12)), Ok(false));
        assert_eq!(hub.is_initialized(SensorType::Custom(13)), Ok(false));

        C.fail_init.store(false, Ordering::Relaxed);
        assert_eq!(hub.init_all(), Ok(()));
        assert_eq!(
            [A.init_calls(), B.init_calls(), C.init_calls(), D.init_calls()],
            [1, 1, 2, 1]
        );

        // Everything initialized: nothing left to do.
        assert_eq!(hub.init_all(), Ok(()));
        assert_eq!(C.init_calls(), 2);
    }

    #[test]
    fn short_buffers_are_rejected_before_touching_the_driver() {
        static A: FakeDriver = FakeDriver::new(SensorType::Custom(20), 12, 0xaa);
        static B: FakeDriver = FakeDriver::new(SensorType::Custom(21), 4, 0x55);
        let hub: Hub = Hub::new();
        hub.register(&A).unwrap();
        hub.register(&B).unwrap();

        let mut buf = [0u8; 12];
        for driver in [&A, &B] {
            for len in 0..driver.size {
                let short = buf.get_mut(..len).unwrap();
                assert_eq!(
                    hub.read(driver.sensor_type, short),
                    Err(Error::BufferTooSmall)
                );
            }
            assert_eq!(driver.init_calls(), 0);
            assert_eq!(driver.read_calls(), 0);
        }
    }

    #[test]
    fn read_initializes_lazily_once() {
        static A: FakeDriver = FakeDriver::new(SensorType::Custom(30), 4, 0x55);
        let hub: Hub = Hub::new();
        hub.register(&A).unwrap();
        assert_eq!(hub.is_initialized(SensorType::Custom(30)), Ok(false));

        let mut buf = [0u8; 8];
        hub.read(SensorType::Custom(30), &mut buf).unwrap();
        hub.read(SensorType::Custom(30), &mut buf).unwrap();

        assert_eq!(buf, [0x55, 0x55, 0x55, 0x55, 0, 0, 0, 0]);
        assert_eq!(A.init_calls(), 1);
        assert_eq!(A.read_calls(), 2);
        assert_eq!(hub.is_initialized(SensorType::Custom(30)), Ok(true));
        assert_eq!(hub.init(SensorType::Custom(30)), Ok(()));
        assert_eq!(A.init_calls(), 1);
    }

    #[test]
    fn failed_lazy_init_is_propagated() {
        static A: FakeDriver = FakeDriver::failing_init(SensorType::Custom(40));
        let hub: Hub = Hub::new();
        hub.register(&A).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(hub.read(SensorType::Custom(40), &mut buf), Err(Error::DeviceFailure));
        assert_eq!(A.read_calls(), 0);
    }

    #[test]
    fn unknown_types_are_not_found() {
        let hub: Hub = Hub::new();
        let mut buf = [0u8; 64];

        assert_eq!(hub.read(SensorType::Aht20, &mut buf), Err(Error::NotFound));
        assert_eq!(hub.init(SensorType::Aht20), Err(Error::NotFound));
        assert_eq!(hub.sample_size(SensorType::Aht20), Err(Error::NotFound));
        assert_eq!(hub.is_initialized(SensorType::Aht20), Err(Error::NotFound));
        assert_eq!(hub.registered_type_at(0), Err(Error::NotFound));
        assert_eq!(hub.read_aht20_once(), Err(Error::NotFound));
    }

    #[test]
    fn builtin_registration_tolerates_repeats() {
        static A: FakeDriver = FakeDriver::new(SensorType::Custom(50), 4, 0);
        static B: FakeDriver = FakeDriver::new(SensorType::Custom(51), 4, 0);
        let hub: Hub = Hub::new();

        assert_eq!(hub.register_builtin(&[&A, &B]), Ok(()));
        assert_eq!(hub.register_builtin(&[&A, &B]), Ok(()));
        assert_eq!(hub.registered_count(), 2);
        assert_eq!(hub.registered_type_at(0), Ok(SensorType::Custom(50)));
        assert_eq!(hub.registered_type_at(1), Ok(SensorType::Custom(51)));

        let small: Hub<1> = Hub::new();
        assert_eq!(small.register_builtin(&[&A, &B]), Err(Error::CapacityExceeded));
    }

    #[test]
    fn typed_read_checks_declared_size() {
        static INA: FakeDriver = FakeDriver::new(SensorType::Ina226, Ina226Sample::SIZE, 0);
        static AHT: FakeDriver = FakeDriver::new(SensorType::Aht20, 4, 0);
        let hub: Hub = Hub::new();
        hub.register(&INA).unwrap();
        hub.register(&AHT).unwrap();

        assert_eq!(hub.read_ina226_once(), Ok(Ina226Sample::default()));
        assert_eq!(hub.read_aht20_once(), Err(Error::InvalidArgument));
    }
}
