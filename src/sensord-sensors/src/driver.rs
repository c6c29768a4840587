use crate::{Error, SensorType};

/// Represents a device providing sensor samples.
///
/// Drivers are usually `static` singletons shared between the code registering them and the
/// thread polling them, hence `&self` receivers and the `Send + Sync` bound. The trait is
/// object-safe: the [`Hub`](crate::Hub) stores `&'static dyn Driver`.
pub trait Driver: Send + Sync {
    /// Returns the sensor type this driver serves.
    fn sensor_type(&self) -> SensorType;

    /// Prepares the device for acquisition.
    ///
    /// Must be idempotent: once this succeeded, further calls return `Ok(())` without touching
    /// the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceFailure`] when the device is absent or not ready.
    fn init(&self) -> Result<(), Error>;

    /// Returns the size in bytes of a sample of this driver.
    ///
    /// This must be constant for a given driver.
    fn sample_size(&self) -> usize;

    /// Acquires a fresh sample and encodes it into the first
    /// [`sample_size()`](Driver::sample_size) bytes of `buf`.
    ///
    /// Samples are never cached by drivers: every call performs an acquisition.
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] when `buf` is shorter than the sample size.
    /// - [`Error::DeviceFailure`] on a hardware fault.
    fn read(&self, buf: &mut [u8]) -> Result<(), Error>;
}
