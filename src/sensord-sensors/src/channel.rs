//! Channel-oriented device access, the layer built-in drivers sit on.
//!
//! A [`ChannelSource`] exposes a device the way a platform sensor API does: a readiness check, a
//! fetch that latches a new measurement, and per-channel accessors returning fixed-point values.

use crate::Error;

/// Measurement channel of a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Voltage, in volts.
    Voltage,
    /// Current, in amperes.
    Current,
    /// Power, in watts.
    Power,
    /// Ambient temperature, in degrees Celsius.
    AmbientTemp,
    /// Relative humidity, in percent.
    Humidity,
}

/// Fixed-point value returned by [`ChannelSource::channel()`].
///
/// The represented value is `integer + micro / 1_000_000`; both parts carry the sign of the
/// value.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorValue {
    /// Integer part.
    pub integer: i32,
    /// Fractional part, in millionths.
    pub micro: i32,
}

impl SensorValue {
    /// Creates a new [`SensorValue`].
    #[must_use]
    pub const fn new(integer: i32, micro: i32) -> Self {
        Self { integer, micro }
    }

    /// Converts a value in base units to thousandths of that unit, truncating.
    ///
    /// ```
    /// # use sensord_sensors::channel::SensorValue;
    /// assert_eq!(SensorValue::new(12, 345_678).to_milli(), 12_345);
    /// assert_eq!(SensorValue::new(-1, -500_000).to_milli(), -1_500);
    /// ```
    #[must_use]
    pub const fn to_milli(self) -> i32 {
        self.integer.saturating_mul(1000).saturating_add(self.micro / 1000)
    }

    /// Converts a percentage to per-mille, truncating.
    ///
    /// ```
    /// # use sensord_sensors::channel::SensorValue;
    /// assert_eq!(SensorValue::new(45, 678_000).percent_to_permille(), 456);
    /// ```
    #[must_use]
    pub const fn percent_to_permille(self) -> i32 {
        self.integer.saturating_mul(10).saturating_add(self.micro / 100_000)
    }
}

/// A device exposing measurements per [`Channel`].
pub trait ChannelSource: Send {
    /// Returns whether the device is present and usable.
    fn is_ready(&mut self) -> bool;

    /// Latches a new measurement for all channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceFailure`] when the device does not answer.
    fn fetch(&mut self) -> Result<(), Error>;

    /// Returns the latched value of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the device has no such channel, or
    /// [`Error::DeviceFailure`].
    fn channel(&mut self, channel: Channel) -> Result<SensorValue, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_truncate_toward_zero() {
        assert_eq!(SensorValue::new(0, 999).to_milli(), 0);
        assert_eq!(SensorValue::new(0, -999).to_milli(), 0);
        assert_eq!(SensorValue::new(23, 456_789).to_milli(), 23_456);
        assert_eq!(SensorValue::new(100, 0).percent_to_permille(), 1000);
        assert_eq!(SensorValue::new(0, 99_999).percent_to_permille(), 0);
    }

    #[test]
    fn conversions_saturate() {
        assert_eq!(SensorValue::new(i32::MAX, 0).to_milli(), i32::MAX);
        assert_eq!(SensorValue::new(i32::MIN, 0).percent_to_permille(), i32::MIN);
    }
}
