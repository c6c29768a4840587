/// Identifies a kind of sensor device.
///
/// This is the key drivers are registered under in the [`Hub`](crate::Hub), and the key cached
/// samples are looked up by.
///
/// # For sensor driver implementors
///
/// Devices without a dedicated variant use [`SensorType::Custom`]; the number only has to be
/// unique among the custom devices of a board.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorType {
    /// INA226 bus voltage, current and power monitor.
    Ina226,
    /// AHT20 temperature and relative humidity sensor.
    Aht20,
    /// Board- or application-specific device.
    Custom(u8),
}

impl core::fmt::Display for SensorType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ina226 => write!(f, "INA226"),
            Self::Aht20 => write!(f, "AHT20"),
            Self::Custom(id) => write!(f, "custom#{id}"),
        }
    }
}
