use embassy_time::Instant;

use super::Device;
use crate::{
    channel::{Channel, ChannelSource},
    Driver, Error, Ina226Sample, Sample, SensorType,
};

/// INA226 bus voltage, current and power monitor.
pub struct Ina226<S> {
    device: Device<S>,
}

impl<S: ChannelSource> Ina226<S> {
    /// Creates a driver reading from `source`.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            device: Device::new(source),
        }
    }
}

impl<S: ChannelSource> Driver for Ina226<S> {
    fn sensor_type(&self) -> SensorType {
        Ina226Sample::TYPE
    }

    fn init(&self) -> Result<(), Error> {
        self.device.init()
    }

    fn sample_size(&self) -> usize {
        Ina226Sample::SIZE
    }

    fn read(&self, buf: &mut [u8]) -> Result<(), Error> {
        if buf.len() < Ina226Sample::SIZE {
            return Err(Error::BufferTooSmall);
        }

        let sample = self.device.fetch(|source| {
            Ok(Ina226Sample {
                bus_mv: source.channel(Channel::Voltage)?.to_milli(),
                current_ma: source.channel(Channel::Current)?.to_milli(),
                power_mw: source.channel(Channel::Power)?.to_milli(),
                timestamp_ms: Instant::now().as_millis(),
            })
        })?;

        sample.encode(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel::SensorValue, drivers::testing::FixedSource};

    fn source() -> FixedSource {
        FixedSource::new([
            (Channel::Voltage, SensorValue::new(12, 345_678)),
            (Channel::Current, SensorValue::new(-1, -250_000)),
            (Channel::Power, SensorValue::new(0, 999_999)),
        ])
    }

    #[test]
    fn converts_to_whole_milli_units() {
        let driver = Ina226::new(source());
        let mut buf = [0u8; Ina226Sample::SIZE];

        driver.read(&mut buf).unwrap();
        let sample = Ina226Sample::decode(&buf).unwrap();

        assert_eq!(sample.bus_mv, 12_345);
        assert_eq!(sample.current_ma, -1_250);
        assert_eq!(sample.power_mw, 999);
    }

    #[test]
    fn not_ready_device_fails() {
        let mut source = source();
        source.ready = false;
        let driver = Ina226::new(source);
        let mut buf = [0u8; Ina226Sample::SIZE];

        assert_eq!(driver.init(), Err(Error::DeviceFailure));
        assert_eq!(driver.read(&mut buf), Err(Error::DeviceFailure));
        assert_eq!(buf, [0u8; Ina226Sample::SIZE]);
    }

    #[test]
    fn short_buffer_skips_acquisition() {
        let driver = Ina226::new(source());
        let mut buf = [0u8; Ina226Sample::SIZE - 1];

        assert_eq!(driver.read(&mut buf), Err(Error::BufferTooSmall));
        let fetches = driver.device.source.try_lock().unwrap().fetches;
        assert_eq!(fetches, 0);
    }

    #[test]
    fn every_read_fetches() {
        let driver = Ina226::new(source());
        let mut buf = [0u8; 32];

        driver.read(&mut buf).unwrap();
        driver.read(&mut buf).unwrap();
        let fetches = driver.device.source.try_lock().unwrap().fetches;
        assert_eq!(fetches, 2);
    }
}
