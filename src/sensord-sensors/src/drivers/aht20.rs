use embassy_time::Instant;

use super::Device;
use crate::{
    channel::{Channel, ChannelSource},
    Aht20Sample, Driver, Error, Sample, SensorType,
};

/// AHT20 temperature and relative humidity sensor.
pub struct Aht20<S> {
    device: Device<S>,
}

impl<S: ChannelSource> Aht20<S> {
    /// Creates a driver reading from `source`.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            device: Device::new(source),
        }
    }
}

impl<S: ChannelSource> Driver for Aht20<S> {
    fn sensor_type(&self) -> SensorType {
        Aht20Sample::TYPE
    }

    fn init(&self) -> Result<(), Error> {
        self.device.init()
    }

    fn sample_size(&self) -> usize {
        Aht20Sample::SIZE
    }

    fn read(&self, buf: &mut [u8]) -> Result<(), Error> {
        if buf.len() < Aht20Sample::SIZE {
            return Err(Error::BufferTooSmall);
        }

        let sample = self.device.fetch(|source| {
            Ok(Aht20Sample {
                temp_mc: source.channel(Channel::AmbientTemp)?.to_milli(),
                rh_permille: source.channel(Channel::Humidity)?.percent_to_permille(),
                timestamp_ms: Instant::now().as_millis(),
            })
        })?;

        sample.encode(buf)
    }
}
