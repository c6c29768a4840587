//! Channel sources standing in for the sensor bus.

use sensord::sensors::{
    channel::{Channel, ChannelSource, SensorValue},
    Error,
};

/// Converts thousandths into a [`SensorValue`].
fn from_milli(milli: i32) -> SensorValue {
    SensorValue::new(milli / 1000, (milli % 1000) * 1000)
}

/// Triangle wave in `0..=period / 2`.
fn triangle(tick: u32, period: u32) -> i32 {
    let phase = tick % period;
    let half = period / 2;
    let value = if phase <= half { phase } else { period - phase };
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A 12 V rail with a slowly varying load.
pub struct Rail {
    tick: u32,
}

impl Rail {
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    fn bus_mv(&self) -> i32 {
        11_950 + triangle(self.tick, 20) * 10
    }

    fn current_ma(&self) -> i32 {
        120 + triangle(self.tick, 14) * 15
    }
}

impl ChannelSource for Rail {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn fetch(&mut self) -> Result<(), Error> {
        self.tick = self.tick.wrapping_add(1);
        Ok(())
    }

    fn channel(&mut self, channel: Channel) -> Result<SensorValue, Error> {
        match channel {
            Channel::Voltage => Ok(from_milli(self.bus_mv())),
            Channel::Current => Ok(from_milli(self.current_ma())),
            Channel::Power => Ok(from_milli(self.bus_mv() * self.current_ma() / 1000)),
            _ => Err(Error::NotFound),
        }
    }
}

/// A room climate sensor that misses every `dropout`-th measurement.
pub struct Climate {
    tick: u32,
    dropout: u32,
}

impl Climate {
    pub const fn new(dropout: u32) -> Self {
        Self { tick: 0, dropout }
    }
}

impl ChannelSource for Climate {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn fetch(&mut self) -> Result<(), Error> {
        self.tick = self.tick.wrapping_add(1);
        if self.dropout != 0 && self.tick % self.dropout == 0 {
            return Err(Error::DeviceFailure);
        }
        Ok(())
    }

    fn channel(&mut self, channel: Channel) -> Result<SensorValue, Error> {
        match channel {
            Channel::AmbientTemp => Ok(from_milli(21_000 + triangle(self.tick, 60) * 50)),
            // Percent, as micro-units of a percent.
            Channel::Humidity => Ok(SensorValue::new(40 + triangle(self.tick, 40), 500_000)),
            _ => Err(Error::NotFound),
        }
    }
}
