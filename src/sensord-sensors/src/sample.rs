//! Typed samples and their byte encoding.
//!
//! The [`Hub`](crate::Hub) and the sample cache only ever see samples as byte blobs of the size
//! declared by the driver. The types in this module give those bytes a meaning: fields are
//! encoded little-endian, in declaration order, without padding.

use crate::{Error, SensorType};

/// A fixed-size sample with a byte encoding, produced by the driver of [`Sample::TYPE`].
pub trait Sample: Sized {
    /// Sensor type producing this sample.
    const TYPE: SensorType;
    /// Size of the encoded sample, in bytes.
    const SIZE: usize;

    /// Encodes the sample into the first [`Sample::SIZE`] bytes of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `buf` is shorter than [`Sample::SIZE`].
    fn encode(&self, buf: &mut [u8]) -> Result<(), Error>;

    /// Decodes a sample from the first [`Sample::SIZE`] bytes of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `buf` is shorter than [`Sample::SIZE`].
    fn decode(buf: &[u8]) -> Result<Self, Error>;
}

/// INA226 power monitor sample.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ina226Sample {
    /// Bus voltage, in millivolts.
    pub bus_mv: i32,
    /// Current, in milliamperes.
    pub current_ma: i32,
    /// Power, in milliwatts.
    pub power_mw: i32,
    /// Acquisition time, in milliseconds since boot.
    pub timestamp_ms: u64,
}

impl Sample for Ina226Sample {
    const TYPE: SensorType = SensorType::Ina226;
    const SIZE: usize = 20;

    fn encode(&self, buf: &mut [u8]) -> Result<(), Error> {
        let mut enc = Encoder::new(buf, Self::SIZE)?;
        enc.put(self.bus_mv.to_le_bytes())?;
        enc.put(self.current_ma.to_le_bytes())?;
        enc.put(self.power_mw.to_le_bytes())?;
        enc.put(self.timestamp_ms.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut dec = Decoder::new(buf, Self::SIZE)?;
        Ok(Self {
            bus_mv: i32::from_le_bytes(dec.take()?),
            current_ma: i32::from_le_bytes(dec.take()?),
            power_mw: i32::from_le_bytes(dec.take()?),
            timestamp_ms: u64::from_le_bytes(dec.take()?),
        })
    }
}

/// AHT20 temperature and humidity sample.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Aht20Sample {
    /// Temperature, in milli-degrees Celsius.
    pub temp_mc: i32,
    /// Relative humidity, in per-mille (0..=1000).
    pub rh_permille: i32,
    /// Acquisition time, in milliseconds since boot.
    pub timestamp_ms: u64,
}

impl Sample for Aht20Sample {
    const TYPE: SensorType = SensorType::Aht20;
    const SIZE: usize = 16;

    fn encode(&self, buf: &mut [u8]) -> Result<(), Error> {
        let mut enc = Encoder::new(buf, Self::SIZE)?;
        enc.put(self.temp_mc.to_le_bytes())?;
        enc.put(self.rh_permille.to_le_bytes())?;
        enc.put(self.timestamp_ms.to_le_bytes())
    }

    fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut dec = Decoder::new(buf, Self::SIZE)?;
        Ok(Self {
            temp_mc: i32::from_le_bytes(dec.take()?),
            rh_permille: i32::from_le_bytes(dec.take()?),
            timestamp_ms: u64::from_le_bytes(dec.take()?),
        })
    }
}

struct Encoder<'a> {
    buf: &'a mut [u8],
}

impl<'a> Encoder<'a> {
    fn new(buf: &'a mut [u8], size: usize) -> Result<Self, Error> {
        if buf.len() < size {
            return Err(Error::BufferTooSmall);
        }
        Ok(Self { buf })
    }

    fn put<const W: usize>(&mut self, bytes: [u8; W]) -> Result<(), Error> {
        let buf = core::mem::take(&mut self.buf);
        let (head, tail) = buf
            .split_first_chunk_mut::<W>()
            .ok_or(Error::BufferTooSmall)?;
        *head = bytes;
        self.buf = tail;
        Ok(())
    }
}

struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8], size: usize) -> Result<Self, Error> {
        if buf.len() < size {
            return Err(Error::BufferTooSmall);
        }
        Ok(Self { buf })
    }

    fn take<const W: usize>(&mut self) -> Result<[u8; W], Error> {
        let (head, tail) = self
            .buf
            .split_first_chunk::<W>()
            .ok_or(Error::BufferTooSmall)?;
        self.buf = tail;
        Ok(*head)
    }
}
