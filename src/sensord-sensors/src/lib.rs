//! Provides the sensor driver abstraction and the [`Hub`] registry.
//!
//! Devices implement the [`Driver`] trait and are registered into a [`Hub`], which maps each
//! [`SensorType`] to its driver and initializes drivers on first use. Samples are handled as
//! opaque byte blobs of the size declared by the driver; the [`Sample`] trait gives them a
//! typed view.
//!
//! The built-in [`drivers`] for the INA226 and the AHT20 sit on top of the
//! [`channel::ChannelSource`] abstraction.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(clippy::pedantic)]

pub mod channel;
mod driver;
pub mod drivers;
mod error;
mod hub;
mod sample;
mod sensor_type;

pub use driver::Driver;
pub use error::Error;
pub use hub::{Hub, MAX_DRIVERS, MAX_SAMPLE_SIZE};
pub use sample::{Aht20Sample, Ina226Sample, Sample};
pub use sensor_type::SensorType;
