//! Provides the sensor sampling service.
//!
//! A [`SensorService`] owns one worker that, every sample period, acquires a fresh sample from
//! each driver of a [`Hub`](sensord_sensors::Hub) and caches it. Consumers read cached samples
//! with [`SensorService::get_latest()`] without ever touching the hardware. The worker also
//! logs a readable snapshot of the cache and, when persistence is enabled, appends a CSV row to
//! a file of a [`Storage`](sensord_storage::Storage).
//!
//! # Failure handling
//!
//! - A failing acquisition leaves the previous sample in the cache; failures are logged on the
//!   first of a streak and every tenth after that.
//! - A failing storage write disables persistence until the next run; sampling continues.
//!
//! # Features
//!
//! - `std`: `SensorService::run()` drives the service from a host thread, and `SystemClock`
//!   reads the host time.
//! - `defmt`: derives `defmt::Format` and routes logs to `defmt`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![deny(clippy::pedantic)]

mod clock;
mod config;
pub mod csv;
mod render;
#[cfg(any(test, feature = "std"))]
mod runner;
mod service;
mod worker;

#[cfg(any(test, feature = "std"))]
pub use clock::SystemClock;
pub use clock::{CalendarTime, Compact, WallClock};
pub use config::Config;
pub use embassy_time::{Duration, Instant};
pub use service::{RunError, SensorService};
pub use worker::Worker;
