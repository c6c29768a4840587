//! sensord keeps the freshest sample of every sensor of a board available, and logs a subset of
//! them to removable storage.
//!
//! The pieces, from the bottom up:
//!
//! - [`sensors`]: the [`Driver`](sensors::Driver) trait, the built-in drivers and the
//!   [`Hub`](sensors::Hub) registry;
//! - [`storage`]: the [`Storage`](storage::Storage) file abstraction;
//! - [`service`]: the [`SensorService`](service::SensorService) sampling the hub, caching
//!   samples and persisting them as CSV;
//! - [`log`]: the log macros and the [`Logger`](log::Logger) sink.
//!
//! # Examples
//!
//! The application owns every component, typically in `static` items:
//!
//! ```
//! use sensord::{
//!     log::SystemLogger,
//!     sensors::{Hub, SensorType},
//!     service::{Config, SensorService},
//! };
//!
//! static HUB: Hub = Hub::new();
//! static LOG: SystemLogger = SystemLogger::new();
//! static SERVICE: SensorService = SensorService::new(&HUB, &LOG, Config::new());
//!
//! // Register drivers into `HUB` here, then start `SERVICE`.
//! let mut buf = [0u8; 20];
//! assert!(SERVICE.get_latest(SensorType::Ina226, &mut buf).is_err());
//! ```
//!
//! # Cargo features
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]
#![no_std]
#![deny(missing_docs)]

#[doc(inline)]
pub use sensord_log as log;
#[doc(inline)]
pub use sensord_sensors as sensors;
#[doc(inline)]
pub use sensord_service as service;
#[doc(inline)]
pub use sensord_storage as storage;

pub use static_cell::{ConstStaticCell, StaticCell};

/// Third party crates as used by sensord.
pub mod reexports {
    pub use static_cell;
}
