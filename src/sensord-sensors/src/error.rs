/// Errors returned by sensor drivers, the [`Hub`](crate::Hub) and the sample cache built on top
/// of it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A driver for this sensor type is already registered.
    AlreadyRegistered,
    /// A fixed-capacity table is full, or a sample does not fit its slot.
    CapacityExceeded,
    /// No driver (or cache entry) exists for this sensor type or index.
    NotFound,
    /// The provided buffer is shorter than the sample size.
    BufferTooSmall,
    /// The device is absent, not ready, or failed during acquisition.
    DeviceFailure,
    /// No valid sample has been obtained yet, or the device is busy with another acquisition.
    NotReady,
    /// An argument was rejected.
    InvalidArgument,
}

impl Error {
    /// Returns the negative errno-style code of this error, as passed to
    /// [`Logger::error()`](sensord_log::Logger::error).
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::AlreadyRegistered => -114, // EALREADY
            Self::CapacityExceeded => -28,   // ENOSPC
            Self::NotFound => -2,            // ENOENT
            Self::BufferTooSmall => -105,    // ENOBUFS
            Self::DeviceFailure => -19,      // ENODEV
            Self::NotReady => -11,           // EAGAIN
            Self::InvalidArgument => -22,    // EINVAL
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(f, "sensor type already registered"),
            Self::CapacityExceeded => write!(f, "capacity exceeded"),
            Self::NotFound => write!(f, "sensor type not found"),
            Self::BufferTooSmall => write!(f, "buffer too small for sample"),
            Self::DeviceFailure => write!(f, "sensor device failure"),
            Self::NotReady => write!(f, "no valid sample yet"),
            Self::InvalidArgument => write!(f, "invalid argument"),
        }
    }
}

impl core::error::Error for Error {}
