//! Provides byte-oriented file storage.
//!
//! Services write through the [`Storage`] trait, addressing files by absolute paths below a
//! mount point such as [`MOUNT_POINT`]. With the `std` feature, `FsStorage` backs the mount
//! point with a host directory.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![deny(clippy::pedantic)]

#[cfg(any(test, feature = "std"))]
mod fs;

#[cfg(any(test, feature = "std"))]
pub use fs::FsStorage;

/// Mount point of the removable storage.
pub const MOUNT_POINT: &str = "/SD:";

/// How [`Storage::write()`] treats existing file contents.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    /// Adds the data at the end of the file, creating it if needed.
    Append,
    /// Replaces the file contents with the data, creating it if needed.
    Truncate,
}

/// Storage errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The medium is not mounted.
    NotMounted,
    /// The path is empty or outside of the mount point.
    InvalidArgument,
    /// The file does not exist.
    NotFound,
    /// The provided buffer cannot hold the file contents.
    BufferTooSmall,
    /// The medium reported an I/O error.
    Io,
}

impl Error {
    /// Returns the negative errno-style code of this error.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::NotMounted => -13,      // EACCES
            Self::InvalidArgument => -22, // EINVAL
            Self::NotFound => -2,         // ENOENT
            Self::BufferTooSmall => -105, // ENOBUFS
            Self::Io => -5,               // EIO
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMounted => write!(f, "storage not mounted"),
            Self::InvalidArgument => write!(f, "invalid path"),
            Self::NotFound => write!(f, "file not found"),
            Self::BufferTooSmall => write!(f, "buffer too small for file"),
            Self::Io => write!(f, "storage I/O error"),
        }
    }
}

impl core::error::Error for Error {}

/// A byte-oriented file store.
///
/// Implementations serialize concurrent writes themselves; callers may share a single
/// `&'static dyn Storage`.
pub trait Storage: Send + Sync {
    /// Writes `data` to the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `path` is empty or not below the mount point.
    /// - [`Error::NotMounted`] if the medium is not mounted.
    /// - [`Error::Io`] on a medium failure.
    fn write(&self, path: &str, data: &[u8], mode: WriteMode) -> Result<(), Error>;
}
