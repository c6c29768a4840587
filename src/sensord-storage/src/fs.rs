use std::{
    fs::OpenOptions,
    io::{self, Read, Write},
    path::{Component, Path, PathBuf},
};

use portable_atomic::{AtomicBool, Ordering};

use crate::{Error, Storage, WriteMode, MOUNT_POINT};

/// [`Storage`] backed by a host directory standing in for the [`MOUNT_POINT`].
///
/// `/SD:/logs/a.csv` maps to `<root>/logs/a.csv`. The storage must be [mounted](Self::mount)
/// before use.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    mounted: AtomicBool,
}

impl FsStorage {
    /// Creates an unmounted storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: AtomicBool::new(false),
        }
    }

    /// Mounts the storage, creating the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the root directory cannot be created.
    pub fn mount(&self) -> Result<(), Error> {
        std::fs::create_dir_all(&self.root).map_err(|err| io_error(&err))?;
        self.mounted.store(true, Ordering::Release);
        sensord_log::info!("storage: mounted {}", MOUNT_POINT);
        Ok(())
    }

    /// Unmounts the storage. Further accesses fail with [`Error::NotMounted`].
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// Returns whether the storage is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Reads the whole file at `path` into `buf`, returning the number of bytes read.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`], [`Error::NotMounted`] as for [`Storage::write()`].
    /// - [`Error::NotFound`] if the file does not exist.
    /// - [`Error::BufferTooSmall`] if the file is larger than `buf`.
    /// - [`Error::Io`] on any other failure.
    pub fn read(&self, path: &str, buf: &mut [u8]) -> Result<usize, Error> {
        let host_path = self.host_path(path)?;

        let mut file = std::fs::File::open(host_path).map_err(|err| io_error(&err))?;
        let len = file.metadata().map_err(|err| io_error(&err))?.len();
        let len = usize::try_from(len).map_err(|_| Error::BufferTooSmall)?;

        let dest = buf.get_mut(..len).ok_or(Error::BufferTooSmall)?;
        file.read_exact(dest).map_err(|err| io_error(&err))?;
        Ok(len)
    }

    fn host_path(&self, path: &str) -> Result<PathBuf, Error> {
        let relative = path
            .strip_prefix(MOUNT_POINT)
            .ok_or(Error::InvalidArgument)?
            .trim_start_matches('/');

        if relative.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if !Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(Error::InvalidArgument);
        }
        if !self.is_mounted() {
            return Err(Error::NotMounted);
        }

        Ok(self.root.join(relative))
    }
}

impl Storage for FsStorage {
    fn write(&self, path: &str, data: &[u8], mode: WriteMode) -> Result<(), Error> {
        let host_path = self.host_path(path)?;

        if let Some(parent) = host_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| io_error(&err))?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.write(true).truncate(true),
        };

        let mut file = options.open(host_path).map_err(|err| io_error(&err))?;
        file.write_all(data).map_err(|err| io_error(&err))
    }
}

fn io_error(err: &io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound,
        _ => Error::Io,
    }
}

#[cfg(test)]
mod tests {
    use portable_atomic::AtomicUsize;

    use super::*;

    fn temp_root() -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("sensord-storage-{}-{n}", std::process::id()))
    }

    #[test]
    fn writes_before_mount_fail() {
        let storage = FsStorage::new(temp_root());
        assert_eq!(
            storage.write("/SD:/a.csv", b"x", WriteMode::Append),
            Err(Error::NotMounted)
        );
    }

    #[test]
    fn truncate_then_append() {
        let storage = FsStorage::new(temp_root());
        storage.mount().unwrap();

        storage.write("/SD:/SENS.csv", b"header\n", WriteMode::Truncate).unwrap();
        storage.write("/SD:/SENS.csv", b"row1\n", WriteMode::Append).unwrap();
        storage.write("/SD:/SENS.csv", b"row2\n", WriteMode::Append).unwrap();

        let mut buf = [0u8; 64];
        let len = storage.read("/SD:/SENS.csv", &mut buf).unwrap();
        assert_eq!(buf.get(..len), Some(&b"header\nrow1\nrow2\n"[..]));

        storage.write("/SD:/SENS.csv", b"fresh\n", WriteMode::Truncate).unwrap();
        let len = storage.read("/SD:/SENS.csv", &mut buf).unwrap();
        assert_eq!(buf.get(..len), Some(&b"fresh\n"[..]));
    }

    #[test]
    fn creates_subdirectories() {
        let root = temp_root();
        let storage = FsStorage::new(&root);
        storage.mount().unwrap();

        storage.write("/SD:/logs/day1/a.csv", b"1", WriteMode::Append).unwrap();
        assert!(root.join("logs/day1/a.csv").is_file());
    }

    #[test]
    fn rejects_bad_paths() {
        let storage = FsStorage::new(temp_root());
        storage.mount().unwrap();

        for path in ["", "/SD:", "/SD:/", "/tmp/a.csv", "/SD:/../escape.csv"] {
            assert_eq!(
                storage.write(path, b"x", WriteMode::Append),
                Err(Error::InvalidArgument),
                "{path}"
            );
        }
    }

    #[test]
    fn read_reports_missing_and_oversized_files() {
        let storage = FsStorage::new(temp_root());
        storage.mount().unwrap();
        let mut small = [0u8; 2];

        assert_eq!(storage.read("/SD:/none.csv", &mut small), Err(Error::NotFound));

        storage.write("/SD:/big.csv", b"abc", WriteMode::Truncate).unwrap();
        assert_eq!(storage.read("/SD:/big.csv", &mut small), Err(Error::BufferTooSmall));
    }

    #[test]
    fn unmount_blocks_access() {
        let storage = FsStorage::new(temp_root());
        storage.mount().unwrap();
        storage.unmount();

        assert!(!storage.is_mounted());
        assert_eq!(
            storage.write("/SD:/a.csv", b"x", WriteMode::Append),
            Err(Error::NotMounted)
        );
    }
}
