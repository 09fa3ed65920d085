//! Advisory cache lock (spec §9 design note: "a file lock under the cache
//! root is a reasonable addition to make the spec robust").

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Holds an advisory exclusive lock on `<dir>/.lock` for its lifetime.
///
/// Guards against two scheduler instances running concurrently against the
/// same cache directory (spec §5, "Shared resource policy": "single-writer
/// by convention").
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Block until the lock at `<dir>/.lock` is acquired.
    pub fn acquire(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(".lock");
        let file = OpenOptions::new().create(true).write(true).open(&path)?;
        file.lock_exclusive()?;
        Ok(Self { file, path })
    }

    /// Try to acquire without blocking.
    pub fn try_acquire(dir: &Path) -> io::Result<Option<Self>> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(".lock");
        let file = OpenOptions::new().create(true).write(true).open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl std::fmt::Debug for DirLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirLock").field("path", &self.path).finish()
    }
}
