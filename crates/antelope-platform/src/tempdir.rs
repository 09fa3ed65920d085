//! Process-scoped temporary directory allocation (spec §4.2 `getTemp()`).

use std::io;
use tempfile::TempDir;

/// Create a fresh temporary directory under the OS temp root, scoped to
/// this process (dropped/cleaned up when the returned `TempDir` is
/// dropped).
pub fn scoped_temp_dir(prefix: &str) -> io::Result<TempDir> {
    tempfile::Builder::new().prefix(prefix).tempdir()
}
