//! Atomic directory replacement (spec §4.2: "rename when possible;
//! recursive copy+delete as fallback").

use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Move `src` into place at `dest`, replacing whatever is there.
///
/// Leaves `dest` in one of two states: fully populated with `src`'s tree
/// (success) or untouched (failure). Tries a same-filesystem rename first;
/// on `EXDEV` (cross-device) it falls back to a recursive copy followed by
/// removal of `src`. `dest`'s prior contents, if any, are moved aside to a
/// sibling path and removed only after the replacement has landed, so a
/// crash mid-operation never leaves `dest` empty.
pub fn replace_dir(src: &Path, dest: &Path) -> io::Result<()> {
    if !dest.exists() {
        return rename_or_copy(src, dest);
    }

    let staging_old = sibling_path(dest, "old");
    if staging_old.exists() {
        std::fs::remove_dir_all(&staging_old)?;
    }
    std::fs::rename(dest, &staging_old)?;

    match rename_or_copy(src, dest) {
        Ok(()) => {
            if let Err(e) = std::fs::remove_dir_all(&staging_old) {
                warn!(path = %staging_old.display(), error = %e, "failed to clean up previous cache contents");
            }
            Ok(())
        }
        Err(e) => {
            // Restore the prior contents so `dest` never observes a
            // partial write (spec §4.2 guarantee).
            if dest.exists() {
                let _ = std::fs::remove_dir_all(dest);
            }
            std::fs::rename(&staging_old, dest)?;
            Err(e)
        }
    }
}

fn rename_or_copy(src: &Path, dest: &Path) -> io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc_exdev()) => {
            debug!(src = %src.display(), dest = %dest.display(), "cross-device rename, falling back to copy");
            copy_dir_recursive(src, dest)?;
            std::fs::remove_dir_all(src)?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
const fn libc_exdev() -> i32 {
    18 // EXDEV
}

#[cfg(windows)]
const fn libc_exdev() -> i32 {
    17 // ERROR_NOT_SAME_DEVICE
}

#[cfg(not(any(unix, windows)))]
const fn libc_exdev() -> i32 {
    i32::MIN
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry.path().strip_prefix(src).expect("walkdir yields children of src");
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{suffix}"));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_empty_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("new.txt"), b"new").unwrap();
        let dest = dir.path().join("dest");

        replace_dir(&src, &dest).unwrap();
        assert!(dest.join("new.txt").exists());
        assert!(!src.exists());
    }

    #[test]
    fn replaces_existing_destination_and_removes_old_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("old.txt"), b"old").unwrap();

        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("new.txt"), b"new").unwrap();

        replace_dir(&src, &dest).unwrap();

        assert!(dest.join("new.txt").exists());
        assert!(!dest.join("old.txt").exists());
    }
}
