//! Cross-platform filesystem primitives used by the cache and watch engine.
//!
//! Keeps the "atomic rename, copy+delete fallback" and "advisory file lock"
//! logic in one place so `antelope-cache` doesn't need to special-case
//! platforms itself.

pub mod atomic;
pub mod lock;
pub mod tempdir;

pub use atomic::replace_dir;
pub use lock::DirLock;
pub use tempdir::scoped_temp_dir;
