//! Extraction for package-source archives fetched by `antelope-registry`.
//!
//! Supports the formats a package registry realistically serves: zip, plain
//! tar, and gzipped tar. 7z/rar/xz/bz2 are not needed by any `ModuleSource`
//! variant in scope and were dropped.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unrecognized archive format for {0}")]
    UnknownFormat(PathBuf),
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt archive {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// Extracts an archive into `dest`, creating it if necessary.
///
/// A single top-level directory inside the archive (the common npm-style
/// `package/` wrapper) is stripped automatically so `dest` ends up holding
/// the module's own files directly.
pub fn extract(archive: &Path, dest: &Path) -> Result<ExtractionReport> {
    let format = archive
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(ArchiveFormat::from_filename)
        .ok_or_else(|| ArchiveError::UnknownFormat(archive.to_path_buf()))?;

    std::fs::create_dir_all(dest).map_err(|source| ArchiveError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    debug!(archive = %archive.display(), dest = %dest.display(), ?format, "extracting archive");

    let staged = match format {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::Tar => extract_tar_reader(open(archive)?, dest)?,
        ArchiveFormat::TarGz => extract_tar_reader(flate2::read::GzDecoder::new(open(archive)?), dest)?,
    };

    strip_single_root(dest)?;

    Ok(ExtractionReport {
        files_extracted: staged,
    })
}

#[derive(Debug)]
pub struct ExtractionReport {
    pub files_extracted: usize,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<usize> {
    let file = open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| ArchiveError::Corrupt {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| ArchiveError::Corrupt {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| ArchiveError::Io {
                path: out_path.clone(),
                source,
            })?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let mut out_file = File::create(&out_path).map_err(|source| ArchiveError::Io {
                path: out_path.clone(),
                source,
            })?;
            std::io::copy(&mut entry, &mut out_file).map_err(|source| ArchiveError::Io {
                path: out_path.clone(),
                source,
            })?;
            count += 1;
        }
    }
    Ok(count)
}

fn extract_tar_reader<R: Read>(reader: R, dest: &Path) -> Result<usize> {
    let mut archive = tar::Archive::new(reader);
    let mut count = 0;
    for entry in archive.entries().map_err(|source| ArchiveError::Io {
        path: dest.to_path_buf(),
        source,
    })? {
        let mut entry = entry.map_err(|source| ArchiveError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        let path = entry
            .path()
            .map_err(|source| ArchiveError::Io {
                path: dest.to_path_buf(),
                source,
            })?
            .into_owned();
        let out_path = dest.join(&path);
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| ArchiveError::Io {
                path: out_path.clone(),
                source,
            })?;
        } else if entry_type.is_file() {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            entry.unpack(&out_path).map_err(|source| ArchiveError::Io {
                path: out_path.clone(),
                source,
            })?;
            count += 1;
        }
    }
    Ok(count)
}

/// If `dest` contains exactly one top-level directory, hoist its contents
/// up and remove the wrapper (npm tarballs wrap everything in `package/`).
fn strip_single_root(dest: &Path) -> Result<()> {
    let entries: Vec<_> = WalkDir::new(dest)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .collect();

    if entries.len() != 1 || !entries[0].file_type().is_dir() {
        return Ok(());
    }
    let root = entries[0].path().to_path_buf();

    for entry in std::fs::read_dir(&root).map_err(|source| ArchiveError::Io {
        path: root.clone(),
        source,
    })? {
        let entry = entry.map_err(|source| ArchiveError::Io {
            path: root.clone(),
            source,
        })?;
        let target = dest.join(entry.file_name());
        std::fs::rename(entry.path(), &target).map_err(|source| ArchiveError::Io {
            path: target,
            source,
        })?;
    }
    std::fs::remove_dir(&root).map_err(|source| ArchiveError::Io {
        path: root,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip_with_wrapper(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("package/index.js", opts).unwrap();
        zip.write_all(b"module.exports = 1;").unwrap();
        zip.start_file("package/manifest.json", opts).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(ArchiveFormat::from_filename("x.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_filename("x.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_filename("x.tgz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_filename("x.tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_filename("x.rar"), None);
    }

    #[test]
    fn extracts_zip_and_strips_single_wrapper_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("pkg.zip");
        write_zip_with_wrapper(&archive_path);

        let dest = dir.path().join("out");
        let report = extract(&archive_path, &dest).unwrap();

        assert_eq!(report.files_extracted, 2);
        assert!(dest.join("index.js").exists());
        assert!(dest.join("manifest.json").exists());
        assert!(!dest.join("package").exists());
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("pkg.7z");
        std::fs::write(&archive_path, b"junk").unwrap();
        let err = extract(&archive_path, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownFormat(_)));
    }
}
