//! Archive extraction.
//!
//! # Platform Behavior
//!
//! **Unix**: permission bits recorded in the archive are applied to files and
//! directories. **Windows**: permission bits are ignored.
//!
//! Every entry path is resolved against the output directory and rejected if
//! it would land outside of it. Directory timestamps and modes are applied
//! after the last entry, deepest first, so writing children does not disturb
//! them.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use tracing::{debug, info};

use crate::entry::{ArchiveReport, EntryKind};
use crate::error::{Error, Result};
use crate::format::{self, Detected, Format};
use crate::options::DecompressOptions;
use crate::sanitize::resolve_entry_path;
use crate::write::{CHUNK_SIZE, copy_chunked};

mod sevenz;
mod tar;
mod zip;

/// An archive member about to be materialized.
pub(crate) struct PendingEntry<'r> {
    pub path: PathBuf,
    pub kind: PendingKind,
    pub mode: Option<u32>,
    pub modified: Option<SystemTime>,
    pub reader: Option<&'r mut dyn Read>,
}

pub(crate) enum PendingKind {
    Entry(EntryKind),
    /// Hard link to an earlier member, named by its archive path.
    HardLink { target: PathBuf },
}

struct DeferredDir {
    path: PathBuf,
    mode: Option<u32>,
    modified: Option<SystemTime>,
}

/// Materializes entries below one output directory.
pub(crate) struct Extractor {
    base: PathBuf,
    deferred: Vec<DeferredDir>,
    report: ArchiveReport,
}

impl Extractor {
    pub fn new(archive: &Path, base: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            base: base.into(),
            deferred: Vec::new(),
            report: ArchiveReport::new(archive, format),
        }
    }

    pub fn place(&mut self, pending: PendingEntry<'_>) -> Result<()> {
        let target = resolve_entry_path(&pending.path, &self.base)?;
        if target == self.base {
            return Ok(());
        }
        self.check_ancestors(&pending.path, &target)?;
        debug!(entry = %pending.path.display(), "extract");

        let mut written = 0;
        match pending.kind {
            PendingKind::Entry(EntryKind::Directory) => {
                ensure_directory(&target)?;
                self.deferred.push(DeferredDir {
                    path: target,
                    mode: pending.mode,
                    modified: pending.modified,
                });
            }
            PendingKind::Entry(EntryKind::File) => {
                written = match pending.reader {
                    Some(reader) => write_file(reader, &target)?,
                    None => write_file(&mut std::io::empty(), &target)?,
                };
                apply_mode(&target, pending.mode)?;
                apply_mtime(&target, pending.modified)?;
            }
            PendingKind::Entry(EntryKind::Symlink { target: link_target }) => {
                write_symlink(&link_target, &target)?;
            }
            PendingKind::HardLink { target: original } => {
                let resolved = resolve_entry_path(&original, &self.base)?;
                // The link must name a real file below the base, not reach
                // out through an extracted symlink.
                self.check_ancestors(&original, &resolved)?;
                if std::fs::symlink_metadata(&resolved).is_ok_and(|m| m.file_type().is_symlink()) {
                    return Err(Error::UnsafeEntryPath { entry: original });
                }
                let original = resolved;
                prepare_parent(&target)?;
                remove_existing(&target)?;
                std::fs::hard_link(&original, &target).map_err(|e| Error::ExtractionFailed {
                    path: target.clone(),
                    source: e,
                })?;
            }
        }

        self.report.record(written);
        Ok(())
    }

    /// Refuse to write through a symlink created by an earlier entry.
    fn check_ancestors(&self, entry: &Path, target: &Path) -> Result<()> {
        let mut current = target.parent();
        while let Some(dir) = current {
            if dir == self.base || !dir.starts_with(&self.base) {
                break;
            }
            if let Ok(meta) = std::fs::symlink_metadata(dir) {
                if meta.file_type().is_symlink() {
                    return Err(Error::UnsafeEntryPath {
                        entry: entry.to_path_buf(),
                    });
                }
            }
            current = dir.parent();
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<ArchiveReport> {
        self.deferred
            .sort_by_key(|dir| std::cmp::Reverse(dir.path.components().count()));
        for dir in &self.deferred {
            apply_mode(&dir.path, dir.mode)?;
            apply_mtime(&dir.path, dir.modified)?;
        }
        Ok(self.report)
    }
}

/// Extract `archive` below `options.out_dir`, sniffing the format from its
/// leading bytes.
pub fn decompress(archive: impl AsRef<Path>, options: &DecompressOptions) -> Result<ArchiveReport> {
    let archive = archive.as_ref();
    check_archive(archive)?;

    let detected = {
        let mut file = File::open(archive)?;
        format::detect_from_reader(&mut file)?.ok_or(Error::UnsupportedFormat)?
    };

    let out_dir = options.out_dir_or_current();
    std::fs::create_dir_all(&out_dir).map_err(|e| Error::DirectoryCreationFailed {
        path: out_dir.clone(),
        source: e,
    })?;

    info!(
        archive = %archive.display(),
        out_dir = %out_dir.display(),
        format = ?detected,
        "extracting"
    );
    let password = options.password_str();
    let report = match detected {
        Detected::Zip => zip::extract(archive, &out_dir, password)?,
        Detected::SevenZip => sevenz::extract(archive, &out_dir, password)?,
        Detected::Tar(filter) => {
            if password.is_some() {
                debug!("tar archives are never encrypted, ignoring password");
            }
            let file = BufReader::with_capacity(CHUNK_SIZE, File::open(archive)?);
            tar::extract(archive, file, filter, &out_dir)?
        }
    };

    info!(
        archive = %archive.display(),
        entries = report.entry_count,
        bytes = report.total_bytes,
        "extracted"
    );
    Ok(report)
}

/// Fail unless `path` exists and is a regular file.
pub fn check_archive(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::ArchiveNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(Error::ArchiveNotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn prepare_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Remove a file or link occupying `target`; directories are left alone.
fn remove_existing(target: &Path) -> Result<()> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if !meta.is_dir() => std::fs::remove_file(target).map_err(|e| {
            Error::ExtractionFailed {
                path: target.to_path_buf(),
                source: e,
            }
        }),
        _ => Ok(()),
    }
}

fn write_file(reader: &mut dyn Read, target: &Path) -> Result<u64> {
    prepare_parent(target)?;
    remove_existing(target)?;
    let mut file = File::create(target).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;
    Ok(copy_chunked(reader, &mut file)?)
}

fn ensure_directory(path: &Path) -> Result<()> {
    // A symlink standing where a directory belongs is replaced, not followed.
    let is_real_dir = std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir());
    if !is_real_dir {
        remove_existing(path)?;
        std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn write_symlink(link_target: &Path, link: &Path) -> Result<()> {
    prepare_parent(link)?;
    remove_existing(link)?;
    std::os::unix::fs::symlink(link_target, link).map_err(|e| Error::ExtractionFailed {
        path: link.to_path_buf(),
        source: e,
    })
}

#[cfg(windows)]
fn write_symlink(link_target: &Path, link: &Path) -> Result<()> {
    use std::os::windows::fs;
    prepare_parent(link)?;
    remove_existing(link)?;
    let resolved = link.parent().map(|p| p.join(link_target));
    let result = if resolved.is_some_and(|p| p.is_dir()) {
        fs::symlink_dir(link_target, link)
    } else {
        fs::symlink_file(link_target, link)
    };
    result.map_err(|e| Error::ExtractionFailed {
        path: link.to_path_buf(),
        source: e,
    })
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

fn apply_mtime(path: &Path, modified: Option<SystemTime>) -> Result<()> {
    if let Some(modified) = modified {
        filetime::set_file_mtime(path, FileTime::from_system_time(modified))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pending<'r>(path: &str, kind: EntryKind, reader: Option<&'r mut dyn Read>) -> PendingEntry<'r> {
        PendingEntry {
            path: PathBuf::from(path),
            kind: PendingKind::Entry(kind),
            mode: None,
            modified: None,
            reader,
        }
    }

    #[test]
    fn missing_archive() {
        let dir = tempdir().unwrap();
        let err = decompress(dir.path().join("nope.zip"), &DecompressOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotFound { .. }));
        assert_eq!(
            err.to_string(),
            format!("the file does not exist: '{}'", dir.path().join("nope.zip").display())
        );
    }

    #[test]
    fn directory_is_not_an_archive() {
        let dir = tempdir().unwrap();
        let err = decompress(dir.path(), &DecompressOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotAFile { .. }));
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("junk.bin");
        std::fs::write(&file, [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let options = DecompressOptions::default().out_dir(dir.path().join("out"));
        assert!(matches!(decompress(&file, &options), Err(Error::UnsupportedFormat)));
    }

    #[test]
    fn extractor_creates_parents_and_counts_bytes() {
        let dir = tempdir().unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        let mut data: &[u8] = b"hello";
        extractor
            .place(pending("x/y/z.txt", EntryKind::File, Some(&mut data)))
            .unwrap();
        let report = extractor.finish().unwrap();

        assert_eq!(std::fs::read(dir.path().join("x/y/z.txt")).unwrap(), b"hello");
        assert_eq!(report.entry_count, 1);
        assert_eq!(report.total_bytes, 5);
    }

    #[test]
    fn extractor_rejects_escape() {
        let dir = tempdir().unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        let mut data: &[u8] = b"evil";
        let err = extractor
            .place(pending("../evil.txt", EntryKind::File, Some(&mut data)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeEntryPath { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn extractor_refuses_to_write_through_symlink() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        extractor
            .place(pending(
                "link",
                EntryKind::Symlink {
                    target: outside.path().to_path_buf(),
                },
                None,
            ))
            .unwrap();

        let mut data: &[u8] = b"evil";
        let err = extractor
            .place(pending("link/evil.txt", EntryKind::File, Some(&mut data)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeEntryPath { .. }));
        assert!(!outside.path().join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn hard_link_through_symlink_is_rejected() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), "outside data").unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        extractor
            .place(pending(
                "esc",
                EntryKind::Symlink {
                    target: outside.path().to_path_buf(),
                },
                None,
            ))
            .unwrap();

        let err = extractor
            .place(PendingEntry {
                path: PathBuf::from("grab"),
                kind: PendingKind::HardLink {
                    target: PathBuf::from("esc/secret"),
                },
                mode: None,
                modified: None,
                reader: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeEntryPath { .. }));
        assert!(std::fs::symlink_metadata(dir.path().join("grab")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn hard_link_to_symlink_is_rejected() {
        let dir = tempdir().unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        extractor
            .place(pending(
                "alias",
                EntryKind::Symlink {
                    target: PathBuf::from("/etc/passwd"),
                },
                None,
            ))
            .unwrap();

        let err = extractor
            .place(PendingEntry {
                path: PathBuf::from("grab"),
                kind: PendingKind::HardLink {
                    target: PathBuf::from("alias"),
                },
                mode: None,
                modified: None,
                reader: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeEntryPath { .. }));
    }

    #[test]
    fn hard_link_to_earlier_file() {
        let dir = tempdir().unwrap();
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        let mut data: &[u8] = b"shared";
        extractor
            .place(pending("a/orig.txt", EntryKind::File, Some(&mut data)))
            .unwrap();
        extractor
            .place(PendingEntry {
                path: PathBuf::from("b/copy.txt"),
                kind: PendingKind::HardLink {
                    target: PathBuf::from("a/orig.txt"),
                },
                mode: None,
                modified: None,
                reader: None,
            })
            .unwrap();
        extractor.finish().unwrap();
        assert_eq!(std::fs::read(dir.path().join("b/copy.txt")).unwrap(), b"shared");
    }

    #[test]
    fn directory_times_applied_at_finish() {
        let dir = tempdir().unwrap();
        let stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        let mut extractor = Extractor::new(Path::new("a.tar"), dir.path(), Format::Tar);
        extractor
            .place(PendingEntry {
                path: PathBuf::from("d"),
                kind: PendingKind::Entry(EntryKind::Directory),
                mode: None,
                modified: Some(stamp),
                reader: None,
            })
            .unwrap();
        let mut data: &[u8] = b"child";
        extractor
            .place(pending("d/child.txt", EntryKind::File, Some(&mut data)))
            .unwrap();
        extractor.finish().unwrap();

        let meta = std::fs::metadata(dir.path().join("d")).unwrap();
        assert_eq!(meta.modified().unwrap(), stamp);
    }
}
