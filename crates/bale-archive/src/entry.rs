use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::collect::SourceRoot;
use crate::error::Result;
use crate::format::Format;

/// One filesystem object headed for an archive.
#[derive(Clone, Debug)]
pub struct EntryMeta {
    /// Archive path, always `/`-separated and relative.
    pub name: String,
    pub disk_path: PathBuf,
    pub kind: EntryKind,
    pub metadata: Metadata,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink { target: PathBuf },
}

impl EntryMeta {
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::File => self.metadata.len(),
            _ => 0,
        }
    }

    /// Permission bits, without the file type bits.
    #[cfg(unix)]
    pub fn mode(&self) -> Option<u32> {
        use std::os::unix::fs::PermissionsExt;
        Some(self.metadata.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    pub fn mode(&self) -> Option<u32> {
        None
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.metadata.modified().ok()
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

/// Summary of one compress or decompress call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveReport {
    pub archive: PathBuf,
    pub format: Format,
    pub entry_count: usize,
    pub total_bytes: u64,
}

impl ArchiveReport {
    pub fn new(archive: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            archive: archive.into(),
            format,
            entry_count: 0,
            total_bytes: 0,
        }
    }

    pub(crate) fn record(&mut self, bytes: u64) {
        self.entry_count += 1;
        self.total_bytes += bytes;
    }
}

/// Join an archive root name and a path relative to it with `/` separators.
pub fn entry_name(root: &Path, relative: &Path) -> String {
    root.join(relative)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursively walk a source root, yielding entries in a stable order.
///
/// Symlinks below the root are reported as links and never followed; a root
/// that is itself a link is stored as its target. `skip` names a path
/// (typically the archive being written) that must not be collected.
pub fn walk<'a>(
    root: &'a SourceRoot,
    skip: Option<&'a Path>,
) -> impl Iterator<Item = Result<EntryMeta>> + 'a {
    let disk_root = root.disk_path();
    let canonical_root = std::fs::canonicalize(&disk_root).ok();

    walkdir::WalkDir::new(&disk_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |dent| {
            let dent = match dent {
                Ok(dent) => dent,
                Err(e) => return Some(Err(e.into())),
            };
            let relative = dent.path().strip_prefix(&disk_root).unwrap_or(Path::new(""));

            if let (Some(skip), Some(canonical_root)) = (skip, &canonical_root) {
                if canonical_root.join(relative) == skip {
                    return None;
                }
            }

            // The walk descends through a linked root, so it is stored as
            // what it points to rather than as a link.
            let metadata: Result<Metadata> = if dent.depth() == 0 && dent.path_is_symlink() {
                std::fs::metadata(dent.path()).map_err(Into::into)
            } else {
                dent.metadata().map_err(Into::into)
            };
            let metadata = match metadata {
                Ok(m) => m,
                Err(e) => return Some(Err(e)),
            };
            let file_type = metadata.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_symlink() {
                match std::fs::read_link(dent.path()) {
                    Ok(target) => EntryKind::Symlink { target },
                    Err(e) => return Some(Err(e.into())),
                }
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                warn!(path = %dent.path().display(), "skipping special file");
                return None;
            };

            Some(Ok(EntryMeta {
                name: entry_name(&root.name, relative),
                disk_path: dent.path().to_path_buf(),
                kind,
                metadata,
            }))
        })
}
