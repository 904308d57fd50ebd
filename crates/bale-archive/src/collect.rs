//! Resolution of a caller-supplied path into top-level archive sources.
//!
//! Sources carry an explicit base directory, so entry naming never depends on
//! the process working directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A top-level source: `base/name` on disk, stored as `name/...` in the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRoot {
    pub base: PathBuf,
    pub name: PathBuf,
}

impl SourceRoot {
    /// Place `path` in the archive under its own final component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_source(path)?;

        if let Some(name) = path.file_name() {
            let base = path.parent().unwrap_or(Path::new("")).to_path_buf();
            return Ok(Self {
                base,
                name: PathBuf::from(name),
            });
        }

        // "." / ".." / trailing components that carry no name
        let canonical = std::fs::canonicalize(path)?;
        match (canonical.parent(), canonical.file_name()) {
            (Some(base), Some(name)) => Ok(Self {
                base: base.to_path_buf(),
                name: PathBuf::from(name),
            }),
            _ => Err(Error::UnnamedSource {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn disk_path(&self) -> PathBuf {
        self.base.join(&self.name)
    }
}

/// Fail unless `path` exists and is a regular file or a directory.
pub fn check_source(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() && !path.is_dir() {
        return Err(Error::UnsupportedSource {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Resolve `path` into the list of top-level sources to archive.
///
/// A regular file, or any path when `include_root_dir` is set, becomes a
/// single source wrapping everything below it. Otherwise the immediate
/// children of the directory are returned, each rooted at `path`; deeper
/// levels are walked by the writer.
pub fn collect(path: impl AsRef<Path>, include_root_dir: bool) -> Result<Vec<SourceRoot>> {
    let path = path.as_ref();
    check_source(path)?;

    if include_root_dir || path.is_file() {
        return Ok(vec![SourceRoot::from_path(path)?]);
    }

    let mut children = std::fs::read_dir(path)?
        .map(|entry| {
            entry.map(|e| SourceRoot {
                base: path.to_path_buf(),
                name: PathBuf::from(e.file_name()),
            })
        })
        .collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(children)
}
