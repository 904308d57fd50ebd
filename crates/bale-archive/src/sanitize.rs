use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path against the extraction base.
///
/// `.` components are dropped, `..` may only climb back out of directories the
/// entry itself descended into, and absolute or prefixed paths are rejected.
pub fn resolve_entry_path(entry: impl AsRef<Path>, base: impl AsRef<Path>) -> Result<PathBuf> {
    let entry = entry.as_ref();
    let normalized = normalize_relative(entry).ok_or_else(|| Error::UnsafeEntryPath {
        entry: entry.to_path_buf(),
    })?;
    Ok(base.as_ref().join(normalized))
}

/// Normalize separators and relative components of an entry path.
///
/// Returns `None` when the path is absolute or climbs above its own root.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}
