//! Metadata-only scan for a single top-level folder.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use sevenz_rust2::{ArchiveReader, Password};
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{self, Detected, TarDecoder};
use crate::read::check_archive;
use crate::write::CHUNK_SIZE;

/// Name of the one top-level path segment shared by every entry, if any.
///
/// Only the first segment is compared; nothing checks that deeper entries are
/// consistently nested. Empty archives yield `None`.
pub fn outermost_folder_name(archive: impl AsRef<Path>) -> Result<Option<String>> {
    let archive = archive.as_ref();
    check_archive(archive)?;

    let mut file = File::open(archive)?;
    let detected = format::detect_from_reader(&mut file)?.ok_or(Error::UnsupportedFormat)?;
    let reader = BufReader::with_capacity(CHUNK_SIZE, file);

    let mut roots = BTreeSet::new();
    match detected {
        Detected::Zip => {
            let zip = zip::ZipArchive::new(reader)?;
            roots.extend(zip.file_names().filter_map(top_segment));
        }
        Detected::Tar(filter) => {
            let mut tar = tar::Archive::new(TarDecoder::new(reader, filter)?);
            for entry in tar.entries()? {
                let entry = entry?;
                let path = entry.path()?;
                if let Some(top) = top_segment(&path.to_string_lossy()) {
                    roots.insert(top);
                }
            }
        }
        Detected::SevenZip => {
            drop(reader);
            let sz = ArchiveReader::open(archive, Password::empty())?;
            roots.extend(sz.archive().files.iter().filter_map(|f| top_segment(f.name())));
        }
    }

    debug!(archive = %archive.display(), roots = roots.len(), "probed");
    if roots.len() == 1 {
        Ok(roots.pop_first())
    } else {
        Ok(None)
    }
}

fn top_segment(name: &str) -> Option<String> {
    name.split(['/', '\\'])
        .find(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_owned)
}
