use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sevenz_rust2::{ArchiveReader, Password};

use super::{Extractor, PendingEntry, PendingKind};
use crate::entry::{ArchiveReport, EntryKind};
use crate::error::{Error, Result};
use crate::format::Format;

/// Modification times are restored; 7z keeps no unix mode bits, so
/// permissions follow the process umask.
pub fn extract(archive: &Path, out_dir: &Path, password: Option<&str>) -> Result<ArchiveReport> {
    let password = password.map_or_else(Password::empty, Password::from);
    let mut reader = ArchiveReader::open(archive, password)?;
    let mut extractor = Extractor::new(archive, out_dir, Format::SevenZip);

    // The callback can only report the backend's error type, so ours is
    // parked here and the walk stopped.
    let mut failure: Option<Error> = None;
    reader.for_each_entries(|entry, data| {
        let kind = if entry.is_directory() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let reader: Option<&mut dyn Read> = match kind {
            EntryKind::File => Some(data),
            _ => None,
        };
        let placed = extractor.place(PendingEntry {
            path: PathBuf::from(entry.name()),
            kind: PendingKind::Entry(kind),
            mode: None,
            modified: entry
                .has_last_modified_date
                .then(|| SystemTime::from(entry.last_modified_date)),
            reader,
        });
        match placed {
            Ok(()) => Ok(true),
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        }
    })?;

    if let Some(e) = failure {
        return Err(e);
    }
    extractor.finish()
}
