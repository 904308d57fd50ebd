use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDate, TimeZone};
use tracing::debug;

use super::{Extractor, PendingEntry, PendingKind};
use crate::entry::{ArchiveReport, EntryKind};
use crate::error::Result;
use crate::format::Format;
use crate::write::CHUNK_SIZE;

pub fn extract(archive: &Path, out_dir: &Path, password: Option<&str>) -> Result<ArchiveReport> {
    let reader = BufReader::with_capacity(CHUNK_SIZE, File::open(archive)?);
    let mut zip = zip::ZipArchive::new(reader)?;
    let mut extractor = Extractor::new(archive, out_dir, Format::Zip);

    for index in 0..zip.len() {
        let encrypted = zip.by_index_raw(index)?.encrypted();
        let mut file = match password {
            Some(password) if encrypted => zip.by_index_decrypt(index, password.as_bytes())?,
            _ => {
                if password.is_some() {
                    debug!(index, "entry is not encrypted, password unused");
                }
                zip.by_index(index)?
            }
        };

        let path = PathBuf::from(file.name());
        let mode = file.unix_mode();
        let modified = file.last_modified().and_then(from_zip_time);

        let kind = if file.is_dir() {
            EntryKind::Directory
        } else if file.is_symlink() {
            let mut target = String::new();
            file.read_to_string(&mut target)?;
            EntryKind::Symlink {
                target: PathBuf::from(target),
            }
        } else {
            EntryKind::File
        };

        let reader: Option<&mut dyn Read> = match kind {
            EntryKind::File => Some(&mut file),
            _ => None,
        };
        extractor.place(PendingEntry {
            path,
            kind: PendingKind::Entry(kind),
            mode,
            modified,
            reader,
        })?;
    }

    extractor.finish()
}

fn from_zip_time(time: zip::DateTime) -> Option<SystemTime> {
    let naive = NaiveDate::from_ymd_opt(time.year().into(), time.month().into(), time.day().into())?
        .and_hms_opt(
            time.hour().into(),
            time.minute().into(),
            time.second().into(),
        )?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.into())
}
