use std::io::Read;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tar::EntryType;
use tracing::warn;

use super::{Extractor, PendingEntry, PendingKind};
use crate::entry::{ArchiveReport, EntryKind};
use crate::error::Result;
use crate::format::{Filter, Format, TarDecoder};

pub fn extract<R: Read>(
    archive: &Path,
    reader: R,
    filter: Filter,
    out_dir: &Path,
) -> Result<ArchiveReport> {
    let mut tar = tar::Archive::new(TarDecoder::new(reader, filter)?);
    let mut extractor = Extractor::new(archive, out_dir, Format::Tar);

    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let header = entry.header();
        let mode = header.mode().ok();
        let modified = header
            .mtime()
            .ok()
            .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));

        let kind = match header.entry_type() {
            EntryType::Directory => PendingKind::Entry(EntryKind::Directory),
            EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
                PendingKind::Entry(EntryKind::File)
            }
            EntryType::Symlink => match entry.link_name()? {
                Some(target) => PendingKind::Entry(EntryKind::Symlink {
                    target: target.into_owned(),
                }),
                None => {
                    warn!(entry = %path.display(), "symlink without a target, skipping");
                    continue;
                }
            },
            EntryType::Link => match entry.link_name()? {
                Some(target) => PendingKind::HardLink {
                    target: target.into_owned(),
                },
                None => {
                    warn!(entry = %path.display(), "hard link without a target, skipping");
                    continue;
                }
            },
            other => {
                warn!(entry = %path.display(), kind = ?other, "unsupported tar entry, skipping");
                continue;
            }
        };

        let reader: Option<&mut dyn Read> = match kind {
            PendingKind::Entry(EntryKind::File) => Some(&mut entry),
            _ => None,
        };
        extractor.place(PendingEntry {
            path,
            kind,
            mode,
            modified,
            reader,
        })?;
    }

    extractor.finish()
}
