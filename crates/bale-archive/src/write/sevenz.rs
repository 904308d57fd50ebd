use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use sevenz_rust2::{ArchiveEntry, ArchiveWriter, EncoderConfiguration, EncoderMethod};
use tracing::warn;

use super::{CHUNK_SIZE, EntrySink};
use crate::entry::{EntryKind, EntryMeta};
use crate::error::Result;
use crate::policy::Method;

pub struct SevenZipSink {
    writer: ArchiveWriter<BufWriter<File>>,
}

impl SevenZipSink {
    pub fn new(out: BufWriter<File>, method: Method) -> Result<Self> {
        let mut writer = ArchiveWriter::new(out)?;
        let method = match method {
            Method::Deflate => EncoderMethod::DEFLATE,
            _ => EncoderMethod::COPY,
        };
        writer.set_content_methods(vec![EncoderConfiguration::new(method)]);
        Ok(Self { writer })
    }
}

impl EntrySink for SevenZipSink {
    fn append(&mut self, entry: &EntryMeta) -> Result<bool> {
        match &entry.kind {
            EntryKind::Directory => {
                let archived = ArchiveEntry::from_path(&entry.disk_path, entry.name.clone());
                self.writer.push_archive_entry::<File>(archived, None)?;
            }
            // Empty files carry no stream; a zero-length stream under the
            // COPY coder produces pack info the reader rejects.
            EntryKind::File if entry.size() == 0 => {
                let archived = ArchiveEntry::from_path(&entry.disk_path, entry.name.clone());
                self.writer.push_archive_entry::<File>(archived, None)?;
            }
            EntryKind::File => {
                let archived = ArchiveEntry::from_path(&entry.disk_path, entry.name.clone());
                let file = BufReader::with_capacity(CHUNK_SIZE, File::open(&entry.disk_path)?);
                self.writer.push_archive_entry(archived, Some(file))?;
            }
            EntryKind::Symlink { .. } => {
                warn!(name = %entry.name, "7z output does not store symbolic links, skipping");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut out = this.writer.finish()?;
        out.flush()?;
        Ok(())
    }
}
