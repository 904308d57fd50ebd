use std::fs::File;
use std::io::{BufWriter, Write};

use chrono::{DateTime, Datelike, Local, Timelike};
use zip::write::{FileOptions, SimpleFileOptions};
use zip::{AesMode, CompressionMethod, ZipWriter};

use super::{EntrySink, copy_chunked};
use crate::entry::{EntryKind, EntryMeta};
use crate::error::Result;
use crate::policy::Method;

/// Payloads at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

pub struct ZipSink {
    writer: ZipWriter<BufWriter<File>>,
    method: Method,
    password: Option<String>,
}

impl ZipSink {
    pub fn new(out: BufWriter<File>, method: Method, password: Option<String>) -> Self {
        Self {
            writer: ZipWriter::new(out),
            method,
            password,
        }
    }
}

impl EntrySink for ZipSink {
    fn append(&mut self, entry: &EntryMeta) -> Result<bool> {
        match &entry.kind {
            EntryKind::Directory => {
                let options = file_options(self.method, None, entry);
                self.writer.add_directory(entry.name.as_str(), options)?;
            }
            EntryKind::Symlink { target } => {
                let options = file_options(self.method, None, entry);
                let target = target.to_string_lossy().replace('\\', "/");
                self.writer.add_symlink(entry.name.as_str(), target, options)?;
            }
            EntryKind::File => {
                let options = file_options(self.method, self.password.as_deref(), entry);
                self.writer.start_file(entry.name.as_str(), options)?;
                let mut file = File::open(&entry.disk_path)?;
                copy_chunked(&mut file, &mut self.writer)?;
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

/// Per-entry options. Only file payloads are encrypted.
fn file_options<'k>(
    method: Method,
    password: Option<&'k str>,
    entry: &EntryMeta,
) -> FileOptions<'k, ()> {
    let compression = match method {
        Method::Deflate => CompressionMethod::Deflated,
        _ => CompressionMethod::Stored,
    };

    let mut options = SimpleFileOptions::default()
        .compression_method(compression)
        .large_file(entry.size() >= ZIP64_THRESHOLD);
    if let Some(mode) = entry.mode() {
        options = options.unix_permissions(mode);
    }
    if let Some(modified) = entry.modified().and_then(to_zip_time) {
        options = options.last_modified_time(modified);
    }

    match password {
        Some(password) => options.with_aes_encryption(AesMode::Aes256, password),
        None => options,
    }
}

/// Zip timestamps are local wall-clock time with two-second resolution,
/// limited to 1980..=2107.
fn to_zip_time(time: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = time.into();
    let year = u16::try_from(local.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn zip_time_clamps_to_dos_range() {
        assert!(to_zip_time(SystemTime::UNIX_EPOCH).is_none());

        let recent = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let converted = to_zip_time(recent).unwrap();
        assert!(converted.year() >= 2023);
    }
}
