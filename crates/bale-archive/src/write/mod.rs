//! Archive creation.
//!
//! A [`CompressionJob`] walks its sources and feeds every entry to one
//! format-specific [`EntrySink`]. The sink is chosen once, from a validated
//! [`BackendConfig`], before the first entry is read.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use tracing::{debug, info, trace};

use crate::collect::SourceRoot;
use crate::entry::{self, ArchiveReport, EntryMeta};
use crate::error::Result;
use crate::format::Format;
use crate::policy::BackendConfig;

mod sevenz;
mod tar;
mod zip;

/// Payload bytes are moved through buffers of this size.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Receives entries in walk order and writes them to one archive.
pub trait EntrySink {
    /// Returns `false` when the format cannot hold this kind of entry.
    fn append(&mut self, entry: &EntryMeta) -> Result<bool>;

    /// Write trailers and flush the output file.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// One compress call: where to read from, where to write, how to encode.
#[derive(Debug)]
pub struct CompressionJob {
    sources: Vec<SourceRoot>,
    out_path: PathBuf,
    config: BackendConfig,
}

impl CompressionJob {
    pub fn new(sources: Vec<SourceRoot>, out_path: impl Into<PathBuf>, config: BackendConfig) -> Self {
        Self {
            sources,
            out_path: out_path.into(),
            config,
        }
    }

    pub fn run(&self) -> Result<ArchiveReport> {
        let out = File::create(&self.out_path)?;
        // Resolved after creation so a source tree containing the output can skip it.
        let skip = std::fs::canonicalize(&self.out_path).ok();
        let mut sink = open_sink(out, &self.config)?;
        let mut report = ArchiveReport::new(&self.out_path, self.config.format());

        info!(
            archive = %self.out_path.display(),
            format = %self.config.format(),
            method = ?self.config.method(),
            sources = self.sources.len(),
            "writing archive"
        );

        for source in &self.sources {
            for entry in entry::walk(source, skip.as_deref()) {
                let entry = entry?;
                debug!(name = %entry.name, kind = ?entry.kind, "append");
                if entry.is_file() {
                    trace!(name = %entry.name, size = entry.size(), "streaming payload");
                }
                if sink.append(&entry)? {
                    report.record(entry.size());
                }
            }
        }

        sink.finish()?;
        info!(
            archive = %self.out_path.display(),
            entries = report.entry_count,
            bytes = report.total_bytes,
            "archive written"
        );
        Ok(report)
    }
}

fn open_sink(out: File, config: &BackendConfig) -> Result<Box<dyn EntrySink>> {
    let out = BufWriter::with_capacity(CHUNK_SIZE, out);
    let method = config.method();
    Ok(match config.format() {
        Format::Tar => Box::new(tar::TarSink::new(out, method)?),
        Format::Zip => {
            let password = config.password().map(str::to_owned);
            Box::new(zip::ZipSink::new(out, method, password))
        }
        Format::SevenZip => Box::new(sevenz::SevenZipSink::new(out, method)?),
    })
}

/// Copy `reader` to `writer` one [`CHUNK_SIZE`] block at a time.
pub(crate) fn copy_chunked<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> io::Result<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}
