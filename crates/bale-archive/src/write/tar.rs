use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use flate2::write::GzEncoder;
use tar::{Builder, Header, HeaderMode};

use super::{CHUNK_SIZE, EntrySink};
use crate::entry::{EntryKind, EntryMeta};
use crate::error::Result;
use crate::policy::Method;

type Out = BufWriter<File>;

/// Byte-stream filter wrapped around the tar stream.
pub enum TarEncoder<W: Write> {
    Stored(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> TarEncoder<W> {
    pub fn new(writer: W, method: Method) -> io::Result<Self> {
        Ok(match method {
            Method::Stored => Self::Stored(writer),
            Method::Deflate | Method::Gzip => {
                Self::Gzip(GzEncoder::new(writer, flate2::Compression::default()))
            }
            Method::Zstd { workers } => {
                let mut encoder =
                    zstd::stream::write::Encoder::new(writer, zstd::DEFAULT_COMPRESSION_LEVEL)?;
                if workers > 1 {
                    encoder.multithread(workers)?;
                }
                encoder.include_checksum(true)?;
                Self::Zstd(encoder)
            }
        })
    }

    /// Write the filter trailer and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Stored(w) => Ok(w),
            Self::Gzip(e) => e.finish(),
            Self::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for TarEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stored(w) => w.write(buf),
            Self::Gzip(e) => e.write(buf),
            Self::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stored(w) => w.flush(),
            Self::Gzip(e) => e.flush(),
            Self::Zstd(e) => e.flush(),
        }
    }
}

/// Yields exactly the size recorded in the header: longer files are cut
/// short, and a file that shrank since it was stat'ed is an error.
struct SizedPayload<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> SizedPayload<R> {
    fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read> Read for SizedPayload<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while archiving, {} bytes missing", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

pub struct TarSink {
    builder: Builder<TarEncoder<Out>>,
}

impl TarSink {
    pub fn new(out: Out, method: Method) -> Result<Self> {
        let mut builder = Builder::new(TarEncoder::new(out, method)?);
        builder.mode(HeaderMode::Complete);
        builder.follow_symlinks(false);
        Ok(Self { builder })
    }
}

impl EntrySink for TarSink {
    fn append(&mut self, entry: &EntryMeta) -> Result<bool> {
        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(&entry.metadata, HeaderMode::Complete);

        match &entry.kind {
            EntryKind::Directory => {
                header.set_size(0);
                self.builder.append_data(&mut header, &entry.name, io::empty())?;
            }
            EntryKind::Symlink { target } => {
                header.set_size(0);
                self.builder.append_link(&mut header, &entry.name, target)?;
            }
            EntryKind::File => {
                let size = entry.size();
                header.set_size(size);
                let file = BufReader::with_capacity(CHUNK_SIZE, File::open(&entry.disk_path)?);
                let payload = SizedPayload::new(file, size);
                self.builder.append_data(&mut header, &entry.name, payload)?;
            }
        }
        Ok(true)
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let this = *self;
        let encoder = this.builder.into_inner()?;
        let mut out = encoder.finish()?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_stops_at_recorded_size() {
        let mut out = Vec::new();
        SizedPayload::new(&b"0123456789"[..], 4)
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"0123");
    }

    #[test]
    fn shrunken_payload_is_an_error() {
        let mut out = Vec::new();
        let err = SizedPayload::new(&b"abc"[..], 8)
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn shrunken_file_fails_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "0123456789").unwrap();
        let entry = EntryMeta {
            name: "f.txt".into(),
            disk_path: path.clone(),
            kind: EntryKind::File,
            metadata: std::fs::metadata(&path).unwrap(),
        };
        // Truncated after the header size was taken.
        std::fs::write(&path, "01").unwrap();

        let out = File::create(dir.path().join("out.tar")).unwrap();
        let mut sink = TarSink::new(BufWriter::new(out), Method::Stored).unwrap();
        assert!(sink.append(&entry).is_err());
    }
}
