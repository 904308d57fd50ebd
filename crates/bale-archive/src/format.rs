use std::fmt;
use std::io::{self, BufReader, Read, Seek};
use std::str::FromStr;

/// Container layout of an archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    Zip,
    SevenZip,
    #[default]
    Tar,
}

/// Compression applied to entry payloads (Zip, 7-Zip) or to the whole stream (Tar).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    None,
    Deflate,
    #[default]
    Gzip,
    Zstd,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZip => "7z",
            Self::Tar => "tar",
        }
    }
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct ParseError {
    what: &'static str,
    value: String,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "7z" | "7zip" | "7-zip" => Ok(Self::SevenZip),
            "tar" => Ok(Self::Tar),
            _ => Err(ParseError {
                what: "format",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "store" => Ok(Self::None),
            "deflate" => Ok(Self::Deflate),
            "gzip" | "gz" => Ok(Self::Gzip),
            "zstd" | "zst" => Ok(Self::Zstd),
            _ => Err(ParseError {
                what: "filter",
                value: s.to_string(),
            }),
        }
    }
}

/// File name suffix conventionally used for a format/filter pair.
pub fn extension(format: Format, filter: Filter) -> &'static str {
    match (format, filter) {
        (Format::Zip, _) => ".zip",
        (Format::SevenZip, _) => ".7z",
        (Format::Tar, Filter::None) => ".tar",
        (Format::Tar, Filter::Deflate | Filter::Gzip) => ".tar.gz",
        (Format::Tar, Filter::Zstd) => ".tar.zst",
    }
}

/// What the leading bytes of an archive file say about its layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detected {
    Zip,
    SevenZip,
    Tar(Filter),
}

const SNIFF_LEN: usize = 512;

pub fn detect_format(data: &[u8]) -> Option<Detected> {
    match data {
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(Detected::Zip),
        [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, ..] => Some(Detected::SevenZip),
        [0x1F, 0x8B, ..] => Some(Detected::Tar(Filter::Gzip)),
        [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(Detected::Tar(Filter::Zstd)),
        _ => {
            if is_tar_header(data) {
                Some(Detected::Tar(Filter::None))
            } else {
                None
            }
        }
    }
}

// POSIX writes "ustar\0", GNU writes "ustar  \0"; both share the first five bytes.
// An archive with no members is nothing but zeroed end-of-archive blocks.
fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= SNIFF_LEN
        && (data[257..262] == *b"ustar" || data[..SNIFF_LEN].iter().all(|&b| b == 0))
}

pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<Option<Detected>> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    reader.rewind()?;
    Ok(detect_format(&header))
}

/// Streaming decoder sitting between the archive file and the tar reader.
pub enum TarDecoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    Zstd(Box<zstd::stream::read::Decoder<'static, BufReader<R>>>),
}

impl<R: Read> TarDecoder<R> {
    pub fn new(reader: R, filter: Filter) -> io::Result<Self> {
        match filter {
            Filter::None => Ok(Self::Passthrough(reader)),
            Filter::Gzip | Filter::Deflate => {
                Ok(Self::Gzip(Box::new(flate2::read::GzDecoder::new(reader))))
            }
            Filter::Zstd => Ok(Self::Zstd(Box::new(zstd::stream::read::Decoder::new(
                reader,
            )?))),
        }
    }
}

impl<R: Read> Read for TarDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            Self::Zstd(d) => d.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detect_zip_format() {
        let zip_header = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];
        assert_eq!(detect_format(&zip_header), Some(Detected::Zip));
    }

    #[test]
    fn detect_empty_zip() {
        let eocd = [0x50, 0x4B, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(detect_format(&eocd), Some(Detected::Zip));
    }

    #[test]
    fn detect_7z_format() {
        let header = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04];
        assert_eq!(detect_format(&header), Some(Detected::SevenZip));
    }

    #[test]
    fn detect_tar_gz_format() {
        let gz_header = [0x1F, 0x8B, 0x08, 0x00];
        assert_eq!(detect_format(&gz_header), Some(Detected::Tar(Filter::Gzip)));
    }

    #[test]
    fn detect_tar_zstd_format() {
        let zstd_header = [0x28, 0xB5, 0x2F, 0xFD, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(detect_format(&zstd_header), Some(Detected::Tar(Filter::Zstd)));
    }

    #[test]
    fn detect_posix_and_gnu_tar() {
        let mut posix = [0u8; 512];
        posix[257..263].copy_from_slice(b"ustar\0");
        assert_eq!(detect_format(&posix), Some(Detected::Tar(Filter::None)));

        let mut gnu = [0u8; 512];
        gnu[257..265].copy_from_slice(b"ustar  \0");
        assert_eq!(detect_format(&gnu), Some(Detected::Tar(Filter::None)));
    }

    #[test]
    fn detect_unknown_format() {
        let random_data = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(detect_format(&random_data), None);
    }

    #[test]
    fn detect_truncated_tar_header() {
        let short_data = [0u8; 256];
        assert_eq!(detect_format(&short_data), None);
    }

    #[test]
    fn detect_from_short_reader_rewinds() {
        let mut cursor = Cursor::new(vec![0x1F, 0x8B, 0x08]);
        let detected = detect_from_reader(&mut cursor).unwrap();
        assert_eq!(detected, Some(Detected::Tar(Filter::Gzip)));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn parse_names() {
        assert_eq!("ZIP".parse::<Format>().unwrap(), Format::Zip);
        assert_eq!("7z".parse::<Format>().unwrap(), Format::SevenZip);
        assert_eq!("zst".parse::<Filter>().unwrap(), Filter::Zstd);
        assert!("rar".parse::<Format>().is_err());
        assert_eq!(
            "lzma".parse::<Filter>().unwrap_err().to_string(),
            "unknown filter: 'lzma'"
        );
    }

    #[test]
    fn extensions() {
        assert_eq!(extension(Format::Zip, Filter::Deflate), ".zip");
        assert_eq!(extension(Format::SevenZip, Filter::None), ".7z");
        assert_eq!(extension(Format::Tar, Filter::None), ".tar");
        assert_eq!(extension(Format::Tar, Filter::Deflate), ".tar.gz");
        assert_eq!(extension(Format::Tar, Filter::Gzip), ".tar.gz");
        assert_eq!(extension(Format::Tar, Filter::Zstd), ".tar.zst");
    }

    #[test]
    fn passthrough_decoder() {
        let mut decoder = TarDecoder::new(Cursor::new(b"hello".to_vec()), Filter::None).unwrap();
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }
}
