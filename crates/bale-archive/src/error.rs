use std::io;
use std::path::PathBuf;

use crate::format::{Filter, Format};

/// Coarse classification of every [`Error`].
///
/// `InvalidArgument` is caller misuse caught before any backend is touched;
/// everything else is `Runtime`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Runtime,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{format} format does not support encryption")]
    EncryptionUnsupported { format: Format },

    #[error("{format} format does not support the {filter} filter")]
    FilterUnsupported { format: Format, filter: Filter },

    #[error("cannot derive an entry name from '{path}'")]
    UnnamedSource { path: PathBuf },

    #[error("no source paths given")]
    NoSources,

    #[error("the file or folder does not exist: '{path}'")]
    SourceNotFound { path: PathBuf },

    #[error("the path does not correspond to a file or folder: '{path}'")]
    UnsupportedSource { path: PathBuf },

    #[error("the file does not exist: '{path}'")]
    ArchiveNotFound { path: PathBuf },

    #[error("the path does not correspond to a file: '{path}'")]
    ArchiveNotAFile { path: PathBuf },

    #[error("unsupported archive format")]
    UnsupportedFormat,

    #[error("entry '{entry}' resolves outside of the extraction directory")]
    UnsafeEntryPath { entry: PathBuf },

    #[error("data is not a zstd frame")]
    NotCompressed,

    #[error("original size unknown")]
    UnknownContentSize,

    #[error("declared content size {size} cannot be allocated")]
    ContentTooLarge { size: u64 },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    SevenZip(#[from] sevenz_rust2::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EncryptionUnsupported { .. }
            | Self::FilterUnsupported { .. }
            | Self::UnnamedSource { .. }
            | Self::NoSources => ErrorKind::InvalidArgument,
            _ => ErrorKind::Runtime,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}

pub type Result<T> = std::result::Result<T, Error>;
