//! ZIP, 7-Zip and TAR creation and extraction, plus a standalone zstd buffer codec.
//!
//! # Architecture
//!
//! - `policy.rs` - Format/filter/password validation
//! - `collect.rs` - Top-level source resolution
//! - `entry.rs` - Disk walk and per-entry metadata
//! - `write/` - Per-format archive writers
//! - `read/` - Format sniffing and per-format extraction
//! - `probe.rs` - Outermost folder heuristic
//! - `codec.rs` - In-memory zstd codec
//! - `sanitize.rs` - Entry path resolution (zip-slip prevention)
//!
//! ```no_run
//! use bale_archive::{CompressOptions, DecompressOptions, Filter, Format};
//!
//! let options = CompressOptions::new(Format::Zip, Filter::Deflate).password("secret");
//! let report = bale_archive::compress("project", &options)?;
//!
//! let options = DecompressOptions::default().out_dir("restored").password("secret");
//! bale_archive::decompress(&report.archive, &options)?;
//! # Ok::<(), bale_archive::Error>(())
//! ```

use std::path::Path;

use tracing::debug;

pub use codec::{compress_data, decompress_data};
pub use collect::SourceRoot;
pub use entry::{ArchiveReport, EntryKind, EntryMeta};
pub use error::{Error, ErrorKind, Result};
pub use format::{Detected, Filter, Format, ParseError, detect_format};
pub use options::{CompressOptions, DecompressOptions};
pub use policy::{BackendConfig, Method};
pub use probe::outermost_folder_name;
pub use read::decompress;
pub use write::{CHUNK_SIZE, CompressionJob};

pub mod codec;
pub mod collect;
pub mod entry;
mod error;
pub mod format;
mod options;
pub mod policy;
mod probe;
mod read;
mod sanitize;
mod write;

/// Archive `path` with the output name synthesized from its base name unless
/// `options.out_name` is set.
///
/// Directories are flattened (entries named relative to `path`) unless
/// `options.include_root_dir` is set.
pub fn compress(path: impl AsRef<Path>, options: &CompressOptions) -> Result<ArchiveReport> {
    let path = path.as_ref();
    let config = validate(options)?;
    let sources = collect::collect(path, options.include_root_dir)?;
    let root = SourceRoot::from_path(path)?;
    let out_path = options.output_for(path, &root.name);

    debug!(source = %path.display(), out = %out_path.display(), "compress");
    CompressionJob::new(sources, out_path, config).run()
}

/// Archive several paths into `out_path`, each under its own base name.
pub fn compress_paths<P: AsRef<Path>>(
    paths: &[P],
    out_path: impl AsRef<Path>,
    options: &CompressOptions,
) -> Result<ArchiveReport> {
    let config = validate(options)?;
    if paths.is_empty() {
        return Err(Error::NoSources);
    }
    let sources = paths
        .iter()
        .map(SourceRoot::from_path)
        .collect::<Result<Vec<_>>>()?;

    CompressionJob::new(sources, out_path.as_ref(), config).run()
}

fn validate(options: &CompressOptions) -> Result<BackendConfig> {
    policy::validate(
        options.format,
        options.filter,
        options.password_str(),
        options.zstd_workers,
    )
}
