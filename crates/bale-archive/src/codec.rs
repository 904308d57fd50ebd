//! In-memory zstd codec, independent of any container format.
//!
//! Frames always record the original content length, so decompression sizes
//! its output from the frame header alone.

use zstd::zstd_safe;

use crate::error::{Error, Result};

pub const LEVEL: i32 = zstd::DEFAULT_COMPRESSION_LEVEL;

/// Compress `data` into a single self-describing zstd frame.
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = vec![0u8; zstd_safe::compress_bound(data.len())];
    let written = zstd::bulk::compress_to_buffer(data, &mut out, LEVEL)?;
    out.truncate(written);
    out.shrink_to_fit();
    Ok(out)
}

/// Decompress a frame produced by [`compress_data`].
pub fn decompress_data(data: &[u8]) -> Result<Vec<u8>> {
    let size = match zstd_safe::get_frame_content_size(data) {
        Ok(Some(size)) => size,
        Ok(None) => return Err(Error::UnknownContentSize),
        Err(_) => return Err(Error::NotCompressed),
    };
    if size == 0 {
        return Ok(Vec::new());
    }

    // The header is untrusted: reserve fallibly instead of aborting.
    let too_large = || Error::ContentTooLarge { size };
    let capacity = usize::try_from(size).map_err(|_| too_large())?;
    let mut out = Vec::new();
    out.try_reserve_exact(capacity).map_err(|_| too_large())?;
    zstd::bulk::Decompressor::new()?.decompress_to_buffer(data, &mut out)?;
    Ok(out)
}
