//! Compression support for YM file formats
//!
//! Most YM files in the wild are LHA archives (usually LH5) holding a single
//! member. [`decompress_if_needed`] detects the archive header and extracts
//! that member with `delharc`; uncompressed input passes through unchanged.

use crate::{PsymError, Result};
use std::io::{Read, Write};

/// Search limit for the LHA method signature.
///
/// Level 0/1 headers place the method at offset 2, level 2 headers can place
/// it further in; 40 bytes covers every header level.
const LHA_SEARCH_LIMIT: usize = 40;

/// Length of the `-lh?-` method signature
const LHA_SIGNATURE_LENGTH: usize = 5;

/// Maximum decompressed size: 100MB
///
/// YM files are typically 10KB-1MB uncompressed.
const MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// Minimum and maximum valid compression levels in LHA
const LHA_MIN_VALID_LEVEL: u8 = b'0';
const LHA_MAX_VALID_LEVEL: u8 = b'7';

/// Automatically decompress LHA data if compressed, otherwise return as-is
///
/// # Examples
/// ```no_run
/// use ym2149_psym::compression::decompress_if_needed;
///
/// let data = std::fs::read("song.ym").unwrap();
/// let decompressed = decompress_if_needed(&data).unwrap();
/// assert!(decompressed.starts_with(b"YM"));
/// ```
pub fn decompress_if_needed(data: &[u8]) -> Result<Vec<u8>> {
    if !is_lha_compressed(data) {
        return Ok(data.to_vec());
    }

    tracing::debug!(
        compressed_bytes = data.len(),
        method = %get_lha_info(data).unwrap_or_default(),
        "decompressing LHA archive"
    );

    // delharc reads archives from a path; the temp file is removed on drop.
    let mut temp_file = tempfile::NamedTempFile::new().map_err(|e| {
        PsymError::DecompressionError(format!("Failed to create temporary file: {}", e))
    })?;
    temp_file.write_all(data).map_err(|e| {
        PsymError::DecompressionError(format!(
            "Failed to write compressed data to temporary file: {} bytes - {}",
            data.len(),
            e
        ))
    })?;
    temp_file.flush().map_err(|e| {
        PsymError::DecompressionError(format!("Failed to flush temporary file: {}", e))
    })?;

    let temp_path = temp_file.path().to_path_buf();
    let reader = delharc::parse_file(&temp_path).map_err(|e| {
        PsymError::DecompressionError(format!(
            "Failed to parse LHA archive from '{}': {}",
            temp_path.display(),
            e
        ))
    })?;

    let mut decompressed = Vec::new();
    let mut limited_reader = reader.take(MAX_DECOMPRESSED_SIZE as u64);
    limited_reader
        .read_to_end(&mut decompressed)
        .map_err(|e| PsymError::DecompressionError(format!("LHA decompression failed: {}", e)))?;

    if decompressed.len() >= MAX_DECOMPRESSED_SIZE {
        return Err(PsymError::DecompressionError(
            "Decompressed data exceeded maximum safe size (100MB). \
             The file may be corrupted or an attempted decompression bomb."
                .to_string(),
        ));
    }

    tracing::debug!(
        decompressed_bytes = decompressed.len(),
        "LHA archive extracted"
    );
    Ok(decompressed)
}

/// Find the offset of the `-lh[0-7]-` signature within the header area
fn find_lha_signature(data: &[u8]) -> Option<usize> {
    if data.len() < LHA_SIGNATURE_LENGTH + 2 {
        return None;
    }

    let search_limit = LHA_SEARCH_LIMIT.min(data.len().saturating_sub(LHA_SIGNATURE_LENGTH));

    (1..=search_limit).find(|&i| match data.get(i..i + LHA_SIGNATURE_LENGTH) {
        Some(window) => {
            window[0] == b'-'
                && window[1] == b'l'
                && window[2] == b'h'
                && is_valid_compression_level(window[3])
                && window[4] == b'-'
        }
        None => false,
    })
}

#[inline]
fn is_valid_compression_level(byte: u8) -> bool {
    (LHA_MIN_VALID_LEVEL..=LHA_MAX_VALID_LEVEL).contains(&byte)
}

/// Detect if data is LHA-compressed by checking for the method signature
pub fn is_lha_compressed(data: &[u8]) -> bool {
    find_lha_signature(data).is_some()
}

/// Human-readable description of the LHA method, if compressed
///
/// ```
/// use ym2149_psym::compression::get_lha_info;
///
/// let lha_data = b"\x20\x2d\x6c\x68\x35\x2d\x15";
/// assert_eq!(
///     get_lha_info(lha_data),
///     Some("LH5 compressed (LHA/LZH archive)".to_string())
/// );
/// ```
pub fn get_lha_info(data: &[u8]) -> Option<String> {
    find_lha_signature(data).map(|offset| {
        let level = data[offset + 3] as char;
        format!("LH{} compressed (LHA/LZH archive)", level)
    })
}
