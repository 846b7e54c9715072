//! YM File Loader
//!
//! Loads YM music files with automatic format detection and transparent
//! decompression support.

use crate::ym_parser::{parse_error, FormatParser, Ym6Parser, YmFileFormat, YmParser, YmSong};
use crate::{compression, Result};
use std::fs;
use std::path::Path;

/// Loads YM files from disk or memory
pub struct YmFileLoader;

impl YmFileLoader {
    /// Load a YM file from disk, auto-detecting format and handling decompression
    pub fn load(path: &Path) -> Result<YmSong> {
        let file_data = fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = file_data.len(), "read input file");
        Self::load_bytes(&file_data)
    }

    /// Parse YM data, decompressing it first when it is an LHA archive
    pub fn load_bytes(file_data: &[u8]) -> Result<YmSong> {
        let data = compression::decompress_if_needed(file_data)?;

        let format = YmFileFormat::from_magic(&data).ok_or_else(|| {
            parse_error("Unsupported file format. Supported: YM2, YM3, YM3b, YM4, YM5, YM6")
        })?;

        let parser: &dyn FormatParser = match format {
            YmFileFormat::Ym6 => &Ym6Parser,
            _ => &YmParser,
        };
        let song = parser.parse(&data)?;

        tracing::debug!(
            parser = parser.name(),
            format = %song.format,
            frames = song.frames.len(),
            "parsed YM song"
        );
        Ok(song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ym3_bytes(frames: usize) -> Vec<u8> {
        let mut data = b"YM3!".to_vec();
        data.resize(4 + frames * 14, 0x01);
        data
    }

    #[test]
    fn test_load_bytes_dispatches_on_magic() {
        let song = YmFileLoader::load_bytes(&ym3_bytes(4)).unwrap();
        assert_eq!(song.format, YmFileFormat::Ym3);
        assert_eq!(song.frames.len(), 4);
    }

    #[test]
    fn test_load_bytes_rejects_unknown_format() {
        let err = YmFileLoader::load_bytes(b"RIFF....WAVE").unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));

        assert!(YmFileLoader::load_bytes(b"").is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&ym3_bytes(2)).unwrap();
        file.flush().unwrap();

        let song = YmFileLoader::load(file.path()).unwrap();
        assert_eq!(song.frames.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = YmFileLoader::load(&dir.path().join("missing.ym")).unwrap_err();
        assert!(matches!(err, crate::PsymError::Io(_)));
    }
}
