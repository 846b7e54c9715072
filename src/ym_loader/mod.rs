//! YM File Loader Domain
//!
//! Reads YM music files from disk or memory, with format auto-detection
//! and transparent LHA decompression.

pub mod loader;

pub use crate::ym_parser::YmSong;
pub use loader::YmFileLoader;

use crate::Result;
use std::path::Path;

/// Convenience function to load a YM file from disk
pub fn load_file(path: impl AsRef<Path>) -> Result<YmSong> {
    YmFileLoader::load(path.as_ref())
}

/// Convenience function to load YM data already in memory
pub fn load_bytes(data: &[u8]) -> Result<YmSong> {
    YmFileLoader::load_bytes(data)
}
