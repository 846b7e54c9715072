//! YM2149 to PSYM converter
//!
//! Turns the per-frame register dumps of YM chiptune files into a compact,
//! delta-encoded stream of register writes that a small microcontroller can
//! replay on a real YM2149 / AY-3-8910 at a fixed sample rate.
//!
//! # Features
//! - Register delta tracking with optional deduplication
//! - `PSYM1` binary output (and a decoder for it)
//! - Python literal output for MicroPython players
//! - YM2/3/3b/4/5/6 loading with transparent LHA decompression
//! - Atomic output writing (temporary file + rename)
//!
//! # Crate feature flags
//! - `ym-format` (default): YM file parsing/loader (`ym_parser`, `ym_loader`, `compression`)
//!   and the `ym2psym` binary
//!
//! # Quick start
//! ## Tracking snapshots directly
//! ```
//! use ym2149_psym::registers::{Register, RegisterSnapshot};
//! use ym2149_psym::tracker::{DedupMode, RegisterDeltaTracker, SampleSequence};
//!
//! let mut tracker = RegisterDeltaTracker::new(DedupMode::Enabled);
//! let mut samples = SampleSequence::new();
//!
//! let mut snapshot = RegisterSnapshot::empty();
//! snapshot.set(Register::ChAAmplitude, 0x0F);
//! samples.push_frame(&mut tracker, &snapshot);
//! samples.push_frame(&mut tracker, &snapshot);
//! assert_eq!(samples.len(), 2);
//! ```
//!
//! ## Converting a YM file
//! ```no_run
//! # #[cfg(feature = "ym-format")]
//! # {
//! use ym2149_psym::convert::{ConvertConfig, Converter};
//!
//! let song = ym2149_psym::ym_loader::load_file("song.ym").unwrap();
//! let converter = Converter::new(ConvertConfig::default());
//! let conversion = converter.convert_frames(&song).unwrap();
//! converter.write_to_path(&conversion, "song.psym").unwrap();
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod convert; // Conversion pipeline
pub mod psym; // Stream encoding (PSYM binary, Python listing)
pub mod registers; // Register model and snapshots
pub mod tracker; // Register delta tracking

#[cfg(feature = "ym-format")]
pub mod compression; // Data Decompression (LHA/LZH)
#[cfg(feature = "ym-format")]
pub mod ym_loader; // YM File I/O
#[cfg(feature = "ym-format")]
pub mod ym_parser; // YM Format Parsing

/// Error types for conversion operations
#[derive(thiserror::Error, Debug)]
pub enum PsymError {
    /// Error while parsing an input file format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error while decoding a PSYM stream
    #[error("PSYM format error: {0}")]
    FormatError(String),

    /// IO error from filesystem
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for PsymError {
    /// Converts a String into `PsymError::Other`.
    ///
    /// Prefer the specific variants (`ParseError`, `ConfigError`, ...) where the
    /// caller needs to tell failure classes apart, as the CLI does for exit codes.
    fn from(msg: String) -> Self {
        PsymError::Other(msg)
    }
}

impl From<&str> for PsymError {
    /// Converts a string slice into `PsymError::Other`.
    fn from(msg: &str) -> Self {
        PsymError::Other(msg.to_string())
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, PsymError>;

// Public API exports
pub use convert::{Conversion, ConvertConfig, Converter};
pub use psym::{OutputFormat, PsymFile, SongInfo};
pub use registers::{Register, RegisterSnapshot, REGISTER_COUNT};
pub use tracker::{ChipState, DedupMode, EmissionRecord, RegisterDeltaTracker, SampleSequence};

#[cfg(feature = "ym-format")]
pub use compression::decompress_if_needed;
#[cfg(feature = "ym-format")]
pub use ym_loader::{load_bytes, load_file, YmSong};
#[cfg(feature = "ym-format")]
pub use ym_parser::{YmFileFormat, YmMetadata};
