//! Stream encoding for delta-encoded register streams
//!
//! Serializes a complete [`SampleSequence`] in one of two formats:
//! - `PSYM1` binary, read sample by sample by an embedded player
//! - a Python listing (`SongInfo = {...}` / `Song = [...]`) for MicroPython
//!
//! Both formats declare the sample count up front, so encoding only starts
//! once the whole sequence has been collected.
//!
//! # Examples
//!
//! ```
//! use ym2149_psym::psym::{self, OutputFormat, SongInfo};
//! use ym2149_psym::tracker::SampleSequence;
//!
//! # fn main() -> ym2149_psym::Result<()> {
//! let info = SongInfo::new(2_000_000, 50);
//! let mut out = Vec::new();
//! psym::encode(OutputFormat::Binary, &info, &SampleSequence::new(), &mut out)?;
//! assert_eq!(out.len(), psym::HEADER_LEN);
//!
//! let decoded = psym::decode(&out)?;
//! assert_eq!(decoded.info, info);
//! assert!(decoded.samples.is_empty());
//! # Ok(())
//! # }
//! ```

mod binary;
mod python;

pub use binary::{decode, write_binary, HEADER_LEN, MAGIC};
pub use python::write_python;

use crate::tracker::SampleSequence;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Default PSG master clock (Atari ST), in Hz
pub const DEFAULT_CLOCK_HZ: u32 = 2_000_000;

/// Default sample rate (one sample per PAL VBL), in Hz
pub const DEFAULT_SAMPLE_RATE_HZ: u8 = 50;

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `PSYM1` binary stream
    #[default]
    Binary,
    /// Python source listing
    Python,
}

impl OutputFormat {
    /// Conventional file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Binary => "psym",
            OutputFormat::Python => "py",
        }
    }

    /// Get string representation of the format
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Binary => "binary",
            OutputFormat::Python => "python",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback parameters declared in the output header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongInfo {
    /// PSG clock frequency in Hz
    pub clock_hz: u32,
    /// Samples per second the player must apply
    pub sample_rate_hz: u8,
}

impl SongInfo {
    /// Create song info
    pub fn new(clock_hz: u32, sample_rate_hz: u8) -> Self {
        Self {
            clock_hz,
            sample_rate_hz,
        }
    }
}

impl Default for SongInfo {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_HZ, DEFAULT_SAMPLE_RATE_HZ)
    }
}

/// A decoded `PSYM1` stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsymFile {
    /// Header parameters
    pub info: SongInfo,
    /// Samples in playback order
    pub samples: SampleSequence,
}

impl PsymFile {
    /// Declared (and actual) number of samples
    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }
}

/// Encode a sample sequence in the given format
pub fn encode<W: Write>(
    format: OutputFormat,
    info: &SongInfo,
    samples: &SampleSequence,
    writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Binary => write_binary(info, samples, writer),
        OutputFormat::Python => write_python(info, samples, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Binary.extension(), "psym");
        assert_eq!(OutputFormat::Python.extension(), "py");
        assert_eq!(OutputFormat::default(), OutputFormat::Binary);
        assert_eq!(OutputFormat::Python.to_string(), "python");
    }
}
