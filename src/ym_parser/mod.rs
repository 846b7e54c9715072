//! File Format Support
//!
//! Parser implementations for the YM register dump formats:
//! - YM2/YM3/YM3b (headerless, 14 registers interleaved)
//! - YM4/YM5 (LeOnArD! header, metadata, digidrums)
//! - YM6 (handled by the separate `ym6` module)
//!
//! Parsers work on uncompressed data; see [`crate::compression`].

pub mod ym;
pub mod ym6;

pub use ym::YmParser;
pub use ym6::Ym6Parser;

use crate::registers::{RegisterSnapshot, REGISTER_COUNT};
use crate::{PsymError, Result};
use bitflags::bitflags;
use std::fmt;

/// Maximum reasonable frame count (100,000 frames ≈ 33 minutes at 50Hz)
pub(crate) const MAX_REASONABLE_FRAMES: u32 = 100_000;

/// Signature following the magic in YM4/YM5/YM6 headers
pub(crate) const LEONARD_SIGNATURE: &[u8; 8] = b"LeOnArD!";

/// One VBL worth of raw register bytes
pub type YmFrame = [u8; REGISTER_COUNT];

bitflags! {
    /// Song attribute bits from YM4/YM5/YM6 headers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct YmAttributes: u32 {
        /// Register data is stored register by register instead of frame by frame
        const INTERLEAVED = 1;
        /// Digidrum samples are signed
        const DRUM_SIGNED = 2;
        /// Digidrum samples are packed 4-bit
        const DRUM_4BIT = 4;
        /// Time control flag
        const TIME_CONTROL = 8;
        /// Loop information present
        const LOOP_MODE = 16;
    }
}

/// Supported YM file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YmFileFormat {
    /// YM2 format (Mad Max).
    Ym2,
    /// Legacy YM3 format without embedded metadata.
    Ym3,
    /// YM3 variant with loop information footer.
    Ym3b,
    /// YM4 format (metadata, optional digidrums, 14 registers).
    Ym4,
    /// YM5 format (metadata, digidrums, clock and frame rate).
    Ym5,
    /// YM6 format (metadata, extended effects).
    Ym6,
}

impl YmFileFormat {
    /// Detect the format from the 4-byte magic
    pub fn from_magic(data: &[u8]) -> Option<Self> {
        match data.get(0..4)? {
            b"YM2!" => Some(YmFileFormat::Ym2),
            b"YM3!" => Some(YmFileFormat::Ym3),
            b"YM3b" => Some(YmFileFormat::Ym3b),
            b"YM4!" => Some(YmFileFormat::Ym4),
            b"YM5!" => Some(YmFileFormat::Ym5),
            b"YM6!" => Some(YmFileFormat::Ym6),
            _ => None,
        }
    }

    /// Name of the original replay routine for this format
    pub fn driver_name(self) -> &'static str {
        match self {
            YmFileFormat::Ym2 => "MADMAX specific",
            YmFileFormat::Ym3 | YmFileFormat::Ym3b => "Standard Atari",
            YmFileFormat::Ym4 | YmFileFormat::Ym5 | YmFileFormat::Ym6 => "Atari-ST",
        }
    }
}

impl fmt::Display for YmFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YmFileFormat::Ym2 => "YM2",
            YmFileFormat::Ym3 => "YM3",
            YmFileFormat::Ym3b => "YM3b",
            YmFileFormat::Ym4 => "YM4",
            YmFileFormat::Ym5 => "YM5",
            YmFileFormat::Ym6 => "YM6",
        };
        f.write_str(name)
    }
}

/// Song information carried by a YM file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YmMetadata {
    /// Song title/name
    pub song_name: String,
    /// Composer/musician name
    pub author: String,
    /// Additional information or notes about the song
    pub comment: String,
    /// Number of VBL frames
    pub frame_count: u32,
    /// Frame index playback loops back to (0 = start)
    pub loop_frame: u32,
    /// Master clock frequency in Hz (YM5/YM6 only)
    pub master_clock: Option<u32>,
    /// Player/VBL frequency in Hz (YM5/YM6 only)
    pub frame_rate: Option<u16>,
}

impl YmMetadata {
    /// Frame rate used for timing, 50Hz when the file does not say
    pub fn effective_frame_rate(&self) -> u16 {
        match self.frame_rate {
            Some(rate) if rate > 0 => rate,
            _ => 50,
        }
    }

    /// Song length in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.frame_count as f32 / self.effective_frame_rate() as f32
    }
}

/// A parsed YM song: raw frames plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YmSong {
    /// Detected file format
    pub format: YmFileFormat,
    /// Register frames in playback order
    pub frames: Vec<YmFrame>,
    /// Song information
    pub metadata: YmMetadata,
}

impl YmSong {
    /// Register snapshots in playback order
    pub fn snapshots(&self) -> impl Iterator<Item = RegisterSnapshot> + '_ {
        self.frames
            .iter()
            .map(move |frame| RegisterSnapshot::from_ym_frame(frame, self.format))
    }
}

/// Trait for parsing music file formats into register frame sequences
pub trait FormatParser {
    /// Parse uncompressed file data
    fn parse(&self, data: &[u8]) -> Result<YmSong>;

    /// Get parser name
    fn name(&self) -> &str;
}

pub(crate) fn parse_error(msg: impl Into<String>) -> PsymError {
    PsymError::ParseError(msg.into())
}

/// Read a big-endian u16 at `offset`
pub(crate) fn read_be_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| parse_error("Unexpected end of data while reading u16"))
}

/// Read a big-endian u32 at `offset`
pub(crate) fn read_be_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| parse_error("Unexpected end of data while reading u32"))
}

/// Read one NUL-terminated string; a missing terminator consumes the rest
pub(crate) fn read_nt_string(data: &[u8], offset: &mut usize) -> String {
    let start = (*offset).min(data.len());
    let end = data[start..]
        .iter()
        .position(|&b| b == 0)
        .map_or(data.len(), |pos| start + pos);
    *offset = (end + 1).min(data.len());
    data[start..end].iter().map(|&b| b as char).collect()
}

/// Skip the digidrum sample section, returning the offset after it
pub(crate) fn skip_digidrums(
    data: &[u8],
    mut offset: usize,
    count: u16,
    format_name: &str,
) -> Result<usize> {
    for _ in 0..count {
        let sample_size = read_be_u32(data, offset).map_err(|_| {
            parse_error(format!("{} truncated in digidrum size header", format_name))
        })? as usize;
        offset = offset
            .checked_add(4 + sample_size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| parse_error(format!("{} truncated in digidrum data", format_name)))?;
    }
    Ok(offset)
}

/// Read `frame_count` frames of `registers_per_frame` bytes starting at `offset`.
///
/// Interleaved data stores all R0 values first, then all R1 values, and so on.
pub(crate) fn read_frames(
    data: &[u8],
    offset: usize,
    frame_count: usize,
    registers_per_frame: usize,
    interleaved: bool,
    format_name: &str,
) -> Result<Vec<YmFrame>> {
    let size = frame_count
        .checked_mul(registers_per_frame)
        .ok_or_else(|| parse_error(format!("{} frame data size overflow", format_name)))?;
    let body = offset
        .checked_add(size)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| parse_error(format!("{} truncated in frame data", format_name)))?;

    let copy_len = registers_per_frame.min(REGISTER_COUNT);
    let mut frames = vec![[0u8; REGISTER_COUNT]; frame_count];
    for (frame_idx, frame) in frames.iter_mut().enumerate() {
        for (reg, value) in frame.iter_mut().enumerate().take(copy_len) {
            *value = if interleaved {
                body[reg * frame_count + frame_idx]
            } else {
                body[frame_idx * registers_per_frame + reg]
            };
        }
    }
    Ok(frames)
}

pub(crate) fn check_frame_count(frame_count: u32, format_name: &str) -> Result<()> {
    if frame_count == 0 {
        return Err(parse_error(format!("{} file has zero frames", format_name)));
    }
    if frame_count > MAX_REASONABLE_FRAMES {
        return Err(parse_error(format!(
            "{} frame count {} exceeds reasonable limit of {}",
            format_name, frame_count, MAX_REASONABLE_FRAMES
        )));
    }
    Ok(())
}
