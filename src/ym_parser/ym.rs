//! YM File Format Parsers
//!
//! Atari ST YM format versions before YM6:
//! - YM2: Mad Max register dump, same layout as YM3
//! - YM3: 4 bytes header + 14 bytes/frame, interleaved by register
//! - YM3b: YM3 with loop support (last 4 bytes = loop frame)
//! - YM4: Adds metadata, digi-drum samples (26 bytes header)
//! - YM5: Extends YM4 with chip/player frequency info (34 bytes header)

use super::{
    check_frame_count, parse_error, read_be_u16, read_be_u32, read_frames, read_nt_string,
    skip_digidrums, FormatParser, YmAttributes, YmFileFormat, YmMetadata, YmSong,
    LEONARD_SIGNATURE,
};
use crate::Result;

/// Registers stored per frame by YM2/YM3/YM4
const LEGACY_REGISTERS: usize = 14;

/// Header information for YM4/YM5 formats
#[derive(Debug, Clone)]
struct YmHeader {
    frame_count: u32,
    attributes: YmAttributes,
    digidrum_count: u16,
    loop_frame: u32,
    master_clock: Option<u32>,
    frame_rate: Option<u16>,
    extra_data_size: u16,
    body_start_offset: usize,
}

/// YM Format Parser - dispatches on the magic and parses accordingly
#[derive(Debug, Clone, Copy, Default)]
pub struct YmParser;

impl YmParser {
    /// Create a new YM parser
    pub fn new() -> Self {
        YmParser
    }

    /// Parse YM2/YM3 (register data only)
    fn parse_ym3(data: &[u8], format: YmFileFormat) -> Result<YmSong> {
        let payload = data
            .get(4..)
            .ok_or_else(|| parse_error(format!("{} file too small", format)))?;
        Self::legacy_song(payload, format, 0)
    }

    /// Parse YM3b (YM3 with a trailing loop frame)
    fn parse_ym3b(data: &[u8]) -> Result<YmSong> {
        if data.len() < 8 {
            return Err(parse_error("YM3b file too small"));
        }
        let footer = data.len() - 4;
        let loop_frame = u32::from_le_bytes([
            data[footer],
            data[footer + 1],
            data[footer + 2],
            data[footer + 3],
        ]);
        Self::legacy_song(&data[4..footer], YmFileFormat::Ym3b, loop_frame)
    }

    fn legacy_song(payload: &[u8], format: YmFileFormat, loop_frame: u32) -> Result<YmSong> {
        if payload.len() % LEGACY_REGISTERS != 0 {
            return Err(parse_error(format!(
                "{} data size {} is not multiple of {}",
                format,
                payload.len(),
                LEGACY_REGISTERS
            )));
        }
        let frame_count = payload.len() / LEGACY_REGISTERS;
        check_frame_count(frame_count as u32, &format.to_string())?;

        let frames = read_frames(
            payload,
            0,
            frame_count,
            LEGACY_REGISTERS,
            true,
            &format.to_string(),
        )?;

        // An out of range loop frame falls back to the start
        let loop_frame = if (loop_frame as usize) < frame_count {
            loop_frame
        } else {
            0
        };

        Ok(YmSong {
            format,
            frames,
            metadata: YmMetadata {
                frame_count: frame_count as u32,
                loop_frame,
                ..Default::default()
            },
        })
    }

    fn check_signature(data: &[u8], format: YmFileFormat) -> Result<()> {
        if data.get(4..12) != Some(&LEONARD_SIGNATURE[..]) {
            return Err(parse_error(format!("Invalid {} signature", format)));
        }
        Ok(())
    }

    /// Parse YM4 header (26 bytes fixed size)
    fn parse_ym4_header(data: &[u8]) -> Result<YmHeader> {
        if data.len() < 26 {
            return Err(parse_error("YM4 file too small for header"));
        }
        Self::check_signature(data, YmFileFormat::Ym4)?;

        let frame_count = read_be_u32(data, 12)?;
        check_frame_count(frame_count, "YM4")?;

        Ok(YmHeader {
            frame_count,
            attributes: YmAttributes::from_bits_truncate(read_be_u32(data, 16)?),
            digidrum_count: read_be_u16(data, 20)?,
            loop_frame: read_be_u32(data, 22)?,
            master_clock: None,
            frame_rate: None,
            extra_data_size: 0,
            body_start_offset: 26,
        })
    }

    /// Parse YM5 header (34 bytes fixed size, extends YM4)
    fn parse_ym5_header(data: &[u8]) -> Result<YmHeader> {
        if data.len() < 34 {
            return Err(parse_error("YM5 file too small for header"));
        }
        Self::check_signature(data, YmFileFormat::Ym5)?;

        let frame_count = read_be_u32(data, 12)?;
        check_frame_count(frame_count, "YM5")?;

        Ok(YmHeader {
            frame_count,
            attributes: YmAttributes::from_bits_truncate(read_be_u32(data, 16)?),
            digidrum_count: read_be_u16(data, 20)?,
            master_clock: Some(read_be_u32(data, 22)?),
            frame_rate: Some(read_be_u16(data, 26)?),
            loop_frame: read_be_u32(data, 28)?,
            extra_data_size: read_be_u16(data, 32)?,
            body_start_offset: 34,
        })
    }

    /// Parse YM4/YM5 body: extra data, digidrums, strings, frames
    fn parse_with_header(data: &[u8], header: YmHeader, format: YmFileFormat) -> Result<YmSong> {
        let format_name = format.to_string();
        let mut offset = header
            .body_start_offset
            .checked_add(header.extra_data_size as usize)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| parse_error(format!("{} truncated in extra data section", format)))?;

        offset = skip_digidrums(data, offset, header.digidrum_count, &format_name)?;

        let song_name = read_nt_string(data, &mut offset);
        let author = read_nt_string(data, &mut offset);
        let comment = read_nt_string(data, &mut offset);

        let interleaved = header.attributes.contains(YmAttributes::INTERLEAVED);
        let frame_count = header.frame_count as usize;
        let frames = if format == YmFileFormat::Ym5 {
            // Some YM5 rips only store 14 registers per frame
            read_frames(data, offset, frame_count, 16, interleaved, &format_name).or_else(
                |_| {
                    read_frames(
                        data,
                        offset,
                        frame_count,
                        LEGACY_REGISTERS,
                        interleaved,
                        &format_name,
                    )
                },
            )?
        } else {
            read_frames(
                data,
                offset,
                frame_count,
                LEGACY_REGISTERS,
                interleaved,
                &format_name,
            )?
        };

        Ok(YmSong {
            format,
            frames,
            metadata: YmMetadata {
                song_name,
                author,
                comment,
                frame_count: header.frame_count,
                loop_frame: header.loop_frame,
                master_clock: header.master_clock,
                frame_rate: header.frame_rate,
            },
        })
    }
}

impl FormatParser for YmParser {
    fn parse(&self, data: &[u8]) -> Result<YmSong> {
        match YmFileFormat::from_magic(data) {
            Some(format @ (YmFileFormat::Ym2 | YmFileFormat::Ym3)) => {
                Self::parse_ym3(data, format)
            }
            Some(YmFileFormat::Ym3b) => Self::parse_ym3b(data),
            Some(YmFileFormat::Ym4) => {
                let header = Self::parse_ym4_header(data)?;
                Self::parse_with_header(data, header, YmFileFormat::Ym4)
            }
            Some(YmFileFormat::Ym5) => {
                let header = Self::parse_ym5_header(data)?;
                Self::parse_with_header(data, header, YmFileFormat::Ym5)
            }
            Some(YmFileFormat::Ym6) => Err(parse_error("YM6 data must use the YM6 parser")),
            None => Err(parse_error("Not a valid YM file format")),
        }
    }

    fn name(&self) -> &str {
        "YM Format Parser (YM2/YM3/YM3b/YM4/YM5)"
    }
}
