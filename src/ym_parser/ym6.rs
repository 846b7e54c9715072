//! YM6 format parser for Atari ST chiptunes
//!
//! Format details:
//! - Header: 34 bytes (fixed size, big-endian)
//! - Extra data and digidrum samples (skipped)
//! - Metadata: Song name, author, comment (null-terminated strings)
//! - Register data: 16 bytes per frame (r0-r15), interleaved or not
//! - `End!` marker

use super::{
    check_frame_count, parse_error, read_be_u16, read_be_u32, read_frames, read_nt_string,
    skip_digidrums, FormatParser, YmAttributes, YmFileFormat, YmMetadata, YmSong,
    LEONARD_SIGNATURE,
};
use crate::registers::REGISTER_COUNT;
use crate::Result;

const HEADER_LEN: usize = 34;
const END_MARKER: &[u8; 4] = b"End!";

/// YM6 file header
#[derive(Debug, Clone)]
pub struct Ym6Header {
    /// Number of frames in the file
    pub frame_count: u32,
    /// Song attributes
    pub attributes: YmAttributes,
    /// Number of digidrum samples
    pub digidrum_count: u16,
    /// YM master clock frequency in Hz (usually 2,000,000 for ATARI ST)
    pub master_clock: u32,
    /// Original player frame rate in Hz (usually 50)
    pub frame_rate: u16,
    /// Loop frame number (0 to loop at beginning)
    pub loop_frame: u32,
    /// Size of additional data to skip
    pub extra_data_size: u16,
}

/// YM6 file parser
#[derive(Debug, Clone, Copy, Default)]
pub struct Ym6Parser;

impl Ym6Parser {
    /// Parse YM6 header from data
    pub fn parse_header(data: &[u8]) -> Result<Ym6Header> {
        if data.len() < HEADER_LEN {
            return Err(parse_error("YM6 file too small for header"));
        }
        if YmFileFormat::from_magic(data) != Some(YmFileFormat::Ym6) {
            return Err(parse_error("Invalid YM6 magic number"));
        }
        if &data[4..12] != LEONARD_SIGNATURE {
            return Err(parse_error("Invalid YM6 signature"));
        }

        let frame_count = read_be_u32(data, 12)?;
        check_frame_count(frame_count, "YM6")?;

        Ok(Ym6Header {
            frame_count,
            attributes: YmAttributes::from_bits_truncate(read_be_u32(data, 16)?),
            digidrum_count: read_be_u16(data, 20)?,
            master_clock: read_be_u32(data, 22)?,
            frame_rate: read_be_u16(data, 26)?,
            loop_frame: read_be_u32(data, 28)?,
            extra_data_size: read_be_u16(data, 32)?,
        })
    }
}

impl FormatParser for Ym6Parser {
    fn parse(&self, data: &[u8]) -> Result<YmSong> {
        let header = Self::parse_header(data)?;

        let mut offset = HEADER_LEN
            .checked_add(header.extra_data_size as usize)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| parse_error("Extra data extends beyond file"))?;
        offset = skip_digidrums(data, offset, header.digidrum_count, "YM6")?;

        let song_name = read_nt_string(data, &mut offset);
        let author = read_nt_string(data, &mut offset);
        let comment = read_nt_string(data, &mut offset);

        let frame_count = header.frame_count as usize;
        let frames = read_frames(
            data,
            offset,
            frame_count,
            REGISTER_COUNT,
            header.attributes.contains(YmAttributes::INTERLEAVED),
            "YM6",
        )?;

        let end_marker_offset = offset + frame_count * REGISTER_COUNT;
        match data.get(end_marker_offset..end_marker_offset + END_MARKER.len()) {
            None => return Err(parse_error("YM6 file truncated - missing end marker")),
            Some(marker) if marker != END_MARKER => {
                return Err(parse_error("Invalid YM6 end marker"))
            }
            Some(_) => {}
        }

        Ok(YmSong {
            format: YmFileFormat::Ym6,
            frames,
            metadata: YmMetadata {
                song_name,
                author,
                comment,
                frame_count: header.frame_count,
                loop_frame: header.loop_frame,
                master_clock: Some(header.master_clock),
                frame_rate: Some(header.frame_rate),
            },
        })
    }

    fn name(&self) -> &str {
        "YM6"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(frame_count: u32, interleaved: bool, digidrums: u16, extra: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"YM6!"); // Magic (0-3)
        data.extend_from_slice(b"LeOnArD!"); // Signature (4-11)
        data.extend_from_slice(&frame_count.to_be_bytes()); // Frame count (12-15)
        data.extend_from_slice(&(interleaved as u32).to_be_bytes()); // Attributes (16-19)
        data.extend_from_slice(&digidrums.to_be_bytes()); // Digidrum samples (20-21)
        data.extend_from_slice(&2_000_000u32.to_be_bytes()); // Master clock (22-25)
        data.extend_from_slice(&50u16.to_be_bytes()); // Frame rate (26-27)
        data.extend_from_slice(&0u32.to_be_bytes()); // Loop frame (28-31)
        data.extend_from_slice(&extra.to_be_bytes()); // Extra data (32-33)
        data
    }

    fn create_minimal_ym6(frame_count: u32, interleaved: bool) -> Vec<u8> {
        let mut data = header(frame_count, interleaved, 0, 0);
        data.extend_from_slice(b"Test Song\0");
        data.extend_from_slice(b"Test Author\0");
        data.extend_from_slice(b"Test Comment\0");
        data.resize(data.len() + frame_count as usize * 16, 0x42);
        data.extend_from_slice(b"End!");
        data
    }

    fn create_ym6_with_distinct_values(frame_count: u32, interleaved: bool) -> Vec<u8> {
        let mut data = header(frame_count, interleaved, 0, 0);
        data.extend_from_slice(b"Song\0Author\0Comment\0");

        // value = (reg * 16 + frame) % 256
        if interleaved {
            for reg in 0u32..16 {
                for frame in 0..frame_count {
                    data.push(((reg * 16 + frame) % 256) as u8);
                }
            }
        } else {
            for frame in 0..frame_count {
                for reg in 0u32..16 {
                    data.push(((reg * 16 + frame) % 256) as u8);
                }
            }
        }

        data.extend_from_slice(b"End!");
        data
    }

    #[test]
    fn test_ym6_header_parsing() {
        let data = create_minimal_ym6(100, false);
        let header = Ym6Parser::parse_header(&data).unwrap();

        assert_eq!(header.frame_count, 100);
        assert_eq!(header.master_clock, 2_000_000);
        assert_eq!(header.frame_rate, 50);
        assert_eq!(header.loop_frame, 0);
        assert_eq!(header.digidrum_count, 0);
        assert!(header.attributes.is_empty());
    }

    #[test]
    fn test_ym6_invalid_magic_and_signature() {
        let mut data = create_minimal_ym6(10, false);
        data[0] = 0xFF;
        assert!(Ym6Parser::parse_header(&data).is_err());

        let mut data = create_minimal_ym6(10, false);
        data[4] = 0xFF;
        assert!(Ym6Parser::parse_header(&data).is_err());

        assert!(Ym6Parser::parse_header(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_ym6_song_and_metadata() {
        let data = create_minimal_ym6(5, true);
        let song = Ym6Parser.parse(&data).unwrap();

        assert_eq!(song.format, YmFileFormat::Ym6);
        assert_eq!(song.frames.len(), 5);
        assert!(song.frames.iter().flatten().all(|&reg| reg == 0x42));
        assert_eq!(song.metadata.song_name, "Test Song");
        assert_eq!(song.metadata.author, "Test Author");
        assert_eq!(song.metadata.comment, "Test Comment");
        assert_eq!(song.metadata.frame_count, 5);
        assert_eq!(song.metadata.master_clock, Some(2_000_000));
        assert_eq!(song.metadata.frame_rate, Some(50));
    }

    #[test]
    fn test_ym6_interleaved_correct_values() {
        let song = Ym6Parser
            .parse(&create_ym6_with_distinct_values(3, true))
            .unwrap();
        assert_eq!(song.frames[0][..3], [0x00, 0x10, 0x20]);
        assert_eq!(song.frames[1][..3], [0x01, 0x11, 0x21]);
        assert_eq!(song.frames[2][15], 0xF2);
    }

    #[test]
    fn test_ym6_non_interleaved_correct_values() {
        let song = Ym6Parser
            .parse(&create_ym6_with_distinct_values(3, false))
            .unwrap();
        assert_eq!(song.frames[0][..3], [0x00, 0x10, 0x20]);
        assert_eq!(song.frames[1][..3], [0x01, 0x11, 0x21]);
    }

    #[test]
    fn test_ym6_end_marker_required() {
        let mut data = create_minimal_ym6(5, false);
        let end_pos = data.len() - 4;
        data[end_pos] = 0xFF;
        let err = Ym6Parser.parse(&data).unwrap_err();
        assert!(err.to_string().contains("end marker"));

        let mut data = create_minimal_ym6(5, false);
        data.truncate(data.len() - 4);
        let err = Ym6Parser.parse(&data).unwrap_err();
        assert!(err.to_string().contains("missing end marker"));
    }

    #[test]
    fn test_ym6_frame_count_limits() {
        let mut data = create_minimal_ym6(1, false);
        data[12..16].copy_from_slice(&0u32.to_be_bytes());
        let err = Ym6Parser::parse_header(&data).unwrap_err();
        assert!(err.to_string().contains("zero frames"));

        data[12..16].copy_from_slice(&200_000u32.to_be_bytes());
        let err = Ym6Parser::parse_header(&data).unwrap_err();
        assert!(err.to_string().contains("exceeds reasonable limit"));
    }

    #[test]
    fn test_ym6_skips_digidrums_and_extra_data() {
        let mut data = header(2, false, 2, 20);
        data.extend_from_slice(&[0xFF; 20]);
        data.extend_from_slice(&10u32.to_be_bytes());
        data.extend_from_slice(&[0xAA; 10]);
        data.extend_from_slice(&5u32.to_be_bytes());
        data.extend_from_slice(&[0xBB; 5]);
        data.extend_from_slice(b"Song\0Author\0Comment\0");
        data.extend_from_slice(&[0x42; 32]);
        data.extend_from_slice(b"End!");

        let song = Ym6Parser.parse(&data).unwrap();
        assert_eq!(song.frames.len(), 2);
        assert_eq!(song.metadata.song_name, "Song");
        assert_eq!(song.frames[1][0], 0x42);
    }
}
