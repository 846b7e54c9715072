//! `PSYM1` binary format
//!
//! ```text
//! header (18 bytes, little endian)
//!   "PSYM1"        5 bytes
//!   clock Hz       u32
//!   sample rate Hz u8
//!   sample count   u64
//! sample (repeated sample-count times)
//!   N              u8
//!   (reg, value)   N x 2 bytes
//! ```

use super::{PsymFile, SongInfo};
use crate::registers::{Register, REGISTER_COUNT};
use crate::tracker::{EmissionRecord, RegisterWrite, SampleSequence};
use crate::{PsymError, Result};
use nom::bytes::complete::{tag, take};
use nom::number::complete::{le_u32, le_u64, le_u8};
use nom::IResult;
use std::io::{BufWriter, Write};

/// Format tag at the start of every stream
pub const MAGIC: &[u8; 5] = b"PSYM1";

/// Size of the fixed header in bytes
pub const HEADER_LEN: usize = 18;

/// Write the sequence as a `PSYM1` stream
pub fn write_binary<W: Write>(info: &SongInfo, samples: &SampleSequence, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);

    out.write_all(MAGIC)?;
    out.write_all(&info.clock_hz.to_le_bytes())?;
    out.write_all(&[info.sample_rate_hz])?;
    out.write_all(&(samples.len() as u64).to_le_bytes())?;

    for record in samples {
        out.write_all(&[record.count()])?;
        for (reg, value) in record.pairs() {
            out.write_all(&[reg, value])?;
        }
    }

    out.flush()?;
    Ok(())
}

fn header(input: &[u8]) -> IResult<&[u8], (SongInfo, u64)> {
    let (input, _) = tag(&MAGIC[..])(input)?;
    let (input, clock_hz) = le_u32(input)?;
    let (input, sample_rate_hz) = le_u8(input)?;
    let (input, sample_count) = le_u64(input)?;
    Ok((input, (SongInfo::new(clock_hz, sample_rate_hz), sample_count)))
}

fn sample(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, count) = le_u8(input)?;
    take(count as usize * 2)(input)
}

fn record_from_pairs(pairs: &[u8], index: u64) -> Result<EmissionRecord> {
    if pairs.is_empty() {
        return Err(PsymError::FormatError(format!("sample {} is empty", index)));
    }
    if pairs.len() / 2 > REGISTER_COUNT {
        return Err(PsymError::FormatError(format!(
            "sample {} has {} writes, more than {} registers",
            index,
            pairs.len() / 2,
            REGISTER_COUNT
        )));
    }

    let mut writes = Vec::with_capacity(pairs.len() / 2);
    for pair in pairs.chunks_exact(2) {
        let register = Register::from_addr(pair[0]).ok_or_else(|| {
            PsymError::FormatError(format!("sample {} writes unknown register {}", index, pair[0]))
        })?;
        writes.push(RegisterWrite::new(register, pair[1]));
    }

    EmissionRecord::from_writes(writes).ok_or_else(|| {
        PsymError::FormatError(format!("sample {} writes registers out of order", index))
    })
}

/// Decode a complete `PSYM1` stream
///
/// Reads exactly the declared number of samples and rejects trailing data.
pub fn decode(data: &[u8]) -> Result<PsymFile> {
    if data.len() < HEADER_LEN {
        return Err(PsymError::FormatError(format!(
            "stream too short for header ({} bytes)",
            data.len()
        )));
    }

    let (mut rest, (info, sample_count)) = header(data)
        .map_err(|_| PsymError::FormatError("invalid PSYM magic".to_string()))?;

    let mut samples = SampleSequence::new();
    for index in 0..sample_count {
        let (next, pairs) = sample(rest).map_err(|_| {
            PsymError::FormatError(format!(
                "stream truncated in sample {} of {}",
                index, sample_count
            ))
        })?;
        samples.push(record_from_pairs(pairs, index)?);
        rest = next;
    }

    if !rest.is_empty() {
        return Err(PsymError::FormatError(format!(
            "{} trailing bytes after {} samples",
            rest.len(),
            sample_count
        )));
    }

    Ok(PsymFile { info, samples })
}
