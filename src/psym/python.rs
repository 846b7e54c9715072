//! Python listing output
//!
//! Produces a module with two bindings that MicroPython can import directly:
//!
//! ```text
//! SongInfo = {'clock': 2000000, 'rate': 50, 'num': 3}
//! Song = [
//! 	[(0,0),(1,0),(7,255)],[(4,255),(7,251)],
//! ]
//! ```

use super::SongInfo;
use crate::tracker::SampleSequence;
use crate::Result;
use std::io::{BufWriter, Write};

/// Register pairs after which the current line is wrapped
const PAIRS_PER_LINE: usize = 10;

/// Write the sequence as a Python listing
pub fn write_python<W: Write>(info: &SongInfo, samples: &SampleSequence, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);

    writeln!(
        out,
        "SongInfo = {{'clock': {}, 'rate': {}, 'num': {}}}",
        info.clock_hz,
        info.sample_rate_hz,
        samples.len()
    )?;
    writeln!(out, "Song = [")?;

    let mut pairs_on_line = 0usize;
    for record in samples {
        if pairs_on_line == 0 {
            out.write_all(b"\t")?;
        }
        out.write_all(b"[")?;
        for (i, (reg, value)) in record.pairs().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            write!(out, "({},{})", reg, value)?;
            pairs_on_line += 1;
        }
        out.write_all(b"],")?;
        if pairs_on_line > PAIRS_PER_LINE {
            pairs_on_line = 0;
            writeln!(out)?;
        }
    }
    writeln!(out, "]")?;

    out.flush()?;
    Ok(())
}
