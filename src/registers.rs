//! YM2149 Register Model
//!
//! Defines the 16 registers (R0-R13, R14-R15 for I/O ports) of the PSG and the
//! per-frame [`RegisterSnapshot`] that the delta tracker consumes.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::fmt;

#[cfg(feature = "ym-format")]
use crate::ym_parser::YmFileFormat;

/// Number of addressable PSG registers
pub const REGISTER_COUNT: usize = 16;

/// Implemented bit width of each register; writes are masked with these values.
const REG_MASK: [u8; REGISTER_COUNT] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF,
];

/// Value of R13 in a YM frame meaning "do not touch the envelope shape"
pub const ENVELOPE_SHAPE_UNCHANGED: u8 = 0xFF;

/// YM2149 Register Address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Channel A Frequency (low byte) - R0
    ChAFreqLo = 0x00,
    /// Channel A Frequency (high byte) - R1
    ChAFreqHi = 0x01,
    /// Channel B Frequency (low byte) - R2
    ChBFreqLo = 0x02,
    /// Channel B Frequency (high byte) - R3
    ChBFreqHi = 0x03,
    /// Channel C Frequency (low byte) - R4
    ChCFreqLo = 0x04,
    /// Channel C Frequency (high byte) - R5
    ChCFreqHi = 0x05,
    /// Noise Frequency Control - R6
    NoiseFreq = 0x06,
    /// Mixer Control (enable/disable channels and noise) - R7
    MixerCtrl = 0x07,
    /// Channel A Amplitude - R8
    ChAAmplitude = 0x08,
    /// Channel B Amplitude - R9
    ChBAmplitude = 0x09,
    /// Channel C Amplitude - R10
    ChCAmplitude = 0x0A,
    /// Envelope Frequency (low byte) - R11
    EnvelopeFreqLo = 0x0B,
    /// Envelope Frequency (high byte) - R12
    EnvelopeFreqHi = 0x0C,
    /// Envelope Shape - R13
    EnvelopeShape = 0x0D,
    /// I/O Port A - R14
    PortA = 0x0E,
    /// I/O Port B - R15
    PortB = 0x0F,
}

impl Register {
    /// All registers in ascending address order
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::ChAFreqLo,
        Register::ChAFreqHi,
        Register::ChBFreqLo,
        Register::ChBFreqHi,
        Register::ChCFreqLo,
        Register::ChCFreqHi,
        Register::NoiseFreq,
        Register::MixerCtrl,
        Register::ChAAmplitude,
        Register::ChBAmplitude,
        Register::ChCAmplitude,
        Register::EnvelopeFreqLo,
        Register::EnvelopeFreqHi,
        Register::EnvelopeShape,
        Register::PortA,
        Register::PortB,
    ];

    /// Convert a raw register number (0-15) to Register enum
    pub fn from_addr(addr: u8) -> Option<Self> {
        Register::from_u8(addr)
    }

    /// Get the register address value
    pub fn addr(self) -> u8 {
        self as u8
    }

    /// Register address as an array index
    pub fn index(self) -> usize {
        self as usize
    }

    /// Mask of the bits the chip actually stores for this register
    pub fn mask(self) -> u8 {
        REG_MASK[self.index()]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::ChAFreqLo => "Channel A Frequency Low",
            Register::ChAFreqHi => "Channel A Frequency High",
            Register::ChBFreqLo => "Channel B Frequency Low",
            Register::ChBFreqHi => "Channel B Frequency High",
            Register::ChCFreqLo => "Channel C Frequency Low",
            Register::ChCFreqHi => "Channel C Frequency High",
            Register::NoiseFreq => "Noise Frequency",
            Register::MixerCtrl => "Mixer Control",
            Register::ChAAmplitude => "Channel A Amplitude",
            Register::ChBAmplitude => "Channel B Amplitude",
            Register::ChCAmplitude => "Channel C Amplitude",
            Register::EnvelopeFreqLo => "Envelope Frequency Low",
            Register::EnvelopeFreqHi => "Envelope Frequency High",
            Register::EnvelopeShape => "Envelope Shape",
            Register::PortA => "I/O Port A",
            Register::PortB => "I/O Port B",
        };
        write!(f, "R{} ({})", self.addr(), name)
    }
}

/// Register values requested by one playback frame.
///
/// A slot is `None` when the frame does not write that register at all. Unset
/// registers are ignored by the delta tracker regardless of the chip state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterSnapshot {
    slots: [Option<u8>; REGISTER_COUNT],
}

impl RegisterSnapshot {
    /// Snapshot with no register set
    pub const fn empty() -> Self {
        Self {
            slots: [None; REGISTER_COUNT],
        }
    }

    /// Snapshot with every register set to the given value
    pub fn from_values(values: [u8; REGISTER_COUNT]) -> Self {
        Self {
            slots: values.map(Some),
        }
    }

    /// Build the snapshot a YM replayer would write to the chip for one frame.
    ///
    /// Values are masked to the register widths, which also drops the YM5/YM6
    /// effect bits carried in the upper nibbles of R1, R3, R6 and R8. R14/R15
    /// hold effect counters in YM files and are never set.
    #[cfg(feature = "ym-format")]
    pub fn from_ym_frame(frame: &[u8; REGISTER_COUNT], format: YmFileFormat) -> Self {
        let mut snapshot = Self::empty();
        let shape_written = frame[Register::EnvelopeShape.index()] != ENVELOPE_SHAPE_UNCHANGED;

        if format == YmFileFormat::Ym2 {
            // Mad Max: a written shape always retriggers envelope 0x0A with R12 cleared
            for reg in &Register::ALL[..=Register::ChCAmplitude.index()] {
                snapshot.set(*reg, frame[reg.index()]);
            }
            if shape_written {
                snapshot.set(
                    Register::EnvelopeFreqLo,
                    frame[Register::EnvelopeFreqLo.index()],
                );
                snapshot.set(Register::EnvelopeFreqHi, 0);
                snapshot.set(Register::EnvelopeShape, 0x0A);
            }
            return snapshot;
        }

        for reg in &Register::ALL[..=Register::EnvelopeFreqHi.index()] {
            snapshot.set(*reg, frame[reg.index()]);
        }
        if shape_written {
            snapshot.set(
                Register::EnvelopeShape,
                frame[Register::EnvelopeShape.index()],
            );
        }
        snapshot
    }

    /// Set a register, masking the value to the register width
    pub fn set(&mut self, reg: Register, value: u8) {
        self.slots[reg.index()] = Some(value & reg.mask());
    }

    /// Set a register without masking
    pub fn set_raw(&mut self, reg: Register, value: u8) {
        self.slots[reg.index()] = Some(value);
    }

    /// Value requested for a register, if any
    pub fn get(&self, reg: Register) -> Option<u8> {
        self.slots[reg.index()]
    }

    /// Number of registers set in this frame
    pub fn set_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no register is set
    pub fn is_empty(&self) -> bool {
        self.set_count() == 0
    }

    /// Set registers with their values, in ascending address order
    pub fn iter_set(&self) -> impl Iterator<Item = (Register, u8)> + '_ {
        Register::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(reg, slot)| slot.map(|value| (*reg, value)))
    }
}
