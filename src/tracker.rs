//! Register Delta Tracking
//!
//! Reduces each frame's [`RegisterSnapshot`] to the register writes that are
//! actually needed to reproduce it, given what has already been written.

use crate::registers::{Register, RegisterSnapshot, REGISTER_COUNT};
use serde::{Deserialize, Serialize};

// Record counts are serialized as a single byte.
const _: () = assert!(REGISTER_COUNT <= u8::MAX as usize);

/// Whether unchanged register values are omitted from the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    /// Only emit registers whose value changed (plus one per repeated frame)
    #[default]
    Enabled,
    /// Emit every register the frame sets
    Disabled,
}

/// Last value written to each register over the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipState {
    written: [Option<u8>; REGISTER_COUNT],
}

impl ChipState {
    /// Fresh state with no register written yet
    pub const fn new() -> Self {
        Self {
            written: [None; REGISTER_COUNT],
        }
    }

    /// Last value written to a register, or `None` if it never was
    pub fn get(&self, reg: Register) -> Option<u8> {
        self.written[reg.index()]
    }

    fn differs(&self, reg: Register, value: u8) -> bool {
        self.written[reg.index()] != Some(value)
    }

    fn write(&mut self, reg: Register, value: u8) {
        self.written[reg.index()] = Some(value);
    }
}

/// A single register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Target register
    pub register: Register,
    /// Value to write
    pub value: u8,
}

impl RegisterWrite {
    /// Create a register write
    pub fn new(register: Register, value: u8) -> Self {
        Self { register, value }
    }
}

/// Register writes chosen for one frame, in ascending register order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmissionRecord {
    writes: Vec<RegisterWrite>,
}

impl EmissionRecord {
    /// Empty record
    pub fn new() -> Self {
        Self {
            writes: Vec::with_capacity(REGISTER_COUNT),
        }
    }

    /// Build a record from writes, rejecting unordered or oversized input
    pub fn from_writes(writes: Vec<RegisterWrite>) -> Option<Self> {
        let ordered = writes
            .windows(2)
            .all(|pair| pair[0].register < pair[1].register);
        (ordered && writes.len() <= REGISTER_COUNT).then_some(Self { writes })
    }

    fn push(&mut self, write: RegisterWrite) {
        self.writes.push(write);
    }

    /// Number of writes, as serialized in the record header byte
    pub fn count(&self) -> u8 {
        self.writes.len() as u8
    }

    /// Number of writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the record has no writes
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// (register address, value) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.writes.iter().map(|w| (w.register.addr(), w.value))
    }
}

/// Tracks chip state across frames and decides which writes each frame needs.
#[derive(Debug, Clone)]
pub struct RegisterDeltaTracker {
    mode: DedupMode,
    state: ChipState,
    frames_seen: u64,
    frames_dropped: u64,
}

impl RegisterDeltaTracker {
    /// Create a tracker with a fresh chip state
    pub fn new(mode: DedupMode) -> Self {
        Self {
            mode,
            state: ChipState::new(),
            frames_seen: 0,
            frames_dropped: 0,
        }
    }

    /// Current chip state
    pub fn chip_state(&self) -> &ChipState {
        &self.state
    }

    /// Frames passed to [`track`](Self::track) so far
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Frames that produced no writes
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Compute the writes for one frame and update the chip state.
    ///
    /// Returns `None` when nothing needs to be written; such frames take no
    /// sample slot in the output.
    ///
    /// With deduplication enabled a frame that changes nothing still re-emits
    /// its lowest set register, so every repeated frame keeps exactly one write.
    pub fn track(&mut self, snapshot: &RegisterSnapshot) -> Option<EmissionRecord> {
        self.frames_seen += 1;

        let changed_count = snapshot
            .iter_set()
            .filter(|&(reg, value)| self.state.differs(reg, value))
            .count();

        let mut record = EmissionRecord::new();
        for (reg, value) in snapshot.iter_set() {
            let emit = match self.mode {
                DedupMode::Disabled => true,
                DedupMode::Enabled => {
                    self.state.differs(reg, value) || (changed_count == 0 && record.is_empty())
                }
            };
            if emit {
                self.state.write(reg, value);
                record.push(RegisterWrite::new(reg, value));
            }
        }

        if record.is_empty() {
            self.frames_dropped += 1;
            tracing::trace!(frame = self.frames_seen - 1, "frame dropped");
            return None;
        }

        tracing::trace!(
            frame = self.frames_seen - 1,
            writes = ?record.pairs().collect::<Vec<_>>(),
            "frame emitted"
        );
        Some(record)
    }
}

impl Default for RegisterDeltaTracker {
    fn default() -> Self {
        Self::new(DedupMode::default())
    }
}

/// All non-empty emission records of a run, in frame order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleSequence {
    records: Vec<EmissionRecord>,
}

impl SampleSequence {
    /// Empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Track one frame and append its record if it has any writes.
    ///
    /// Returns whether a sample was appended.
    pub fn push_frame(
        &mut self,
        tracker: &mut RegisterDeltaTracker,
        snapshot: &RegisterSnapshot,
    ) -> bool {
        match tracker.track(snapshot) {
            Some(record) => {
                self.records.push(record);
                true
            }
            None => false,
        }
    }

    /// Append an already computed record; empty records are ignored
    pub fn push(&mut self, record: EmissionRecord) {
        if !record.is_empty() {
            self.records.push(record);
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the samples
    pub fn iter(&self) -> std::slice::Iter<'_, EmissionRecord> {
        self.records.iter()
    }

    /// Samples as a slice
    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    /// Total register writes across all samples
    pub fn total_writes(&self) -> usize {
        self.records.iter().map(EmissionRecord::len).sum()
    }
}

impl<'a> IntoIterator for &'a SampleSequence {
    type Item = &'a EmissionRecord;
    type IntoIter = std::slice::Iter<'a, EmissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<EmissionRecord> for SampleSequence {
    fn from_iter<I: IntoIterator<Item = EmissionRecord>>(iter: I) -> Self {
        let mut sequence = Self::new();
        for record in iter {
            sequence.push(record);
        }
        sequence
    }
}
