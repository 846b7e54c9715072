//! Conversion pipeline
//!
//! Ties the pieces together: register snapshots go through a
//! [`RegisterDeltaTracker`] into a [`SampleSequence`], which is then encoded
//! in the configured [`OutputFormat`].

use crate::psym::{self, OutputFormat, SongInfo, DEFAULT_CLOCK_HZ, DEFAULT_SAMPLE_RATE_HZ};
use crate::registers::RegisterSnapshot;
use crate::tracker::{DedupMode, RegisterDeltaTracker, SampleSequence};
use crate::{PsymError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(feature = "ym-format")]
use crate::ym_parser::YmSong;

/// Conversion settings
///
/// `None` for the clock or rate means "use what the song declares", falling
/// back to 2 MHz / 50 Hz when the song declares nothing. Loadable from JSON:
///
/// ```json
/// { "clock_hz": 1773400, "sample_rate_hz": 50, "format": "python", "dedup": "disabled" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// PSG clock written to the output header
    pub clock_hz: Option<u32>,
    /// Sample rate written to the output header
    pub sample_rate_hz: Option<u8>,
    /// Output encoding
    pub format: OutputFormat,
    /// Whether unchanged register writes are omitted
    pub dedup: DedupMode,
}

impl ConvertConfig {
    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PsymError::ConfigError(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            PsymError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values no player can use
    pub fn validate(&self) -> Result<()> {
        if self.clock_hz == Some(0) {
            return Err(PsymError::ConfigError("clock must be non-zero".into()));
        }
        if self.sample_rate_hz == Some(0) {
            return Err(PsymError::ConfigError("sample rate must be non-zero".into()));
        }
        Ok(())
    }

    /// Resolve the output header from these settings and what the song declares
    pub fn resolve(&self, source_clock: Option<u32>, source_rate: Option<u16>) -> Result<SongInfo> {
        self.validate()?;

        let clock_hz = self
            .clock_hz
            .or(source_clock.filter(|&clock| clock > 0))
            .unwrap_or(DEFAULT_CLOCK_HZ);

        let sample_rate_hz = match (self.sample_rate_hz, source_rate) {
            (Some(rate), _) => rate,
            (None, Some(rate)) if rate > 0 => u8::try_from(rate).map_err(|_| {
                PsymError::ConfigError(format!(
                    "song frame rate {} Hz does not fit the 8-bit sample rate field; \
                     set the rate explicitly",
                    rate
                ))
            })?,
            (None, _) => DEFAULT_SAMPLE_RATE_HZ,
        };

        Ok(SongInfo::new(clock_hz, sample_rate_hz))
    }
}

/// Result of tracking a whole song, ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Header parameters
    pub info: SongInfo,
    /// Collected samples
    pub samples: SampleSequence,
    /// Snapshots fed to the tracker
    pub frames_seen: u64,
    /// Snapshots that produced no sample
    pub frames_dropped: u64,
}

/// Runs the tracker over a song and writes the result
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    /// Create a converter
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Active settings
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Track a snapshot sequence with a fresh chip state
    pub fn convert_snapshots<I>(&self, snapshots: I, info: SongInfo) -> Conversion
    where
        I: IntoIterator<Item = RegisterSnapshot>,
    {
        let mut tracker = RegisterDeltaTracker::new(self.config.dedup);
        let samples: SampleSequence = snapshots
            .into_iter()
            .filter_map(|snapshot| tracker.track(&snapshot))
            .collect();

        tracing::debug!(
            frames = tracker.frames_seen(),
            dropped = tracker.frames_dropped(),
            samples = samples.len(),
            writes = samples.total_writes(),
            dedup = ?self.config.dedup,
            "tracked register snapshots"
        );

        Conversion {
            info,
            samples,
            frames_seen: tracker.frames_seen(),
            frames_dropped: tracker.frames_dropped(),
        }
    }

    /// Track every frame of a parsed YM song
    #[cfg(feature = "ym-format")]
    pub fn convert_frames(&self, song: &YmSong) -> Result<Conversion> {
        let info = self
            .config
            .resolve(song.metadata.master_clock, song.metadata.frame_rate)?;
        Ok(self.convert_snapshots(song.snapshots(), info))
    }

    /// Encode a conversion in the configured format
    pub fn write<W: Write>(&self, conversion: &Conversion, writer: W) -> Result<()> {
        psym::encode(
            self.config.format,
            &conversion.info,
            &conversion.samples,
            writer,
        )
    }

    /// Encode into `path`, replacing it atomically
    ///
    /// The output is written to a temporary file in the destination directory
    /// and renamed over `path` once complete, so a failed write leaves no
    /// partial file behind. An existing target keeps its permissions; a new
    /// file gets the usual `0o666` minus the umask on Unix.
    pub fn write_to_path(&self, conversion: &Conversion, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut temp_file = builder.tempfile_in(dir)?;
        if let Ok(existing) = fs::metadata(path) {
            temp_file.as_file().set_permissions(existing.permissions())?;
        }

        self.write(conversion, temp_file.as_file_mut())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| PsymError::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            format = %self.config.format,
            samples = conversion.samples.len(),
            "output written"
        );
        Ok(())
    }
}
