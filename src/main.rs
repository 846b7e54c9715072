use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ym2149_psym::{
    load_file, ConvertConfig, Converter, DedupMode, OutputFormat, YmSong,
};

/// Convert YM chiptune files into delta-encoded PSG register streams
#[derive(Parser, Debug)]
#[command(
    name = "ym2psym",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Write a Python listing instead of a PSYM1 binary stream
    #[arg(short = 'p', long = "python")]
    python: bool,

    /// Emit every set register each frame, even when unchanged
    #[arg(long = "no-dedup")]
    no_dedup: bool,

    /// PSG clock written to the output header (default: from the song, else 2000000)
    #[arg(long, value_name = "HZ", value_parser = clap::value_parser!(u32).range(1..))]
    clock: Option<u32>,

    /// Sample rate written to the output header (default: from the song, else 50)
    #[arg(long, value_name = "HZ", value_parser = clap::value_parser!(u8).range(1..))]
    rate: Option<u8>,

    /// JSON configuration file; command line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// YM file to convert (plain or LHA compressed)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, replaced atomically
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

/// Which part of the run failed; selects the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Config,
    Input,
    Output,
}

impl Stage {
    fn exit_code(self) -> u8 {
        match self {
            Stage::Config => 2,
            Stage::Input => 3,
            Stage::Output => 4,
        }
    }
}

#[derive(Debug)]
struct Failure {
    stage: Stage,
    error: anyhow::Error,
}

trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, Failure>;
}

impl<T> StageExt<T> for anyhow::Result<T> {
    fn stage(self, stage: Stage) -> Result<T, Failure> {
        self.map_err(|error| Failure { stage, error })
    }
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new(if verbose == 1 { "debug" } else { "trace" })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<ConvertConfig> {
    let mut config = match &cli.config {
        Some(path) => ConvertConfig::from_json_file(path)
            .with_context(|| format!("failed to load configuration '{}'", path.display()))?,
        None => ConvertConfig::default(),
    };

    if cli.python {
        config.format = OutputFormat::Python;
    }
    if cli.no_dedup {
        config.dedup = DedupMode::Disabled;
    }
    if cli.clock.is_some() {
        config.clock_hz = cli.clock;
    }
    if cli.rate.is_some() {
        config.sample_rate_hz = cli.rate;
    }

    config.validate()?;
    Ok(config)
}

fn check_output_extension(output: &Path, format: OutputFormat) {
    let expected = format.extension();
    let actual = output.extension().and_then(|ext| ext.to_str());
    if actual != Some(expected) {
        tracing::warn!(
            output = %output.display(),
            %format,
            "output name does not end in .{}",
            expected
        );
    }
}

fn print_song_info(song: &YmSong) {
    let meta = &song.metadata;
    let seconds = meta.duration_seconds() as u32;
    println!("Name: {}", meta.song_name);
    println!("Author: {}", meta.author);
    println!("Comment: {}", meta.comment);
    println!("Duration: {}:{:02}", seconds / 60, seconds % 60);
    println!("Driver: {} ({})", song.format.driver_name(), song.format);
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let config = build_config(cli).stage(Stage::Config)?;
    tracing::debug!(?config, "configuration resolved");
    if config.format == OutputFormat::Python {
        println!("Pure python");
    }

    let song = load_file(&cli.input)
        .with_context(|| format!("failed to load '{}'", cli.input.display()))
        .stage(Stage::Input)?;
    print_song_info(&song);

    let converter = Converter::new(config);
    check_output_extension(&cli.output, converter.config().format);
    let conversion = converter
        .convert_frames(&song)
        .context("cannot derive the output header from the song")
        .stage(Stage::Config)?;

    println!(
        "collected {} samples, writing to {}",
        conversion.samples.len(),
        cli.output.display()
    );

    converter
        .write_to_path(&conversion, &cli.output)
        .with_context(|| format!("failed to write '{}'", cli.output.display()))
        .stage(Stage::Output)?;

    tracing::debug!(
        frames = conversion.frames_seen,
        dropped = conversion.frames_dropped,
        writes = conversion.samples.total_writes(),
        "conversion finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            tracing::error!("{:#}", failure.error);
            eprintln!("error: {:#}", failure.error);
            ExitCode::from(failure.stage.exit_code())
        }
    }
}
