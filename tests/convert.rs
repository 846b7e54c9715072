#![cfg(feature = "ym-format")]

use std::fs;
use std::path::Path;

use ym2149_psym::psym::{self, SongInfo};
use ym2149_psym::{load_file, ConvertConfig, Converter, DedupMode, OutputFormat, YmFileFormat};

/// Three non-interleaved YM6 frames:
/// - frame 0 sets the tone, mixer, volume and envelope shape 0x0E
/// - frame 1 repeats it with the shape left unchanged (0xFF)
/// - frame 2 lowers the channel A volume
fn ym6_song(clock: u32, rate: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"YM6!");
    data.extend_from_slice(b"LeOnArD!");
    data.extend_from_slice(&3u32.to_be_bytes()); // frames
    data.extend_from_slice(&0u32.to_be_bytes()); // attributes
    data.extend_from_slice(&0u16.to_be_bytes()); // digidrums
    data.extend_from_slice(&clock.to_be_bytes());
    data.extend_from_slice(&rate.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes()); // loop frame
    data.extend_from_slice(&0u16.to_be_bytes()); // extra data
    data.extend_from_slice(b"Delta Test\0Nobody\0Generated\0");

    let mut frame = [0u8; 16];
    frame[0] = 0xD6;
    frame[1] = 0x01;
    frame[7] = 0x3E;
    frame[8] = 0x0F;
    frame[13] = 0x0E;
    data.extend_from_slice(&frame);

    frame[13] = 0xFF;
    data.extend_from_slice(&frame);

    frame[8] = 0x0C;
    data.extend_from_slice(&frame);

    data.extend_from_slice(b"End!");
    data
}

fn write_input(dir: &Path, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join("song.ym");
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn converts_ym6_file_to_binary_stream() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &ym6_song(2_000_000, 50));
    let output = dir.path().join("song.psym");

    let song = load_file(&input).unwrap();
    assert_eq!(song.format, YmFileFormat::Ym6);
    assert_eq!(song.metadata.song_name, "Delta Test");
    assert_eq!(song.metadata.author, "Nobody");

    let converter = Converter::new(ConvertConfig::default());
    let conversion = converter.convert_frames(&song).unwrap();
    converter.write_to_path(&conversion, &output).unwrap();

    let decoded = psym::decode(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(decoded.info, SongInfo::new(2_000_000, 50));
    assert_eq!(decoded.sample_count(), 3);

    let records = decoded.samples.records();
    // R0-R13 on the first frame
    assert_eq!(records[0].count(), 14);
    assert_eq!(records[0].pairs().last(), Some((13, 0x0E)));
    // Nothing changed: one write keeps the sample alive
    assert_eq!(records[1].pairs().collect::<Vec<_>>(), vec![(0, 0xD6)]);
    assert_eq!(records[2].pairs().collect::<Vec<_>>(), vec![(8, 0x0C)]);
}

#[test]
fn converts_ym6_file_to_python_listing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &ym6_song(1_000_000, 60));
    let output = dir.path().join("song.py");

    let config = ConvertConfig {
        format: OutputFormat::Python,
        ..Default::default()
    };
    let converter = Converter::new(config);
    let conversion = converter.convert_frames(&load_file(&input).unwrap()).unwrap();
    converter.write_to_path(&conversion, &output).unwrap();

    let first = "(0,214),(1,1),(2,0),(3,0),(4,0),(5,0),(6,0),(7,62),(8,15),(9,0),(10,0),(11,0),(12,0),(13,14)";
    let expected = format!(
        "SongInfo = {{'clock': 1000000, 'rate': 60, 'num': 3}}\n\
         Song = [\n\
         \t[{}],\n\
         \t[(0,214)],[(8,12)],]\n",
        first
    );
    assert_eq!(fs::read_to_string(&output).unwrap(), expected);
}

#[test]
fn no_dedup_emits_every_set_register() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &ym6_song(2_000_000, 50));

    let converter = Converter::new(ConvertConfig {
        dedup: DedupMode::Disabled,
        ..Default::default()
    });
    let conversion = converter.convert_frames(&load_file(&input).unwrap()).unwrap();

    let counts: Vec<u8> = conversion.samples.iter().map(|r| r.count()).collect();
    assert_eq!(counts, vec![14, 13, 13]);
}

#[test]
fn config_file_overrides_song_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &ym6_song(2_000_000, 50));
    let config_path = dir.path().join("ym2psym.json");
    fs::write(&config_path, r#"{ "clock_hz": 1773400, "sample_rate_hz": 100 }"#).unwrap();

    let config = ConvertConfig::from_json_file(&config_path).unwrap();
    let conversion = Converter::new(config)
        .convert_frames(&load_file(&input).unwrap())
        .unwrap();
    assert_eq!(conversion.info, SongInfo::new(1_773_400, 100));
}

#[test]
fn headerless_ym3_uses_default_timing() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = b"YM3!".to_vec();
    data.resize(4 + 14 * 2, 0x05);
    let input = write_input(dir.path(), &data);

    let conversion = Converter::default()
        .convert_frames(&load_file(&input).unwrap())
        .unwrap();
    assert_eq!(conversion.info, SongInfo::new(2_000_000, 50));
    assert_eq!(conversion.samples.len(), 2);
}

#[test]
fn rejects_unknown_and_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), b"not a ym file");
    assert!(load_file(&input).is_err());
    assert!(load_file(dir.path().join("missing.ym")).is_err());
}
