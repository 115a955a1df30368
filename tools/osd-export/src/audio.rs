//! SPU2 audio -> WAV conversion
//!
//! One WAV file per decoded stream, named after the stream
//! (`SNDBOOTS_0.wav`, `SNDBOOTS_1.wav`, ...).

use anyhow::{Context, Result};
use osd_common::{NamedPcm, SoundOptions, load_sound_file, scan_vag_headers, split_headerless};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Stream name for a file: its stem, or `SOUND`
pub fn stream_base_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("SOUND")
        .to_string()
}

/// Write every stream as `{name}.wav` under `out_dir`
pub fn write_streams(streams: &[NamedPcm], out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let mut written = Vec::with_capacity(streams.len());
    for stream in streams {
        let path = out_dir.join(format!("{}.wav", stream.name));
        std::fs::write(&path, stream.pcm.to_wav())
            .with_context(|| format!("Failed to write WAV: {:?}", path))?;
        tracing::debug!(
            "{}: {} samples @ {} Hz ({:.2}s)",
            stream.name,
            stream.pcm.len(),
            stream.pcm.sample_rate,
            stream.pcm.duration_secs()
        );
        written.push(path);
    }
    Ok(written)
}

/// Decode a sound file and write its streams as WAV
pub fn convert_sound(input: &Path, out_dir: &Path, options: &SoundOptions) -> Result<Vec<PathBuf>> {
    let data =
        std::fs::read(input).with_context(|| format!("Failed to read sound: {:?}", input))?;

    let name = stream_base_name(input);
    let streams = load_sound_file(&name, &data, options);
    if streams.is_empty() {
        anyhow::bail!("No decodable audio streams in {:?}", input);
    }

    let written = write_streams(&streams, out_dir)?;
    tracing::info!("Converted {}: {} stream(s)", name, written.len());
    Ok(written)
}

/// Where the streams of a sound file are
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMap {
    pub vag_offsets: Vec<usize>,
    pub split_ranges: Vec<Range<usize>>,
}

/// Locate streams without decoding them
pub fn scan_streams(data: &[u8], options: &SoundOptions) -> StreamMap {
    StreamMap {
        vag_offsets: scan_vag_headers(data),
        split_ranges: split_headerless(data, &options.split),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osd_common::VagHeader;

    fn vag_file(rate: u32, blocks: usize) -> Vec<u8> {
        let mut data = VagHeader::new((blocks * 16) as u32, rate, "T").to_bytes().to_vec();
        data.resize(data.len() + blocks * 16, 0);
        data
    }

    #[test]
    fn test_convert_two_streams() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("SNDTEST.bin");
        let mut data = vag_file(22050, 4);
        data.extend(vag_file(11025, 2));
        std::fs::write(&input, &data).unwrap();

        let out = dir.path().join("wav");
        let written = convert_sound(&input, &out, &SoundOptions::default()).unwrap();
        assert_eq!(
            written,
            vec![out.join("SNDTEST_0.wav"), out.join("SNDTEST_1.wav")]
        );

        let reader = hound::WavReader::open(&written[1]).unwrap();
        assert_eq!(reader.spec().sample_rate, 11025);
        assert_eq!(reader.len(), 56);
    }

    #[test]
    fn test_convert_empty_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("SNDNONE.bin");
        std::fs::write(&input, [0u8; 16]).unwrap();
        assert!(convert_sound(&input, dir.path(), &SoundOptions::default()).is_err());
    }

    #[test]
    fn test_scan_streams() {
        let mut data = vag_file(44100, 1);
        data.extend(vag_file(44100, 1));
        let map = scan_streams(&data, &SoundOptions::default());
        assert_eq!(map.vag_offsets, vec![0, 64]);
        assert!(map.split_ranges.is_empty());
    }

    #[test]
    fn test_stream_base_name() {
        assert_eq!(stream_base_name(Path::new("sound/SNDBOOTS.bin")), "SNDBOOTS");
        assert_eq!(stream_base_name(Path::new("")), "SOUND");
    }
}
