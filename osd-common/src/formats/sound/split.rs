//! Headerless archive splitting and named stream loading
//!
//! OSDSYS sound blobs (`SND*.bin`) are often raw ADPCM streams glued
//! together. Each stream ends on a block beginning `07 77 77` (or
//! `00 07 77`), optionally followed by padding blocks that begin `00 00` or
//! `77 77`. The next non-padding block starts the next stream.

use std::ops::Range;

use hashbrown::HashMap;
use osd_vag::VAG_BLOCK_SIZE;

use super::{DEFAULT_SAMPLE_RATE, PcmBuffer, decode_headerless, decode_vag, scan_vag_headers};

/// Files shorter than this are never treated as audio
pub const MIN_SOUND_FILE_SIZE: usize = 32;

/// Default minimum stream length in bytes
pub const DEFAULT_MIN_STREAM_LEN: usize = 128;

/// Tuning for [`split_headerless`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Streams must be strictly longer than this many bytes to be kept
    pub min_stream_len: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_stream_len: DEFAULT_MIN_STREAM_LEN,
        }
    }
}

fn is_delimiter(block: &[u8]) -> bool {
    matches!(block, [0x07, 0x77, 0x77, ..] | [0x00, 0x07, 0x77, ..])
}

fn is_padding(block: &[u8]) -> bool {
    matches!(block, [0x00, 0x00, ..] | [0x77, 0x77, ..])
}

/// Find stream boundaries in a headerless archive
///
/// Returned ranges include their delimiter block. Data after the last
/// delimiter is not returned.
pub fn split_headerless(data: &[u8], config: &SplitConfig) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + VAG_BLOCK_SIZE < data.len() {
        if !is_delimiter(&data[i..]) {
            i += VAG_BLOCK_SIZE;
            continue;
        }

        let end = i + VAG_BLOCK_SIZE;
        if end - start > config.min_stream_len {
            ranges.push(start..end);
        }

        let mut next = end;
        while next + VAG_BLOCK_SIZE < data.len() && is_padding(&data[next..]) {
            next += VAG_BLOCK_SIZE;
        }
        start = next;
        i = next;
    }

    ranges
}

/// How [`load_sound_file`] treats a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundOptions {
    /// Rate for streams without a header
    pub sample_rate: u32,
    pub split: SplitConfig,
    /// Skip `VAGp` detection and go straight to splitting
    pub headerless: bool,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            split: SplitConfig::default(),
            headerless: false,
        }
    }
}

/// A decoded stream with its registered name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPcm {
    pub name: String,
    pub pcm: PcmBuffer,
}

/// Decode every stream in a sound file
///
/// Tried in order:
/// 1. `VAGp` headers: each header up to the next one is a stream
/// 2. Headerless split points (see [`split_headerless`])
/// 3. The whole buffer as one headerless stream, if long enough
///
/// Streams are named `{name}_{i}`. `VAGp` streams take `i` from their header
/// position; headerless streams are numbered in the order they decode.
/// Streams that fail to decode are skipped with a warning.
pub fn load_sound_file(name: &str, data: &[u8], options: &SoundOptions) -> Vec<NamedPcm> {
    if data.len() < MIN_SOUND_FILE_SIZE {
        tracing::debug!("{}: {} bytes is too small for audio", name, data.len());
        return Vec::new();
    }

    let mut streams = Vec::new();

    let offsets = if options.headerless {
        Vec::new()
    } else {
        scan_vag_headers(data)
    };

    if !offsets.is_empty() {
        tracing::info!("{}: {} VAGp stream(s)", name, offsets.len());
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len());
            // Numbered by header position, so a bad stream leaves a gap
            match decode_vag(&data[start..end]) {
                Ok(pcm) => streams.push(NamedPcm {
                    name: format!("{name}_{i}"),
                    pcm,
                }),
                Err(e) => tracing::warn!("{}: skipping VAGp stream at {:#x}: {}", name, start, e),
            }
        }
        return streams;
    }

    // Headerless streams are numbered densely, in decode order
    let mut push = |pcm: PcmBuffer| {
        let name = format!("{}_{}", name, streams.len());
        streams.push(NamedPcm { name, pcm });
    };

    let ranges = split_headerless(data, &options.split);
    if !ranges.is_empty() {
        for range in ranges {
            match decode_headerless(&data[range.clone()], options.sample_rate) {
                Ok(pcm) => push(pcm),
                Err(e) => tracing::warn!("{}: skipping stream {:?}: {}", name, range, e),
            }
        }
        tracing::info!("{}: split into {} stream(s) using markers", name, streams.len());
        return streams;
    }

    if data.len() > options.split.min_stream_len {
        match decode_headerless(data, options.sample_rate) {
            Ok(pcm) => push(pcm),
            Err(e) => tracing::warn!("{}: not decodable as raw ADPCM: {}", name, e),
        }
    }

    streams
}

/// Named streams, looked up by name
///
/// A bare `NAME` resolves to `NAME_0` when no stream is registered under
/// `NAME` itself.
#[derive(Debug, Clone, Default)]
pub struct SoundSet {
    streams: HashMap<String, PcmBuffer>,
    order: Vec<String>,
}

impl SoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream, replacing any stream of the same name
    pub fn insert(&mut self, name: impl Into<String>, pcm: PcmBuffer) {
        let name = name.into();
        if self.streams.insert(name.clone(), pcm).is_none() {
            self.order.push(name);
        }
    }

    /// Decode a file and register all of its streams; returns how many
    pub fn load(&mut self, name: &str, data: &[u8], options: &SoundOptions) -> usize {
        let streams = load_sound_file(name, data, options);
        let count = streams.len();
        for NamedPcm { name, pcm } in streams {
            self.insert(name, pcm);
        }
        count
    }

    pub fn get(&self, name: &str) -> Option<&PcmBuffer> {
        self.streams
            .get(name)
            .or_else(|| self.streams.get(&format!("{name}_0")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::sound::tests::{pulse_block, vag_file};

    const DELIM: [u8; 16] = {
        let mut b = [0x77; 16];
        b[0] = 0x07;
        b
    };

    /// `blocks` audio blocks with a recognisable first sample
    fn stream(nibble: u8, blocks: usize) -> Vec<u8> {
        // Predictor 1 keeps the first byte off the padding pattern; with
        // empty history the first sample is still `nibble << 12`
        let mut first = pulse_block(nibble, 0);
        first[0] = 0x10;

        let mut data = first.to_vec();
        for _ in 1..blocks {
            data.extend_from_slice(&[0x10; 16]);
        }
        data
    }

    fn archive() -> (Vec<u8>, Vec<Range<usize>>) {
        let mut data = stream(1, 10);
        data.extend_from_slice(&DELIM);
        let first = 0..data.len();

        // Two padding blocks, one of each kind
        data.extend_from_slice(&[0u8; 16]);
        data.extend_from_slice(&[0x77u8; 16]);

        let second_start = data.len();
        data.extend(stream(2, 12));
        let mut alt = DELIM;
        alt[0] = 0x00;
        alt[1] = 0x07;
        data.extend_from_slice(&alt);
        let second = second_start..data.len();

        // Trailing block so the last delimiter is inside the scan window
        data.extend_from_slice(&[0x10; 16]);
        (data, vec![first, second])
    }

    #[test]
    fn test_split_keeps_boundaries() {
        let (data, expected) = archive();
        assert_eq!(split_headerless(&data, &SplitConfig::default()), expected);
    }

    #[test]
    fn test_split_drops_short_streams() {
        // 8 blocks + delimiter = 144 bytes; 128 is not enough to drop it,
        // but a higher threshold is
        let mut data = stream(1, 8);
        data.extend_from_slice(&DELIM);
        data.extend_from_slice(&[0x10; 16]);

        assert_eq!(split_headerless(&data, &SplitConfig::default()), vec![0..144]);
        let strict = SplitConfig { min_stream_len: 144 };
        assert!(split_headerless(&data, &strict).is_empty());
    }

    #[test]
    fn test_split_ignores_trailing_data() {
        let mut data = stream(1, 10);
        data.extend_from_slice(&DELIM);
        data.extend(stream(2, 20));
        assert_eq!(split_headerless(&data, &SplitConfig::default()), vec![0..176]);
    }

    #[test]
    fn test_split_last_block_not_scanned() {
        // A delimiter in the final block is outside the scan window
        let mut data = stream(1, 10);
        data.extend_from_slice(&DELIM);
        assert!(split_headerless(&data, &SplitConfig::default()).is_empty());
    }

    #[test]
    fn test_split_no_markers() {
        assert!(split_headerless(&[0x10u8; 1024], &SplitConfig::default()).is_empty());
        assert!(split_headerless(&[], &SplitConfig::default()).is_empty());
    }

    #[test]
    fn test_load_vagp_file() {
        let mut data = vag_file("A", 22050, &[pulse_block(1, 0)]);
        data.extend(vag_file("B", 11025, &[pulse_block(2, 0); 3]));

        let streams = load_sound_file("SNDBOOTS", &data, &SoundOptions::default());
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].name, "SNDBOOTS_0");
        assert_eq!(streams[0].pcm.sample_rate, 22050);
        assert_eq!(streams[1].name, "SNDBOOTS_1");
        assert_eq!(streams[1].pcm.len(), 84);
    }

    #[test]
    fn test_load_vagp_keeps_header_index() {
        // First stream has a header but no blocks and fails to decode
        let mut data = vag_file("A", 22050, &[]);
        data.extend(vag_file("B", 22050, &[pulse_block(1, 0); 4]));

        let streams = load_sound_file("SND", &data, &SoundOptions::default());
        let names: Vec<_> = streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["SND_1"]);
        assert_eq!(streams[0].pcm.len(), 4 * 28);

        let mut set = SoundSet::new();
        assert_eq!(set.load("SND", &data, &SoundOptions::default()), 1);
        assert!(!set.contains("SND"));
        assert!(set.get("SND_0").is_none());
        assert!(set.get("SND_1").is_some());
    }

    #[test]
    fn test_load_split_archive() {
        let (data, _) = archive();
        let streams = load_sound_file("SNDOSDDB", &data, &SoundOptions::default());
        let names: Vec<_> = streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["SNDOSDDB_0", "SNDOSDDB_1"]);
        assert_eq!(streams[0].pcm.samples[0], 4096);
        assert_eq!(streams[1].pcm.samples[0], 8192);
        assert_eq!(streams[0].pcm.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_load_whole_buffer() {
        let data = stream(3, 20);
        let options = SoundOptions {
            sample_rate: 32000,
            ..Default::default()
        };
        let streams = load_sound_file("SNDWARNS", &data, &options);
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "SNDWARNS_0");
        assert_eq!(streams[0].pcm.len(), 20 * 28);
        assert_eq!(streams[0].pcm.sample_rate, 32000);
    }

    #[test]
    fn test_load_tiny_file() {
        assert!(load_sound_file("X", &[0u8; 31], &SoundOptions::default()).is_empty());
        // Long enough to read, too short to be a stream
        assert!(load_sound_file("X", &[0u8; 100], &SoundOptions::default()).is_empty());
    }

    #[test]
    fn test_headerless_option_skips_vagp() {
        let data = vag_file("A", 22050, &[pulse_block(1, 0); 10]);
        let options = SoundOptions {
            headerless: true,
            ..Default::default()
        };
        let streams = load_sound_file("RAW", &data, &options);
        assert_eq!(streams.len(), 1);
        // Header bytes decoded as three extra blocks
        assert_eq!(streams[0].pcm.len(), 13 * 28);
        assert_eq!(streams[0].pcm.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_sound_set_alias() {
        let mut set = SoundSet::new();
        let (data, _) = archive();
        assert_eq!(set.load("SNDOSDDB", &data, &SoundOptions::default()), 2);

        assert!(set.contains("SNDOSDDB"));
        assert_eq!(set.get("SNDOSDDB"), set.get("SNDOSDDB_0"));
        assert!(set.get("SNDOSDDB_1").is_some());
        assert!(set.get("SNDOSDDB_2").is_none());
        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), ["SNDOSDDB_0", "SNDOSDDB_1"]);
    }

    #[test]
    fn test_sound_set_exact_name_wins() {
        let mut set = SoundSet::new();
        set.insert("A_0", PcmBuffer::new(vec![1], 44100));
        set.insert("A", PcmBuffer::new(vec![2], 44100));
        assert_eq!(set.get("A").map(|p| p.samples[0]), Some(2));

        // Re-inserting keeps the original order slot
        set.insert("A_0", PcmBuffer::new(vec![3], 44100));
        assert_eq!(set.names().collect::<Vec<_>>(), ["A_0", "A"]);
        assert_eq!(set.get("A_0").map(|p| p.samples[0]), Some(3));
    }
}
