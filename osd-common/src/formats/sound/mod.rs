//! SPU2 audio: `VAGp` files and headerless ADPCM archives
//!
//! A `VAGp` file is a 48-byte big-endian header followed by ADPCM blocks.
//! OSDSYS sound archives often contain several such files back to back, or
//! no headers at all (see [`split`]).
//!
//! # Layout
//! ```text
//! 0x00: magic "VAGp"
//! 0x04: version u32 BE
//! 0x08: reserved (4 bytes)
//! 0x0C: data_size u32 BE (bytes of ADPCM after the header)
//! 0x10: sample_rate u32 BE
//! 0x14: reserved (12 bytes)
//! 0x20: name (16 bytes, NUL padded)
//! 0x30: ADPCM blocks (16 bytes each, see osd-vag)
//! ```

pub mod split;

use crate::error::{DecodeError, DecodeResult};

pub use split::{NamedPcm, SoundOptions, SoundSet, SplitConfig, load_sound_file, split_headerless};

/// `VAGp` magic bytes
pub const VAG_MAGIC: [u8; 4] = *b"VAGp";

/// Sample rate used when a stream carries none (or an implausible one)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Highest sample rate accepted from a header
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// VAGp header (48 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VagHeader {
    pub version: u32,
    pub data_size: u32,
    pub sample_rate: u32,
    pub name: [u8; 16],
}

impl VagHeader {
    pub const SIZE: usize = 48;

    pub fn new(data_size: u32, sample_rate: u32, name: &str) -> Self {
        let mut name_bytes = [0u8; 16];
        let len = name.len().min(16);
        name_bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            version: 0x20,
            data_size,
            sample_rate,
            name: name_bytes,
        }
    }

    /// Stream name up to the first NUL, lossily decoded
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(16);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Header rate, or [`DEFAULT_SAMPLE_RATE`] when it is 0 or implausible
    pub fn effective_sample_rate(&self) -> u32 {
        if (1..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            self.sample_rate
        } else {
            tracing::warn!(
                "VAGp sample rate {} out of range, using {}",
                self.sample_rate,
                DEFAULT_SAMPLE_RATE
            );
            DEFAULT_SAMPLE_RATE
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&VAG_MAGIC);
        bytes[4..8].copy_from_slice(&self.version.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.data_size.to_be_bytes());
        bytes[16..20].copy_from_slice(&self.sample_rate.to_be_bytes());
        bytes[32..48].copy_from_slice(&self.name);
        bytes
    }

    /// Read header from bytes
    ///
    /// # Errors
    /// * `InvalidHeader` if fewer than 48 bytes are available
    /// * `BadMagic` if the buffer does not start with `VAGp`
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let header: &[u8; Self::SIZE] = bytes
            .get(..Self::SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(DecodeError::InvalidHeader {
                needed: Self::SIZE,
                actual: bytes.len(),
            })?;

        let be32 = |at: usize| {
            u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
        };

        let magic = [header[0], header[1], header[2], header[3]];
        if magic != VAG_MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }

        let mut name = [0u8; 16];
        name.copy_from_slice(&header[32..48]);

        Ok(Self {
            version: be32(4),
            data_size: be32(12),
            sample_rate: be32(16),
            name,
        })
    }
}

/// Decoded mono 16-bit audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Offsets of every `VAGp` header in a buffer
///
/// Only 4-byte aligned offsets with a full header after them are reported.
pub fn scan_vag_headers(data: &[u8]) -> Vec<usize> {
    if data.len() < VagHeader::SIZE {
        return Vec::new();
    }
    (0..=data.len() - VagHeader::SIZE)
        .step_by(4)
        .filter(|&i| data[i..i + 4] == VAG_MAGIC)
        .collect()
}

/// Decode a single `VAGp` stream starting at the beginning of `data`
///
/// A declared data size of 0, or one larger than what follows the header, is
/// clamped to the bytes actually present.
///
/// # Errors
/// * `InvalidHeader` / `BadMagic` from the header
/// * `NoAudioData` if the payload holds no complete block
pub fn decode_vag(data: &[u8]) -> DecodeResult<PcmBuffer> {
    let header = VagHeader::from_bytes(data)?;
    let sample_rate = header.effective_sample_rate();

    let remaining = data.len() - VagHeader::SIZE;
    let declared = header.data_size as usize;
    let size = if declared == 0 || declared > remaining {
        tracing::warn!(
            "VAGp '{}' declares {} data bytes, {} present; using {}",
            header.name(),
            declared,
            remaining,
            remaining
        );
        remaining
    } else {
        declared
    };

    let payload = &data[VagHeader::SIZE..VagHeader::SIZE + size];
    let samples = osd_vag::decode_adpcm(payload)?;
    tracing::debug!(
        "Decoded VAGp '{}': {} samples @ {} Hz",
        header.name(),
        samples.len(),
        sample_rate
    );
    Ok(PcmBuffer::new(samples, sample_rate))
}

/// Decode the `VAGp` stream whose header sits at `offset`
///
/// The stream is bounded by the next header in the buffer, or the end.
pub fn decode_vag_at(data: &[u8], offset: usize) -> DecodeResult<PcmBuffer> {
    let tail = data.get(offset..).ok_or(DecodeError::InvalidHeader {
        needed: VagHeader::SIZE,
        actual: 0,
    })?;

    // Next header strictly after this one
    let end = scan_vag_headers(tail)
        .into_iter()
        .find(|&o| o > 0)
        .unwrap_or(tail.len());

    decode_vag(&tail[..end])
}

/// Decode raw ADPCM with no header
///
/// # Errors
/// Returns `NoAudioData` if `data` holds no complete block
pub fn decode_headerless(data: &[u8], sample_rate: u32) -> DecodeResult<PcmBuffer> {
    let samples = osd_vag::decode_adpcm(data)?;
    Ok(PcmBuffer::new(samples, sample_rate))
}
