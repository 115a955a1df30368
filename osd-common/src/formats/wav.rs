//! Canonical PCM WAV output
//!
//! Only the 44-byte header with a single `fmt ` and `data` chunk is
//! produced, and only that shape is parsed back.
//!
//! # Layout
//! ```text
//! 0x00: "RIFF", riff_size u32 LE (36 + data_size)
//! 0x08: "WAVE"
//! 0x0C: "fmt ", 16 u32 LE
//! 0x14: format u16 (1 = PCM), channels u16
//! 0x18: sample_rate u32, byte_rate u32
//! 0x20: block_align u16, bits_per_sample u16
//! 0x24: "data", data_size u32 LE
//! 0x2C: samples, i16 LE
//! ```

use std::io::{self, Write};

use crate::error::{DecodeError, DecodeResult};
use crate::formats::sound::PcmBuffer;

const PCM_FORMAT: u16 = 1;

/// WAV header (44 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Bytes of sample data after the header
    pub data_size: u32,
}

impl WavHeader {
    pub const SIZE: usize = 44;

    /// Header for mono 16-bit samples
    ///
    /// The RIFF size fields are 32-bit; larger buffers saturate at `u32::MAX`.
    pub fn mono16(sample_rate: u32, sample_count: usize) -> Self {
        let data_size = u32::try_from(sample_count.saturating_mul(2)).unwrap_or(u32::MAX);
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            data_size,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(b"RIFF");
        bytes[4..8].copy_from_slice(&self.data_size.saturating_add(36).to_le_bytes());
        bytes[8..12].copy_from_slice(b"WAVE");
        bytes[12..16].copy_from_slice(b"fmt ");
        bytes[16..20].copy_from_slice(&16u32.to_le_bytes());
        bytes[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        bytes[22..24].copy_from_slice(&self.channels.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        bytes[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        bytes[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        bytes[36..40].copy_from_slice(b"data");
        bytes[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        bytes
    }

    /// Read a canonical header
    ///
    /// # Errors
    /// * `InvalidHeader` if fewer than 44 bytes are available
    /// * `BadMagic` if any of the four chunk tags is wrong
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(DecodeError::InvalidHeader {
                needed: Self::SIZE,
                actual: bytes.len(),
            });
        }

        for (at, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            let found = [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
            if &found != tag {
                return Err(DecodeError::BadMagic { found });
            }
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        Ok(Self {
            channels: u16_at(22),
            sample_rate: u32_at(24),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

impl PcmBuffer {
    /// Header describing this buffer
    pub fn wav_header(&self) -> WavHeader {
        WavHeader::mono16(self.sample_rate, self.samples.len())
    }

    /// Encode as a complete WAV file
    pub fn to_wav(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WavHeader::SIZE + self.samples.len() * 2);
        out.extend_from_slice(&self.wav_header().to_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Stream a WAV file to a writer
    pub fn write_wav<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.to_wav())?;
        writer.flush()
    }
}
