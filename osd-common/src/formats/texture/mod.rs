//! Raw GS texture dumps
//!
//! OSDSYS textures are headerless copies of GS local memory. Nothing in the
//! file says what it is, so the layout is inferred from the file size alone
//! (see [`detect_format`]). Pixel data is stored in GS page/block order and is
//! unswizzled into a row-major RGBA8 buffer.
//!
//! # Layout
//! ```text
//! 0x00: optional header (24 bytes on some dumps, variable on 16-bit dumps)
//! 0x??: pixel data in GS physical order
//!       32-bit: RGBA, alpha 0..128
//!       24-bit: RGB, linear
//!       16-bit: ARGB1555 little endian
//!        8-bit: index / mask value
//!        4-bit: nibble pairs, low nibble first
//! ```

mod detect;
mod gs;
mod read;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeResult;

pub use detect::{detect_format, detect_format_strict};
pub use gs::{
    BLOCK_TABLE_4, BLOCK_TABLE_8, BLOCK_TABLE_16, BLOCK_TABLE_32, GsGeometry, gs_address,
};
pub use read::decode_texture;

/// GS pixel storage mode of a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Psm32,
    Psm24,
    Psm16,
    Psm8,
    Psm4,
}

impl PixelFormat {
    /// Bits per stored pixel
    pub const fn bits(self) -> u32 {
        match self {
            Self::Psm32 => 32,
            Self::Psm24 => 24,
            Self::Psm16 => 16,
            Self::Psm8 => 8,
            Self::Psm4 => 4,
        }
    }

    /// Bytes of pixel data for a `width` x `height` image, rounded up
    pub fn payload_size(self, width: u32, height: u32) -> usize {
        let bits = width as usize * height as usize * self.bits() as usize;
        bits.div_ceil(8)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Psm32 => "psm32",
            Self::Psm24 => "psm24",
            Self::Psm16 => "psm16",
            Self::Psm8 => "psm8",
            Self::Psm4 => "psm4",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "psm32" | "32" => Ok(Self::Psm32),
            "psm24" | "24" => Ok(Self::Psm24),
            "psm16" | "16" => Ok(Self::Psm16),
            "psm8" | "8" => Ok(Self::Psm8),
            "psm4" | "4" => Ok(Self::Psm4),
            other => Err(format!(
                "unknown pixel format '{other}' (expected psm32, psm24, psm16, psm8 or psm4)"
            )),
        }
    }
}

/// Which detection rule produced a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// File size matched a known dump size
    ExactSize,
    /// File size fell in the 16-bit header range
    SizeRange,
    /// File size is a perfect square, read as 8-bit
    PerfectSquare,
    /// Nothing matched; 32-bit guess
    Fallback,
    /// Caller supplied the layout
    Override,
}

/// Where and how the pixels of a dump are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLayout {
    pub width: u32,
    pub height: u32,
    /// Byte offset of the pixel data
    pub offset: usize,
    pub format: PixelFormat,
    pub source: DetectionSource,
}

impl TextureLayout {
    pub fn new(width: u32, height: u32, offset: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            offset,
            format,
            source: DetectionSource::Override,
        }
    }

    /// Linear size of the pixel data in bytes
    pub fn payload_size(&self) -> usize {
        self.format.payload_size(self.width, self.height)
    }
}

/// Decode knobs; every field defaults to automatic detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureOptions {
    /// Read 4-bit dumps through the PSMT4 page layout instead of linearly
    pub tiled_4bit: bool,
    /// Fail on unrecognized sizes instead of guessing 32-bit
    pub strict: bool,
    pub format: Option<PixelFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub offset: Option<usize>,
}

impl TextureOptions {
    fn has_override(&self) -> bool {
        self.format.is_some() || self.width.is_some() || self.height.is_some() || self.offset.is_some()
    }

    /// Detect the layout for a dump of `size` bytes, then apply overrides
    pub fn resolve_layout(&self, size: usize) -> DecodeResult<TextureLayout> {
        let detected = if self.strict {
            detect_format_strict(size)?
        } else {
            detect_format(size)
        };

        if !self.has_override() {
            return Ok(detected);
        }

        let layout = TextureLayout::new(
            self.width.unwrap_or(detected.width),
            self.height.unwrap_or(detected.height),
            self.offset.unwrap_or(detected.offset),
            self.format.unwrap_or(detected.format),
        );
        tracing::debug!(
            "Layout override: {}x{} {} @ {}",
            layout.width,
            layout.height,
            layout.format,
            layout.offset
        );
        Ok(layout)
    }
}

/// How pixel addresses were computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexAddressing {
    /// Row-major, no tiling
    Linear,
    /// GS page/block order
    Swizzled,
}

/// A decoded texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub addressing: TexAddressing,
    /// RGBA8, row-major, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl TexData {
    /// RGBA of pixel `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Detect the layout of a dump and decode it
pub fn load_texture(data: &[u8], options: &TextureOptions) -> DecodeResult<TexData> {
    let layout = options.resolve_layout(data.len())?;
    decode_texture(data, &layout, options)
}
