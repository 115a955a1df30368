//! Layout detection from file size
//!
//! Rules are checked in order; the first match wins.
//!
//! ```text
//! Size              WxH       Format  Offset
//! 16384             128x128   8       0
//! 8192              64x128    8       0
//! 4096              64x64     8       0
//! 2048              64x64     4       0
//! 16408             128x128   8       24
//! 8216              64x128    8       24
//! 32792             256x128   8       24
//! 131073..=144999   256x256   16      size - 131072
//! 12288 / 12312     64x64     24      0 / 24
//! n*n               nxn       8       0
//! other             square    32      0   (logged)
//! ```

use super::{DetectionSource, PixelFormat, TextureLayout};
use crate::error::{DecodeError, DecodeResult};

/// Pixel bytes of a 256x256 16-bit dump
const PSM16_FULL_SIZE: usize = 256 * 256 * 2;

/// Upper (exclusive) bound of the 16-bit header range
const PSM16_MAX_SIZE: usize = 145_000;

/// Header length on dumps that carry one
const DUMP_HEADER_SIZE: usize = 24;

const PSM24_64_SIZE: usize = 64 * 64 * 3;

fn layout(
    width: u32,
    height: u32,
    offset: usize,
    format: PixelFormat,
    source: DetectionSource,
) -> TextureLayout {
    TextureLayout {
        width,
        height,
        offset,
        format,
        source,
    }
}

fn detect_known(size: usize) -> Option<TextureLayout> {
    use DetectionSource::*;
    use PixelFormat::*;

    let found = match size {
        16384 => layout(128, 128, 0, Psm8, ExactSize),
        8192 => layout(64, 128, 0, Psm8, ExactSize),
        4096 => layout(64, 64, 0, Psm8, ExactSize),
        2048 => layout(64, 64, 0, Psm4, ExactSize),
        16408 => layout(128, 128, DUMP_HEADER_SIZE, Psm8, ExactSize),
        8216 => layout(64, 128, DUMP_HEADER_SIZE, Psm8, ExactSize),
        32792 => layout(256, 128, DUMP_HEADER_SIZE, Psm8, ExactSize),
        s if s > PSM16_FULL_SIZE && s < PSM16_MAX_SIZE => {
            layout(256, 256, s - PSM16_FULL_SIZE, Psm16, SizeRange)
        }
        PSM24_64_SIZE => layout(64, 64, 0, Psm24, ExactSize),
        s if s == PSM24_64_SIZE + DUMP_HEADER_SIZE => {
            layout(64, 64, DUMP_HEADER_SIZE, Psm24, ExactSize)
        }
        s => {
            let n = s.isqrt();
            if n == 0 || n * n != s {
                return None;
            }
            let side = u32::try_from(n).ok()?;
            layout(side, side, 0, Psm8, PerfectSquare)
        }
    };
    Some(found)
}

/// Guess the layout of a dump from its size
///
/// Never fails: sizes matching no rule fall back to a 32-bit square guess,
/// logged as a warning.
pub fn detect_format(size: usize) -> TextureLayout {
    if let Some(found) = detect_known(size) {
        return found;
    }

    let side = u32::try_from((size / 4).isqrt()).unwrap_or(u32::MAX);
    tracing::warn!(
        "Unrecognized texture size {} bytes, guessing {}x{} 32-bit",
        size,
        side,
        side
    );
    layout(side, side, 0, PixelFormat::Psm32, DetectionSource::Fallback)
}

/// Like [`detect_format`] but returns an error instead of guessing
pub fn detect_format_strict(size: usize) -> DecodeResult<TextureLayout> {
    detect_known(size).ok_or(DecodeError::UnrecognizedFormat { size })
}
