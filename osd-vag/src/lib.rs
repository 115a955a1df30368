//! OSD-VAG: SPU2 ADPCM block codec
//!
//! Decodes the 4-bit predictive ADPCM used by the PS2 sound processor into
//! 16-bit mono PCM.
//!
//! **This is a pure codec** - it only understands 16-byte ADPCM blocks. The
//! `VAGp` file header, sample rate handling and archive splitting live in
//! `osd-common` (`formats::sound`).
//!
//! # Block Format
//!
//! ```text
//! 0x00: predictor (high nibble, 0-4) | shift (low nibble)
//! 0x01: flags (0x07 = end / loop-end marker)
//! 0x02: 14 bytes of sample data, 28 signed 4-bit samples
//!       (low nibble first, then high nibble)
//! ```
//!
//! # Prediction
//!
//! Each sample is the sign-extended nibble shifted right by the block's shift
//! amount, plus a 2-tap IIR prediction from the previous two output samples:
//!
//! ```text
//! s = (nibble << 12) >> shift + (h1 * c0 + h2 * c1) / 64
//! ```
//!
//! The history (h1, h2) carries over from block to block and is only reset at
//! the start of a new stream.
//!
//! # Usage
//!
//! ```
//! use osd_vag::{decode_adpcm, VAG_BLOCK_SIZE, VAG_SAMPLES_PER_BLOCK};
//!
//! // Two silent blocks
//! let data = vec![0u8; VAG_BLOCK_SIZE * 2];
//! let pcm = decode_adpcm(&data).unwrap();
//! assert_eq!(pcm.len(), VAG_SAMPLES_PER_BLOCK * 2);
//! assert!(pcm.iter().all(|&s| s == 0));
//! ```

mod decode;
mod filter;

pub use decode::{BlockHeader, decode_adpcm, decode_block};
pub use filter::AdpcmHistory;

// =============================================================================
// Constants
// =============================================================================

/// Size of one ADPCM block in bytes
pub const VAG_BLOCK_SIZE: usize = 16;

/// Samples encoded in one block (14 data bytes x 2 nibbles)
pub const VAG_SAMPLES_PER_BLOCK: usize = 28;

/// Number of distinct predictor filters
pub const VAG_PREDICTOR_COUNT: usize = 5;

/// Flag byte value marking the end (or loop end) of a stream
pub const VAG_FLAG_END: u8 = 0x07;

/// Predictor coefficient pairs (c0, c1), in units of 1/64.
///
/// Index with `predictor % VAG_PREDICTOR_COUNT`.
pub const VAG_PREDICTOR_TABLE: [[i32; 2]; VAG_PREDICTOR_COUNT] = [
    [0, 0],
    [60, 0],
    [115, -52],
    [98, -55],
    [122, -60],
];

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur during ADPCM decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VagError {
    /// Input holds no complete 16-byte block
    #[error("ADPCM data holds no complete {VAG_BLOCK_SIZE}-byte block ({0} bytes)")]
    Empty(usize),
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Clamp value to 16-bit signed range
#[inline]
pub(crate) fn clamp_i16(v: i32) -> i32 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX))
}

// =============================================================================
// Tests
// =============================================================================
