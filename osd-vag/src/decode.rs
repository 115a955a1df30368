//! ADPCM decoder implementation
//!
//! This module handles decoding 16-byte SPU2 ADPCM blocks to PCM samples.
//! Note: This is a pure codec - no file headers are parsed. The caller
//! (osd-common) strips the `VAGp` header and picks the sample rate.

use crate::{
    AdpcmHistory, VAG_BLOCK_SIZE, VAG_FLAG_END, VAG_PREDICTOR_COUNT, VAG_SAMPLES_PER_BLOCK,
    VagError,
};

/// Decoded first two bytes of an ADPCM block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Predictor filter index as stored (0-4 on well-formed data)
    pub predictor: u8,
    /// Right-shift applied to every sample of the block
    pub shift: u8,
    /// Flag byte
    pub flags: u8,
}

impl BlockHeader {
    pub fn from_bytes(block: &[u8; VAG_BLOCK_SIZE]) -> Self {
        Self {
            predictor: block[0] >> 4,
            shift: block[0] & 0x0F,
            flags: block[1],
        }
    }

    /// Predictor index reduced into the filter table range
    pub fn filter(&self) -> u8 {
        self.predictor % VAG_PREDICTOR_COUNT as u8
    }

    /// True if this block carries the end / loop-end marker
    pub fn is_end(&self) -> bool {
        self.flags == VAG_FLAG_END
    }
}

/// Decode a single 16-byte block (28 samples)
///
/// # Arguments
/// * `block` - The 16 encoded bytes
/// * `history` - Filter history (updated during decoding)
/// * `output` - Output buffer for the 28 decoded samples
///
/// # Returns
/// The parsed block header
pub fn decode_block(
    block: &[u8; VAG_BLOCK_SIZE],
    history: &mut AdpcmHistory,
    output: &mut [i16; VAG_SAMPLES_PER_BLOCK],
) -> BlockHeader {
    let header = BlockHeader::from_bytes(block);
    let predictor = header.filter();

    for (i, out) in output.iter_mut().enumerate() {
        let byte = block[2 + i / 2];
        let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };

        // Sign-extend via the top nibble of an i16
        let expanded = i32::from((u16::from(nibble) << 12) as i16);
        let residual = expanded >> header.shift;

        *out = history.step(residual, predictor);
    }

    header
}

/// Decode a run of ADPCM blocks to PCM
///
/// # Arguments
/// * `data` - Raw ADPCM payload (no `VAGp` header). A trailing partial block
///   is ignored.
///
/// # Returns
/// Decoded PCM samples (mono, 16-bit), 28 per complete block
///
/// The end flag does not stop decoding: blocks after it are still decoded.
///
/// # Errors
/// Returns `VagError::Empty` if `data` has no complete block
pub fn decode_adpcm(data: &[u8]) -> Result<Vec<i16>, VagError> {
    let block_count = data.len() / VAG_BLOCK_SIZE;
    if block_count == 0 {
        return Err(VagError::Empty(data.len()));
    }

    let mut output = Vec::with_capacity(block_count * VAG_SAMPLES_PER_BLOCK);
    let mut history = AdpcmHistory::new();
    let mut samples = [0i16; VAG_SAMPLES_PER_BLOCK];

    for chunk in data.chunks_exact(VAG_BLOCK_SIZE) {
        let mut block = [0u8; VAG_BLOCK_SIZE];
        block.copy_from_slice(chunk);

        decode_block(&block, &mut history, &mut samples);
        output.extend_from_slice(&samples);
    }

    Ok(output)
}
