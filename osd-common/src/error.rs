//! Decoder error taxonomy
//!
//! Every decoder returns `Result<_, DecodeError>`; nothing panics on malformed
//! input. Conditions that have a sane fallback (model magic mismatch, bogus
//! sample rate, unknown texture size) are logged with `tracing::warn!` and do
//! not produce an error.

use std::io;

/// Errors returned by the asset decoders
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// File could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer is shorter than the fixed-size header
    #[error("header needs {needed} bytes, got {actual}")]
    InvalidHeader { needed: usize, actual: usize },

    /// Header magic does not match and no fallback exists
    #[error("bad magic {found:02X?}")]
    BadMagic { found: [u8; 4] },

    /// Vertex stream cannot form a triangle list
    #[error("invalid geometry: {vertex_count} vertices, {shape_count} shapes (need a non-zero multiple of 3 and at least one shape)")]
    InvalidGeometry { vertex_count: u32, shape_count: u32 },

    /// Data ended before a record was complete
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {actual} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        actual: usize,
    },

    /// Texture size matches no known layout (strict detection only)
    #[error("unrecognized texture layout for {size} bytes")]
    UnrecognizedFormat { size: usize },

    /// Audio payload holds no complete ADPCM block
    #[error("no ADPCM blocks in audio payload")]
    NoAudioData,
}

impl From<osd_vag::VagError> for DecodeError {
    fn from(e: osd_vag::VagError) -> Self {
        match e {
            osd_vag::VagError::Empty(_) => DecodeError::NoAudioData,
        }
    }
}

/// Shorthand used throughout the crate
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_maps_to_no_audio() {
        let err: DecodeError = osd_vag::VagError::Empty(3).into();
        assert!(matches!(err, DecodeError::NoAudioData));
    }

    #[test]
    fn test_display_mentions_counts() {
        let err = DecodeError::InvalidGeometry {
            vertex_count: 4,
            shape_count: 1,
        };
        assert!(err.to_string().contains("4 vertices"));

        let err = DecodeError::BadMagic { found: *b"RIFF" };
        assert!(err.to_string().contains("52"), "{err}");
    }
}
