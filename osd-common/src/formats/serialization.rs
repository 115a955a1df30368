//! Binary serialization trait for format headers.
//!
//! The fixed-size headers (ICOB, VAGp, WAV) implement `BinarySerializable`
//! so generic code (the export tool's `info` command, tests) can handle them
//! uniformly. Each header keeps its own `to_bytes()` returning a fixed-size
//! array.

use crate::formats::icob::IcobHeader;
use crate::formats::sound::VagHeader;
use crate::formats::wav::WavHeader;

/// Trait for binary-serializable format headers.
///
/// The trait returns `Vec<u8>` because `[u8; Self::SIZE]` cannot appear in a
/// trait signature on stable Rust. Use the type-specific `to_bytes()` for a
/// fixed-size array.
///
/// # Example
///
/// ```
/// use osd_common::formats::{BinarySerializable, IcobHeader};
///
/// let header = IcobHeader::new(1, 0, 36);
///
/// let bytes = header.serialize();
/// let parsed = IcobHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.vertex_count, 36);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Short format name for diagnostics
    const NAME: &'static str;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short or contains invalid data.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for IcobHeader {
    const SIZE: usize = Self::SIZE;
    const NAME: &'static str = "ICOB";

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for VagHeader {
    const SIZE: usize = Self::SIZE;
    const NAME: &'static str = "VAGp";

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes).ok()
    }
}

impl BinarySerializable for WavHeader {
    const SIZE: usize = Self::SIZE;
    const NAME: &'static str = "WAV";

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes).ok()
    }
}
