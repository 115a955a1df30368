//! Shared decoders for PS2 system-menu (OSDSYS) assets
//!
//! This crate turns the raw files dumped from the PS2 browser into data a
//! modern renderer or audio stack can use:
//! - `osd-export` (CLI converter to OBJ / PNG / WAV)
//! - anything that wants the decoded buffers directly
//!
//! # Modules
//!
//! - [`formats::icob`] - ICOB icon models (fixed-point morph-target meshes)
//! - [`formats::texture`] - GS texture dumps (size detection, unswizzle)
//! - [`formats::sound`] - `VAGp` and headerless SPU2 ADPCM archives
//! - [`formats::wav`] - canonical PCM WAV output
//!
//! All decoders are synchronous, side-effect free and never panic on
//! malformed input; failures are reported as [`DecodeError`].

mod error;
pub mod formats;

use std::path::Path;

pub use error::{DecodeError, DecodeResult};

// Re-export commonly used format items
pub use formats::BinarySerializable;

// Models
pub use formats::{IcobHeader, IcobMesh, IcobShapes, IcobVertex, decode_icob, decode_icob_shapes};

// Textures
pub use formats::{
    DetectionSource, PixelFormat, TexAddressing, TexData, TextureLayout, TextureOptions,
    decode_texture, detect_format, detect_format_strict, gs_address, load_texture,
};

// Audio
pub use formats::{
    NamedPcm, PcmBuffer, SoundOptions, SoundSet, SplitConfig, VagHeader, WavHeader,
    decode_headerless, decode_vag, decode_vag_at, load_sound_file, scan_vag_headers,
    split_headerless,
};

/// Read a whole asset file into memory
pub fn read_asset(path: impl AsRef<Path>) -> DecodeResult<Vec<u8>> {
    Ok(std::fs::read(path)?)
}
