//! OSDSYS asset formats
//!
//! None of these formats are self-describing in a useful way: ICOB has a
//! magic word that is not always right, texture dumps carry no header at
//! all, and sound archives mix `VAGp` files with raw ADPCM. Each decoder
//! validates what it can and falls back (with a `tracing` warning) where
//! the hardware would not care.
//!
//! The fixed-size headers implement [`BinarySerializable`].

pub mod icob;
mod serialization;
pub mod sound;
pub mod texture;
pub mod wav;

pub use icob::*;
pub use serialization::BinarySerializable;
pub use sound::*;
pub use texture::*;
pub use wav::*;
