//! osd-export library
//!
//! Asset conversion functions behind the `osd-export` CLI, usable from other
//! tools (batch scripts, viewers).

pub mod audio;
pub mod manifest;
pub mod model;
pub mod texture;

// Re-export key types for conversions
pub use audio::{StreamMap, convert_sound, scan_streams};
pub use manifest::{AssetManifest, BuildReport, MANIFEST_FILE, ManifestError, build_all};
pub use model::{ModelSummary, convert_model, write_obj};
pub use texture::{TextureSummary, convert_texture};
