//! osd-assets.toml manifest parsing and batch builds
//!
//! A manifest lists the dumped assets to convert. Paths are relative to the
//! manifest's directory; outputs land in `output` (default `out/`) under
//! `models/`, `textures/` and `sounds/`.

use anyhow::{Context, Result};
use osd_common::{PixelFormat, SoundOptions, SplitConfig, TextureOptions};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::{audio, model, texture};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "osd-assets.toml";

/// osd-assets.toml manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct AssetManifest {
    /// Output directory, relative to the manifest
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub audio: AudioSection,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub sounds: Vec<SoundEntry>,
}

/// Defaults for headerless audio
#[derive(Debug, Deserialize)]
pub struct AudioSection {
    /// Sample rate for streams without a header
    /// Default: 44100
    #[serde(default = "default_sample_rate")]
    pub default_sample_rate: u32,

    /// Minimum bytes for a split stream to be kept
    /// Default: 128
    #[serde(default = "default_min_stream_len")]
    pub min_stream_len: usize,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            default_sample_rate: default_sample_rate(),
            min_stream_len: default_min_stream_len(),
        }
    }
}

fn default_sample_rate() -> u32 {
    osd_common::formats::DEFAULT_SAMPLE_RATE
}

fn default_min_stream_len() -> usize {
    SplitConfig::default().min_stream_len
}

/// ICOB model entry
#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub path: String,

    /// Write every morph target as its own OBJ object
    #[serde(default)]
    pub all_shapes: bool,
}

/// Texture dump entry
#[derive(Debug, Deserialize)]
pub struct TextureEntry {
    pub path: String,

    /// Read 4-bit dumps through the GS page layout
    #[serde(default)]
    pub tiled_4bit: bool,

    /// Layout overrides; anything omitted is detected from the file size
    #[serde(default)]
    pub format: Option<PixelFormat>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl TextureEntry {
    pub fn options(&self) -> TextureOptions {
        TextureOptions {
            tiled_4bit: self.tiled_4bit,
            strict: false,
            format: self.format,
            width: self.width,
            height: self.height,
            offset: self.offset,
        }
    }
}

/// Sound file entry
#[derive(Debug, Deserialize)]
pub struct SoundEntry {
    pub path: String,

    /// Ignore `VAGp` headers and split on stream markers only
    #[serde(default)]
    pub headerless: bool,

    /// Overrides `[audio] default_sample_rate`
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

/// Manifest validation failures
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("{kind} entry {index} has an empty path")]
    EmptyPath { kind: &'static str, index: usize },

    #[error("{kind} '{path}' is listed more than once")]
    Duplicate { kind: &'static str, path: String },

    #[error("{kind}s '{first}' and '{second}' both write output '{stem}'")]
    OutputCollision {
        kind: &'static str,
        stem: String,
        first: String,
        second: String,
    },

    #[error("sample rate {0} is out of range (1..={max})", max = osd_common::formats::MAX_SAMPLE_RATE)]
    SampleRate(u32),

    #[error("manifest lists no assets")]
    Empty,
}

impl AssetManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse osd-assets.toml")
    }

    /// Check paths and audio settings without touching any asset
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.models.is_empty() && self.textures.is_empty() && self.sounds.is_empty() {
            return Err(ManifestError::Empty);
        }

        let groups: [(&'static str, Vec<&str>); 3] = [
            ("model", self.models.iter().map(|e| e.path.as_str()).collect()),
            ("texture", self.textures.iter().map(|e| e.path.as_str()).collect()),
            ("sound", self.sounds.iter().map(|e| e.path.as_str()).collect()),
        ];
        for (kind, paths) in groups {
            let mut seen = HashSet::new();
            // Each kind writes into one flat directory keyed by file stem
            let mut stems: HashMap<String, &str> = HashMap::new();
            for (index, path) in paths.into_iter().enumerate() {
                if path.trim().is_empty() {
                    return Err(ManifestError::EmptyPath { kind, index });
                }
                if !seen.insert(path) {
                    return Err(ManifestError::Duplicate {
                        kind,
                        path: path.to_string(),
                    });
                }
                let stem = if kind == "sound" {
                    audio::stream_base_name(Path::new(path))
                } else {
                    output_stem(path).to_string()
                };
                if let Some(first) = stems.get(&stem) {
                    return Err(ManifestError::OutputCollision {
                        kind,
                        stem,
                        first: first.to_string(),
                        second: path.to_string(),
                    });
                }
                stems.insert(stem, path);
            }
        }

        let rates = std::iter::once(self.audio.default_sample_rate)
            .chain(self.sounds.iter().filter_map(|s| s.sample_rate));
        for rate in rates {
            if !(1..=osd_common::formats::MAX_SAMPLE_RATE).contains(&rate) {
                return Err(ManifestError::SampleRate(rate));
            }
        }

        Ok(())
    }

    /// Sound options for one entry
    pub fn sound_options(&self, entry: &SoundEntry) -> SoundOptions {
        SoundOptions {
            sample_rate: entry.sample_rate.unwrap_or(self.audio.default_sample_rate),
            split: SplitConfig {
                min_stream_len: self.audio.min_stream_len,
            },
            headerless: entry.headerless,
        }
    }

    /// Output directory for a manifest at `manifest_dir`
    pub fn output_dir(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(self.output.as_deref().unwrap_or("out"))
    }
}

/// Counts from a finished build
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub models: usize,
    pub textures: usize,
    /// WAV files written (one sound entry may produce several)
    pub sound_streams: usize,
}

fn output_stem(input: &str) -> &str {
    Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
}

fn output_path(out_dir: &Path, sub: &str, input: &str, ext: &str) -> PathBuf {
    out_dir
        .join(sub)
        .join(format!("{}.{ext}", output_stem(input)))
}

/// Convert every asset in a manifest (parallel)
///
/// `output_override` replaces the manifest's `output` directory.
pub fn build_all(
    manifest: &AssetManifest,
    manifest_dir: &Path,
    output_override: Option<&Path>,
) -> Result<BuildReport> {
    manifest.validate()?;

    let out_dir = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.output_dir(manifest_dir));
    for sub in ["models", "textures", "sounds"] {
        std::fs::create_dir_all(out_dir.join(sub))
            .with_context(|| format!("Failed to create {:?}", out_dir.join(sub)))?;
    }

    // Convert models in parallel
    let models: Result<Vec<_>> = manifest
        .models
        .par_iter()
        .map(|entry| {
            let input = manifest_dir.join(&entry.path);
            let output = output_path(&out_dir, "models", &entry.path, "obj");
            model::convert_model(&input, &output, entry.all_shapes)
        })
        .collect();
    let models = models?;

    // Convert textures in parallel
    let textures: Result<Vec<_>> = manifest
        .textures
        .par_iter()
        .map(|entry| {
            let input = manifest_dir.join(&entry.path);
            let output = output_path(&out_dir, "textures", &entry.path, "png");
            texture::convert_texture(&input, &output, &entry.options())
        })
        .collect();
    let textures = textures?;

    // Convert sounds in parallel
    let sounds: Result<Vec<_>> = manifest
        .sounds
        .par_iter()
        .map(|entry| {
            let input = manifest_dir.join(&entry.path);
            audio::convert_sound(&input, &out_dir.join("sounds"), &manifest.sound_options(entry))
        })
        .collect();
    let sounds = sounds?;

    let report = BuildReport {
        models: models.len(),
        textures: textures.len(),
        sound_streams: sounds.iter().map(Vec::len).sum(),
    };

    tracing::info!(
        "Built {} model(s), {} texture(s), {} sound stream(s) into {:?}",
        report.models,
        report.textures,
        report.sound_streams,
        out_dir
    );

    Ok(report)
}
