//! GS texture dump -> PNG conversion

use anyhow::{Context, Result};
use image::RgbaImage;
use osd_common::{TexData, TextureLayout, TextureOptions, decode_texture};
use std::path::Path;

/// What a texture conversion produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSummary {
    pub layout: TextureLayout,
    /// Pixels with non-zero alpha
    pub opaque_pixels: usize,
}

/// Wrap decoded pixels in an `image` buffer
pub fn to_image(tex: TexData) -> Result<RgbaImage> {
    let (width, height) = (tex.width, tex.height);
    RgbaImage::from_raw(width, height, tex.into_pixels())
        .with_context(|| format!("Pixel buffer does not match {}x{}", width, height))
}

/// Detect, decode and save a texture dump as PNG
pub fn convert_texture(
    input: &Path,
    output: &Path,
    options: &TextureOptions,
) -> Result<TextureSummary> {
    let data =
        std::fs::read(input).with_context(|| format!("Failed to read texture: {:?}", input))?;

    let layout = options
        .resolve_layout(data.len())
        .with_context(|| format!("Cannot determine layout of {:?}", input))?;
    let tex = decode_texture(&data, &layout, options)
        .with_context(|| format!("Failed to decode texture: {:?}", input))?;

    let opaque_pixels = tex.pixels.chunks_exact(4).filter(|p| p[3] != 0).count();
    let format = tex.format;
    let addressing = tex.addressing;

    to_image(tex)?
        .save_with_format(output, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write PNG: {:?}", output))?;

    tracing::info!(
        "Converted texture: {}x{} {} ({:?}, offset {}, {:?})",
        layout.width,
        layout.height,
        format,
        layout.source,
        layout.offset,
        addressing
    );

    Ok(TextureSummary {
        layout,
        opaque_pixels,
    })
}
