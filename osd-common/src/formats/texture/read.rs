//! Per-format pixel readers
//!
//! Every reader produces straight RGBA8. PS2 alpha runs 0..128, so 32-bit
//! and 8-bit alpha are doubled and saturated.

use super::gs::GsGeometry;
use super::{PixelFormat, TexAddressing, TexData, TextureLayout, TextureOptions};
use crate::error::{DecodeError, DecodeResult};

/// Expand a 5-bit channel to 8 bits
#[inline]
fn expand5(c: u16) -> u8 {
    let c = (c & 0x1F) as u8;
    (c << 3) | (c >> 2)
}

/// PS2 alpha (0..128) to 0..255
#[inline]
fn double_alpha(a: u8) -> u8 {
    (u16::from(a) * 2).min(255) as u8
}

/// Reads one pixel of a given format from the payload
struct PixelReader<'a> {
    payload: &'a [u8],
    width: u32,
    format: PixelFormat,
    geometry: Option<GsGeometry>,
}

impl<'a> PixelReader<'a> {
    fn new(payload: &'a [u8], width: u32, format: PixelFormat, addressing: TexAddressing) -> Self {
        let geometry = match addressing {
            TexAddressing::Swizzled => GsGeometry::for_format(format),
            TexAddressing::Linear => None,
        };
        Self {
            payload,
            width,
            format,
            geometry,
        }
    }

    /// Physical pixel index of `(x, y)`
    fn index(&self, x: u32, y: u32) -> usize {
        match &self.geometry {
            Some(g) => g.pixel_index(x, y, self.width),
            None => y as usize * self.width as usize + x as usize,
        }
    }

    fn bytes<const N: usize>(&self, index: usize) -> Option<[u8; N]> {
        let start = index.checked_mul(N)?;
        self.payload.get(start..start + N)?.try_into().ok()
    }

    /// RGBA of `(x, y)`, `None` when its address lies past the payload
    fn read(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let index = self.index(x, y);
        match self.format {
            PixelFormat::Psm32 => {
                let [r, g, b, a] = self.bytes::<4>(index)?;
                Some([r, g, b, double_alpha(a)])
            }
            PixelFormat::Psm24 => {
                let [r, g, b] = self.bytes::<3>(index)?;
                Some([r, g, b, 255])
            }
            PixelFormat::Psm16 => {
                let raw = u16::from_le_bytes(self.bytes::<2>(index)?);
                let (r, g, b) = (expand5(raw), expand5(raw >> 5), expand5(raw >> 10));
                let mut a = if raw & 0x8000 != 0 { 255 } else { 0 };
                // Many dumps leave the alpha bit clear on visible texels
                if a == 0 && (r | g | b) != 0 {
                    a = 255;
                }
                Some([r, g, b, a])
            }
            PixelFormat::Psm8 => {
                let [v] = self.bytes::<1>(index)?;
                let a = if v > 128 { 255 } else { double_alpha(v) };
                Some([255, 255, 255, a])
            }
            PixelFormat::Psm4 => {
                let byte = *self.payload.get(index / 2)?;
                let v = if index % 2 == 0 { byte & 0x0F } else { byte >> 4 };
                Some([255, 255, 255, v * 17])
            }
        }
    }
}

/// Pick the data offset, retrying at 0 when the declared one overruns
fn payload_offset(data: &[u8], layout: &TextureLayout) -> DecodeResult<usize> {
    let required = layout.payload_size();
    if layout.offset.saturating_add(required) <= data.len() {
        return Ok(layout.offset);
    }
    if required <= data.len() {
        tracing::warn!(
            "Pixel data at offset {} overruns {} bytes, reading from 0",
            layout.offset,
            data.len()
        );
        return Ok(0);
    }
    Err(DecodeError::UnexpectedEof {
        offset: layout.offset,
        needed: required,
        actual: data.len(),
    })
}

/// Unswizzle a dump into row-major RGBA8
///
/// 24-bit data is read linearly. 4-bit data is read linearly unless
/// `options.tiled_4bit` is set. Everything else goes through the GS page
/// layout.
///
/// # Errors
/// * `UnrecognizedFormat` if the layout has a zero dimension
/// * `UnexpectedEof` if the buffer is shorter than the linear pixel data
pub fn decode_texture(
    data: &[u8],
    layout: &TextureLayout,
    options: &TextureOptions,
) -> DecodeResult<TexData> {
    let (width, height) = (layout.width, layout.height);
    if width == 0 || height == 0 {
        return Err(DecodeError::UnrecognizedFormat { size: data.len() });
    }

    let offset = payload_offset(data, layout)?;
    let addressing = match layout.format {
        PixelFormat::Psm24 => TexAddressing::Linear,
        PixelFormat::Psm4 if !options.tiled_4bit => TexAddressing::Linear,
        _ => TexAddressing::Swizzled,
    };
    let reader = PixelReader::new(&data[offset..], width, layout.format, addressing);

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    let mut missing = 0usize;

    for y in 0..height {
        for x in 0..width {
            let rgba = reader.read(x, y).unwrap_or_else(|| {
                missing += 1;
                [0; 4]
            });
            let dst = (y as usize * width as usize + x as usize) * 4;
            pixels[dst..dst + 4].copy_from_slice(&rgba);
        }
    }

    if missing > 0 {
        tracing::warn!(
            "{} of {} pixels address past the end of a {}x{} {} dump; left transparent",
            missing,
            width as usize * height as usize,
            width,
            height,
            layout.format
        );
    }

    Ok(TexData {
        width,
        height,
        format: layout.format,
        addressing,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::texture::detect_format;

    fn decode(data: &[u8], layout: &TextureLayout) -> TexData {
        decode_texture(data, layout, &TextureOptions::default()).unwrap()
    }

    #[test]
    fn test_expand5() {
        assert_eq!(expand5(0), 0);
        assert_eq!(expand5(31), 255);
        assert_eq!(expand5(16), 132);
    }

    #[test]
    fn test_psm8_alpha_mask() {
        // 64x64 8-bit, single page: fill with 0x40 -> alpha 128
        let mut data = vec![0x40u8; 4096];
        data[0] = 200; // (0,0) is physical byte 0
        data[1] = 128; // (1,0) is physical byte 1
        let tex = decode(&data, &detect_format(4096));
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(tex.pixel(1, 0), Some([255, 255, 255, 255]));
        assert_eq!(tex.pixel(2, 0), Some([255, 255, 255, 128]));
        assert_eq!(tex.addressing, TexAddressing::Swizzled);
    }

    #[test]
    fn test_psm4_linear_nibbles() {
        let mut data = vec![0u8; 2048];
        data[0] = 0x3A; // x=0 -> 0xA, x=1 -> 0x3
        data[32] = 0x01; // row 1 starts at byte 32
        let tex = decode(&data, &detect_format(2048));
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 0xA * 17]));
        assert_eq!(tex.pixel(1, 0), Some([255, 255, 255, 0x3 * 17]));
        assert_eq!(tex.pixel(0, 1), Some([255, 255, 255, 17]));
    }

    #[test]
    fn test_psm4_tiled_opt_in() {
        let mut data = vec![0u8; 2048];
        // (32, 0) is raster block 1 -> physical block 2 -> pixel 1024 -> byte 512
        data[512] = 0x0F;
        let layout = detect_format(2048);
        let options = TextureOptions {
            tiled_4bit: true,
            ..Default::default()
        };
        let tex = decode_texture(&data, &layout, &options).unwrap();
        assert_eq!(tex.addressing, TexAddressing::Swizzled);
        assert_eq!(tex.pixel(32, 0), Some([255, 255, 255, 255]));
        assert_eq!(tex.pixel(33, 0), Some([255, 255, 255, 0]));
    }

    #[test]
    fn test_psm16_channels() {
        let layout = TextureLayout::new(64, 64, 0, PixelFormat::Psm16);
        let mut data = vec![0u8; layout.payload_size()];
        // Pure red, alpha bit clear -> forced opaque
        data[0..2].copy_from_slice(&0x001Fu16.to_le_bytes());
        // Alpha bit only -> black, opaque
        data[2..4].copy_from_slice(&0x8000u16.to_le_bytes());
        // Pure blue with alpha
        data[4..6].copy_from_slice(&(0x8000u16 | (31 << 10)).to_le_bytes());

        let tex = decode(&data, &layout);
        assert_eq!(tex.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(tex.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(tex.pixel(2, 0), Some([0, 0, 255, 255]));
        // All-zero texel stays transparent
        assert_eq!(tex.pixel(3, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_psm16_header_offset() {
        let size = 131072 + 100;
        let mut data = vec![0u8; size];
        data[100..102].copy_from_slice(&0x7FFFu16.to_le_bytes());
        let tex = decode(&data, &detect_format(size));
        assert_eq!(tex.format, PixelFormat::Psm16);
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(tex.pixel(1, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_psm24_linear_opaque() {
        let mut data = vec![0u8; 12312];
        data[24..27].copy_from_slice(&[1, 2, 3]);
        data[24 + 64 * 3..24 + 64 * 3 + 3].copy_from_slice(&[4, 5, 6]);
        let tex = decode(&data, &detect_format(data.len()));
        assert_eq!(tex.addressing, TexAddressing::Linear);
        assert_eq!(tex.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(tex.pixel(0, 1), Some([4, 5, 6, 255]));
        assert_eq!(tex.pixel(1, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_psm32_alpha_doubling() {
        let layout = TextureLayout::new(64, 32, 0, PixelFormat::Psm32);
        let mut data = vec![0u8; layout.payload_size()];
        data[0..4].copy_from_slice(&[10, 20, 30, 0x40]);
        data[4..8].copy_from_slice(&[0, 0, 0, 0x80]);
        data[8..12].copy_from_slice(&[0, 0, 0, 0xFF]);
        let tex = decode(&data, &layout);
        assert_eq!(tex.pixel(0, 0), Some([10, 20, 30, 128]));
        assert_eq!(tex.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(tex.pixel(2, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_psm32_unswizzle() {
        // 64x32 32-bit is one page; (8, 0) is physical block 1
        let layout = TextureLayout::new(64, 32, 0, PixelFormat::Psm32);
        let mut data = vec![0u8; layout.payload_size()];
        data[64 * 4..64 * 4 + 4].copy_from_slice(&[9, 9, 9, 64]);
        let tex = decode(&data, &layout);
        assert_eq!(tex.pixel(8, 0), Some([9, 9, 9, 128]));
        assert_eq!(tex.pixel(7, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_bad_offset_retries_at_zero() {
        let layout = TextureLayout::new(64, 64, 100, PixelFormat::Psm8);
        let mut data = vec![0u8; 4096];
        data[0] = 255;
        let tex = decode(&data, &layout);
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_short_buffer_is_eof() {
        let layout = TextureLayout::new(64, 64, 0, PixelFormat::Psm8);
        let err = decode_texture(&[0u8; 100], &layout, &TextureOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                needed: 4096,
                actual: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_narrow_tiled_dump_does_not_overrun() {
        // 64x128 8-bit: tiling addresses up to 12288 bytes in an 8192-byte dump
        let data = vec![0xFFu8; 8192];
        let tex = decode(&data, &detect_format(8192));
        assert_eq!(tex.pixels.len(), 64 * 128 * 4);
        let transparent = tex.pixels.chunks_exact(4).filter(|p| p[3] == 0).count();
        assert!(transparent > 0);
        assert!(transparent < 64 * 128);
    }

    #[test]
    fn test_width_one_override() {
        // 1x256 8-bit: rows step through block 0 16 bytes apart; rows past
        // the first page address beyond the 256-byte payload
        let layout = TextureLayout::new(1, 256, 0, PixelFormat::Psm8);
        let mut data = vec![0u8; layout.payload_size()];
        data[0] = 0x40;
        data[16] = 0x20;

        let tex = decode(&data, &layout);
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 128]));
        assert_eq!(tex.pixel(0, 1), Some([255, 255, 255, 64]));
        assert_eq!(tex.pixel(0, 64), Some([0, 0, 0, 0]));
        assert_eq!(tex.pixel(0, 255), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let layout = detect_format(0);
        assert!(matches!(
            decode_texture(&[], &layout, &TextureOptions::default()),
            Err(DecodeError::UnrecognizedFormat { size: 0 })
        ));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data: Vec<u8> = (0..16384u32).map(|i| (i * 31 % 253) as u8).collect();
        let layout = detect_format(data.len());
        assert_eq!(decode(&data, &layout), decode(&data, &layout));
    }
}
