//! GS local-memory addressing
//!
//! The GS stores textures in pages, each page a grid of blocks, each block a
//! small row-major grid of pixels. Blocks inside a page are not stored in
//! raster order; a fixed 32-entry table maps the raster block index to the
//! block's physical slot. Dumped VRAM keeps this physical order, so decoding
//! means asking, for every output pixel, where the GS put it.
//!
//! ```text
//! Format   Page      Block   Blocks (cols x rows)  Bytes/px
//! PSMCT32  64x32     8x8     8x4                   4
//! PSMCT16  64x64     16x8    4x8                   2
//! PSMT8    128x64    16x16   8x4                   1
//! PSMT4    128x128   32x16   4x8                   1/2
//! ```

use super::PixelFormat;

/// Block permutation for 32-bit pages
pub const BLOCK_TABLE_32: [u8; 32] = [
    0, 1, 4, 5, 16, 17, 20, 21, 2, 3, 6, 7, 18, 19, 22, 23, 8, 9, 12, 13, 24, 25, 28, 29, 10, 11,
    14, 15, 26, 27, 30, 31,
];

/// Block permutation for 16-bit pages
pub const BLOCK_TABLE_16: [u8; 32] = [
    0, 2, 8, 10, 1, 3, 9, 11, 4, 6, 12, 14, 5, 7, 13, 15, 16, 18, 24, 26, 17, 19, 25, 27, 20, 22,
    28, 30, 21, 23, 29, 31,
];

/// Block permutation for 8-bit pages
pub const BLOCK_TABLE_8: [u8; 32] = [
    0, 1, 4, 5, 16, 17, 20, 21, 2, 3, 6, 7, 18, 19, 22, 23, 8, 9, 12, 13, 24, 25, 28, 29, 10, 11,
    14, 15, 26, 27, 30, 31,
];

/// Block permutation for 4-bit pages
pub const BLOCK_TABLE_4: [u8; 32] = [
    0, 2, 8, 10, 1, 3, 9, 11, 4, 6, 12, 14, 5, 7, 13, 15, 16, 18, 24, 26, 17, 19, 25, 27, 20, 22,
    28, 30, 21, 23, 29, 31,
];

/// Page/block geometry of one tiled pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub block_width: u32,
    pub block_height: u32,
    /// Bits per pixel
    pub bits: u32,
    pub table: &'static [u8; 32],
}

impl GsGeometry {
    pub const PSMCT32: Self = Self {
        page_width: 64,
        page_height: 32,
        block_width: 8,
        block_height: 8,
        bits: 32,
        table: &BLOCK_TABLE_32,
    };
    pub const PSMCT16: Self = Self {
        page_width: 64,
        page_height: 64,
        block_width: 16,
        block_height: 8,
        bits: 16,
        table: &BLOCK_TABLE_16,
    };
    pub const PSMT8: Self = Self {
        page_width: 128,
        page_height: 64,
        block_width: 16,
        block_height: 16,
        bits: 8,
        table: &BLOCK_TABLE_8,
    };
    pub const PSMT4: Self = Self {
        page_width: 128,
        page_height: 128,
        block_width: 32,
        block_height: 16,
        bits: 4,
        table: &BLOCK_TABLE_4,
    };

    /// Geometry for a format, `None` for formats stored untiled (24-bit)
    pub fn for_format(format: PixelFormat) -> Option<Self> {
        match format {
            PixelFormat::Psm32 => Some(Self::PSMCT32),
            PixelFormat::Psm16 => Some(Self::PSMCT16),
            PixelFormat::Psm8 => Some(Self::PSMT8),
            PixelFormat::Psm4 => Some(Self::PSMT4),
            PixelFormat::Psm24 => None,
        }
    }

    pub const fn pixels_per_page(&self) -> u32 {
        self.page_width * self.page_height
    }

    pub const fn pixels_per_block(&self) -> u32 {
        self.block_width * self.block_height
    }

    pub const fn blocks_per_row(&self) -> u32 {
        self.page_width / self.block_width
    }

    /// Physical pixel index of logical `(x, y)` in a buffer `width` pixels wide
    ///
    /// Computed in `usize`: a tall, narrow buffer can put the page base
    /// past `u32::MAX`.
    pub fn pixel_index(&self, x: u32, y: u32, width: u32) -> usize {
        let (page_w, page_h) = (self.page_width as usize, self.page_height as usize);
        let (block_w, block_h) = (self.block_width as usize, self.block_height as usize);
        let (x, y) = (x as usize, y as usize);

        let pages_per_row = (width as usize).div_ceil(page_w);
        let page = x / page_w + (y / page_h) * pages_per_row;

        let ox = x % page_w;
        let oy = y % page_h;

        let raster_block = (oy / block_h) * self.blocks_per_row() as usize + ox / block_w;
        let block = usize::from(self.table[raster_block]);

        let col = ox % block_w;
        let row = oy % block_h;

        page * self.pixels_per_page() as usize
            + block * self.pixels_per_block() as usize
            + row * block_w
            + col
    }

    /// Physical byte offset of logical `(x, y)`; 4-bit formats return the
    /// byte holding the pixel's nibble
    pub fn address(&self, x: u32, y: u32, width: u32) -> usize {
        self.pixel_index(x, y, width) * self.bits as usize / 8
    }
}

/// Physical byte offset of pixel `(x, y)` in a GS-tiled dump
///
/// `width` is the buffer width in pixels. 24-bit data is not tiled and is
/// addressed linearly at 3 bytes per pixel.
pub fn gs_address(x: u32, y: u32, width: u32, format: PixelFormat) -> usize {
    match GsGeometry::for_format(format) {
        Some(geometry) => geometry.address(x, y, width),
        None => (y as usize * width as usize + x as usize) * 3,
    }
}
