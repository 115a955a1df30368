//! Synthetic OSDSYS asset files for integration tests

use osd_common::VagHeader;
use std::path::Path;

/// A single triangle ICOB with `shape_count` morph targets.
/// Shape `s` is shape 0 raised by `s` units on Y.
pub fn generate_icob(path: &Path, shape_count: u32) -> std::io::Result<()> {
    let mut data = Vec::new();
    for word in [0x0001_0000u32, shape_count, 0, 0x3F80_0000, 3] {
        data.extend_from_slice(&word.to_le_bytes());
    }

    let corners: [[i16; 3]; 3] = [[0, 0, 0], [4096, 0, 0], [0, 4096, 0]];
    for (i, c) in corners.iter().enumerate() {
        for shape in 0..shape_count as i16 {
            for v in [c[0], c[1] + shape * 4096, c[2], 0] {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        for v in [0i16, 0, 4096, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&((i as i16) * 2048).to_le_bytes());
        data.extend_from_slice(&0i16.to_le_bytes());
        data.extend_from_slice(&0x80FF_FFFFu32.to_le_bytes());
    }

    std::fs::write(path, data)
}

/// 64x64 4-bit dump: even pixels index 0 (transparent), odd pixels 15
pub fn generate_4bit_texture(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, vec![0xF0u8; 2048])
}

/// ADPCM block with filter 1, shift 0 and every nibble set to `nibble`
fn adpcm_block(nibble: u8) -> [u8; 16] {
    let mut block = [(nibble << 4) | nibble; 16];
    block[0] = 0x10;
    block[1] = 0x00;
    block
}

/// VAGp stream with `blocks` ADPCM blocks
pub fn vag_stream(name: &str, sample_rate: u32, blocks: usize) -> Vec<u8> {
    let mut data = VagHeader::new((blocks * 16) as u32, sample_rate, name)
        .to_bytes()
        .to_vec();
    for _ in 0..blocks {
        data.extend_from_slice(&adpcm_block(1));
    }
    data
}

/// Two VAGp streams back to back
pub fn generate_vag_archive(path: &Path) -> std::io::Result<()> {
    let mut data = vag_stream("FIRST", 22050, 4);
    data.extend(vag_stream("SECOND", 11025, 2));
    std::fs::write(path, data)
}

/// Two headerless streams of `blocks` data blocks each, separated by
/// delimiter and padding blocks
pub fn generate_headerless_archive(path: &Path, blocks: usize) -> std::io::Result<()> {
    let mut delimiter = [0u8; 16];
    delimiter[..3].copy_from_slice(&[0x07, 0x77, 0x77]);

    let mut data = Vec::new();
    for _ in 0..2 {
        for _ in 0..blocks {
            data.extend_from_slice(&adpcm_block(2));
        }
        data.extend_from_slice(&delimiter);
        data.extend_from_slice(&[0x77; 16]);
        data.extend_from_slice(&[0x00; 16]);
    }
    std::fs::write(path, data)
}
