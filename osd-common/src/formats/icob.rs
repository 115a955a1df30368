//! ICOB icon model format (.icn / .ico / ICOB*.bin)
//!
//! System-menu 3D icons: a flat, unindexed triangle list where each vertex
//! stores one position per animation shape (morph target) followed by a
//! shared normal and a UV + color record. All coordinates are 16-bit fixed
//! point with 4096 = 1.0.
//!
//! # Layout
//! ```text
//! 0x00: magic u32 (0x00010000)
//! 0x04: shape_count u32 (positions per vertex)
//! 0x08: texture_type u32
//! 0x0C: reserved u32 (usually 1.0f)
//! 0x10: vertex_count u32 (multiple of 3)
//! 0x14: vertex records, vertex_count times:
//!         shape_count x position [i16; 4]   (x, y, z, w)
//!         normal [i16; 4]                   (x, y, z, w)
//!         u i16, v i16, color u32 (RGBA, R in the low byte)
//! ...:  animation section and texture (not decoded here)
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

use crate::error::{DecodeError, DecodeResult};

/// Expected magic value
pub const ICOB_MAGIC: u32 = 0x0001_0000;

/// Fixed-point scale: 4096 = 1.0
pub const FIXED_ONE: f32 = 4096.0;

/// Size of one `[i16; 4]` coordinate record
pub const FIXED_COORD_SIZE: usize = 8;

/// Size of the UV + color record
pub const TEX_COLOR_SIZE: usize = 8;

/// Convert a 16-bit fixed-point component to float
#[inline]
pub fn fixed_to_f32(value: i16) -> f32 {
    f32::from(value) / FIXED_ONE
}

/// Unpack a 32-bit vertex color
///
/// Alpha uses the GS convention where 0x80 is fully opaque: values at or
/// above 0x80 map to 1.0, lower values to `a / 128`.
pub fn unpack_color(color: u32) -> Vec4 {
    let [r, g, b, a] = color.to_le_bytes();
    let alpha = if a >= 0x80 { 1.0 } else { f32::from(a) / 128.0 };
    Vec4::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        alpha,
    )
}

/// IcobHeader (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct IcobHeader {
    pub magic: u32,
    pub shape_count: u32,
    pub texture_type: u32,
    pub reserved: u32,
    pub vertex_count: u32,
}

impl IcobHeader {
    pub const SIZE: usize = 20;

    pub fn new(shape_count: u32, texture_type: u32, vertex_count: u32) -> Self {
        Self {
            magic: ICOB_MAGIC,
            shape_count,
            texture_type,
            reserved: 1.0f32.to_bits(),
            vertex_count,
        }
    }

    /// Bytes occupied by one vertex record
    pub fn vertex_stride(&self) -> usize {
        self.shape_count as usize * FIXED_COORD_SIZE + FIXED_COORD_SIZE + TEX_COLOR_SIZE
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == ICOB_MAGIC
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.shape_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.texture_type.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Some(Self {
            magic: word(0),
            shape_count: word(4),
            texture_type: word(8),
            reserved: word(12),
            vertex_count: word(16),
        })
    }
}

/// Decoded vertex, laid out for direct GPU upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct IcobVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Vec4,
}

const _: () = assert!(std::mem::size_of::<IcobVertex>() == 48);

/// Static icon mesh (shape 0)
#[derive(Debug, Clone, PartialEq)]
pub struct IcobMesh {
    pub shape_count: u32,
    pub texture_type: u32,
    vertices: Vec<IcobVertex>,
    indices: Vec<u32>,
}

impl IcobMesh {
    pub fn vertices(&self) -> &[IcobVertex] {
        &self.vertices
    }

    /// Identity index list, one entry per vertex
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Consume the mesh, returning (vertices, indices)
    pub fn into_buffers(self) -> (Vec<IcobVertex>, Vec<u32>) {
        (self.vertices, self.indices)
    }
}

/// Mesh plus every morph target position
#[derive(Debug, Clone, PartialEq)]
pub struct IcobShapes {
    pub mesh: IcobMesh,
    /// `shapes[s][v]` is the position of vertex `v` in shape `s`
    pub shapes: Vec<Vec<Vec3>>,
}

/// Bounds-checked little-endian reader over the vertex stream
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: N,
                actual: self.data.len().saturating_sub(self.pos),
            })?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn i16(&mut self) -> DecodeResult<i16> {
        self.take::<2>().map(i16::from_le_bytes)
    }

    fn u32(&mut self) -> DecodeResult<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    /// `[i16; 4]` record, `w` dropped
    fn fixed_vec3(&mut self) -> DecodeResult<Vec3> {
        let x = self.i16()?;
        let y = self.i16()?;
        let z = self.i16()?;
        let _w = self.i16()?;
        Ok(Vec3::new(fixed_to_f32(x), fixed_to_f32(y), fixed_to_f32(z)))
    }
}

fn read_header(data: &[u8]) -> DecodeResult<IcobHeader> {
    let header = IcobHeader::from_bytes(data).ok_or(DecodeError::InvalidHeader {
        needed: IcobHeader::SIZE,
        actual: data.len(),
    })?;

    if !header.has_valid_magic() {
        tracing::warn!(
            "ICOB magic mismatch (got {:#010X}, expected {:#010X}), continuing",
            header.magic,
            ICOB_MAGIC
        );
    }

    if header.vertex_count == 0 || header.vertex_count % 3 != 0 || header.shape_count == 0 {
        return Err(DecodeError::InvalidGeometry {
            vertex_count: header.vertex_count,
            shape_count: header.shape_count,
        });
    }

    Ok(header)
}

fn decode_inner(data: &[u8], keep_shapes: bool) -> DecodeResult<(IcobMesh, Vec<Vec<Vec3>>)> {
    let header = read_header(data)?;
    let vertex_count = header.vertex_count as usize;
    let shape_count = header.shape_count as usize;

    // Reject impossible counts before allocating for them
    let needed = vertex_count.saturating_mul(header.vertex_stride());
    let available = data.len() - IcobHeader::SIZE;
    if needed > available {
        return Err(DecodeError::UnexpectedEof {
            offset: IcobHeader::SIZE,
            needed,
            actual: available,
        });
    }

    tracing::debug!(
        "Decoding ICOB: {} vertices, {} shapes, texture type {}",
        vertex_count,
        shape_count,
        header.texture_type
    );

    let mut reader = Reader::new(data, IcobHeader::SIZE);
    let mut vertices = Vec::with_capacity(vertex_count);
    let mut shapes: Vec<Vec<Vec3>> = if keep_shapes {
        vec![Vec::with_capacity(vertex_count); shape_count]
    } else {
        Vec::new()
    };

    for _ in 0..vertex_count {
        let mut position = Vec3::ZERO;
        for shape in 0..shape_count {
            let p = reader.fixed_vec3()?;
            if shape == 0 {
                position = p;
            }
            if keep_shapes {
                shapes[shape].push(p);
            }
        }

        let normal = reader.fixed_vec3()?;

        let u = reader.i16()?;
        let v = reader.i16()?;
        let color = reader.u32()?;

        vertices.push(IcobVertex {
            position,
            normal,
            uv: Vec2::new(fixed_to_f32(u), fixed_to_f32(v)),
            color: unpack_color(color),
        });
    }

    let mesh = IcobMesh {
        shape_count: header.shape_count,
        texture_type: header.texture_type,
        vertices,
        indices: (0..header.vertex_count).collect(),
    };

    Ok((mesh, shapes))
}

/// Decode the static (shape 0) mesh of an ICOB file
///
/// # Errors
/// - `InvalidHeader` if the data is shorter than the 20-byte header
/// - `InvalidGeometry` if the vertex count is 0 or not a multiple of 3, or
///   there are no shapes
/// - `UnexpectedEof` if the vertex records are truncated
pub fn decode_icob(data: &[u8]) -> DecodeResult<IcobMesh> {
    decode_inner(data, false).map(|(mesh, _)| mesh)
}

/// Decode an ICOB file keeping every morph target's positions
pub fn decode_icob_shapes(data: &[u8]) -> DecodeResult<IcobShapes> {
    decode_inner(data, true).map(|(mesh, shapes)| IcobShapes { mesh, shapes })
}
