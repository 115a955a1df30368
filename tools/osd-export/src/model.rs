//! ICOB -> Wavefront OBJ conversion

use anyhow::{Context, Result};
use osd_common::{IcobMesh, IcobShapes, decode_icob, decode_icob_shapes};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What a model conversion produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub shape_count: u32,
    /// Shapes written as separate OBJ objects
    pub shapes_written: usize,
}

/// Write a mesh as OBJ
///
/// Texture V is flipped (OBJ puts the origin at the bottom left). When
/// `shapes` is given, shapes 1.. are appended as extra objects sharing the
/// texture coordinates and normals of the base object.
pub fn write_obj<W: Write>(
    w: &mut W,
    name: &str,
    mesh: &IcobMesh,
    shapes: Option<&IcobShapes>,
) -> std::io::Result<()> {
    let n = mesh.vertex_count();

    writeln!(w, "# ICOB model: {} vertices, {} shapes", n, mesh.shape_count)?;
    writeln!(w, "o {name}")?;

    for v in mesh.vertices() {
        writeln!(w, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }
    for v in mesh.vertices() {
        writeln!(w, "vt {} {}", v.uv.x, 1.0 - v.uv.y)?;
    }
    for v in mesh.vertices() {
        writeln!(w, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
    }
    write_faces(w, mesh.indices(), 0)?;

    if let Some(shapes) = shapes {
        for (s, positions) in shapes.shapes.iter().enumerate().skip(1) {
            writeln!(w, "o {name}_shape{s}")?;
            for p in positions {
                writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
            }
            write_faces(w, mesh.indices(), s * n)?;
        }
    }

    Ok(())
}

/// `f` lines for a triangle list; `base` offsets the position index only
fn write_faces<W: Write>(w: &mut W, indices: &[u32], base: usize) -> std::io::Result<()> {
    for tri in indices.chunks_exact(3) {
        write!(w, "f")?;
        for &i in tri {
            let attr = i as usize + 1;
            write!(w, " {}/{}/{}", base + attr, attr, attr)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Convert an ICOB file to OBJ
pub fn convert_model(input: &Path, output: &Path, all_shapes: bool) -> Result<ModelSummary> {
    let data =
        std::fs::read(input).with_context(|| format!("Failed to read model: {:?}", input))?;

    let (mesh, shapes) = if all_shapes {
        let shapes = decode_icob_shapes(&data)
            .with_context(|| format!("Failed to decode ICOB: {:?}", input))?;
        (shapes.mesh.clone(), Some(shapes))
    } else {
        let mesh =
            decode_icob(&data).with_context(|| format!("Failed to decode ICOB: {:?}", input))?;
        (mesh, None)
    };

    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("icob");

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, name, &mesh, shapes.as_ref())?;
    writer.flush()?;

    let summary = ModelSummary {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        shape_count: mesh.shape_count,
        shapes_written: shapes.as_ref().map_or(1, |s| s.shapes.len()),
    };

    tracing::info!(
        "Converted ICOB model: {} vertices, {} triangles, {} shape(s)",
        summary.vertex_count,
        summary.triangle_count,
        summary.shape_count
    );

    Ok(summary)
}
