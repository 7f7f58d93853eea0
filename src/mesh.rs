// ============================================================================
// mesh.rs — accelwave
// Index and vertex data a renderer needs to draw the height field.
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::field::Cell;

/// Vertex-buffer layout for the water surface: position, normal, uv.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SurfaceVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SurfaceVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Converts a solution snapshot into surface vertices; uv is the xz position
/// divided by `uv_scale`.
pub fn surface_vertices(cells: &[Cell], uv_scale: f32) -> Vec<SurfaceVertex> {
    cells
        .iter()
        .map(|c| SurfaceVertex {
            position: [c.position[0], c.position[1], c.position[2]],
            normal: [c.normal[0], c.normal[1], c.normal[2]],
            uv: [c.position[0] / uv_scale, c.position[2] / uv_scale],
        })
        .collect()
}

/// Triangle-list indices, two triangles per grid quad.
pub fn grid_indices(rows: u32, columns: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(((rows - 1) * (columns - 1) * 6) as usize);
    for i in 0..rows - 1 {
        for j in 0..columns - 1 {
            let top = i * columns + j;
            let bottom = (i + 1) * columns + j;

            indices.extend_from_slice(&[top, top + 1, bottom]);
            indices.extend_from_slice(&[bottom, top + 1, bottom + 1]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveConfig;
    use crate::field::flat_lattice;

    #[test]
    fn index_count_matches_triangle_count() {
        let config = WaveConfig::new(7, 9, 1.0, 0.03, 6.25, 0.25);
        let indices = grid_indices(config.rows, config.columns);
        assert_eq!(indices.len() as u32, config.triangle_count() * 3);
        assert!(indices.iter().all(|&k| k < config.vertex_count()));
    }

    #[test]
    fn first_quad_winding() {
        let indices = grid_indices(3, 4);
        assert_eq!(&indices[..6], &[0, 1, 4, 4, 1, 5]);
    }

    #[test]
    fn vertices_carry_uv_from_position() {
        let cells = flat_lattice(3, 3, 2.0);
        let vertices = surface_vertices(&cells, 200.0);
        assert_eq!(vertices.len(), 9);
        assert_eq!(vertices[0].position, [-2.0, 0.0, 2.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].uv, [-0.01, 0.01]);
        assert_eq!(std::mem::size_of::<SurfaceVertex>(), 32);
        assert_eq!(SurfaceVertex::layout().array_stride, 32);
    }
}
