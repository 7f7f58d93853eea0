// ============================================================================
// field.rs — accelwave
// Per-cell state layout and the GPU storage buffer holding one height field.
// ============================================================================

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

// ======================== Cell ========================

/// One lattice sample. The kernel addresses cells at `index * 48` bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    pub position: [f32; 4],
    pub normal: [f32; 4],
    pub tangent: [f32; 4],
}

pub const CELL_STRIDE: u64 = std::mem::size_of::<Cell>() as u64;

impl Cell {
    pub const UP: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
    pub const PLUS_X: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    /// A resting cell at `(x, 0, z)`.
    pub fn flat(x: f32, z: f32) -> Self {
        Self {
            position: [x, 0.0, z, 0.0],
            normal: Self::UP,
            tangent: Self::PLUS_X,
        }
    }

    pub fn height(&self) -> f32 {
        self.position[1]
    }
}

/// Flat lattice of `rows * columns` cells, row-major, centred on the origin.
/// Row 0 sits at `+z`, column 0 at `-x`.
pub fn flat_lattice(rows: u32, columns: u32, spatial_step: f32) -> Vec<Cell> {
    let half_width = (columns - 1) as f32 * spatial_step * 0.5;
    let half_depth = (rows - 1) as f32 * spatial_step * 0.5;

    let mut cells = Vec::with_capacity((rows * columns) as usize);
    for i in 0..rows {
        let z = half_depth - i as f32 * spatial_step;
        for j in 0..columns {
            let x = -half_width + j as f32 * spatial_step;
            cells.push(Cell::flat(x, z));
        }
    }
    cells
}

// ======================== HeightFieldBuffer ========================

/// GPU storage buffer of `len` cells. Released when dropped.
pub struct HeightFieldBuffer {
    pub buffer: wgpu::Buffer,
    pub len: usize,
}

impl HeightFieldBuffer {
    pub fn new_init(device: &wgpu::Device, label: &str, cells: &[Cell]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(cells),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            len: cells.len(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.len as u64 * CELL_STRIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_is_48_bytes() {
        assert_eq!(CELL_STRIDE, 48);
    }

    #[test]
    fn lattice_is_centred_and_regular() {
        let dx = 0.5;
        let cells = flat_lattice(5, 7, dx);
        assert_eq!(cells.len(), 35);

        // first row at +z, first column at -x
        assert_eq!(cells[0].position, [-1.5, 0.0, 1.0, 0.0]);
        assert_eq!(cells[34].position, [1.5, 0.0, -1.0, 0.0]);

        // centre cell sits on the origin
        assert_eq!(cells[2 * 7 + 3].position, [0.0, 0.0, 0.0, 0.0]);

        for i in 0..5 {
            for j in 0..6 {
                let a = cells[i * 7 + j].position[0];
                let b = cells[i * 7 + j + 1].position[0];
                assert!((b - a - dx).abs() < 1e-6);
            }
        }
        assert!(cells.iter().all(|c| c.normal == Cell::UP && c.tangent == Cell::PLUS_X));
    }
}
