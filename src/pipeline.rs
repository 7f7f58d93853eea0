// ============================================================================
// pipeline.rs — accelwave
// Wave kernel compute pipeline, its bind-group layouts, and layout helpers.
// ============================================================================

use crate::error::Result;
use crate::field::CELL_STRIDE;
use crate::gpu::scoped_allocation;
use crate::params::WaveParams;

/// Workgroup edge of the wave kernel (`@workgroup_size(32, 32, 1)`).
pub const BLOCK_SIZE: u32 = 32;

const BUILTIN_KERNEL: &str = include_str!("shaders/wave_step.wgsl");

/// Workgroup counts for a `rows x columns` grid. Integer division plus one
/// always covers partial tiles, at the cost of a spare tile on exact multiples.
pub fn dispatch_size(rows: u32, columns: u32) -> (u32, u32, u32) {
    (columns / BLOCK_SIZE + 1, rows / BLOCK_SIZE + 1, 1)
}

// ======================== Layouts ========================

/// Group 0: parameter block. Group 1: past cells (read-only).
/// Group 2: current cells (read-write).
pub struct WaveLayouts {
    pub params: wgpu::BindGroupLayout,
    pub read: wgpu::BindGroupLayout,
    pub write: wgpu::BindGroupLayout,
}

impl WaveLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let params = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wave_params_bgl"),
            entries: &[bgl_uniform(0, std::mem::size_of::<WaveParams>() as u64)],
        });
        // Read views are also handed to the renderer, hence vertex/fragment visibility.
        let read = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wave_read_bgl"),
            entries: &[bgl_storage_ro(0)],
        });
        let write = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wave_write_bgl"),
            entries: &[bgl_storage_rw(0)],
        });
        Self {
            params,
            read,
            write,
        }
    }
}

// ======================== Kernel ========================

/// The compute pipeline that advances the height field by one step.
pub struct WaveKernel {
    pub pipeline: wgpu::ComputePipeline,
    pub layouts: WaveLayouts,
}

impl WaveKernel {
    /// The kernel shipped in `shaders/wave_step.wgsl`.
    pub fn builtin(device: &wgpu::Device) -> Result<Self> {
        Self::from_wgsl(device, "wave_step", BUILTIN_KERNEL, "main")
    }

    /// Builds a caller-supplied kernel. It must declare the three bind groups
    /// of [`WaveLayouts`], a 32x32 workgroup, and ignore invocations past the
    /// grid edge.
    pub fn from_wgsl(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<Self> {
        scoped_allocation(device, &format!("building kernel '{label}'"), || {
            let layouts = WaveLayouts::new(device);
            let module = load_shader(device, label, source);
            let pipeline = create_compute_pipeline(device, label, &layouts, &module, entry_point);
            log::debug!("Kernel '{}' built (entry point '{}')", label, entry_point);
            Self { pipeline, layouts }
        })
    }
}

// ======================== Helpers ========================

fn load_shader(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn create_compute_pipeline(
    device: &wgpu::Device,
    name: &str,
    layouts: &WaveLayouts,
    module: &wgpu::ShaderModule,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{name}_pipeline_layout")),
        bind_group_layouts: &[&layouts.params, &layouts.read, &layouts.write],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("{name}_pipeline")),
        layout: Some(&layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn bgl_uniform(binding: u32, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}

fn bgl_storage_ro(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(CELL_STRIDE),
        },
        count: None,
    }
}

fn bgl_storage_rw(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(CELL_STRIDE),
        },
        count: None,
    }
}

pub(crate) fn bg_buffer(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_partial_tiles() {
        assert_eq!(dispatch_size(50, 50), (2, 2, 1));
        assert_eq!(dispatch_size(200, 100), (4, 7, 1));
        assert_eq!(dispatch_size(3, 3), (1, 1, 1));
    }

    #[test]
    fn dispatch_on_exact_multiple_keeps_spare_tile() {
        assert_eq!(dispatch_size(64, 32), (2, 3, 1));
    }

    #[test]
    fn dispatch_never_undercovers() {
        for rows in 3..130 {
            for columns in 3..130 {
                let (x, y, _) = dispatch_size(rows, columns);
                assert!(x * BLOCK_SIZE >= columns);
                assert!(y * BLOCK_SIZE >= rows);
            }
        }
    }
}
