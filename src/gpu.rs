// ============================================================================
// gpu.rs — accelwave
// Headless device/queue setup and error-scope capture for resource creation.
// ============================================================================

use crate::error::{Result, WaveError};
use crate::pipeline::BLOCK_SIZE;

/// Device and queue the simulation issues work on.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Creates a surface-less context on the first high-performance adapter.
    pub fn new_headless() -> Result<Self> {
        pollster::block_on(Self::request())
    }

    /// Wraps a device created elsewhere (e.g. by a windowed renderer).
    pub fn from_parts(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_info: wgpu::AdapterInfo,
    ) -> Self {
        Self {
            device,
            queue,
            adapter_info,
        }
    }

    async fn request() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(WaveError::AdapterUnavailable)?;

        let adapter_info = adapter.get_info();
        log::info!("GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("accelwave_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: required_limits(&adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }
}

/// Downlevel defaults plus a full 32x32 workgroup and the adapter's own
/// storage binding ceiling.
pub fn required_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits {
        max_compute_invocations_per_workgroup: BLOCK_SIZE * BLOCK_SIZE,
        max_storage_buffer_binding_size: adapter.max_storage_buffer_binding_size,
        max_buffer_size: adapter.max_buffer_size,
        ..wgpu::Limits::downlevel_defaults()
    }
}

/// Runs `f` inside out-of-memory and validation error scopes and turns any
/// captured error into [`WaveError::ResourceAllocation`]. Whatever `f` built
/// is dropped on failure.
pub fn scoped_allocation<T>(device: &wgpu::Device, what: &str, f: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = f();

    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());

    match validation.or(oom) {
        None => Ok(value),
        Some(err) => {
            log::error!("{what}: {err}");
            Err(WaveError::ResourceAllocation(format!("{what}: {err}")))
        }
    }
}
