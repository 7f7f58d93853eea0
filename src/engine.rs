// ============================================================================
// engine.rs — accelwave
// WaveSimulation: double-buffered height field, fixed-step dispatch,
// disturbance editing and solution readback.
// ============================================================================

use std::collections::BTreeSet;
use std::sync::mpsc;

use wgpu::util::DeviceExt;

use crate::clock::StepClock;
use crate::config::WaveConfig;
use crate::error::{Result, WaveError};
use crate::field::{flat_lattice, Cell, HeightFieldBuffer, CELL_STRIDE};
use crate::gpu::{scoped_allocation, GpuContext};
use crate::params::WaveParams;
use crate::pipeline::{bg_buffer, dispatch_size, WaveKernel};
use crate::swap::SwapRegistry;

// ======================== Slots ========================

/// One height-field buffer with its read-only and read-write views.
pub struct SolutionSlot {
    pub field: HeightFieldBuffer,
    pub read_view: wgpu::BindGroup,
    pub write_view: wgpu::BindGroup,
}

/// Read-only handle on the latest solution, valid until the next step.
#[derive(Clone, Copy)]
pub struct SolutionView<'a> {
    /// Bind group matching the kernel's read layout (group 1 of the kernel,
    /// usable at any group index of a renderer that shares the layout).
    pub bind_group: &'a wgpu::BindGroup,
    pub buffer: &'a wgpu::Buffer,
    pub layout: &'a wgpu::BindGroupLayout,
    pub cell_count: usize,
}

// ======================== WaveSimulation ========================

pub struct WaveSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: WaveConfig,
    params: WaveParams,
    kernel: WaveKernel,
    // Kept alive for the bind group below.
    _params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    slots: SwapRegistry<SolutionSlot>,
    staging: wgpu::Buffer,
    clock: StepClock,
    steps: u64,
}

impl WaveSimulation {
    /// Builds a simulation running the built-in kernel.
    pub fn new(gpu: &GpuContext, config: WaveConfig) -> Result<Self> {
        let params = WaveParams::from_config(&config)?;
        let kernel = WaveKernel::builtin(&gpu.device)?;
        Self::build(gpu, config, params, kernel)
    }

    /// Builds a simulation running a caller-supplied kernel.
    pub fn with_kernel(gpu: &GpuContext, config: WaveConfig, kernel: WaveKernel) -> Result<Self> {
        let params = WaveParams::from_config(&config)?;
        Self::build(gpu, config, params, kernel)
    }

    fn build(
        gpu: &GpuContext,
        config: WaveConfig,
        params: WaveParams,
        kernel: WaveKernel,
    ) -> Result<Self> {
        let device = &gpu.device;
        let cell_count = config.vertex_count() as usize;
        let size = cell_count as u64 * CELL_STRIDE;

        let limits = device.limits();
        if size > limits.max_buffer_size || size > limits.max_storage_buffer_binding_size as u64 {
            return Err(WaveError::ResourceAllocation(format!(
                "{}x{} grid needs {} bytes per buffer, device allows {} (binding) / {} (buffer)",
                config.rows,
                config.columns,
                size,
                limits.max_storage_buffer_binding_size,
                limits.max_buffer_size
            )));
        }

        let lattice = flat_lattice(config.rows, config.columns, config.spatial_step);

        let (params_buffer, params_bind_group, slots, staging) =
            scoped_allocation(device, "allocating wave buffers", || {
                let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("wave_params"),
                    contents: bytemuck::bytes_of(&params),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("wave_params_bg"),
                    layout: &kernel.layouts.params,
                    entries: &[bg_buffer(0, &params_buffer)],
                });

                let slots = SwapRegistry::new(
                    create_slot(device, &kernel, "solution_a", &lattice),
                    create_slot(device, &kernel, "solution_b", &lattice),
                );

                let staging = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("solution_staging"),
                    size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                (params_buffer, params_bind_group, slots, staging)
            })?;

        let k = params.coefficients();
        log::info!(
            "Wave simulation initialized: {}x{} cells, dx={}, dt={}, k=({:.5}, {:.5}, {:.5})",
            config.rows,
            config.columns,
            config.spatial_step,
            config.time_step,
            k.k1,
            k.k2,
            k.k3
        );

        Ok(Self {
            device: gpu.device.clone(),
            queue: gpu.queue.clone(),
            clock: StepClock::new(config.time_step),
            config,
            params,
            kernel,
            _params_buffer: params_buffer,
            params_bind_group,
            slots,
            staging,
            steps: 0,
        })
    }

    // ---- Accessors ----

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    pub fn rows(&self) -> u32 {
        self.config.rows
    }

    pub fn columns(&self) -> u32 {
        self.config.columns
    }

    pub fn vertex_count(&self) -> u32 {
        self.config.vertex_count()
    }

    pub fn triangle_count(&self) -> u32 {
        self.config.triangle_count()
    }

    /// Number of kernel dispatches issued so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Which of the two buffers (0 = A, 1 = B) currently holds the latest
    /// solution.
    pub fn current_slot(&self) -> usize {
        self.slots.current_index()
    }

    /// Time carried over towards the next step.
    pub fn accumulated_time(&self) -> f32 {
        self.clock.accumulated()
    }

    pub fn current_view(&self) -> SolutionView<'_> {
        let slot = self.slots.current();
        SolutionView {
            bind_group: &slot.read_view,
            buffer: &slot.field.buffer,
            layout: &self.kernel.layouts.read,
            cell_count: slot.field.len,
        }
    }

    // ---- Stepping ----

    /// Advances wall-clock time. When at least one step has accumulated,
    /// swaps roles and dispatches exactly one kernel pass; any further whole
    /// steps in `delta_time` are dropped. Returns whether a step ran.
    pub fn update(&mut self, delta_time: f32) -> bool {
        if !self.clock.advance(delta_time) {
            return false;
        }
        self.slots.swap();
        self.dispatch();
        true
    }

    fn dispatch(&mut self) {
        let (x, y, z) = dispatch_size(self.config.rows, self.config.columns);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wave_step_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("wave_step_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernel.pipeline);
            pass.set_bind_group(0, &self.params_bind_group, &[]);
            pass.set_bind_group(1, &self.slots.past().read_view, &[]);
            pass.set_bind_group(2, &self.slots.current().write_view, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.steps += 1;

        log::debug!(
            "Step {}: past=slot{} current=slot{} groups={}x{}x{}",
            self.steps,
            self.slots.past_index(),
            self.slots.current_index(),
            x,
            y,
            z
        );
    }

    // ---- Readback ----

    /// Blocking copy of every cell of the current buffer.
    pub fn solution_set(&self) -> Result<Vec<Cell>> {
        let field = &self.slots.current().field;
        let size = field.size_bytes();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("solution_readback_encoder"),
            });
        encoder.copy_buffer_to_buffer(&field.buffer, 0, &self.staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..size);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(WaveError::Readback(e.to_string())),
            Err(e) => return Err(WaveError::Readback(e.to_string())),
        }

        let cells = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Cell>(&data).to_vec()
        };
        self.staging.unmap();
        Ok(cells)
    }

    /// Replaces both buffers with `cells`, e.g. to restore a saved state.
    /// The upload is ordered before the next step or readback.
    pub fn load_solution(&mut self, cells: &[Cell]) -> Result<()> {
        if cells.len() != self.vertex_count() as usize {
            return Err(WaveError::Configuration(format!(
                "solution has {} cells, grid needs {}",
                cells.len(),
                self.vertex_count()
            )));
        }
        for slot in self.slots.slots() {
            self.queue
                .write_buffer(&slot.field.buffer, 0, bytemuck::cast_slice(cells));
        }
        Ok(())
    }

    // ---- Disturbances ----

    /// Opens an edit session on the current buffer. Blocks until pending GPU
    /// work has landed. While the session lives the simulation cannot step
    /// or read back.
    pub fn begin_edit(&mut self) -> Result<EditSession<'_>> {
        let shadow = self.solution_set()?;
        Ok(EditSession {
            sim: self,
            shadow,
            dirty: BTreeSet::new(),
        })
    }

    /// Five-point ripple at `(i, j)`: centre `+= magnitude`, the four axis
    /// neighbours `+= magnitude / 2`.
    ///
    /// Each call reads back the whole field; hold one [`EditSession`] from
    /// [`WaveSimulation::begin_edit`] to apply many disturbances at once.
    ///
    /// # Panics
    /// Unless `1 < i < rows - 2` and `1 < j < columns - 2`.
    pub fn disturb(&mut self, i: u32, j: u32, magnitude: f32) -> Result<()> {
        let mut session = self.begin_edit()?;
        session.disturb(i, j, magnitude);
        session.finish();
        Ok(())
    }

    /// Raises only cell `(i, j)`. Same bounds and readback cost as
    /// [`WaveSimulation::disturb`].
    pub fn disturb_sharp(&mut self, i: u32, j: u32, magnitude: f32) -> Result<()> {
        let mut session = self.begin_edit()?;
        session.disturb_sharp(i, j, magnitude);
        session.finish();
        Ok(())
    }
}

fn create_slot(device: &wgpu::Device, kernel: &WaveKernel, label: &str, cells: &[Cell]) -> SolutionSlot {
    let field = HeightFieldBuffer::new_init(device, label, cells);
    let read_view = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label}_read")),
        layout: &kernel.layouts.read,
        entries: &[bg_buffer(0, &field.buffer)],
    });
    let write_view = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label}_write")),
        layout: &kernel.layouts.write,
        entries: &[bg_buffer(0, &field.buffer)],
    });
    SolutionSlot {
        field,
        read_view,
        write_view,
    }
}

// ======================== EditSession ========================

/// CPU window onto the current buffer. Edits land in a shadow copy and are
/// written back on [`EditSession::finish`] or drop. Only one session can
/// exist, and it must end before the simulation steps again.
pub struct EditSession<'a> {
    sim: &'a mut WaveSimulation,
    shadow: Vec<Cell>,
    dirty: BTreeSet<usize>,
}

impl EditSession<'_> {
    pub fn rows(&self) -> u32 {
        self.sim.config.rows
    }

    pub fn columns(&self) -> u32 {
        self.sim.config.columns
    }

    /// Whether `(i, j)` is far enough from the edges for a disturbance.
    pub fn is_interior(&self, i: u32, j: u32) -> bool {
        is_interior(self.rows(), self.columns(), i, j)
    }

    /// # Panics
    /// Unless `i < rows` and `j < columns`.
    pub fn cell(&self, i: u32, j: u32) -> Cell {
        assert!(
            i < self.rows() && j < self.columns(),
            "cell ({i}, {j}) outside {}x{} grid",
            self.rows(),
            self.columns()
        );
        self.shadow[self.index(i, j)]
    }

    pub fn height(&self, i: u32, j: u32) -> f32 {
        self.cell(i, j).height()
    }

    /// See [`WaveSimulation::disturb`].
    pub fn disturb(&mut self, i: u32, j: u32, magnitude: f32) {
        self.check_interior(i, j);
        let half = 0.5 * magnitude;
        self.raise(i, j, magnitude);
        self.raise(i, j + 1, half);
        self.raise(i, j - 1, half);
        self.raise(i + 1, j, half);
        self.raise(i - 1, j, half);
    }

    /// See [`WaveSimulation::disturb_sharp`].
    pub fn disturb_sharp(&mut self, i: u32, j: u32, magnitude: f32) {
        self.check_interior(i, j);
        self.raise(i, j, magnitude);
    }

    /// Number of cells touched so far.
    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Writes the touched cells back and closes the session.
    pub fn finish(mut self) {
        self.flush();
    }

    fn check_interior(&self, i: u32, j: u32) {
        assert!(
            self.is_interior(i, j),
            "disturbance at ({i}, {j}) outside interior of {}x{} grid",
            self.rows(),
            self.columns()
        );
    }

    fn index(&self, i: u32, j: u32) -> usize {
        (i * self.sim.config.columns + j) as usize
    }

    fn raise(&mut self, i: u32, j: u32, amount: f32) {
        let idx = self.index(i, j);
        self.shadow[idx].position[1] += amount;
        self.dirty.insert(idx);
    }

    /// Uploads contiguous runs of dirty cells.
    fn flush(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let buffer = &self.sim.slots.current().field.buffer;
        let dirty = std::mem::take(&mut self.dirty);
        let mut runs = 0usize;

        let mut iter = dirty.into_iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            self.sim.queue.write_buffer(
                buffer,
                start as u64 * CELL_STRIDE,
                bytemuck::cast_slice(&self.shadow[start..=end]),
            );
            runs += 1;
        }
        log::trace!("Edit session flushed {} run(s)", runs);
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// `1 < i < rows - 2` and `1 < j < columns - 2`.
pub fn is_interior(rows: u32, columns: u32, i: u32, j: u32) -> bool {
    i > 1 && i < rows.saturating_sub(2) && j > 1 && j < columns.saturating_sub(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_bounds_are_strict() {
        // 10x12 grid: legal rows 2..=7, legal columns 2..=9
        assert!(is_interior(10, 12, 2, 2));
        assert!(is_interior(10, 12, 7, 9));
        assert!(!is_interior(10, 12, 1, 5));
        assert!(!is_interior(10, 12, 8, 5));
        assert!(!is_interior(10, 12, 5, 1));
        assert!(!is_interior(10, 12, 5, 10));
    }

    #[test]
    fn tiny_grids_have_no_interior() {
        for i in 0..4 {
            for j in 0..4 {
                assert!(!is_interior(4, 4, i, j));
            }
        }
        assert!(is_interior(5, 5, 2, 2));
    }

    #[test]
    fn coordinates_near_u32_max_are_not_interior() {
        assert!(!is_interior(10, 10, u32::MAX, 5));
        assert!(!is_interior(10, 10, 5, u32::MAX - 1));
        assert!(!is_interior(u32::MAX, u32::MAX, u32::MAX - 2, 5));
        assert!(is_interior(u32::MAX, u32::MAX, u32::MAX - 3, 5));
        assert!(!is_interior(1, 1, 2, 2));
    }
}
