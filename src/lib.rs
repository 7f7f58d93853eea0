// ============================================================================
// lib.rs — accelwave
// Host-side orchestration of a GPU height-field wave simulation.
// ============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod gpu;
pub mod headless;
pub mod mesh;
pub mod params;
pub mod pipeline;
pub mod ripples;
pub mod swap;

pub use config::WaveConfig;
pub use engine::{EditSession, SolutionView, WaveSimulation};
pub use error::{Result, WaveError};
pub use field::Cell;
pub use gpu::GpuContext;
pub use pipeline::WaveKernel;
