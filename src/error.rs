// ============================================================================
// error.rs — accelwave
// Error taxonomy for simulation setup, GPU resources and config files.
// ============================================================================

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, WaveError>;

/// Errors surfaced to callers. Disturbance coordinates outside the interior are
/// not represented here: they are caller bugs and panic.
#[derive(Error, Debug)]
pub enum WaveError {
    /// Invalid grid size or degenerate physics coefficients.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// wgpu refused buffer, bind group or pipeline creation.
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// No adapter matched the request.
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,

    /// Adapter found but the device could not be created.
    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Mapping a buffer for CPU access failed.
    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
