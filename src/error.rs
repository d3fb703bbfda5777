// error.rs — crate-wide error type.
//
// Three kinds of failure, all propagated synchronously to the caller:
//
//   Capability — a required GPU feature is missing at construction
//     time (NoSuitableAdapter, DeviceRequest, MissingCapability,
//     SurfaceTooLarge, EmptyTarget). Fatal; the pipeline cannot
//     degrade to a slower path with different semantics.
//
//   Shape mismatch — the input frame cannot be drawn onto the fixed
//     surface (EmptyFrame). Per-call; the surface is left cleared.
//
//   Execution — the shader failed to compile (ShaderCompile) or a
//     dispatch was rejected by the driver/validation layer
//     (Execution). No fallback shader, no retry.

use std::fmt;

/// Errors from pipeline construction and per-frame processing.
#[derive(Debug)]
pub enum PipelineError {
    /// No usable GPU adapter found (only CPU/software renderers, or none).
    NoSuitableAdapter,
    /// wgpu device request failed (driver issue, unsupported limits, etc.).
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter lacks a capability the pipeline cannot work without.
    MissingCapability { what: &'static str },
    /// The target surface exceeds the device's 2D texture dimension limit.
    SurfaceTooLarge { width: u32, height: u32, max: u32 },
    /// Target width or height is zero.
    EmptyTarget { width: u32, height: u32 },
    /// Input frame has a zero dimension and cannot be composited.
    EmptyFrame { width: u32, height: u32 },
    /// The luminance shader failed validation/compilation.
    ShaderCompile(String),
    /// The compute dispatch was rejected by the driver.
    Execution(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NoSuitableAdapter => write!(
                f,
                "no suitable GPU adapter found (only CPU/software renderers visible)"
            ),
            PipelineError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            PipelineError::MissingCapability { what } => {
                write!(f, "required GPU capability missing: {what}")
            }
            PipelineError::SurfaceTooLarge { width, height, max } => write!(
                f,
                "target surface {width}×{height} exceeds device texture limit {max}"
            ),
            PipelineError::EmptyTarget { width, height } => {
                write!(f, "target dimensions must be nonzero (got {width}×{height})")
            }
            PipelineError::EmptyFrame { width, height } => {
                write!(f, "input frame has a zero dimension ({width}×{height})")
            }
            PipelineError::ShaderCompile(msg) => {
                write!(f, "luminance shader failed to compile: {msg}")
            }
            PipelineError::Execution(msg) => write!(f, "program execution failed: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::DeviceRequest(e) => Some(e),
            _ => None,
        }
    }
}
