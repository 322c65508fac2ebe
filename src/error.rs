//! Error and warning types for the atlas backend.
//!
//! `RenderError` is fatal for the current frame: the caller is expected to
//! drop the backend and build a new one. `Warning` reports degradations the
//! backend recovered from on its own.

use std::path::PathBuf;

/// A fatal failure while producing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create presentation surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no GPU adapter is compatible with the presentation surface")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("presentation surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("swap chain error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("no back buffer acquired for the current frame")]
    NoBackBuffer,

    /// A glyph did not fit into a freshly reset atlas.
    #[error("glyph {glyph} does not fit into an empty {width}x{height} atlas")]
    AtlasExhausted { width: u32, height: u32, glyph: u16 },

    /// A shader that ships with the backend failed to compile.
    #[error("built-in shader failed to compile: {0}")]
    BuiltinShader(#[source] ShaderError),

    #[error("background bitmap has {actual} cells, expected {expected}")]
    PayloadMismatch { expected: usize, actual: usize },

    #[error("row {row} has {actual} glyph attributes, expected {expected}")]
    RowMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The GPU rejected a pipeline built from a shader that naga accepted.
    #[error("pipeline for {label} rejected: {message}")]
    PipelineValidation { label: String, message: String },
}

/// Failure to turn WGSL source into a validated shader module.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("shader has no `{0}` entry point")]
    MissingEntryPoint(&'static str),

    /// Bindings or stage inputs/outputs that the pipeline cannot provide.
    #[error("shader does not fit the custom shader pipeline: {0}")]
    Interface(String),
}

/// Non-fatal rendering degradation, reported through the warning callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// The user's custom pixel shader failed to compile; the stage is disabled.
    CustomShaderCompileFailed,
    /// Debug hot reload failed; the previous built-in shaders stay live.
    ShaderReloadFailed,
}
