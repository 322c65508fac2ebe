//! GPU glyph atlas rendering backend for a terminal grid.
//!
//! Each frame the host hands a [`RenderingPayload`] to [`Backend::render`],
//! which turns background colors, shaped glyph runs, decorations, the
//! cursor and the selection into a single batch of quads drawn from one
//! glyph atlas texture. Glyph outlines are rasterized by an external
//! [`GlyphRasterizer`]; the graphics API sits behind [`GpuDevice`], with
//! [`WgpuDevice`] as the production implementation.

#![deny(unsafe_code)]

pub mod atlas;
pub mod batch;
pub mod cursor;
pub mod device;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod payload;
pub mod rasterizer;
pub mod renderer;
pub mod settings;
pub mod shader;
pub mod swap_chain;
pub mod text_params;

#[cfg(test)]
mod testing;

pub use device::{GpuDevice, WgpuDevice};
pub use error::{RenderError, ShaderError, Warning};
pub use geometry::{CellRect, Rect, Size};
pub use payload::{
    FontFaceId, FontMapping, Generation, Generational, GlyphOffset, GridLineRange, GridLines,
    RenderSettings, RenderingPayload, ShapedRow,
};
pub use rasterizer::{GlyphRasterizer, GlyphRequest, GlyphTarget, InkBox};
pub use renderer::{Backend, WarningCallback};
pub use settings::{
    AntialiasingMode, BackendConfig, CursorColor, CursorSettings, FontSettings, HotReloadConfig,
    MiscSettings,
};
