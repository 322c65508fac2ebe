//! Interface to the external glyph rasterization service.
//!
//! The backend never touches font outlines. It asks the rasterizer for a
//! glyph's ink box, reserves atlas space for it, and then hands the
//! rasterizer a [`GlyphTarget`] covering exactly that space.

use crate::error::RenderError;
use crate::payload::FontFaceId;
use crate::settings::AntialiasingMode;

/// One glyph to measure or draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRequest {
    pub font_face: FontFaceId,
    pub glyph_index: u16,
    /// Em size in DIPs.
    pub font_em_size: f32,
    pub antialiasing: AntialiasingMode,
    pub pixel_per_dip: f32,
}

/// Ink bounds of a glyph in DIPs, relative to its baseline origin.
/// `top` is negative for ink above the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InkBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl InkBox {
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }
}

/// A 2D surface the rasterizer draws one glyph into.
///
/// Pixels are RGBA8 with premultiplied alpha. For monochrome text the RGB
/// channels carry per-subpixel coverage and alpha their average.
pub trait GlyphTarget {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Position of the glyph's baseline origin within the target, in pixels.
    fn baseline_origin(&self) -> (f32, f32);

    /// Copy a `width x height` block of RGBA8 pixels to `(x, y)`. Pixels
    /// falling outside the target are dropped.
    fn write_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, rgba: &[u8]);
}

/// The external glyph rasterization service.
pub trait GlyphRasterizer {
    /// Ink bounds of the glyph, or `None` if it has no visible ink.
    fn ink_box(&mut self, request: &GlyphRequest) -> Option<InkBox>;

    /// Draw the glyph with its origin at the target's baseline origin.
    ///
    /// Returns `true` for color (emoji) glyphs, whose pixels must be
    /// composited as-is rather than tinted.
    fn draw_glyph(
        &mut self,
        request: &GlyphRequest,
        target: &mut dyn GlyphTarget,
    ) -> Result<bool, RenderError>;
}
