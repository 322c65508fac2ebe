//! Per-frame input: what to draw and which settings generation it belongs to.
//!
//! The frame orchestrator owns the payload and hands the backend a shared
//! reference for the duration of one `Backend::render` call.

use std::ops::{Deref, Range};

use bitflags::bitflags;

use crate::geometry::{CellRect, Size};
use crate::settings::{CursorSettings, FontSettings, MiscSettings};

/// Monotonically increasing version tag of a settings group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    fn bump(&mut self) {
        self.0 += 1;
    }
}

/// A value paired with a generation that advances on every mutable access.
///
/// Equality of generations is the only change signal the backend uses, so
/// mutating through [`Generational::write`] is the way to invalidate.
#[derive(Debug, Clone, Default)]
pub struct Generational<T> {
    generation: Generation,
    value: T,
}

impl<T> Generational<T> {
    pub fn new(value: T) -> Self {
        Self {
            generation: Generation(1),
            value,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Mutable access; bumps the generation.
    pub fn write(&mut self) -> &mut T {
        self.generation.bump();
        &mut self.value
    }
}

impl<T> Deref for Generational<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// All settings groups. The outer generation covers any of them changing.
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    pub font: Generational<FontSettings>,
    pub misc: Generational<MiscSettings>,
    pub cursor: Generational<CursorSettings>,
    /// Swap chain size in physical pixels.
    pub target_size: Generational<Size>,
    /// Grid dimensions: `width` columns by `height` rows.
    pub cell_count: Generational<Size>,
}

/// Opaque identity of a font face, assigned by the glyph rasterizer's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontFaceId(pub u32);

/// A run of glyphs within a row that share a face and size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMapping {
    pub font_face: FontFaceId,
    pub font_em_size: f32,
    /// Index range into the row's per-glyph arrays.
    pub glyphs: Range<usize>,
}

/// Per-glyph pen adjustments in DIPs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphOffset {
    pub advance_offset: f32,
    pub ascender_offset: f32,
}

bitflags! {
    /// Decorations drawn over a column range of a row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GridLines: u8 {
        const LEFT = 1 << 0;
        const TOP = 1 << 1;
        const RIGHT = 1 << 2;
        const BOTTOM = 1 << 3;
        const UNDERLINE = 1 << 4;
        const HYPERLINK_UNDERLINE = 1 << 5;
        const DOUBLE_UNDERLINE = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Columns `from..to` of a row carrying the same decorations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLineRange {
    pub lines: GridLines,
    pub color: u32,
    pub from: u16,
    pub to: u16,
}

/// Shaped glyph data and decorations of one grid row.
///
/// `glyph_indices`, `glyph_advances`, `glyph_offsets` and `colors` are
/// parallel arrays indexed by the ranges in `mappings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedRow {
    pub mappings: Vec<FontMapping>,
    pub glyph_indices: Vec<u16>,
    pub glyph_advances: Vec<f32>,
    pub glyph_offsets: Vec<GlyphOffset>,
    pub colors: Vec<u32>,
    pub grid_line_ranges: Vec<GridLineRange>,
    pub selection_from: u16,
    pub selection_to: u16,
}

impl ShapedRow {
    pub fn has_selection(&self) -> bool {
        self.selection_to > self.selection_from
    }
}

/// Immutable description of one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderingPayload {
    pub settings: Generational<RenderSettings>,
    pub rows: Vec<ShapedRow>,
    /// One `0xAABBGGRR` color per cell, row-major, `cell_count` sized.
    pub background_bitmap: Vec<u32>,
    /// Cursor extent in cells; empty when the cursor is hidden.
    pub cursor_rect: CellRect,
}

impl RenderingPayload {
    /// Background color of the cell at `(x, y)`, if inside the grid.
    pub fn background_at(&self, x: u16, y: u16) -> Option<u32> {
        let cells = *self.settings.cell_count;
        if u32::from(x) >= cells.width || u32::from(y) >= cells.height {
            return None;
        }
        let idx = usize::from(y) * cells.width as usize + usize::from(x);
        self.background_bitmap.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_bumps_generation() {
        let mut g = Generational::new(5u32);
        let before = g.generation();
        *g.write() = 6;
        assert_ne!(g.generation(), before);
        assert_eq!(*g, 6);
    }

    #[test]
    fn nested_write_bumps_outer_and_inner() {
        let mut settings = Generational::new(RenderSettings::default());
        let outer = settings.generation();
        let font = settings.font.generation();
        let misc = settings.misc.generation();

        settings.write().font.write().dpi = 144.0;

        assert_ne!(settings.generation(), outer);
        assert_ne!(settings.font.generation(), font);
        assert_eq!(settings.misc.generation(), misc);
    }

    #[test]
    fn background_lookup_uses_column_stride() {
        let mut payload = RenderingPayload::default();
        *payload.settings.write().cell_count.write() = Size::new(3, 2);
        payload.background_bitmap = vec![0, 1, 2, 3, 4, 5];

        assert_eq!(payload.background_at(0, 1), Some(3));
        assert_eq!(payload.background_at(2, 1), Some(5));
        assert_eq!(payload.background_at(3, 0), None);
        assert_eq!(payload.background_at(0, 2), None);
    }
}
