//! Cursor drawing, including the color-inverting cursor.
//!
//! An inverting cursor cannot be done with blend state alone: the text
//! shaders' contrast adjustment depends on the glyph color. Instead every
//! quad already queued under the cursor is re-emitted, clipped to the
//! cursor, with its color inverted.

use crate::batch::{QuadBatch, ShadingType};
use crate::geometry::{CellRect, Rect, Size};
use crate::settings::CursorColor;

/// XOR mask flipping the top two bits of R, G and B. Unlike a full
/// inversion this keeps mid-gray from inverting to itself.
pub const INVERT_MASK: u32 = 0x00c0_c0c0;

/// Pixel rectangle covered by `cursor` on a grid of `cell_size` cells.
pub fn cursor_pixel_rect(cursor: CellRect, cell_size: Size) -> Rect {
    let cw = cell_size.width as f32;
    let ch = cell_size.height as f32;
    Rect::new(
        cw * f32::from(cursor.left),
        ch * f32::from(cursor.top),
        cw * f32::from(cursor.right.saturating_sub(cursor.left)),
        ch * f32::from(cursor.bottom.saturating_sub(cursor.top)),
    )
}

/// Queue the cursor over everything already in `batch`.
///
/// `background` is the cell color under the cursor's top-left cell; it is
/// only used by [`CursorColor::Invert`].
pub fn append_cursor(batch: &mut QuadBatch, rect: Rect, color: CursorColor, background: u32) {
    match color {
        CursorColor::Solid(c) => batch.append_rect(rect, Rect::ZERO, c, ShadingType::SolidFill),
        CursorColor::Invert => append_inverting(batch, rect, background),
    }
}

fn append_inverting(batch: &mut QuadBatch, rect: Rect, background: u32) {
    let queued = batch.len();
    batch.append_rect(rect, Rect::ZERO, background ^ INVERT_MASK, ShadingType::SolidFill);

    for i in 0..queued {
        let source = batch.instances()[i];
        let Some(shading) = source.shading() else {
            continue;
        };
        let src_rect = source.rect();
        let Some(clip) = src_rect.intersect(&rect) else {
            continue;
        };

        let src_tex = source.tex();
        let tex = Rect::new(
            src_tex.x + (clip.x - src_rect.x),
            src_tex.y + (clip.y - src_rect.y),
            clip.w,
            clip.h,
        );
        let shading = match shading {
            ShadingType::Passthrough => ShadingType::PassthroughInvert,
            other => other,
        };
        batch.append_rect(clip, tex, source.color ^ INVERT_MASK, shading);
    }
}
