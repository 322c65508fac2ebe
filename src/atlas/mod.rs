//! Glyph atlas: one GPU texture, a skyline packer, and a placement cache.
//!
//! The atlas is sized from the target's pixel area, never from the glyphs
//! it holds. When it fills up mid-frame the renderer flushes what it has
//! queued, resets the atlas, and retries; entries are never evicted one by
//! one.

pub mod cache;
pub mod packer;

use crate::batch::ShadingType;
use crate::device::GpuDevice;
use crate::error::RenderError;
use crate::geometry::{Rect, Size};
use crate::rasterizer::{GlyphRasterizer, GlyphRequest, GlyphTarget};
use crate::settings::AntialiasingMode;

pub use cache::{GlyphCache, GlyphCacheEntry};
pub use packer::RectPacker;

/// Lower bound on atlas area (256 x 256).
const MIN_AREA: u64 = 256 * 256;

/// Power-of-two atlas dimensions for a render target.
///
/// The area is at least `max(65536, target area)` and less than four times
/// that, with the width one step wider than the height when the exponent is
/// odd. Each side is clamped to `max_dimension`.
pub fn atlas_size(target: Size, max_dimension: u32) -> Size {
    let area = target.area().max(MIN_AREA);
    let index = 63 - (area - 1).leading_zeros();
    let width = 1u64 << ((index + 2) / 2);
    let height = 1u64 << ((index + 1) / 2);
    let max = u64::from(max_dimension.max(1));
    Size::new(width.min(max) as u32, height.min(max) as u32)
}

/// Pixel rectangle inside the atlas texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// CPU staging surface for one glyph, uploaded to the atlas in one write.
#[derive(Debug)]
pub struct GlyphCanvas {
    width: u32,
    height: u32,
    origin: (f32, f32),
    pixels: Vec<u8>,
}

impl GlyphCanvas {
    pub fn new(width: u32, height: u32, origin: (f32, f32)) -> Self {
        Self {
            width,
            height,
            origin,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// RGBA8 rows, tightly packed.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl GlyphTarget for GlyphCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn baseline_origin(&self) -> (f32, f32) {
        self.origin
    }

    fn write_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, rgba: &[u8]) {
        let x0 = x.max(0);
        let x1 = (x + width as i32).min(self.width as i32);
        if x0 >= x1 {
            return;
        }
        let span = (x1 - x0) as usize * 4;

        for row in 0..height as i32 {
            let dy = y + row;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            let src = (row as usize * width as usize + (x0 - x) as usize) * 4;
            let dst = (dy as usize * self.width as usize + x0 as usize) * 4;
            let Some(src_row) = rgba.get(src..src + span) else {
                return;
            };
            self.pixels[dst..dst + span].copy_from_slice(src_row);
        }
    }
}

/// Atlas bookkeeping on the CPU side. The texture itself lives in the
/// [`GpuDevice`].
#[derive(Debug)]
pub struct GlyphAtlas {
    size: Size,
    packer: RectPacker,
    cache: GlyphCache,
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphAtlas {
    /// An atlas with no texture yet; the first [`reset`](Self::reset)
    /// allocates it.
    pub fn new() -> Self {
        Self {
            size: Size::default(),
            packer: RectPacker::new(0, 0),
            cache: GlyphCache::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn cache(&self) -> &GlyphCache {
        &self.cache
    }

    /// Recreate the texture at `size` and forget every cached glyph.
    pub fn reset<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        size: Size,
    ) -> Result<(), RenderError> {
        log::debug!(
            "atlas reset: {}x{} -> {}x{}, dropping {} glyphs",
            self.size.width,
            self.size.height,
            size.width,
            size.height,
            self.cache.len(),
        );
        device.recreate_atlas(size)?;
        self.size = size;
        self.packer = RectPacker::new(size.width, size.height);
        self.cache.clear();
        Ok(())
    }

    /// Cached placement of a glyph, rasterizing it on a miss.
    ///
    /// Returns `Ok(None)` when the glyph does not fit; the caller is
    /// expected to flush, [`reset`](Self::reset), and ask again.
    pub fn glyph<D, R>(
        &mut self,
        device: &mut D,
        rasterizer: &mut R,
        request: &GlyphRequest,
    ) -> Result<Option<GlyphCacheEntry>, RenderError>
    where
        D: GpuDevice + ?Sized,
        R: GlyphRasterizer + ?Sized,
    {
        let (entry, inserted) = self
            .cache
            .find_or_insert(request.font_face, request.glyph_index);
        if !inserted {
            return Ok(Some(*entry));
        }

        let Some(ink) = rasterizer.ink_box(request).filter(|b| !b.is_empty()) else {
            *entry = GlyphCacheEntry::default();
            return Ok(Some(*entry));
        };

        // Pad the ink box by a pixel on each side for antialiasing bleed.
        let ppd = request.pixel_per_dip;
        let left = (ink.left * ppd).floor() as i32 - 1;
        let top = (ink.top * ppd).floor() as i32 - 1;
        let right = (ink.right * ppd).ceil() as i32 + 1;
        let bottom = (ink.bottom * ppd).ceil() as i32 + 1;
        let width = (right - left) as u32;
        let height = (bottom - top) as u32;
        let (Ok(offset_x), Ok(offset_y)) = (i16::try_from(left), i16::try_from(top)) else {
            log::warn!(
                "glyph {} ink box at ({left}, {top}) is out of range, not drawn",
                request.glyph_index
            );
            *entry = GlyphCacheEntry::default();
            return Ok(Some(*entry));
        };

        let Some((x, y)) = self.packer.pack(width, height) else {
            self.cache.remove(request.font_face, request.glyph_index);
            return Ok(None);
        };

        let mut canvas = GlyphCanvas::new(width, height, (-left as f32, -top as f32));
        let is_color = rasterizer.draw_glyph(request, &mut canvas)?;
        device.write_atlas(
            AtlasRegion {
                x,
                y,
                width,
                height,
            },
            canvas.pixels(),
        )?;

        let shading = if is_color {
            ShadingType::Passthrough
        } else {
            match request.antialiasing {
                AntialiasingMode::ClearType => ShadingType::TextClearType,
                AntialiasingMode::Grayscale | AntialiasingMode::Aliased => {
                    ShadingType::TextGrayscale
                }
            }
        };
        *entry = GlyphCacheEntry {
            shading: Some(shading),
            offset: (offset_x, offset_y),
            texcoord: Rect::new(x as f32, y as f32, width as f32, height as f32),
        };
        Ok(Some(*entry))
    }
}
