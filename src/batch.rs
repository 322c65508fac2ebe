//! CPU-side quad accumulation and upload.
//!
//! Every primitive of a frame (background, glyphs, decorations, cursor,
//! selection) is one [`QuadInstance`]. Instances are painted in append order
//! by a single indexed draw per flush, so append order is paint order.

use bytemuck::{Pod, Zeroable};

use crate::device::GpuDevice;
use crate::error::RenderError;
use crate::geometry::{Rect, Size};

/// Smallest CPU-side capacity the batch grows to.
const MIN_CAPACITY: usize = 1024;

/// Indices emitted per quad: two triangles over the corners `base+0..3`.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 3, 2, 1];

/// Pixel-stage behavior selected per instance.
///
/// The discriminants are shared with `quad.wgsl`; zero is never used so a
/// zeroed instance draws nothing.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingType {
    /// Samples the per-cell background bitmap.
    Background = 1,
    TextGrayscale = 2,
    TextClearType = 3,
    /// Color glyph copied from the atlas as-is.
    Passthrough = 4,
    /// Color glyph with its color channels inverted (cursor overlay).
    PassthroughInvert = 5,
    DashedLine = 6,
    SolidFill = 7,
}

impl ShadingType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::Background,
            2 => Self::TextGrayscale,
            3 => Self::TextClearType,
            4 => Self::Passthrough,
            5 => Self::PassthroughInvert,
            6 => Self::DashedLine,
            7 => Self::SolidFill,
            _ => return None,
        })
    }
}

/// One quad as laid out in the GPU storage buffer (48 bytes).
///
/// `rect` is the screen rectangle and `tex` the source rectangle, both
/// `[x, y, w, h]` in pixels. For glyphs `tex` addresses the atlas; for the
/// background it addresses the target so the shader can map it to cells.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    pub rect: [f32; 4],
    pub tex: [f32; 4],
    /// Packed `0xAABBGGRR`.
    pub color: u32,
    pub shading_type: u32,
    pub _padding: [u32; 2],
}

impl QuadInstance {
    pub fn rect(&self) -> Rect {
        Rect::from_array(self.rect)
    }

    pub fn tex(&self) -> Rect {
        Rect::from_array(self.tex)
    }

    pub fn shading(&self) -> Option<ShadingType> {
        ShadingType::from_raw(self.shading_type)
    }
}

/// Growable instance and index arrays plus the GPU buffer capacity they
/// were last uploaded into.
#[derive(Debug, Default)]
pub struct QuadBatch {
    instances: Vec<QuadInstance>,
    indices: Vec<u32>,
    /// Instances the GPU buffers can hold; zero until the first flush.
    gpu_capacity: usize,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one quad.
    pub fn append_rect(&mut self, rect: Rect, tex: Rect, color: u32, shading: ShadingType) {
        if self.instances.len() == self.instances.capacity() {
            self.grow();
        }

        let base = (self.instances.len() * 4) as u32;
        self.instances.push(QuadInstance {
            rect: rect.to_array(),
            tex: tex.to_array(),
            color,
            shading_type: shading as u32,
            _padding: [0; 2],
        });
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    /// Double the backing storage (at least [`MIN_CAPACITY`]). Queued
    /// instances are carried over.
    fn grow(&mut self) {
        let target = (self.instances.capacity() * 2).max(MIN_CAPACITY);
        let additional = target - self.instances.len();
        self.instances.reserve_exact(additional);
        self.indices.reserve_exact(target * QUAD_INDICES.len() - self.indices.len());
    }

    /// Number of queued instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[QuadInstance] {
        &self.instances
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Allocated CPU-side instance slots.
    pub fn capacity(&self) -> usize {
        self.instances.capacity()
    }

    pub fn gpu_capacity(&self) -> usize {
        self.gpu_capacity
    }

    /// Drop queued quads without drawing them.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.indices.clear();
    }

    /// Upload queued quads and draw them with one indexed call.
    ///
    /// A flush with nothing queued touches no GPU state. GPU buffers are
    /// reallocated to `max(cells, n * 1.5)` when too small, anticipating
    /// roughly one quad per cell.
    pub fn flush<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        cell_count: Size,
    ) -> Result<(), RenderError> {
        let n = self.instances.len();
        if n == 0 {
            return Ok(());
        }

        if n > self.gpu_capacity {
            let estimated_min = cell_count.area() as usize;
            let capacity = estimated_min.max(n + n / 2);
            log::debug!("quad buffers: {} -> {capacity} instances", self.gpu_capacity);
            device.recreate_instance_buffer(capacity)?;
            device.recreate_index_buffer(capacity * QUAD_INDICES.len())?;
            self.gpu_capacity = capacity;
        }

        device.write_instances(&self.instances)?;
        device.write_indices(&self.indices)?;
        device.draw_indexed(self.indices.len() as u32)?;
        self.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests;
