//! Graphics API seam.
//!
//! The renderer decides *what* to rebuild and draw; a [`GpuDevice`] owns the
//! actual GPU objects. Each resource the renderer can invalidate has exactly
//! one `recreate_*` method, so rebuild work is observable per frame.

mod wgpu_device;

pub use wgpu_device::WgpuDevice;

use bytemuck::{Pod, Zeroable};

use crate::atlas::AtlasRegion;
use crate::batch::QuadInstance;
use crate::error::RenderError;
use crate::geometry::Size;
use crate::shader::{BuiltinShaders, CompiledShader, ShaderProfile};
use crate::swap_chain::SwapChainSettings;

/// Per-frame uniforms of the quad shader (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ConstBuffer {
    /// `2 / target size`, maps pixels to clip space.
    pub position_scale: [f32; 2],
    /// Cell size in pixels, maps background texcoords to cells.
    pub cell_size: [f32; 2],
    pub gamma_ratios: [f32; 4],
    pub cleartype_enhanced_contrast: f32,
    pub grayscale_enhanced_contrast: f32,
    /// Length of one dash of a dashed underline, in pixels.
    pub dashed_line_length: f32,
    pub _padding: f32,
}

/// Uniforms of a custom pixel shader (32 bytes).
///
/// `time` must stay the first member: it is what shader introspection
/// looks for.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CustomConstBuffer {
    /// Seconds since the shader was created.
    pub time: f32,
    /// Pixels per DIP.
    pub scale: f32,
    /// Target size in pixels.
    pub resolution: [f32; 2],
    /// Straight-alpha RGBA of the background color.
    pub background: [f32; 4],
}

/// Everything the frame renderer asks of the graphics API.
///
/// All methods run on the render thread. An `Err` is fatal for the frame.
pub trait GpuDevice {
    /// Largest supported 2D texture side.
    fn max_texture_dimension(&self) -> u32;

    /// Shader feature level of the adapter.
    fn shader_profile(&self) -> ShaderProfile;

    /// Resize or reconfigure the presentation surface.
    fn update_swap_chain(&mut self, settings: &SwapChainSettings) -> Result<(), RenderError>;

    /// Block until the surface can hand out the next back buffer.
    fn wait_until_can_render(&mut self) -> Result<(), RenderError>;

    /// Start a frame. With `offscreen`, draws go to the custom shader's
    /// input texture instead of the back buffer. The first draw of a frame
    /// clears its target.
    fn begin_frame(&mut self, offscreen: bool) -> Result<(), RenderError>;

    fn present(&mut self) -> Result<(), RenderError>;

    /// Sampler for the background bitmap; cells outside the grid read as
    /// `border_color`.
    fn recreate_background_sampler(&mut self, border_color: u32) -> Result<(), RenderError>;

    fn recreate_background_bitmap(&mut self, cells: Size) -> Result<(), RenderError>;

    fn write_background_bitmap(&mut self, colors: &[u32], cells: Size) -> Result<(), RenderError>;

    /// Offscreen render target for the custom shader, or `None` to drop it.
    fn recreate_offscreen_texture(&mut self, size: Option<Size>) -> Result<(), RenderError>;

    fn write_constants(&mut self, constants: &ConstBuffer) -> Result<(), RenderError>;

    /// Replace the atlas with an empty texture of `size`.
    fn recreate_atlas(&mut self, size: Size) -> Result<(), RenderError>;

    fn write_atlas(&mut self, region: AtlasRegion, rgba: &[u8]) -> Result<(), RenderError>;

    fn recreate_instance_buffer(&mut self, capacity: usize) -> Result<(), RenderError>;

    fn recreate_index_buffer(&mut self, capacity: usize) -> Result<(), RenderError>;

    fn write_instances(&mut self, instances: &[QuadInstance]) -> Result<(), RenderError>;

    fn write_indices(&mut self, indices: &[u32]) -> Result<(), RenderError>;

    /// Draw `index_count` indices from the index buffer in one call.
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), RenderError>;

    /// Build (or with `None`, tear down) the custom pixel shader pipeline.
    fn create_custom_shader(&mut self, shader: Option<&CompiledShader>) -> Result<(), RenderError>;

    /// Draw the offscreen texture to the back buffer through the custom
    /// pixel shader.
    fn draw_custom_shader(&mut self, constants: &CustomConstBuffer) -> Result<(), RenderError>;

    /// Swap in freshly compiled built-in shaders.
    fn replace_builtin_shaders(&mut self, shaders: &BuiltinShaders) -> Result<(), RenderError>;
}

/// Unpack `0xAABBGGRR` into straight-alpha RGBA floats.
pub fn unpack_color(color: u32) -> [f32; 4] {
    let [r, g, b, a] = color.to_le_bytes();
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        f32::from(a) / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(size_of::<ConstBuffer>(), 48);
        assert_eq!(size_of::<CustomConstBuffer>(), 32);
        assert_eq!(size_of::<QuadInstance>(), 48);
    }

    #[test]
    fn unpack_abgr() {
        assert_eq!(unpack_color(0xff00_00ff), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(unpack_color(0x00ff_0000), [0.0, 0.0, 1.0, 0.0]);
    }
}
