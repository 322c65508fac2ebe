//! Test doubles for the GPU and the glyph rasterizer.

use std::collections::{HashMap, HashSet};

use crate::atlas::AtlasRegion;
use crate::batch::QuadInstance;
use crate::device::{ConstBuffer, CustomConstBuffer, GpuDevice};
use crate::error::RenderError;
use crate::geometry::Size;
use crate::rasterizer::{GlyphRasterizer, GlyphRequest, GlyphTarget, InkBox};
use crate::shader::{BuiltinShaders, CompiledShader, ShaderProfile};
use crate::swap_chain::SwapChainSettings;

/// One recorded [`GpuDevice`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UpdateSwapChain(SwapChainSettings),
    WaitUntilCanRender,
    BeginFrame { offscreen: bool },
    Present,
    RecreateBackgroundSampler(u32),
    RecreateBackgroundBitmap(Size),
    WriteBackgroundBitmap(Size),
    RecreateOffscreenTexture(Option<Size>),
    WriteConstants(ConstBuffer),
    RecreateAtlas(Size),
    WriteAtlas(AtlasRegion),
    RecreateInstanceBuffer(usize),
    RecreateIndexBuffer(usize),
    WriteInstances(usize),
    WriteIndices(usize),
    DrawIndexed(u32),
    /// Label of the shader, or `None` for teardown.
    CreateCustomShader(Option<String>),
    DrawCustomShader(CustomConstBuffer),
    ReplaceBuiltinShaders,
}

impl Call {
    /// Whether this call allocates or rebuilds a frame-independent resource.
    pub fn is_rebuild(&self) -> bool {
        matches!(
            self,
            Self::UpdateSwapChain(_)
                | Self::RecreateBackgroundSampler(_)
                | Self::RecreateBackgroundBitmap(_)
                | Self::RecreateOffscreenTexture(_)
                | Self::WriteConstants(_)
                | Self::RecreateAtlas(_)
                | Self::CreateCustomShader(_)
        )
    }
}

/// A [`GpuDevice`] that records calls and keeps every drawn instance.
#[derive(Debug)]
pub struct RecordingDevice {
    pub calls: Vec<Call>,
    pub max_texture_dimension: u32,
    pub profile: ShaderProfile,
    /// Instances of each indexed draw, in draw order.
    pub draws: Vec<Vec<QuadInstance>>,
    /// Fail pipeline creation the way a GPU validation error would.
    pub reject_pipelines: bool,
    uploaded: Vec<QuadInstance>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            max_texture_dimension: 16384,
            profile: ShaderProfile::Full,
            draws: Vec::new(),
            reject_pipelines: false,
            uploaded: Vec::new(),
        }
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        self.draws.clear();
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// All instances drawn since the last [`take_calls`](Self::take_calls).
    pub fn drawn(&self) -> Vec<QuadInstance> {
        self.draws.iter().flatten().copied().collect()
    }

    fn pipeline(&self, label: &str) -> Result<(), RenderError> {
        if self.reject_pipelines {
            return Err(RenderError::PipelineValidation {
                label: label.to_owned(),
                message: "rejected".to_owned(),
            });
        }
        Ok(())
    }
}

impl GpuDevice for RecordingDevice {
    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn shader_profile(&self) -> ShaderProfile {
        self.profile
    }

    fn update_swap_chain(&mut self, settings: &SwapChainSettings) -> Result<(), RenderError> {
        self.calls.push(Call::UpdateSwapChain(*settings));
        Ok(())
    }

    fn wait_until_can_render(&mut self) -> Result<(), RenderError> {
        self.calls.push(Call::WaitUntilCanRender);
        Ok(())
    }

    fn begin_frame(&mut self, offscreen: bool) -> Result<(), RenderError> {
        self.calls.push(Call::BeginFrame { offscreen });
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.calls.push(Call::Present);
        Ok(())
    }

    fn recreate_background_sampler(&mut self, border_color: u32) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateBackgroundSampler(border_color));
        Ok(())
    }

    fn recreate_background_bitmap(&mut self, cells: Size) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateBackgroundBitmap(cells));
        Ok(())
    }

    fn write_background_bitmap(&mut self, _colors: &[u32], cells: Size) -> Result<(), RenderError> {
        self.calls.push(Call::WriteBackgroundBitmap(cells));
        Ok(())
    }

    fn recreate_offscreen_texture(&mut self, size: Option<Size>) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateOffscreenTexture(size));
        Ok(())
    }

    fn write_constants(&mut self, constants: &ConstBuffer) -> Result<(), RenderError> {
        self.calls.push(Call::WriteConstants(*constants));
        Ok(())
    }

    fn recreate_atlas(&mut self, size: Size) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateAtlas(size));
        Ok(())
    }

    fn write_atlas(&mut self, region: AtlasRegion, rgba: &[u8]) -> Result<(), RenderError> {
        assert_eq!(rgba.len(), region.width as usize * region.height as usize * 4);
        self.calls.push(Call::WriteAtlas(region));
        Ok(())
    }

    fn recreate_instance_buffer(&mut self, capacity: usize) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateInstanceBuffer(capacity));
        Ok(())
    }

    fn recreate_index_buffer(&mut self, capacity: usize) -> Result<(), RenderError> {
        self.calls.push(Call::RecreateIndexBuffer(capacity));
        Ok(())
    }

    fn write_instances(&mut self, instances: &[QuadInstance]) -> Result<(), RenderError> {
        self.calls.push(Call::WriteInstances(instances.len()));
        self.uploaded = instances.to_vec();
        Ok(())
    }

    fn write_indices(&mut self, indices: &[u32]) -> Result<(), RenderError> {
        self.calls.push(Call::WriteIndices(indices.len()));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), RenderError> {
        self.calls.push(Call::DrawIndexed(index_count));
        self.draws.push(std::mem::take(&mut self.uploaded));
        Ok(())
    }

    fn create_custom_shader(&mut self, shader: Option<&CompiledShader>) -> Result<(), RenderError> {
        self.calls
            .push(Call::CreateCustomShader(shader.map(|s| s.label().to_owned())));
        match shader {
            Some(shader) => self.pipeline(shader.label()),
            None => Ok(()),
        }
    }

    fn draw_custom_shader(&mut self, constants: &CustomConstBuffer) -> Result<(), RenderError> {
        self.calls.push(Call::DrawCustomShader(*constants));
        Ok(())
    }

    fn replace_builtin_shaders(&mut self, shaders: &BuiltinShaders) -> Result<(), RenderError> {
        self.calls.push(Call::ReplaceBuiltinShaders);
        self.pipeline(shaders.quad.label())
    }
}

/// A rasterizer with fixed ink boxes per glyph index.
///
/// Glyphs without a scripted box use `default_ink`; `None` there means
/// "no ink". Drawing fills the whole target with opaque white coverage.
#[derive(Debug, Default)]
pub struct ScriptedRasterizer {
    pub ink: HashMap<u16, InkBox>,
    pub default_ink: Option<InkBox>,
    pub color_glyphs: HashSet<u16>,
    /// Every glyph drawn, in order.
    pub drawn: Vec<u16>,
}

impl ScriptedRasterizer {
    /// Every glyph has a `width x height` DIP box sitting on the baseline.
    pub fn uniform(width: f32, height: f32) -> Self {
        Self {
            default_ink: Some(InkBox {
                left: 0.0,
                top: -height,
                right: width,
                bottom: 0.0,
            }),
            ..Self::default()
        }
    }
}

impl GlyphRasterizer for ScriptedRasterizer {
    fn ink_box(&mut self, request: &GlyphRequest) -> Option<InkBox> {
        self.ink.get(&request.glyph_index).copied().or(self.default_ink)
    }

    fn draw_glyph(
        &mut self,
        request: &GlyphRequest,
        target: &mut dyn GlyphTarget,
    ) -> Result<bool, RenderError> {
        self.drawn.push(request.glyph_index);
        let (w, h) = target.size();
        let pixels = vec![0xff; w as usize * h as usize * 4];
        target.write_pixels(0, 0, w, h, &pixels);
        Ok(self.color_glyphs.contains(&request.glyph_index))
    }
}
