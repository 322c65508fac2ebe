//! Frame renderer.
//!
//! [`Backend::render`] turns one [`RenderingPayload`] into one presented
//! frame: refresh invalidated resources, then queue background, text, grid
//! lines, cursor and selection in paint order, flush, and present.

use std::time::Instant;

use crate::atlas::{GlyphAtlas, GlyphCacheEntry, atlas_size};
use crate::batch::{QuadBatch, ShadingType};
use crate::cursor::{append_cursor, cursor_pixel_rect};
use crate::device::{ConstBuffer, GpuDevice};
use crate::error::{RenderError, Warning};
use crate::generation::{GenerationTracker, Invalidation};
use crate::geometry::{Rect, Size};
use crate::payload::{GridLineRange, GridLines, RenderingPayload};
use crate::rasterizer::{GlyphRasterizer, GlyphRequest};
use crate::settings::{BackendConfig, FontSettings};
use crate::shader::{BuiltinShaders, CustomShaderStage, ShaderMonitor};
use crate::swap_chain::SwapChainSettings;
use crate::text_params::gamma_ratios;

/// Receives non-fatal degradations.
pub type WarningCallback = Box<dyn FnMut(Warning)>;

/// The atlas rendering backend.
///
/// Generic over the graphics API and the glyph rasterizer. A `RenderError`
/// from any method leaves the backend in an undefined state; drop it and
/// build a new one.
pub struct Backend<D: GpuDevice, R: GlyphRasterizer> {
    device: D,
    rasterizer: R,
    config: BackendConfig,
    tracker: GenerationTracker,
    atlas: GlyphAtlas,
    batch: QuadBatch,
    custom_shader: CustomShaderStage,
    shader_monitor: Option<ShaderMonitor>,
    warning_callback: Option<WarningCallback>,
}

impl<D: GpuDevice, R: GlyphRasterizer> Backend<D, R> {
    pub fn new(device: D, rasterizer: R, config: BackendConfig) -> Result<Self, RenderError> {
        let shader_monitor = if cfg!(debug_assertions) && config.hot_reload.enabled {
            let live = BuiltinShaders::embedded(device.shader_profile())
                .map_err(RenderError::BuiltinShader)?;
            match ShaderMonitor::new(&config.hot_reload, live) {
                Ok(monitor) => Some(monitor),
                Err(e) => {
                    log::warn!("shader hot reload disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            device,
            rasterizer,
            config,
            tracker: GenerationTracker::new(),
            atlas: GlyphAtlas::new(),
            batch: QuadBatch::new(),
            custom_shader: CustomShaderStage::new(),
            shader_monitor,
            warning_callback: None,
        })
    }

    pub fn set_warning_callback(&mut self, callback: impl FnMut(Warning) + 'static) {
        self.warning_callback = Some(Box::new(callback));
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Whether the active custom shader animates without content changes.
    pub fn requires_continuous_redraw(&self) -> bool {
        self.custom_shader.is_active() && self.custom_shader.requires_continuous_redraw()
    }

    /// Block until the swap chain can accept another frame.
    pub fn wait_until_can_render(&mut self) -> Result<(), RenderError> {
        self.device.wait_until_can_render()
    }

    /// Draw and present one frame.
    pub fn render(&mut self, payload: &RenderingPayload) -> Result<(), RenderError> {
        let cells = *payload.settings.cell_count;
        let expected = cells.area() as usize;
        if payload.background_bitmap.len() != expected {
            return Err(RenderError::PayloadMismatch {
                expected,
                actual: payload.background_bitmap.len(),
            });
        }
        check_rows(payload)?;

        self.debug_update_shaders()?;
        self.refresh_resources(payload)?;

        self.batch.clear();
        self.device.begin_frame(self.custom_shader.is_active())?;
        self.device
            .write_background_bitmap(&payload.background_bitmap, cells)?;

        self.draw_background(payload);
        self.draw_text(payload)?;
        self.draw_grid_lines(payload);
        self.draw_cursor(payload);
        self.draw_selection(payload);
        self.batch.flush(&mut self.device, cells)?;

        if self.custom_shader.is_active() {
            let settings = &*payload.settings;
            let constants = self.custom_shader.constants(
                Instant::now(),
                settings.font.pixel_per_dip(),
                *settings.target_size,
                settings.misc.background_color,
            );
            self.device.draw_custom_shader(&constants)?;
        }

        self.device.present()
    }

    fn warn(&mut self, warning: Warning) {
        if let Some(callback) = &mut self.warning_callback {
            callback(warning);
        }
    }

    /// Swap in recompiled built-in shaders once an edit has settled.
    fn debug_update_shaders(&mut self) -> Result<(), RenderError> {
        let Some(monitor) = &mut self.shader_monitor else {
            return Ok(());
        };
        let result = match monitor.poll(self.device.shader_profile()) {
            None => return Ok(()),
            Some(Ok(shaders)) => self.device.replace_builtin_shaders(shaders),
            Some(Err(e)) => {
                log::error!("shader hot reload failed:\n{e}");
                self.warn(Warning::ShaderReloadFailed);
                return Ok(());
            }
        };
        match result {
            Err(RenderError::PipelineValidation { label, message }) => {
                log::error!("shader hot reload: {label} rejected by the device:\n{message}");
                self.warn(Warning::ShaderReloadFailed);
                Ok(())
            }
            other => other,
        }
    }

    /// Rebuild what the settings generations invalidated, then size the
    /// atlas for the current target. Font changes empty the atlas since
    /// cached glyphs carry the old scale and shading.
    fn refresh_resources(&mut self, payload: &RenderingPayload) -> Result<(), RenderError> {
        let settings = &*payload.settings;
        let target = *settings.target_size;
        let inv = self.tracker.observe(&payload.settings);

        if !inv.is_empty() {
            log::debug!("invalidated: {inv:?}");
        }
        if inv.contains(Invalidation::SWAP_CHAIN) {
            self.device.update_swap_chain(&SwapChainSettings {
                size: target,
                present_mode: self.config.present_mode,
                frame_latency: self.config.frame_latency,
            })?;
        }
        if inv.contains(Invalidation::SAMPLER) {
            self.device
                .recreate_background_sampler(settings.misc.background_color)?;
        }
        if inv.contains(Invalidation::CUSTOM_SHADER) {
            if let Some(warning) = self.custom_shader.recreate(&mut self.device, &settings.misc)? {
                self.warn(warning);
            }
        }
        if inv.contains(Invalidation::BACKGROUND_BITMAP) {
            self.device
                .recreate_background_bitmap(*settings.cell_count)?;
        }
        if inv.contains(Invalidation::OFFSCREEN_TEXTURE) {
            let size = settings.misc.has_custom_shader().then_some(target);
            self.device.recreate_offscreen_texture(size)?;
        }
        if inv.contains(Invalidation::CONST_BUFFER) {
            self.device
                .write_constants(&const_buffer(&settings.font, target))?;
        }

        let atlas = atlas_size(target, self.device.max_texture_dimension());
        if inv.contains(Invalidation::ATLAS) || atlas != self.atlas.size() {
            self.atlas.reset(&mut self.device, atlas)?;
        }
        Ok(())
    }

    /// One quad over the whole target; the shader maps it to cells.
    fn draw_background(&mut self, payload: &RenderingPayload) {
        let target = *payload.settings.target_size;
        let rect = Rect::new(0.0, 0.0, target.width as f32, target.height as f32);
        self.batch.append_rect(rect, rect, 0, ShadingType::Background);
    }

    fn draw_text(&mut self, payload: &RenderingPayload) -> Result<(), RenderError> {
        let settings = &*payload.settings;
        let font = &*settings.font;
        let cells = *settings.cell_count;
        let ppd = font.pixel_per_dip();
        let cell_height = font.cell_height_dip();

        for (y, row) in payload.rows.iter().enumerate() {
            let baseline = font.baseline + cell_height * y as f32;
            let mut pen = 0.0;

            for mapping in &row.mappings {
                for i in mapping.glyphs.clone() {
                    let request = GlyphRequest {
                        font_face: mapping.font_face,
                        glyph_index: row.glyph_indices[i],
                        font_em_size: mapping.font_em_size,
                        antialiasing: font.antialiasing,
                        pixel_per_dip: ppd,
                    };
                    let entry = self.glyph(&request, cells)?;

                    if let Some(shading) = entry.shading {
                        let offset = row.glyph_offsets[i];
                        let x = ((pen + offset.advance_offset) * ppd).round();
                        let y = ((baseline - offset.ascender_offset) * ppd).round();
                        let tex = entry.texcoord;
                        self.batch.append_rect(
                            Rect::new(
                                x + f32::from(entry.offset.0),
                                y + f32::from(entry.offset.1),
                                tex.w,
                                tex.h,
                            ),
                            tex,
                            row.colors[i],
                            shading,
                        );
                    }
                    pen += row.glyph_advances[i];
                }
            }
        }
        Ok(())
    }

    /// Atlas placement of a glyph. A full atlas is flushed, reset at its
    /// current size, and retried once.
    fn glyph(&mut self, request: &GlyphRequest, cells: Size) -> Result<GlyphCacheEntry, RenderError> {
        if let Some(entry) = self
            .atlas
            .glyph(&mut self.device, &mut self.rasterizer, request)?
        {
            return Ok(entry);
        }

        let size = self.atlas.size();
        log::debug!("atlas full at glyph {}, flushing", request.glyph_index);
        self.batch.flush(&mut self.device, cells)?;
        self.atlas.reset(&mut self.device, size)?;

        self.atlas
            .glyph(&mut self.device, &mut self.rasterizer, request)?
            .ok_or(RenderError::AtlasExhausted {
                width: size.width,
                height: size.height,
                glyph: request.glyph_index,
            })
    }

    fn draw_grid_lines(&mut self, payload: &RenderingPayload) {
        let font = &*payload.settings.font;
        for (y, row) in payload.rows.iter().enumerate() {
            for range in &row.grid_line_ranges {
                append_grid_lines(&mut self.batch, font, y as u32, range);
            }
        }
    }

    fn draw_cursor(&mut self, payload: &RenderingPayload) {
        if payload.cursor_rect.is_empty() {
            return;
        }
        let settings = &*payload.settings;
        let rect = cursor_pixel_rect(payload.cursor_rect, settings.font.cell_size);
        let background = payload
            .background_at(payload.cursor_rect.left, payload.cursor_rect.top)
            .unwrap_or(settings.misc.background_color);
        append_cursor(&mut self.batch, rect, settings.cursor.cursor_color, background);
    }

    fn draw_selection(&mut self, payload: &RenderingPayload) {
        let settings = &*payload.settings;
        let cell = settings.font.cell_size;
        let (cw, ch) = (cell.width as f32, cell.height as f32);

        for (y, row) in payload.rows.iter().enumerate() {
            if !row.has_selection() {
                continue;
            }
            self.batch.append_rect(
                Rect::new(
                    cw * f32::from(row.selection_from),
                    ch * y as f32,
                    cw * f32::from(row.selection_to - row.selection_from),
                    ch,
                ),
                Rect::ZERO,
                settings.misc.selection_color,
                ShadingType::SolidFill,
            );
        }
    }
}

/// Every glyph a row's mappings reference must exist in all of its
/// parallel arrays.
fn check_rows(payload: &RenderingPayload) -> Result<(), RenderError> {
    for (row, r) in payload.rows.iter().enumerate() {
        let expected = r.mappings.iter().map(|m| m.glyphs.end).max().unwrap_or(0);
        let actual = r
            .glyph_indices
            .len()
            .min(r.glyph_advances.len())
            .min(r.glyph_offsets.len())
            .min(r.colors.len());
        if actual < expected {
            return Err(RenderError::RowMismatch {
                row,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

fn const_buffer(font: &FontSettings, target: Size) -> ConstBuffer {
    ConstBuffer {
        position_scale: [
            2.0 / target.width.max(1) as f32,
            2.0 / target.height.max(1) as f32,
        ],
        cell_size: [font.cell_size.width as f32, font.cell_size.height as f32],
        gamma_ratios: gamma_ratios(font.gamma),
        cleartype_enhanced_contrast: font.cleartype_enhanced_contrast,
        grayscale_enhanced_contrast: font.grayscale_enhanced_contrast,
        dashed_line_length: f32::from(font.underline_width) * 3.0,
        _padding: 0.0,
    }
}

/// Queue the decorations of one range in row `y`.
fn append_grid_lines(batch: &mut QuadBatch, font: &FontSettings, y: u32, range: &GridLineRange) {
    let cw = font.cell_size.width as f32;
    let ch = font.cell_size.height as f32;
    let top = ch * y as f32;
    let left = cw * f32::from(range.from);
    let width = cw * f32::from(range.to.saturating_sub(range.from));
    let thin = f32::from(font.thin_line_width);
    let color = range.color;

    let mut line = |x: f32, y: f32, w: f32, h: f32, shading: ShadingType| {
        batch.append_rect(Rect::new(x, y, w, h), Rect::ZERO, color, shading);
    };
    let solid = ShadingType::SolidFill;

    if range.lines.contains(GridLines::LEFT) {
        line(left, top, thin, ch, solid);
    }
    if range.lines.contains(GridLines::TOP) {
        line(left, top, width, thin, solid);
    }
    if range.lines.contains(GridLines::RIGHT) {
        line(left + width - thin, top, thin, ch, solid);
    }
    if range.lines.contains(GridLines::BOTTOM) {
        line(left, top + ch - thin, width, thin, solid);
    }
    if range.lines.contains(GridLines::UNDERLINE) {
        let pos = top + f32::from(font.underline_pos);
        line(left, pos, width, f32::from(font.underline_width), solid);
    }
    if range.lines.contains(GridLines::HYPERLINK_UNDERLINE) {
        let pos = top + f32::from(font.underline_pos);
        let w = f32::from(font.underline_width);
        line(left, pos, width, w, ShadingType::DashedLine);
    }
    if range.lines.contains(GridLines::DOUBLE_UNDERLINE) {
        for pos in font.double_underline_pos {
            line(left, top + f32::from(pos), width, thin, solid);
        }
    }
    if range.lines.contains(GridLines::STRIKETHROUGH) {
        let pos = top + f32::from(font.strikethrough_pos);
        line(left, pos, width, f32::from(font.strikethrough_width), solid);
    }
}
