//! Shaders: compilation, the built-in set, hot reload, and the optional
//! post-processing stage.

pub mod builtin;
pub mod compile;
pub mod hot_reload;

use std::time::Instant;

pub use builtin::BuiltinShaders;
pub use compile::{CompiledShader, ShaderProfile};
pub use hot_reload::ShaderMonitor;

use crate::device::{CustomConstBuffer, GpuDevice, unpack_color};
use crate::error::{RenderError, Warning};
use crate::geometry::Size;
use crate::settings::MiscSettings;

/// Which post-processing shader is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomShaderKind {
    None,
    Retro,
    User,
}

/// The custom pixel shader applied to the composed frame.
#[derive(Debug)]
pub struct CustomShaderStage {
    kind: CustomShaderKind,
    requires_continuous_redraw: bool,
    start: Instant,
}

impl Default for CustomShaderStage {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomShaderStage {
    pub fn new() -> Self {
        Self {
            kind: CustomShaderKind::None,
            requires_continuous_redraw: false,
            start: Instant::now(),
        }
    }

    pub fn kind(&self) -> CustomShaderKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.kind != CustomShaderKind::None
    }

    pub fn requires_continuous_redraw(&self) -> bool {
        self.requires_continuous_redraw
    }

    /// Tear the stage down and rebuild it from `misc`.
    ///
    /// A user shader that fails to compile, or whose pipeline the device
    /// rejects, leaves the stage disabled and is reported as a warning
    /// rather than an error. The retro effect is only used when no user
    /// shader is configured.
    pub fn recreate<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        misc: &MiscSettings,
    ) -> Result<Option<Warning>, RenderError> {
        device.create_custom_shader(None)?;
        self.kind = CustomShaderKind::None;
        self.requires_continuous_redraw = false;

        let profile = device.shader_profile();
        let mut warning = None;
        let shader = if let Some(path) = &misc.custom_pixel_shader_path {
            match compile::compile_custom_file(path, profile) {
                Ok(shader) => Some((shader, CustomShaderKind::User)),
                Err(e) => {
                    log::warn!("custom shader {} failed to compile: {e}", path.display());
                    warning = Some(Warning::CustomShaderCompileFailed);
                    None
                }
            }
        } else if misc.use_retro_terminal_effect {
            let shader = builtin::retro(profile).map_err(RenderError::BuiltinShader)?;
            Some((shader, CustomShaderKind::Retro))
        } else {
            None
        };

        if let Some((shader, kind)) = shader {
            match device.create_custom_shader(Some(&shader)) {
                Ok(()) => {}
                Err(RenderError::PipelineValidation { label, message })
                    if kind == CustomShaderKind::User =>
                {
                    log::warn!("custom shader {label} rejected by the device: {message}");
                    device.create_custom_shader(None)?;
                    return Ok(Some(Warning::CustomShaderCompileFailed));
                }
                Err(e) => return Err(e),
            }
            self.kind = kind;
            self.requires_continuous_redraw = shader.requires_continuous_redraw();
            self.start = Instant::now();
            log::info!(
                "custom shader {} active (continuous redraw: {})",
                shader.label(),
                self.requires_continuous_redraw,
            );
        }
        Ok(warning)
    }

    /// Uniforms for a frame drawn at `now`.
    pub fn constants(
        &self,
        now: Instant,
        pixel_per_dip: f32,
        target: Size,
        background: u32,
    ) -> CustomConstBuffer {
        CustomConstBuffer {
            time: now.saturating_duration_since(self.start).as_secs_f32(),
            scale: pixel_per_dip,
            resolution: [target.width as f32, target.height as f32],
            background: unpack_color(background),
        }
    }
}
