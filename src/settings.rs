//! Renderer-facing settings groups and the backend's own TOML configuration.
//!
//! Each settings group is wrapped in a [`Generational`](crate::Generational)
//! inside the payload; the backend never compares their contents.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Sentinel used by hosts that store the cursor color as a raw `u32`.
pub const INVERT_CURSOR_COLOR: u32 = 0xffff_ffff;

/// How non-color glyphs are antialiased by the rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntialiasingMode {
    #[default]
    Grayscale,
    ClearType,
    Aliased,
}

/// Font metrics and text rendering parameters.
///
/// Pixel metrics (`cell_size`, line positions and widths) are in physical
/// pixels relative to the top of a cell. `baseline` is in DIPs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub cell_size: Size,
    pub dpi: f32,
    pub baseline: f32,
    pub underline_pos: u16,
    pub underline_width: u16,
    pub strikethrough_pos: u16,
    pub strikethrough_width: u16,
    pub double_underline_pos: [u16; 2],
    pub thin_line_width: u16,
    pub antialiasing: AntialiasingMode,
    /// Display gamma, clamped to `1.0..=2.2` when computing ratios.
    pub gamma: f32,
    pub cleartype_enhanced_contrast: f32,
    pub grayscale_enhanced_contrast: f32,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            cell_size: Size::new(9, 19),
            dpi: 96.0,
            baseline: 15.0,
            underline_pos: 16,
            underline_width: 1,
            strikethrough_pos: 9,
            strikethrough_width: 1,
            double_underline_pos: [15, 17],
            thin_line_width: 1,
            antialiasing: AntialiasingMode::Grayscale,
            gamma: 1.8,
            cleartype_enhanced_contrast: 0.5,
            grayscale_enhanced_contrast: 1.0,
        }
    }
}

impl FontSettings {
    pub fn pixel_per_dip(&self) -> f32 {
        self.dpi / 96.0
    }

    pub fn dip_per_pixel(&self) -> f32 {
        96.0 / self.dpi
    }

    /// Cell height in DIPs, used to place each row's baseline.
    pub fn cell_height_dip(&self) -> f32 {
        self.cell_size.height as f32 * self.dip_per_pixel()
    }
}

/// Settings that change rarely and invalidate shader-side state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscSettings {
    /// Fill color outside the cell grid, `0xAABBGGRR`.
    pub background_color: u32,
    pub selection_color: u32,
    /// WGSL post-processing shader supplied by the user.
    pub custom_pixel_shader_path: Option<PathBuf>,
    pub use_retro_terminal_effect: bool,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            background_color: 0xff00_0000,
            selection_color: 0x7f80_8080,
            custom_pixel_shader_path: None,
            use_retro_terminal_effect: false,
        }
    }
}

impl MiscSettings {
    /// Whether any post-processing shader is configured, compiled or not.
    pub fn has_custom_shader(&self) -> bool {
        self.custom_pixel_shader_path.is_some() || self.use_retro_terminal_effect
    }
}

/// Cursor fill: a fixed color or an inversion of whatever is underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorColor {
    Invert,
    Solid(u32),
}

impl CursorColor {
    pub fn from_raw(color: u32) -> Self {
        if color == INVERT_CURSOR_COLOR {
            Self::Invert
        } else {
            Self::Solid(color)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    pub cursor_color: CursorColor,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            cursor_color: CursorColor::Invert,
        }
    }
}

/// Swap chain presentation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    #[default]
    Fifo,
    Mailbox,
    Immediate,
}

impl From<PresentMode> for wgpu::PresentMode {
    fn from(mode: PresentMode) -> Self {
        match mode {
            PresentMode::Fifo => Self::Fifo,
            PresentMode::Mailbox => Self::Mailbox,
            PresentMode::Immediate => Self::Immediate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    #[default]
    HighPerformance,
    LowPower,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(pref: PowerPreference) -> Self {
        match pref {
            PowerPreference::HighPerformance => Self::HighPerformance,
            PowerPreference::LowPower => Self::LowPower,
        }
    }
}

/// Top-level backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub present_mode: PresentMode,
    /// Maximum frames queued for presentation.
    pub frame_latency: u32,
    pub power_preference: PowerPreference,
    pub hot_reload: HotReloadConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            present_mode: PresentMode::Fifo,
            frame_latency: 2,
            power_preference: PowerPreference::HighPerformance,
            hot_reload: HotReloadConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Debug-build reloading of the built-in WGSL sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotReloadConfig {
    pub enabled: bool,
    /// Directory containing the built-in `.wgsl` files. Defaults to the
    /// crate's own shader directory.
    pub shader_dir: Option<PathBuf>,
    pub debounce_ms: u64,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shader_dir: None,
            debounce_ms: 100,
        }
    }
}

impl HotReloadConfig {
    pub fn shader_dir(&self) -> PathBuf {
        self.shader_dir.clone().unwrap_or_else(|| {
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/shader/wgsl"))
        })
    }
}
