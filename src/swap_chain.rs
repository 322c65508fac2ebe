//! Presentation surface management.

use crate::error::RenderError;
use crate::geometry::Size;
use crate::settings::PresentMode;

/// What the swap chain is configured from. Rebuilt by the renderer whenever
/// the settings generation changes; reconfiguration only happens when the
/// values differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainSettings {
    /// Target size in physical pixels.
    pub size: Size,
    pub present_mode: PresentMode,
    /// Maximum frames queued for presentation.
    pub frame_latency: u32,
}

/// Owns the surface and the back buffer acquired for the current frame.
pub struct SwapChain {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
    view: Option<wgpu::TextureView>,
}

impl SwapChain {
    /// Configure `surface` for `device`, preferring a non-sRGB format so
    /// sRGB colors pass through without a second gamma curve.
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        settings: &SwapChainSettings,
    ) -> Result<Self, RenderError> {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: settings.size.width.max(1),
            height: settings.size.height.max(1),
            present_mode: settings.present_mode.into(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: settings.frame_latency.max(1),
        };
        surface.configure(device, &config);
        log::info!("swap chain: format={format:?}, {}x{}", config.width, config.height);

        Ok(Self {
            surface,
            config,
            frame: None,
            view: None,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> Size {
        Size::new(self.config.width, self.config.height)
    }

    /// Reconfigure if `settings` differ from the current configuration.
    /// Any back buffer acquired ahead of time is released first.
    pub fn update(&mut self, device: &wgpu::Device, settings: &SwapChainSettings) {
        let width = settings.size.width.max(1);
        let height = settings.size.height.max(1);
        let present_mode: wgpu::PresentMode = settings.present_mode.into();
        let latency = settings.frame_latency.max(1);
        if self.config.width == width
            && self.config.height == height
            && self.config.present_mode == present_mode
            && self.config.desired_maximum_frame_latency == latency
        {
            return;
        }

        self.view = None;
        self.frame = None;
        self.config.width = width;
        self.config.height = height;
        self.config.present_mode = present_mode;
        self.config.desired_maximum_frame_latency = latency;
        self.surface.configure(device, &self.config);
        log::debug!("swap chain: resized to {width}x{height}");
    }

    /// Acquire the next back buffer unless one is already held.
    ///
    /// Blocks while the presentation queue is full. A lost or outdated
    /// surface is reconfigured once before giving up.
    pub fn acquire(&mut self, device: &wgpu::Device) -> Result<(), RenderError> {
        if self.frame.is_some() {
            return Ok(());
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("swap chain: surface lost, reconfiguring");
                self.surface.configure(device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };

        self.view = Some(
            frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        self.frame = Some(frame);
        Ok(())
    }

    /// View of the back buffer acquired for this frame.
    pub fn back_buffer(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub fn present(&mut self) -> Result<(), RenderError> {
        self.view = None;
        let frame = self.frame.take().ok_or(RenderError::NoBackBuffer)?;
        frame.present();
        Ok(())
    }
}
