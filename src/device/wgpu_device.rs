//! [`GpuDevice`] on top of wgpu.

use std::sync::Arc;

use winit::window::Window;

use super::{ConstBuffer, CustomConstBuffer, GpuDevice};
use crate::atlas::AtlasRegion;
use crate::batch::QuadInstance;
use crate::error::RenderError;
use crate::geometry::Size;
use crate::settings::BackendConfig;
use crate::shader::{BuiltinShaders, CompiledShader, ShaderProfile, builtin};
use crate::swap_chain::{SwapChain, SwapChainSettings};

/// Premultiplied alpha: shaders output `(rgb * a, a)`.
const PREMULTIPLIED: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

const INSTANCE_SIZE: u64 = size_of::<QuadInstance>() as u64;

/// Render target state of the frame being recorded.
#[derive(Debug, Default, Clone, Copy)]
struct FrameState {
    offscreen: bool,
    cleared: bool,
}

struct Offscreen {
    view: wgpu::TextureView,
    size: Size,
}

struct CustomShader {
    shader: CompiledShader,
    pipeline: wgpu::RenderPipeline,
}

/// All GPU objects of one backend instance.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    swap_chain: SwapChain,
    profile: ShaderProfile,

    quad_layout: wgpu::BindGroupLayout,
    quad_pipeline: wgpu::RenderPipeline,
    quad_bind_group: wgpu::BindGroup,
    quad_bind_group_dirty: bool,

    custom_layout: wgpu::BindGroupLayout,
    custom_vs: CompiledShader,
    custom_shader: Option<CustomShader>,
    custom_bind_group: Option<wgpu::BindGroup>,
    shader_sampler: wgpu::Sampler,

    constants: wgpu::Buffer,
    custom_constants: wgpu::Buffer,
    background_params: wgpu::Buffer,
    instances: wgpu::Buffer,
    indices: wgpu::Buffer,
    atlas: wgpu::Texture,
    atlas_view: wgpu::TextureView,
    background: wgpu::Texture,
    background_view: wgpu::TextureView,
    background_sampler: wgpu::Sampler,
    offscreen: Option<Offscreen>,

    frame: FrameState,
}

impl WgpuDevice {
    /// Create a device presenting to `window`.
    ///
    /// Every resizable resource starts at a placeholder size; the first
    /// frame's invalidation pass sizes them for real.
    pub fn new(window: Arc<Window>, config: &BackendConfig) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let inner = window.inner_size();
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference.into(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("oriterm_atlas"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            ..Default::default()
        }))?;

        let profile = if adapter.get_downlevel_capabilities().is_webgpu_compliant() {
            ShaderProfile::Full
        } else {
            ShaderProfile::Downlevel
        };
        log::info!(
            "GPU init: adapter={}, backend={:?}, profile={profile:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
        );

        let swap_chain = SwapChain::new(
            surface,
            &adapter,
            &device,
            &SwapChainSettings {
                size: Size::new(inner.width, inner.height),
                present_mode: config.present_mode,
                frame_latency: config.frame_latency,
            },
        )?;
        let format = swap_chain.format();

        let shaders = BuiltinShaders::embedded(profile).map_err(RenderError::BuiltinShader)?;
        let quad_layout = create_quad_layout(&device);
        let quad_pipeline = create_quad_pipeline(&device, format, &quad_layout, &shaders.quad);
        let custom_layout = create_custom_layout(&device);

        let constants = create_buffer(
            &device,
            "constants",
            size_of::<ConstBuffer>() as u64,
            wgpu::BufferUsages::UNIFORM,
        );
        let custom_constants = create_buffer(
            &device,
            "custom_constants",
            size_of::<CustomConstBuffer>() as u64,
            wgpu::BufferUsages::UNIFORM,
        );
        let background_params =
            create_buffer(&device, "background_params", 16, wgpu::BufferUsages::UNIFORM);
        let instances = create_buffer(&device, "instances", INSTANCE_SIZE, wgpu::BufferUsages::STORAGE);
        let indices = create_buffer(&device, "indices", 6 * 4, wgpu::BufferUsages::INDEX);

        let atlas = create_texture(
            &device,
            "glyph_atlas",
            Size::new(1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let atlas_view = atlas.create_view(&wgpu::TextureViewDescriptor::default());
        let background = create_texture(
            &device,
            "background_bitmap",
            Size::new(1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let background_view = background.create_view(&wgpu::TextureViewDescriptor::default());
        let background_sampler = create_sampler(&device, "background_sampler", wgpu::FilterMode::Nearest);
        let shader_sampler = create_sampler(&device, "shader_sampler", wgpu::FilterMode::Linear);

        let quad_bind_group = create_quad_bind_group(
            &device,
            &quad_layout,
            QuadBindings {
                constants: &constants,
                instances: &instances,
                atlas: &atlas_view,
                background: &background_view,
                background_params: &background_params,
                background_sampler: &background_sampler,
            },
        );

        Ok(Self {
            device,
            queue,
            swap_chain,
            profile,
            quad_layout,
            quad_pipeline,
            quad_bind_group,
            quad_bind_group_dirty: false,
            custom_layout,
            custom_vs: shaders.custom_vs,
            custom_shader: None,
            custom_bind_group: None,
            shader_sampler,
            constants,
            custom_constants,
            background_params,
            instances,
            indices,
            atlas,
            atlas_view,
            background,
            background_view,
            background_sampler,
            offscreen: None,
            frame: FrameState::default(),
        })
    }

    /// View the current frame draws into.
    fn target_view(&self) -> Result<&wgpu::TextureView, RenderError> {
        if self.frame.offscreen {
            if let Some(offscreen) = &self.offscreen {
                return Ok(&offscreen.view);
            }
        }
        self.swap_chain.back_buffer().ok_or(RenderError::NoBackBuffer)
    }

    /// Clear on the first pass of a frame, load afterwards.
    fn next_load_op(&mut self) -> wgpu::LoadOp<wgpu::Color> {
        if self.frame.cleared {
            wgpu::LoadOp::Load
        } else {
            self.frame.cleared = true;
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        }
    }

    fn refresh_quad_bind_group(&mut self) {
        if !self.quad_bind_group_dirty {
            return;
        }
        self.quad_bind_group = create_quad_bind_group(
            &self.device,
            &self.quad_layout,
            QuadBindings {
                constants: &self.constants,
                instances: &self.instances,
                atlas: &self.atlas_view,
                background: &self.background_view,
                background_params: &self.background_params,
                background_sampler: &self.background_sampler,
            },
        );
        self.quad_bind_group_dirty = false;
    }

    fn build_custom_pipeline(&self, shader: &CompiledShader) -> wgpu::RenderPipeline {
        create_custom_pipeline(
            &self.device,
            self.swap_chain.format(),
            &self.custom_layout,
            &self.custom_vs,
            shader,
        )
    }

    fn write_texture(&self, texture: &wgpu::Texture, region: AtlasRegion, rgba: &[u8]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(region.width * 4),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl GpuDevice for WgpuDevice {
    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn shader_profile(&self) -> ShaderProfile {
        self.profile
    }

    fn update_swap_chain(&mut self, settings: &SwapChainSettings) -> Result<(), RenderError> {
        self.swap_chain.update(&self.device, settings);
        Ok(())
    }

    fn wait_until_can_render(&mut self) -> Result<(), RenderError> {
        self.swap_chain.acquire(&self.device)
    }

    fn begin_frame(&mut self, offscreen: bool) -> Result<(), RenderError> {
        self.swap_chain.acquire(&self.device)?;
        self.frame = FrameState {
            offscreen: offscreen && self.offscreen.is_some(),
            cleared: false,
        };
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.swap_chain.present()
    }

    fn recreate_background_sampler(&mut self, border_color: u32) -> Result<(), RenderError> {
        self.background_sampler =
            create_sampler(&self.device, "background_sampler", wgpu::FilterMode::Nearest);
        let params: [u32; 4] = [border_color, 0, 0, 0];
        self.queue
            .write_buffer(&self.background_params, 0, bytemuck::cast_slice(&params));
        self.quad_bind_group_dirty = true;
        Ok(())
    }

    fn recreate_background_bitmap(&mut self, cells: Size) -> Result<(), RenderError> {
        let size = Size::new(cells.width.max(1), cells.height.max(1));
        self.background = create_texture(
            &self.device,
            "background_bitmap",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.background_view = self
            .background
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.quad_bind_group_dirty = true;
        Ok(())
    }

    fn write_background_bitmap(&mut self, colors: &[u32], cells: Size) -> Result<(), RenderError> {
        if cells.area() == 0 {
            return Ok(());
        }
        let region = AtlasRegion {
            x: 0,
            y: 0,
            width: cells.width,
            height: cells.height,
        };
        self.write_texture(&self.background, region, bytemuck::cast_slice(colors));
        Ok(())
    }

    fn recreate_offscreen_texture(&mut self, size: Option<Size>) -> Result<(), RenderError> {
        self.custom_bind_group = None;
        self.offscreen = size.map(|size| {
            let size = Size::new(size.width.max(1), size.height.max(1));
            let texture = create_texture(
                &self.device,
                "offscreen",
                size,
                self.swap_chain.format(),
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
            Offscreen {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                size,
            }
        });
        Ok(())
    }

    fn write_constants(&mut self, constants: &ConstBuffer) -> Result<(), RenderError> {
        self.queue
            .write_buffer(&self.constants, 0, bytemuck::bytes_of(constants));
        Ok(())
    }

    fn recreate_atlas(&mut self, size: Size) -> Result<(), RenderError> {
        self.atlas = create_texture(
            &self.device,
            "glyph_atlas",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.atlas_view = self.atlas.create_view(&wgpu::TextureViewDescriptor::default());
        self.quad_bind_group_dirty = true;
        Ok(())
    }

    fn write_atlas(&mut self, region: AtlasRegion, rgba: &[u8]) -> Result<(), RenderError> {
        self.write_texture(&self.atlas, region, rgba);
        Ok(())
    }

    fn recreate_instance_buffer(&mut self, capacity: usize) -> Result<(), RenderError> {
        self.instances = create_buffer(
            &self.device,
            "instances",
            capacity.max(1) as u64 * INSTANCE_SIZE,
            wgpu::BufferUsages::STORAGE,
        );
        self.quad_bind_group_dirty = true;
        Ok(())
    }

    fn recreate_index_buffer(&mut self, capacity: usize) -> Result<(), RenderError> {
        self.indices = create_buffer(
            &self.device,
            "indices",
            capacity.max(6) as u64 * 4,
            wgpu::BufferUsages::INDEX,
        );
        Ok(())
    }

    fn write_instances(&mut self, instances: &[QuadInstance]) -> Result<(), RenderError> {
        self.queue
            .write_buffer(&self.instances, 0, bytemuck::cast_slice(instances));
        Ok(())
    }

    fn write_indices(&mut self, indices: &[u32]) -> Result<(), RenderError> {
        self.queue
            .write_buffer(&self.indices, 0, bytemuck::cast_slice(indices));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), RenderError> {
        self.refresh_quad_bind_group();
        let load = self.next_load_op();
        let view = self.target_view()?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.quad_pipeline);
            pass.set_bind_group(0, &self.quad_bind_group, &[]);
            pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn create_custom_shader(&mut self, shader: Option<&CompiledShader>) -> Result<(), RenderError> {
        self.custom_bind_group = None;
        self.custom_shader = None;
        if let Some(shader) = shader {
            let pipeline = validated(&self.device, shader.label(), || {
                self.build_custom_pipeline(shader)
            })?;
            self.custom_shader = Some(CustomShader {
                pipeline,
                shader: shader.clone(),
            });
        }
        Ok(())
    }

    fn draw_custom_shader(&mut self, constants: &CustomConstBuffer) -> Result<(), RenderError> {
        let (Some(custom), Some(offscreen)) = (&self.custom_shader, &self.offscreen) else {
            return Ok(());
        };
        self.queue
            .write_buffer(&self.custom_constants, 0, bytemuck::bytes_of(constants));

        let bind_group = self.custom_bind_group.get_or_insert_with(|| {
            log::debug!(
                "custom shader input: {}x{}",
                offscreen.size.width,
                offscreen.size.height
            );
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("custom_bind_group"),
                layout: &self.custom_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.custom_constants.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&offscreen.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.shader_sampler),
                    },
                ],
            })
        });
        let view = self
            .swap_chain
            .back_buffer()
            .ok_or(RenderError::NoBackBuffer)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("custom_shader_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("custom_shader_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&custom.pipeline);
            pass.set_bind_group(0, &*bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn replace_builtin_shaders(&mut self, shaders: &BuiltinShaders) -> Result<(), RenderError> {
        let format = self.swap_chain.format();
        let quad_pipeline = validated(&self.device, shaders.quad.label(), || {
            create_quad_pipeline(&self.device, format, &self.quad_layout, &shaders.quad)
        })?;
        let custom_pipeline = match &self.custom_shader {
            Some(custom) => Some(validated(&self.device, shaders.custom_vs.label(), || {
                create_custom_pipeline(
                    &self.device,
                    format,
                    &self.custom_layout,
                    &shaders.custom_vs,
                    &custom.shader,
                )
            })?),
            None => None,
        };

        self.quad_pipeline = quad_pipeline;
        self.custom_vs = shaders.custom_vs.clone();
        if let (Some(custom), Some(pipeline)) = (&mut self.custom_shader, custom_pipeline) {
            custom.pipeline = pipeline;
        }
        log::info!("built-in shaders replaced");
        Ok(())
    }
}

/// Run `build` inside a validation error scope and return what it caught.
fn validated<T>(
    device: &wgpu::Device,
    label: &str,
    build: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(e) => Err(RenderError::PipelineValidation {
            label: label.to_owned(),
            message: e.to_string(),
        }),
    }
}

fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    size: Size,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

fn create_sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_quad_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("quad_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(2),
            texture_entry(3),
            uniform_entry(4, wgpu::ShaderStages::FRAGMENT),
            sampler_entry(5),
        ],
    })
}

fn create_custom_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("custom_shader_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1),
            sampler_entry(2),
        ],
    })
}

struct QuadBindings<'a> {
    constants: &'a wgpu::Buffer,
    instances: &'a wgpu::Buffer,
    atlas: &'a wgpu::TextureView,
    background: &'a wgpu::TextureView,
    background_params: &'a wgpu::Buffer,
    background_sampler: &'a wgpu::Sampler,
}

fn create_quad_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    bindings: QuadBindings<'_>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("quad_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: bindings.constants.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: bindings.instances.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(bindings.atlas),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(bindings.background),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: bindings.background_params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::Sampler(bindings.background_sampler),
            },
        ],
    })
}

fn shader_module(device: &wgpu::Device, shader: &CompiledShader) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader.label()),
        source: wgpu::ShaderSource::Wgsl(shader.source().into()),
    })
}

fn triangle_list() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

/// Quad pipeline: vertices are generated from the instance storage buffer,
/// so there are no vertex buffers.
fn create_quad_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layout: &wgpu::BindGroupLayout,
    shader: &CompiledShader,
) -> wgpu::RenderPipeline {
    let module = shader_module(device, shader);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("quad_pipeline_layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("quad_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(builtin::VERTEX_ENTRY),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(builtin::FRAGMENT_ENTRY),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(PREMULTIPLIED),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: triangle_list(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Full-screen pass sampling the offscreen frame through a custom pixel
/// shader. The output replaces the back buffer contents.
fn create_custom_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layout: &wgpu::BindGroupLayout,
    vertex: &CompiledShader,
    fragment: &CompiledShader,
) -> wgpu::RenderPipeline {
    let vs = shader_module(device, vertex);
    let fs = shader_module(device, fragment);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("custom_shader_pipeline_layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("custom_shader_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vs,
            entry_point: Some(vertex.entry_point()),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &fs,
            entry_point: Some(fragment.entry_point()),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: triangle_list(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
