//! wgpu Backend
//!
//! [`WgpuBackend`] implements [`GpuBackend`] on a headless wgpu device.
//! Textures and framebuffers live in slot maps and are destroyed explicitly
//! (`wgpu::Texture::destroy`) rather than when the last reference drops.
//!
//! Every fullscreen draw renders its template into WGSL, fetches the cached
//! module and pipeline, uploads the packed scalars into a fresh uniform
//! buffer and submits one render pass.

use glam::UVec2;
use slotmap::SlotMap;
use smallvec::SmallVec;
use wgpu::util::DeviceExt;

use super::backend::{FullscreenDraw, GpuBackend};
use super::resources::{
    FramebufferDesc, FramebufferHandle, PixelFormat, SamplerDesc, TextureDesc, TextureFilter,
    TextureHandle, TextureUsages, TextureWrap,
};
use crate::errors::{Result, UmbraError};
use crate::renderer::pipeline::{
    FullscreenPipelineKey, PipelineCache, ShaderGenerator, ShaderManager,
};
use crate::renderer::settings::RenderSettings;

/// A live texture with its default view and sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    /// Format requested by the caller (before RGB expansion).
    pub format: PixelFormat,
    pub usage: TextureUsages,
    pub size: UVec2,
}

struct GpuFramebuffer {
    color: TextureHandle,
    destroy_attachments: bool,
}

/// Headless wgpu implementation of [`GpuBackend`].
pub struct WgpuBackend {
    /// The wgpu device for GPU operations
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,

    size: UVec2,
    textures: SlotMap<TextureHandle, GpuTexture>,
    framebuffers: SlotMap<FramebufferHandle, GpuFramebuffer>,
    shader_manager: ShaderManager,
    pipeline_cache: PipelineCache,
}

impl WgpuBackend {
    /// Creates a backend on a new headless device, blocking until it is ready.
    pub fn headless(settings: &RenderSettings) -> Result<Self> {
        pollster::block_on(Self::new(settings))
    }

    pub async fn new(settings: &RenderSettings) -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| UmbraError::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Umbra Device"),
                required_features: settings.required_features,
                required_limits: settings.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        Ok(Self {
            device,
            queue,
            size: UVec2::new(settings.width, settings.height),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            shader_manager: ShaderManager::new(),
            pipeline_cache: PipelineCache::new(),
        })
    }

    /// Live texture, if the handle is valid.
    #[must_use]
    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle)
    }

    /// Number of live textures.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of live framebuffers.
    #[must_use]
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    fn create_sampler(&self, label: &str, desc: SamplerDesc, filterable: bool) -> wgpu::Sampler {
        // Unfilterable formats must be bound to a non-filtering sampler.
        let filter = |f: TextureFilter| match f {
            TextureFilter::Linear if filterable => wgpu::FilterMode::Linear,
            _ => wgpu::FilterMode::Nearest,
        };

        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: address_mode(desc.wrap_s),
            address_mode_v: address_mode(desc.wrap_t),
            mag_filter: filter(desc.mag_filter),
            min_filter: filter(desc.min_filter),
            ..Default::default()
        })
    }
}

fn address_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Native format; three-channel textures are stored as RGBA.
fn native_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgb8Unorm | PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::R32Float => wgpu::TextureFormat::R32Float,
        PixelFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

fn native_usage(usage: TextureUsages) -> wgpu::TextureUsages {
    let mut native = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsages::SAMPLED) {
        native |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsages::RENDER_TARGET) {
        native |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.contains(TextureUsages::COPY_SRC) {
        native |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsages::COPY_DST) {
        native |= wgpu::TextureUsages::COPY_DST;
    }
    native
}

impl GpuBackend for WgpuBackend {
    fn drawing_buffer_size(&self) -> UVec2 {
        self.size
    }

    fn resize_drawing_buffer(&mut self, size: UVec2) {
        self.size = size;
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        data: Option<&[u8]>,
    ) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(UmbraError::InvalidTextureSize {
                label: desc.label.to_string(),
                width: desc.width,
                height: desc.height,
            });
        }
        if let Some(data) = data
            && data.len() != desc.byte_len()
        {
            return Err(UmbraError::InvalidTextureData {
                label: desc.label.to_string(),
                expected: desc.byte_len(),
                actual: data.len(),
            });
        }
        if data.is_some() && desc.format == PixelFormat::Depth32Float {
            return Err(UmbraError::UnsupportedFormat {
                format: desc.format,
                operation: "texel upload",
            });
        }

        let mut usage = native_usage(desc.usage);
        if data.is_some() {
            usage |= wgpu::TextureUsages::COPY_DST;
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let format = native_format(desc.format);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        if let Some(data) = data {
            let expanded;
            let texels = if desc.format == PixelFormat::Rgb8Unorm {
                expanded = data
                    .chunks_exact(3)
                    .flat_map(|p| [p[0], p[1], p[2], 255])
                    .collect::<Vec<u8>>();
                expanded.as_slice()
            } else {
                data
            };

            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                texels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(desc.width * 4),
                    rows_per_image: Some(desc.height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.create_sampler(desc.label, desc.sampler, desc.format.is_filterable());

        log::debug!(
            "Created texture '{}' {}x{} {:?}",
            desc.label,
            desc.width,
            desc.height,
            desc.format
        );

        Ok(self.textures.insert(GpuTexture {
            texture,
            view,
            sampler,
            format: desc.format,
            usage: desc.usage,
            size: desc.size(),
        }))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(gpu_texture) = self.textures.remove(texture) {
            gpu_texture.texture.destroy();
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<UVec2> {
        self.textures.get(texture).map(|t| t.size)
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc<'_>) -> Result<FramebufferHandle> {
        let color = self
            .textures
            .get(desc.color_texture)
            .ok_or(UmbraError::InvalidTexture(desc.color_texture))?;

        if !color.format.is_color_renderable() || !color.usage.contains(TextureUsages::RENDER_TARGET)
        {
            return Err(UmbraError::UnsupportedFormat {
                format: color.format,
                operation: "framebuffer color attachment",
            });
        }

        log::debug!("Created framebuffer '{}'", desc.label);

        Ok(self.framebuffers.insert(GpuFramebuffer {
            color: desc.color_texture,
            destroy_attachments: desc.destroy_attachments,
        }))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(fb) = self.framebuffers.remove(framebuffer)
            && fb.destroy_attachments
        {
            self.destroy_texture(fb.color);
        }
    }

    fn framebuffer_texture(&self, framebuffer: FramebufferHandle) -> Option<TextureHandle> {
        self.framebuffers.get(framebuffer).map(|fb| fb.color)
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()> {
        let values = draw.bound_values();

        let target_handle = self
            .framebuffers
            .get(draw.target)
            .ok_or(UmbraError::InvalidFramebuffer(draw.target))?
            .color;
        let target = self
            .textures
            .get(target_handle)
            .ok_or(UmbraError::InvalidTexture(target_handle))?;

        let mut bound: SmallVec<[&GpuTexture; 4]> = SmallVec::new();
        for (name, handle) in values.textures() {
            let handle = handle.ok_or(UmbraError::MissingTexture { name })?;
            bound.push(
                self.textures
                    .get(handle)
                    .ok_or(UmbraError::InvalidTexture(handle))?,
            );
        }

        let source = ShaderGenerator::generate_shader(draw.shader, &values)?;
        let (module, shader_hash) =
            self.shader_manager
                .get_or_compile(&self.device, draw.shader.name, &source);

        let key = FullscreenPipelineKey {
            shader_hash,
            filterable: bound.iter().map(|t| t.format.is_filterable()).collect(),
            color_format: native_format(target.format),
            blend: draw.blend,
        };
        let pipeline =
            self.pipeline_cache
                .get_or_create_fullscreen(&self.device, module, &key, draw.label);

        let packed = values.packed_scalars();
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Uniforms", draw.label)),
                contents: bytemuck::cast_slice(packed.as_slice()),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut entries = Vec::with_capacity(1 + bound.len() * 2);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        });
        for (i, texture) in bound.iter().enumerate() {
            let binding = crate::renderer::pipeline::shader_gen::texture_binding(i as u32);
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} BindGroup", draw.label)),
            layout: &pipeline.bind_group_layout,
            entries: &entries,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(draw.label),
            });
        {
            let load = if draw.blend {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(draw.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });

            pass.set_pipeline(&pipeline.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));

        log::trace!("Drew '{}' ({})", draw.label, draw.shader.name);
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>> {
        let gpu_texture = self
            .textures
            .get(texture)
            .ok_or(UmbraError::InvalidTexture(texture))?;

        if !gpu_texture.usage.contains(TextureUsages::COPY_SRC) {
            return Err(UmbraError::ReadbackFailed(
                "texture was not created with COPY_SRC".to_string(),
            ));
        }
        let native = native_format(gpu_texture.format);
        let bytes_per_pixel = native
            .block_copy_size(None)
            .ok_or(UmbraError::UnsupportedFormat {
                format: gpu_texture.format,
                operation: "readback",
            })?;

        let UVec2 {
            x: width,
            y: height,
        } = gpu_texture.size;
        let unpadded = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| UmbraError::ReadbackFailed(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| UmbraError::ReadbackFailed(e.to_string()))?
            .map_err(|e| UmbraError::ReadbackFailed(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks_exact(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        buffer.unmap();

        Ok(pixels)
    }
}
