//! Recording Backend
//!
//! A CPU implementation of [`GpuBackend`] that performs the same validation
//! as the wgpu backend but only records what it was asked to do. Tests use
//! the event log to check allocation counts, release ordering and pass
//! sequencing without a GPU.
//!
//! Texel contents are not simulated: uploaded data is kept verbatim and
//! rendered textures read back as zeros. Readback uses the backend's stored
//! layout, so `Rgb8Unorm` texels come back expanded to RGBA8 as on wgpu.

use glam::UVec2;
use slotmap::SlotMap;

use crate::errors::{Result, UmbraError};
use crate::renderer::core::{
    FramebufferDesc, FramebufferHandle, FullscreenDraw, GpuBackend, PixelFormat, SamplerDesc,
    TextureDesc, TextureHandle, TextureUsages,
};
use crate::renderer::pipeline::FragmentShader;
use crate::resources::uniforms::UniformValues;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuEvent {
    CreateTexture {
        handle: TextureHandle,
        label: String,
        size: UVec2,
        format: PixelFormat,
        usage: TextureUsages,
        sampler: SamplerDesc,
    },
    DestroyTexture(TextureHandle),
    CreateFramebuffer {
        handle: FramebufferHandle,
        label: String,
        color_texture: TextureHandle,
        destroy_attachments: bool,
    },
    DestroyFramebuffer(FramebufferHandle),
    Draw(DrawRecord),
}

/// A recorded fullscreen draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub label: String,
    pub shader: FragmentShader,
    pub color_texture: TextureHandle,
    pub depth_texture: TextureHandle,
    /// The draw's own uniforms (without the color/depth inputs).
    pub uniforms: UniformValues,
    pub target: FramebufferHandle,
    /// Color texture of `target` at the time of the draw.
    pub target_texture: TextureHandle,
    pub blend: bool,
}

#[derive(Debug)]
struct RecordedTexture {
    label: String,
    size: UVec2,
    format: PixelFormat,
    usage: TextureUsages,
    sampler: SamplerDesc,
    data: Option<Vec<u8>>,
    last_writer: Option<String>,
}

#[derive(Debug)]
struct RecordedFramebuffer {
    color: TextureHandle,
    destroy_attachments: bool,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    size: UVec2,
    textures: SlotMap<TextureHandle, RecordedTexture>,
    framebuffers: SlotMap<FramebufferHandle, RecordedFramebuffer>,
    events: Vec<GpuEvent>,
    failing_labels: Vec<String>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: UVec2::new(width, height),
            ..Default::default()
        }
    }

    // === Fault injection ===

    /// Makes every later allocation whose label contains `label` fail with
    /// [`UmbraError::AllocationFailed`].
    pub fn fail_allocations_labeled(&mut self, label: &str) {
        self.failing_labels.push(label.to_string());
    }

    /// Clears all injected allocation failures.
    pub fn allow_all_allocations(&mut self) {
        self.failing_labels.clear();
    }

    fn check_allocation(&self, label: &str) -> Result<()> {
        if self.failing_labels.iter().any(|l| label.contains(l.as_str())) {
            return Err(UmbraError::AllocationFailed {
                label: label.to_string(),
            });
        }
        Ok(())
    }

    // === Inspection ===

    #[must_use]
    pub fn events(&self) -> &[GpuEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Recorded draws, in submission order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> + '_ {
        self.events.iter().filter_map(|e| match e {
            GpuEvent::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Number of recorded texture creations whose label contains `label`.
    #[must_use]
    pub fn created_textures_labeled(&self, label: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GpuEvent::CreateTexture { label: l, .. } if l.contains(label)))
            .count()
    }

    /// Number of recorded framebuffer creations whose label contains `label`.
    #[must_use]
    pub fn created_framebuffers_labeled(&self, label: &str) -> usize {
        self.events
            .iter()
            .filter(
                |e| matches!(e, GpuEvent::CreateFramebuffer { label: l, .. } if l.contains(label)),
            )
            .count()
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

    #[must_use]
    pub fn is_texture_live(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(texture)
    }

    #[must_use]
    pub fn is_framebuffer_live(&self, framebuffer: FramebufferHandle) -> bool {
        self.framebuffers.contains_key(framebuffer)
    }

    #[must_use]
    pub fn texture_label(&self, texture: TextureHandle) -> Option<&str> {
        self.textures.get(texture).map(|t| t.label.as_str())
    }

    #[must_use]
    pub fn texture_format(&self, texture: TextureHandle) -> Option<PixelFormat> {
        self.textures.get(texture).map(|t| t.format)
    }

    #[must_use]
    pub fn texture_usage(&self, texture: TextureHandle) -> Option<TextureUsages> {
        self.textures.get(texture).map(|t| t.usage)
    }

    #[must_use]
    pub fn texture_sampler(&self, texture: TextureHandle) -> Option<SamplerDesc> {
        self.textures.get(texture).map(|t| t.sampler)
    }

    /// Whether destroying `framebuffer` also destroys its color texture.
    #[must_use]
    pub fn framebuffer_destroys_attachments(&self, framebuffer: FramebufferHandle) -> Option<bool> {
        self.framebuffers
            .get(framebuffer)
            .map(|fb| fb.destroy_attachments)
    }

    /// Bytes uploaded at creation, as given (three bytes per `Rgb8Unorm` texel).
    #[must_use]
    pub fn texture_data(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(texture).and_then(|t| t.data.as_deref())
    }

    /// Label of the last draw that rendered into `texture`.
    #[must_use]
    pub fn last_writer(&self, texture: TextureHandle) -> Option<&str> {
        self.textures
            .get(texture)
            .and_then(|t| t.last_writer.as_deref())
    }
}

impl GpuBackend for RecordingBackend {
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
        self.check_allocation(desc.label)?;
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

        let handle = self.textures.insert(RecordedTexture {
            label: desc.label.to_string(),
            size: desc.size(),
            format: desc.format,
            usage: desc.usage,
            sampler: desc.sampler,
            data: data.map(<[u8]>::to_vec),
            last_writer: None,
        });
        self.events.push(GpuEvent::CreateTexture {
            handle,
            label: desc.label.to_string(),
            size: desc.size(),
            format: desc.format,
            usage: desc.usage,
            sampler: desc.sampler,
        });
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(texture).is_some() {
            self.events.push(GpuEvent::DestroyTexture(texture));
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<UVec2> {
        self.textures.get(texture).map(|t| t.size)
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc<'_>) -> Result<FramebufferHandle> {
        self.check_allocation(desc.label)?;
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

        let handle = self.framebuffers.insert(RecordedFramebuffer {
            color: desc.color_texture,
            destroy_attachments: desc.destroy_attachments,
        });
        self.events.push(GpuEvent::CreateFramebuffer {
            handle,
            label: desc.label.to_string(),
            color_texture: desc.color_texture,
            destroy_attachments: desc.destroy_attachments,
        });
        Ok(handle)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(fb) = self.framebuffers.remove(framebuffer) {
            self.events.push(GpuEvent::DestroyFramebuffer(framebuffer));
            if fb.destroy_attachments {
                self.destroy_texture(fb.color);
            }
        }
    }

    fn framebuffer_texture(&self, framebuffer: FramebufferHandle) -> Option<TextureHandle> {
        self.framebuffers.get(framebuffer).map(|fb| fb.color)
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()> {
        let target_texture = self
            .framebuffers
            .get(draw.target)
            .ok_or(UmbraError::InvalidFramebuffer(draw.target))?
            .color;
        if !self.textures.contains_key(target_texture) {
            return Err(UmbraError::InvalidTexture(target_texture));
        }
        for (name, handle) in draw.bound_values().textures() {
            let handle = handle.ok_or(UmbraError::MissingTexture { name })?;
            if !self.textures.contains_key(handle) {
                return Err(UmbraError::InvalidTexture(handle));
            }
        }

        if let Some(texture) = self.textures.get_mut(target_texture) {
            texture.last_writer = Some(draw.label.to_string());
        }
        self.events.push(GpuEvent::Draw(DrawRecord {
            label: draw.label.to_string(),
            shader: draw.shader,
            color_texture: draw.color_texture,
            depth_texture: draw.depth_texture,
            uniforms: draw.uniforms.clone(),
            target: draw.target,
            target_texture,
            blend: draw.blend,
        }));
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>> {
        let recorded = self
            .textures
            .get(texture)
            .ok_or(UmbraError::InvalidTexture(texture))?;
        if !recorded.usage.contains(TextureUsages::COPY_SRC) {
            return Err(UmbraError::ReadbackFailed(
                "texture was not created with COPY_SRC".to_string(),
            ));
        }

        let texels = recorded.size.x as usize * recorded.size.y as usize;
        Ok(match (&recorded.data, recorded.format) {
            (Some(data), PixelFormat::Rgb8Unorm) => data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            (Some(data), _) => data.clone(),
            // Rgb8Unorm is stored as RGBA8
            (None, PixelFormat::Rgb8Unorm) => vec![0; texels * 4],
            (None, format) => vec![0; texels * format.bytes_per_pixel()],
        })
    }
}
