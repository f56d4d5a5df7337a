//! Offscreen Scene
//!
//! A minimal scene for exercising post-process stages: it owns a color and a
//! depth input sized to the drawing buffer, two canvas targets that stages
//! composite into alternately, and the registered stages.
//!
//! ```rust,ignore
//! let mut scene = create_scene(&SceneOptions::default())?;
//! let ao = scene.add_stage(Box::new(AmbientOcclusionStage::new()));
//! scene.stage_mut(ao).set_show(true);
//! let pixels = scene.render_for_specs()?;
//! ```

use glam::UVec2;

use crate::errors::Result;
use crate::renderer::core::{
    FramebufferDesc, FramebufferHandle, FullscreenDraw, GpuBackend, PixelFormat, SamplerDesc,
    TextureDesc, TextureFilter, TextureHandle, TextureUsages, WgpuBackend,
};
use crate::renderer::graph::{FrameContext, PostProcessStage};
use crate::renderer::settings::RenderSettings;

/// Options of [`create_scene`].
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub width: u32,
    pub height: u32,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            power_preference: wgpu::PowerPreference::LowPower,
        }
    }
}

/// Creates an offscreen scene over a new headless wgpu device.
pub fn create_scene(options: &SceneOptions) -> Result<OffscreenScene<WgpuBackend>> {
    let gpu = WgpuBackend::headless(&RenderSettings {
        power_preference: options.power_preference,
        width: options.width,
        height: options.height,
        ..Default::default()
    })?;
    OffscreenScene::new(gpu)
}

#[derive(Debug, Clone, Copy)]
struct Canvas {
    texture: TextureHandle,
    framebuffer: FramebufferHandle,
}

#[derive(Debug, Clone, Copy)]
struct SceneTargets {
    color: TextureHandle,
    depth: TextureHandle,
    canvas: [Canvas; 2],
}

pub struct OffscreenScene<B: GpuBackend> {
    gpu: B,
    targets: Option<SceneTargets>,
    stages: Vec<Box<dyn PostProcessStage<B>>>,
    frame_number: u64,
    dirty: bool,
    output: Option<TextureHandle>,
}

impl<B: GpuBackend> OffscreenScene<B> {
    /// Creates the scene and its inputs at the backend's drawing-buffer size.
    pub fn new(gpu: B) -> Result<Self> {
        let mut scene = Self {
            gpu,
            targets: None,
            stages: Vec::new(),
            frame_number: 0,
            dirty: true,
            output: None,
        };
        scene.targets = Some(scene.create_targets(None, None)?);
        Ok(scene)
    }

    fn create_targets(
        &mut self,
        color_data: Option<&[u8]>,
        depth_data: Option<&[u8]>,
    ) -> Result<SceneTargets> {
        let UVec2 {
            x: width,
            y: height,
        } = self.gpu.drawing_buffer_size();

        let color = self.gpu.create_texture(
            &TextureDesc {
                label: "Scene Color",
                width,
                height,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsages::SAMPLED | TextureUsages::COPY_SRC,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Linear),
            },
            color_data,
        )?;
        let depth = self.gpu.create_texture(
            &TextureDesc {
                label: "Scene Depth",
                width,
                height,
                format: PixelFormat::R32Float,
                usage: TextureUsages::SAMPLED,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Nearest),
            },
            depth_data,
        )?;

        let canvas = [self.create_canvas(0)?, self.create_canvas(1)?];

        Ok(SceneTargets {
            color,
            depth,
            canvas,
        })
    }

    fn create_canvas(&mut self, index: usize) -> Result<Canvas> {
        let UVec2 {
            x: width,
            y: height,
        } = self.gpu.drawing_buffer_size();
        let label = format!("Scene Canvas {index}");

        let texture = self.gpu.create_texture(
            &TextureDesc {
                label: &label,
                width,
                height,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsages::RENDER_TARGET | TextureUsages::SAMPLED | TextureUsages::COPY_SRC,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Linear),
            },
            None,
        )?;
        let framebuffer = self.gpu.create_framebuffer(&FramebufferDesc {
            label: &label,
            color_texture: texture,
            destroy_attachments: true,
        })?;

        Ok(Canvas {
            texture,
            framebuffer,
        })
    }

    fn release_targets(&mut self) {
        if let Some(targets) = self.targets.take() {
            self.gpu.destroy_texture(targets.color);
            self.gpu.destroy_texture(targets.depth);
            for canvas in targets.canvas {
                self.gpu.destroy_framebuffer(canvas.framebuffer);
            }
        }
        self.output = None;
    }

    // === Accessors ===

    pub fn gpu(&self) -> &B {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut B {
        &mut self.gpu
    }

    #[must_use]
    pub fn color_texture(&self) -> Option<TextureHandle> {
        self.targets.map(|t| t.color)
    }

    #[must_use]
    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.targets.map(|t| t.depth)
    }

    /// Texture written by the last `render`.
    #[must_use]
    pub fn output_texture(&self) -> Option<TextureHandle> {
        self.output
    }

    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    // === Stages ===

    /// Registers a stage; returns its index.
    pub fn add_stage(&mut self, stage: Box<dyn PostProcessStage<B>>) -> usize {
        self.stages.push(stage);
        self.stages.len() - 1
    }

    pub fn stage(&self, index: usize) -> &dyn PostProcessStage<B> {
        self.stages[index].as_ref()
    }

    pub fn stage_mut(&mut self, index: usize) -> &mut dyn PostProcessStage<B> {
        self.stages[index].as_mut()
    }

    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    // === Inputs ===

    /// Replaces both inputs: RGBA8 color texels and normalized depths
    /// (`1.0` = far plane), each covering the whole drawing buffer.
    pub fn load_inputs(&mut self, rgba: &[u8], depth: &[f32]) -> Result<()> {
        self.reload(Some(rgba), Some(bytemuck::cast_slice(depth)))
    }

    fn reload(&mut self, color: Option<&[u8]>, depth: Option<&[u8]>) -> Result<()> {
        self.release_targets();
        self.targets = Some(self.create_targets(color, depth)?);
        self.dirty = true;
        Ok(())
    }

    // === Frame ===

    /// Starts a new frame.
    pub fn initialize_frame(&mut self) {
        self.frame_number += 1;
        self.output = self.targets.map(|t| t.color);
    }

    /// Runs every shown stage, then its composite shader into the next canvas.
    pub fn render(&mut self) -> Result<()> {
        let Some(targets) = self.targets else {
            return Ok(());
        };

        let dirty = self.dirty;
        let mut input = targets.color;
        let mut next = 0;
        {
            let mut ctx = FrameContext::new(&mut self.gpu, self.frame_number);
            for stage in &mut self.stages {
                if !stage.show() || !stage.ready() {
                    continue;
                }
                stage.execute(&mut ctx, input, targets.depth, dirty)?;

                let canvas = targets.canvas[next];
                ctx.gpu.draw_fullscreen(&FullscreenDraw {
                    label: stage.name(),
                    shader: stage.fragment_shader(),
                    color_texture: input,
                    depth_texture: targets.depth,
                    uniforms: &stage.uniform_values(),
                    target: canvas.framebuffer,
                    blend: false,
                })?;
                input = canvas.texture;
                next ^= 1;
            }
        }

        self.dirty = false;
        self.output = Some(input);
        Ok(())
    }

    /// Initializes a frame, renders it and reads back the output texels.
    pub fn render_for_specs(&mut self) -> Result<Vec<u8>> {
        self.initialize_frame();
        self.render()?;
        match self.output {
            Some(output) => self.gpu.read_texture(output),
            None => Ok(Vec::new()),
        }
    }

    /// Resizes the drawing buffer and recreates the inputs. The next render
    /// passes `dirty = true` to every stage.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.gpu.resize_drawing_buffer(UVec2::new(width, height));
        self.reload(None, None)
    }

    /// Destroys every stage and scene target. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        for stage in &mut self.stages {
            stage.destroy(&mut self.gpu);
        }
        self.release_targets();
    }
}
