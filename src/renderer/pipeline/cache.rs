//! Fullscreen Pipeline Cache
//!
//! Owns every fullscreen `wgpu::RenderPipeline` together with its bind group
//! layout. Pipelines live in a contiguous `Vec` and are looked up by an
//! `FxHasher` hash of their canonical [`FullscreenPipelineKey`].
//!
//! Bind group layout of every fullscreen pipeline:
//!
//! | Binding      | Resource                                   |
//! |--------------|--------------------------------------------|
//! | 0            | scalar uniform block                       |
//! | 1 + 2i       | i-th texture (`texture_2d<f32>`)           |
//! | 2 + 2i       | sampler of the i-th texture                |

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::shader_gen::{UNIFORM_BINDING, texture_binding};

/// Canonical description of a fullscreen pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullscreenPipelineKey {
    /// xxh3-128 of the final WGSL source.
    pub shader_hash: u128,
    /// Filterability of each bound texture, in binding order.
    pub filterable: SmallVec<[bool; 4]>,
    pub color_format: wgpu::TextureFormat,
    pub blend: bool,
}

/// A cached pipeline and the layout its bind groups must use.
pub struct FullscreenPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[must_use]
pub fn fx_hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[derive(Default)]
pub struct PipelineCache {
    pipelines: Vec<FullscreenPipeline>,
    lookup: FxHashMap<u64, usize>,
}

impl PipelineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create a fullscreen pipeline.
    pub fn get_or_create_fullscreen(
        &mut self,
        device: &wgpu::Device,
        shader_module: &wgpu::ShaderModule,
        canonical_key: &FullscreenPipelineKey,
        label: &str,
    ) -> &FullscreenPipeline {
        let hash = fx_hash_key(canonical_key);
        if let Some(&index) = self.lookup.get(&hash) {
            return &self.pipelines[index];
        }

        log::debug!("Creating fullscreen pipeline '{label}'");

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for (i, &filterable) in canonical_key.filterable.iter().enumerate() {
            let binding = texture_binding(i as u32);
            entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: binding + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(if filterable {
                    wgpu::SamplerBindingType::Filtering
                } else {
                    wgpu::SamplerBindingType::NonFiltering
                }),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Layout")),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &[Some(&bind_group_layout)],
            immediate_size: 0,
        });

        let blend = if canonical_key.blend {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: canonical_key.color_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let index = self.pipelines.len();
        self.pipelines.push(FullscreenPipeline {
            pipeline,
            bind_group_layout,
        });
        self.lookup.insert(hash, index);
        &self.pipelines[index]
    }
}
