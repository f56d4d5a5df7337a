//! Ambient Occlusion Stage Tests
//!
//! Tests for:
//! - Visibility: hidden stage is a complete no-op
//! - Noise texture: created once per stage lifetime, red channel only
//! - Dirty protocol: one rebuild per dirty execute, release before allocate
//! - Viewport changes: output follows the drawing-buffer size
//! - Teardown: idempotent destroy, execute after destroy
//! - Parameters: edits visible on the next execute without a rebuild
//! - End-to-end pass sequencing over the recording backend

use glam::UVec2;

use umbra::errors::{Result, UmbraError};
use umbra::renderer::core::{
    GpuBackend, PixelFormat, SamplerDesc, TextureDesc, TextureFilter, TextureHandle, TextureUsages,
};
use umbra::renderer::graph::{AmbientOcclusionStage, FrameContext};
use umbra::renderer::pipeline::{AMBIENT_OCCLUSION, AMBIENT_OCCLUSION_GENERATE, GAUSSIAN_BLUR_1D_AO};
use umbra::testing::{GpuEvent, RecordingBackend};

const OUTPUT_LABEL: &str = "Ambient Occlusion Output";
const FRAMEBUFFER_LABEL: &str = "Ambient Occlusion Framebuffer";
const NOISE_LABEL: &str = "Ambient Occlusion Random Texture";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Fixture {
    gpu: RecordingBackend,
    color: TextureHandle,
    depth: TextureHandle,
}

fn fixture(width: u32, height: u32) -> Fixture {
    init_logger();
    let mut gpu = RecordingBackend::new(width, height);
    let color = gpu
        .create_texture(
            &TextureDesc {
                label: "Color Input",
                width,
                height,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsages::SAMPLED,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Linear),
            },
            None,
        )
        .unwrap();
    let depth = gpu
        .create_texture(
            &TextureDesc {
                label: "Depth Input",
                width,
                height,
                format: PixelFormat::R32Float,
                usage: TextureUsages::SAMPLED,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Nearest),
            },
            None,
        )
        .unwrap();
    gpu.clear_events();
    Fixture { gpu, color, depth }
}

impl Fixture {
    fn execute(&mut self, stage: &mut AmbientOcclusionStage, dirty: bool) -> Result<()> {
        let mut ctx = FrameContext::new(&mut self.gpu, 0);
        stage.execute(&mut ctx, self.color, self.depth, dirty)
    }
}

fn shown_stage() -> AmbientOcclusionStage {
    let mut stage = AmbientOcclusionStage::with_seed(7);
    stage.show = true;
    stage
}

// ============================================================================
// Construction & Visibility
// ============================================================================

#[test]
fn fresh_stage_is_hidden_and_alive() {
    let stage = AmbientOcclusionStage::new();

    assert!(!stage.show);
    assert!(!stage.is_destroyed());
    assert!(stage.ready());
    assert_eq!(stage.fragment_shader(), AMBIENT_OCCLUSION);
    assert!(stage.random_texture().is_none());
    assert!(!stage.viewport().is_allocated());
}

#[test]
fn hidden_stage_touches_nothing() {
    let mut fx = fixture(8, 6);
    let mut stage = AmbientOcclusionStage::with_seed(1);

    for i in 0..5 {
        fx.execute(&mut stage, i % 2 == 0).unwrap();
    }

    assert!(fx.gpu.events().is_empty());
    assert!(stage.random_texture().is_none());
    assert!(stage.composite().ao_texture.is_none());
}

#[test]
fn stage_can_be_shown_after_hidden_frames() {
    let mut fx = fixture(8, 6);
    let mut stage = AmbientOcclusionStage::with_seed(1);

    fx.execute(&mut stage, true).unwrap();
    assert!(fx.gpu.events().is_empty());

    stage.show = true;
    fx.execute(&mut stage, false).unwrap();
    assert_eq!(fx.gpu.draws().count(), 3);
}

// ============================================================================
// Noise Texture
// ============================================================================

#[test]
fn noise_texture_is_created_once() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    fx.execute(&mut stage, true).unwrap();
    for _ in 0..3 {
        fx.execute(&mut stage, false).unwrap();
    }
    fx.execute(&mut stage, true).unwrap();

    assert_eq!(fx.gpu.created_textures_labeled(NOISE_LABEL), 1);
}

#[test]
fn noise_texture_layout() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    let noise = stage.random_texture().unwrap();
    assert_eq!(fx.gpu.texture_size(noise), Some(UVec2::new(256, 256)));
    assert_eq!(fx.gpu.texture_format(noise), Some(PixelFormat::Rgb8Unorm));
    assert_eq!(fx.gpu.texture_usage(noise), Some(TextureUsages::SAMPLED));
    assert_eq!(
        fx.gpu.texture_sampler(noise),
        Some(SamplerDesc::clamp_to_edge(TextureFilter::Nearest))
    );

    let data = fx.gpu.texture_data(noise).unwrap();
    assert_eq!(data.len(), 256 * 256 * 3);
    assert!(data.chunks_exact(3).all(|t| t[1] == 0 && t[2] == 0));
    assert_eq!(stage.generate().random_texture, Some(noise));
}

#[test]
fn output_target_layout() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    let resources = stage.viewport().resources().unwrap();
    assert_eq!(
        fx.gpu.texture_sampler(resources.output_texture),
        Some(SamplerDesc::clamp_to_edge(TextureFilter::Linear))
    );
    assert_eq!(
        fx.gpu.framebuffer_destroys_attachments(resources.framebuffer),
        Some(false)
    );
}

#[test]
fn noise_is_independent_of_viewport() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();
    let noise = stage.random_texture();

    fx.gpu.resize_drawing_buffer(UVec2::new(32, 32));
    fx.execute(&mut stage, true).unwrap();

    assert_eq!(stage.random_texture(), noise);
    assert_eq!(fx.gpu.created_textures_labeled(NOISE_LABEL), 1);
}

// ============================================================================
// Dirty Protocol
// ============================================================================

#[test]
fn each_dirty_execute_rebuilds_once() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    for _ in 0..4 {
        fx.execute(&mut stage, true).unwrap();
    }

    assert_eq!(fx.gpu.created_textures_labeled(OUTPUT_LABEL), 4);
    assert_eq!(fx.gpu.created_framebuffers_labeled(FRAMEBUFFER_LABEL), 4);
}

#[test]
fn previous_resources_are_released_before_reallocation() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    for _ in 0..3 {
        fx.execute(&mut stage, true).unwrap();
    }

    let mut live_output = None;
    let mut live_framebuffer = None;
    for event in fx.gpu.events() {
        match event {
            GpuEvent::CreateTexture { handle, label, .. } if label == OUTPUT_LABEL => {
                assert!(live_output.is_none(), "output allocated while another is live");
                live_output = Some(*handle);
            }
            GpuEvent::DestroyTexture(handle) if live_output == Some(*handle) => {
                live_output = None;
            }
            GpuEvent::CreateFramebuffer { handle, label, .. } if label == FRAMEBUFFER_LABEL => {
                assert!(live_framebuffer.is_none(), "framebuffer allocated while another is live");
                live_framebuffer = Some(*handle);
            }
            GpuEvent::DestroyFramebuffer(handle) if live_framebuffer == Some(*handle) => {
                live_framebuffer = None;
            }
            _ => {}
        }
    }

    // inputs + noise + output + two intermediates
    assert_eq!(fx.gpu.texture_count(), 6);
    // output + two intermediates
    assert_eq!(fx.gpu.framebuffer_count(), 3);
}

#[test]
fn clean_frames_do_not_rebuild() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();
    let output = stage.composite().ao_texture;
    fx.gpu.clear_events();

    for _ in 0..3 {
        fx.execute(&mut stage, false).unwrap();
    }

    assert_eq!(fx.gpu.created_textures_labeled(OUTPUT_LABEL), 0);
    assert_eq!(fx.gpu.draws().count(), 9);
    assert_eq!(stage.composite().ao_texture, output);
}

#[test]
fn first_shown_execute_allocates_even_when_clean() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    fx.execute(&mut stage, false).unwrap();

    assert!(stage.viewport().is_allocated());
    assert_eq!(fx.gpu.created_textures_labeled(OUTPUT_LABEL), 1);
    assert_eq!(fx.gpu.draws().count(), 3);
}

#[test]
fn rebuild_follows_viewport_size() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    fx.gpu.resize_drawing_buffer(UVec2::new(16, 9));
    fx.execute(&mut stage, true).unwrap();

    let output = stage.composite().ao_texture.unwrap();
    assert_eq!(fx.gpu.texture_size(output), Some(UVec2::new(16, 9)));

    let resources = stage.viewport().resources().unwrap();
    assert_eq!(resources.size, UVec2::new(16, 9));
    for texture in resources.composer.intermediate_textures() {
        assert_eq!(fx.gpu.texture_size(texture), Some(UVec2::new(16, 9)));
    }
}

#[test]
fn resize_without_dirty_keeps_old_size() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    fx.gpu.resize_drawing_buffer(UVec2::new(16, 9));
    fx.execute(&mut stage, false).unwrap();

    let output = stage.composite().ao_texture.unwrap();
    assert_eq!(fx.gpu.texture_size(output), Some(UVec2::new(8, 6)));
}

// ============================================================================
// Failure Propagation
// ============================================================================

#[test]
fn zero_viewport_propagates_backend_error() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.gpu.resize_drawing_buffer(UVec2::ZERO);

    let result = fx.execute(&mut stage, true);

    assert!(matches!(
        result,
        Err(UmbraError::InvalidTextureSize { width: 0, height: 0, .. })
    ));
    assert!(fx.gpu.draws().next().is_none());
}

#[test]
fn failed_rebuild_leaves_no_partial_resources() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.gpu.fail_allocations_labeled("Intermediate 1");

    let result = fx.execute(&mut stage, true);

    assert!(matches!(result, Err(UmbraError::AllocationFailed { .. })));
    assert!(!stage.viewport().is_allocated());
    assert!(stage.composite().ao_texture.is_none());
    // inputs + noise
    assert_eq!(fx.gpu.texture_count(), 3);
    assert_eq!(fx.gpu.framebuffer_count(), 0);

    fx.gpu.allow_all_allocations();
    fx.execute(&mut stage, false).unwrap();
    assert!(stage.viewport().is_allocated());
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn destroy_releases_everything_and_is_idempotent() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    stage.destroy(&mut fx.gpu);
    let events_after_first = fx.gpu.events().len();
    stage.destroy(&mut fx.gpu);

    assert!(stage.is_destroyed());
    assert_eq!(fx.gpu.events().len(), events_after_first);
    assert_eq!(fx.gpu.texture_count(), 2);
    assert_eq!(fx.gpu.framebuffer_count(), 0);
    assert!(stage.random_texture().is_none());
    assert!(stage.composite().ao_texture.is_none());
}

#[test]
fn destroy_before_first_execute() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    stage.destroy(&mut fx.gpu);
    stage.destroy(&mut fx.gpu);

    assert!(stage.is_destroyed());
    assert!(fx.gpu.events().is_empty());
}

#[test]
fn execute_after_destroy_is_rejected() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    stage.destroy(&mut fx.gpu);

    let result = fx.execute(&mut stage, true);

    assert!(matches!(result, Err(UmbraError::StageDestroyed(_))));
    assert!(fx.gpu.events().is_empty());
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn parameter_edits_apply_without_rebuild() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();
    fx.gpu.clear_events();

    stage.generate_mut().set_intensity(8.0);
    stage.blur_x_mut().sigma = 3.5;
    stage.blur_y_mut().kernel_size = 2.0;
    fx.execute(&mut stage, false).unwrap();

    let draws: Vec<_> = fx.gpu.draws().collect();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].uniforms.scalar("intensity"), Some(8.0));
    assert_eq!(draws[1].uniforms.scalar("sigma"), Some(3.5));
    assert_eq!(draws[2].uniforms.scalar("kernelSize"), Some(2.0));
    assert!(
        !fx.gpu
            .events()
            .iter()
            .any(|e| matches!(e, GpuEvent::CreateTexture { .. }))
    );
}

#[test]
fn composite_uniforms_publish_output() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();
    fx.execute(&mut stage, true).unwrap();

    let output = stage.viewport().resources().unwrap().output_texture;
    let values = stage.uniform_values();

    assert_eq!(values.texture("aoTexture"), Some(output));
    assert_eq!(values.scalar("aoOnly"), Some(0.0));

    stage.set_ao_only(true);
    assert_eq!(stage.uniform_values().scalar("aoOnly"), Some(1.0));
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn single_dirty_execute_runs_three_passes_in_order() {
    let mut fx = fixture(8, 6);
    let mut stage = shown_stage();

    fx.execute(&mut stage, true).unwrap();

    assert_eq!(fx.gpu.created_textures_labeled(NOISE_LABEL), 1);
    assert_eq!(fx.gpu.created_textures_labeled(OUTPUT_LABEL), 1);
    assert_eq!(fx.gpu.created_framebuffers_labeled(FRAMEBUFFER_LABEL), 1);

    let output = stage.composite().ao_texture.unwrap();
    assert_eq!(fx.gpu.texture_size(output), Some(UVec2::new(8, 6)));
    let framebuffer = stage.viewport().resources().unwrap().framebuffer;

    let draws: Vec<_> = fx.gpu.draws().collect();
    let labels: Vec<_> = draws.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "Ambient Occlusion Generate",
            "Ambient Occlusion Blur X",
            "Ambient Occlusion Blur Y"
        ]
    );

    assert_eq!(draws[0].shader, AMBIENT_OCCLUSION_GENERATE);
    assert_eq!(draws[1].shader, GAUSSIAN_BLUR_1D_AO);
    assert_eq!(draws[2].shader, GAUSSIAN_BLUR_1D_AO);
    assert_eq!(draws[1].uniforms.scalar("direction"), Some(0.0));
    assert_eq!(draws[2].uniforms.scalar("direction"), Some(1.0));

    // chaining
    assert_eq!(draws[0].color_texture, fx.color);
    assert_eq!(draws[1].color_texture, draws[0].target_texture);
    assert_eq!(draws[2].color_texture, draws[1].target_texture);
    assert!(draws.iter().all(|d| d.depth_texture == fx.depth));
    assert!(draws.iter().all(|d| !d.blend));

    // final image lands in the managed framebuffer
    assert_eq!(draws[2].target, framebuffer);
    assert_eq!(fx.gpu.last_writer(output), Some("Ambient Occlusion Blur Y"));
    assert_eq!(fx.gpu.last_writer(fx.color), None);

    assert_eq!(
        draws[0].uniforms.texture("randomTexture"),
        stage.random_texture()
    );
    assert_eq!(draws[0].uniforms.scalar("frustumLength"), Some(1000.0));
}
