//! Offscreen Scene Tests
//!
//! Tests for:
//! - Scene targets and frame bookkeeping
//! - Stage execution and composite draws during `render`
//! - Dirty propagation on the first frame and after resize
//! - Input loading and readback
//! - Scene teardown
//! - GPU end-to-end rendering (ignored by default, needs an adapter)

use glam::UVec2;

use umbra::errors::UmbraError;
use umbra::renderer::core::GpuBackend;
use umbra::renderer::graph::AmbientOcclusionStage;
use umbra::renderer::pipeline::AMBIENT_OCCLUSION;
use umbra::resources::AmbientOcclusionSettings;
use umbra::testing::{OffscreenScene, RecordingBackend, SceneOptions, create_scene};

fn scene(width: u32, height: u32) -> OffscreenScene<RecordingBackend> {
    let _ = env_logger::builder().is_test(true).try_init();
    OffscreenScene::new(RecordingBackend::new(width, height)).unwrap()
}

fn shown_ao() -> Box<AmbientOcclusionStage> {
    let mut stage = AmbientOcclusionStage::with_seed(11);
    stage.show = true;
    Box::new(stage)
}

// ============================================================================
// Targets & Frames
// ============================================================================

#[test]
fn scene_creates_inputs_at_buffer_size() {
    let scene = scene(4, 3);

    let color = scene.color_texture().unwrap();
    let depth = scene.depth_texture().unwrap();
    assert_eq!(scene.gpu().texture_size(color), Some(UVec2::new(4, 3)));
    assert_eq!(scene.gpu().texture_size(depth), Some(UVec2::new(4, 3)));
    assert_eq!(scene.frame_number(), 0);
    assert_eq!(scene.stage_count(), 0);
}

#[test]
fn empty_scene_reads_back_color() {
    let mut scene = scene(4, 3);

    let pixels = scene.render_for_specs().unwrap();

    assert_eq!(pixels.len(), 4 * 3 * 4);
    assert_eq!(scene.frame_number(), 1);
    assert_eq!(scene.output_texture(), scene.color_texture());
}

#[test]
fn loaded_inputs_pass_through_without_stages() {
    let mut scene = scene(2, 1);
    let rgba = [10, 20, 30, 255, 40, 50, 60, 255];

    scene.load_inputs(&rgba, &[0.5, 1.0]).unwrap();
    let pixels = scene.render_for_specs().unwrap();

    assert_eq!(pixels, rgba);
}

#[test]
fn wrong_input_length_is_rejected() {
    let mut scene = scene(2, 2);

    let result = scene.load_inputs(&[0; 4], &[1.0; 4]);

    assert!(matches!(
        result,
        Err(UmbraError::InvalidTextureData {
            expected: 16,
            actual: 4,
            ..
        })
    ));
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn hidden_stage_is_not_drawn() {
    let mut scene = scene(4, 3);
    scene.add_stage(Box::new(AmbientOcclusionStage::with_seed(1)));

    scene.initialize_frame();
    scene.render().unwrap();

    assert_eq!(scene.gpu().draws().count(), 0);
    assert_eq!(scene.output_texture(), scene.color_texture());
}

#[test]
fn shown_stage_runs_then_composites() {
    let mut scene = scene(4, 3);
    let index = scene.add_stage(shown_ao());
    let color = scene.color_texture().unwrap();

    scene.initialize_frame();
    scene.render().unwrap();

    let draws: Vec<_> = scene.gpu().draws().collect();
    assert_eq!(draws.len(), 4);
    assert_eq!(draws[0].color_texture, color);

    let composite = &draws[3];
    assert_eq!(composite.label, "Ambient Occlusion");
    assert_eq!(composite.shader, AMBIENT_OCCLUSION);
    assert_eq!(composite.color_texture, color);
    let ao_texture = scene.stage(index).uniform_values().texture("aoTexture");
    assert_eq!(composite.uniforms.texture("aoTexture"), ao_texture);
    assert_eq!(ao_texture, Some(draws[2].target_texture));

    assert_eq!(scene.output_texture(), Some(composite.target_texture));
    assert_ne!(scene.output_texture(), Some(color));
}

#[test]
fn stage_can_be_toggled_through_the_scene() {
    let mut scene = scene(4, 3);
    let index = scene.add_stage(Box::new(AmbientOcclusionStage::with_seed(1)));

    scene.stage_mut(index).set_show(true);
    scene.render_for_specs().unwrap();
    assert_eq!(scene.gpu().draws().count(), 4);

    scene.stage_mut(index).set_show(false);
    scene.gpu_mut().clear_events();
    scene.render_for_specs().unwrap();
    assert_eq!(scene.gpu().draws().count(), 0);
}

#[test]
fn only_first_frame_and_resize_rebuild() {
    let mut scene = scene(4, 3);
    scene.add_stage(shown_ao());

    for _ in 0..3 {
        scene.render_for_specs().unwrap();
    }
    assert_eq!(
        scene
            .gpu()
            .created_textures_labeled("Ambient Occlusion Output"),
        1
    );

    scene.resize(6, 5).unwrap();
    let pixels = scene.render_for_specs().unwrap();
    scene.render_for_specs().unwrap();

    assert_eq!(pixels.len(), 6 * 5 * 4);
    assert_eq!(
        scene
            .gpu()
            .created_textures_labeled("Ambient Occlusion Output"),
        2
    );
    let ao_texture = scene.stage(0).uniform_values().texture("aoTexture").unwrap();
    assert_eq!(scene.gpu().texture_size(ao_texture), Some(UVec2::new(6, 5)));
}

#[test]
fn stacked_stages_ping_pong_between_canvases() {
    let mut scene = scene(4, 3);
    scene.add_stage(shown_ao());
    scene.add_stage(shown_ao());

    scene.render_for_specs().unwrap();

    let composites: Vec<_> = scene
        .gpu()
        .draws()
        .filter(|d| d.shader == AMBIENT_OCCLUSION)
        .collect();
    assert_eq!(composites.len(), 2);
    assert_eq!(composites[1].color_texture, composites[0].target_texture);
    assert_ne!(composites[1].target, composites[0].target);
    assert_eq!(scene.output_texture(), Some(composites[1].target_texture));
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn destroy_releases_all_gpu_objects() {
    let mut scene = scene(4, 3);
    scene.add_stage(shown_ao());
    scene.render_for_specs().unwrap();

    scene.destroy();
    let events = scene.gpu().events().len();
    scene.destroy();

    assert!(scene.stage(0).is_destroyed());
    assert_eq!(scene.gpu().events().len(), events);
    assert_eq!(scene.gpu().texture_count(), 0);
    assert_eq!(scene.gpu().framebuffer_count(), 0);
    assert!(scene.color_texture().is_none());
}

// ============================================================================
// GPU End-to-End
// ============================================================================

#[test]
#[ignore = "requires a GPU adapter"]
fn background_pixels_are_not_occluded() -> anyhow::Result<()> {
    let mut scene = create_scene(&SceneOptions {
        width: 4,
        height: 4,
        ..Default::default()
    })?;
    let texel = [200u8, 100, 50, 255];
    let rgba: Vec<u8> = texel.iter().copied().cycle().take(4 * 4 * 4).collect();
    scene.load_inputs(&rgba, &[1.0; 16])?;
    scene.add_stage(shown_ao());

    let pixels = scene.render_for_specs()?;

    assert_eq!(pixels.len(), rgba.len());
    for (got, want) in pixels.iter().zip(&rgba) {
        assert!(got.abs_diff(*want) <= 1, "{got} vs {want}");
    }
    scene.destroy();
    Ok(())
}

#[test]
#[ignore = "requires a GPU adapter"]
fn ao_only_outputs_occlusion_term() -> anyhow::Result<()> {
    let mut scene = create_scene(&SceneOptions {
        width: 4,
        height: 4,
        ..Default::default()
    })?;
    scene.load_inputs(&[30; 64], &[1.0; 16])?;
    let settings = AmbientOcclusionSettings {
        show: true,
        ao_only: true,
        ..Default::default()
    };
    scene.add_stage(Box::new(AmbientOcclusionStage::from_settings(&settings)));

    let pixels = scene.render_for_specs()?;

    assert!(pixels.iter().all(|&p| p >= 254));
    Ok(())
}
