// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::{Harness, HEIGHT, WIDTH};
use sable_core::math::{LinearRgba, Mat4, Vec3};
use sable_core::renderer::{ClearFlags, GpuDevice, RenderState, ShaderDefines, ViewRect};
use sable_core::scene::PointLightInfo;
use sable_core::testing::{fixtures, DeviceCall};
use sable_pipeline::{FrameContext, Pipeline, PipelineError};
use std::cell::Cell;
use std::rc::Rc;

fn one_mesh(h: &mut Harness, passes: &[&str]) {
    let material = h.add_material("mesh.mat", passes);
    let model = fixtures::model(1, &material, 1);
    h.scene
        .add_renderable(fixtures::renderable(1, &model, 0, Vec3::new(0.0, 0.0, -5.0)));
}

#[test]
fn test_same_pass_twice_draws_into_one_view() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.load(
        r#"(frame: [
            SetPass("MAIN"), ApplyCamera("main"), RenderModels(layer_mask: 1),
            SetPass("DEBUG"),
            SetPass("MAIN"), RenderModels(layer_mask: 1),
        ])"#,
    );
    h.render();

    let subs = h.device.submissions();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].view, subs[1].view);
    assert_eq!(h.pipeline.allocated_views().len(), 2);
    assert_eq!(subs[0].program, Some(fixtures::program_for(0, ShaderDefines::NONE)));
}

#[test]
fn test_apply_camera_sets_view_and_camera_uniform() {
    let mut h = Harness::new();
    h.load(r#"(frame: [SetPass("MAIN"), ApplyCamera("main")])"#);
    h.render();

    let view = h.pipeline.allocated_views()[0];
    assert_eq!(
        h.device.view_rect(view),
        Some(ViewRect::new(0, 0, WIDTH as u16, HEIGHT as u16))
    );
    let camera = h.pipeline.applied_camera().expect("camera applied");
    assert_eq!(camera.params.width, WIDTH as f32);
    assert_eq!(camera.params.height, HEIGHT as f32);
    assert_eq!(h.device.uniform_vec4("u_cameraPos").unwrap()[0].w, 1.0);
    assert!(h.device.calls().iter().any(|c| matches!(
        c,
        DeviceCall::SetViewTransform { view: v, view_matrix, .. } if *v == view && *view_matrix == Mat4::IDENTITY
    )));
}

#[test]
fn test_missing_camera_skips_models_but_frame_completes() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.load(
        r#"(frame: [
            SetPass("MAIN"), ApplyCamera("nobody"),
            RenderModels(layer_mask: 1),
            Clear(buffers: Depth),
        ])"#,
    );
    h.render();

    assert!(h.device.submissions().is_empty());
    assert!(h.pipeline.applied_camera().is_none());
    let view = h.pipeline.allocated_views()[0];
    assert!(h.device.calls().contains(&DeviceCall::SetViewClear {
        view,
        flags: ClearFlags::DEPTH,
        color: LinearRgba::from_rgba_u32(0x0000_00ff),
        depth: 1.0,
    }));
    assert!(h.device.calls().contains(&DeviceCall::Touch(view)));
}

#[test]
fn test_render_state_starts_fresh_every_frame() {
    let mut h = Harness::new();
    let material = h.add_material("mesh.mat", &["MAIN"]);
    let model = fixtures::model(1, &material, 1);
    h.scene
        .add_renderable(fixtures::renderable(1, &model, 0, Vec3::new(0.0, 0.0, -5.0)));
    h.load(
        r#"(frame: [
            SetPass("MAIN"), ApplyCamera("main"), RenderModels(layer_mask: 1),
            EnableBlending(Add), DisableDepthWrite,
        ])"#,
    );

    let expected = RenderState::FRAME_DEFAULT | material.render_states;
    for _ in 0..2 {
        h.render();
        assert_eq!(h.device.submissions()[0].state, Some(expected));
        assert!(h.pipeline.render_state().contains(RenderState::BLEND_ADD));
        assert!(!h.pipeline.render_state().contains(RenderState::WRITE_Z));
    }
}

#[test]
fn test_blending_replaces_previous_equation() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.load(
        r#"(frame: [
            SetPass("MAIN"), ApplyCamera("main"),
            EnableBlending(Add), EnableBlending(Alpha), DisableRgbWrite,
            RenderModels(layer_mask: 1),
        ])"#,
    );
    h.render();

    let state = h.device.submissions()[0].state.unwrap();
    assert!(state.contains(RenderState::BLEND_ALPHA));
    assert!(!state.contains(RenderState::BLEND_ADD));
    assert!(!state.contains(RenderState::WRITE_RGB));
    assert!(state.contains(RenderState::WRITE_Z));
}

#[test]
fn test_view_counter_is_shared_between_pipelines() {
    let mut h = Harness::new();
    h.load(r#"(frame: [SetPass("MAIN"), Clear(buffers: All)])"#);
    let mut preview = Pipeline::new(256, 256);
    preview
        .load_ron(
            &mut h.device,
            &mut h.library,
            r#"(frame: [SetPass("MAIN"), Clear(buffers: All)])"#,
        )
        .unwrap();

    h.render();
    preview.render(&mut h.ctx, &mut h.device, &h.scene);
    let game_view = h.pipeline.allocated_views()[0];
    let preview_view = preview.allocated_views()[0];
    assert_ne!(game_view, preview_view);

    h.render();
    assert_ne!(h.pipeline.allocated_views()[0], game_view);
}

#[test]
fn test_view_ids_wrap_at_device_limit() {
    let mut h = Harness::new();
    h.device = sable_core::testing::RecordingDevice::with_max_views(2);
    h.ctx = FrameContext::new();
    h.load(r#"(frame: [SetPass("A"), SetPass("B"), SetPass("C")])"#);
    h.render();
    assert_eq!(h.pipeline.allocated_views(), &[0, 1, 0]);
}

#[test]
fn test_draw_quad_without_camera() {
    let mut h = Harness::new();
    h.add_material("pipelines/screen.mat", &["MAIN"]);
    h.load(
        r#"(
            materials: [(name: "screen", path: "pipelines/screen.mat")],
            frame: [SetPass("MAIN"), DrawQuad(x: -1.0, y: -1.0, w: 2.0, h: 2.0, material: "screen")],
        )"#,
    );
    h.render();

    let subs = h.device.submissions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].program, Some(fixtures::program_for(0, ShaderDefines::NONE)));
    assert_eq!(subs[0].transient_vertices.map(|v| v.count), Some(4));
    assert_eq!(subs[0].transient_indices.map(|i| i.count), Some(6));
    assert_eq!(subs[0].transform, Some(Mat4::IDENTITY));
    assert!(h.device.uniform_mat4("u_camInvProj").is_none());
    let ortho = Mat4::orthographic_rh_zo(-1.0, 1.0, 1.0, -1.0, 0.0, 30.0);
    assert!(h.device.calls().iter().any(|c| matches!(
        c,
        DeviceCall::SetViewTransform { view_matrix, projection, .. }
            if *view_matrix == Mat4::IDENTITY && *projection == ortho
    )));
}

#[test]
fn test_draw_quad_after_camera_uploads_camera_matrices() {
    let mut h = Harness::new();
    h.add_material("pipelines/screen.mat", &["MAIN"]);
    h.load(
        r#"(
            materials: [(name: "screen", path: "pipelines/screen.mat")],
            frame: [
                SetPass("MAIN"), ApplyCamera("main"),
                DrawQuad(x: -1.0, y: -1.0, w: 2.0, h: 2.0, material: "screen"),
            ],
        )"#,
    );
    h.render();

    let camera = *h.pipeline.applied_camera().unwrap();
    assert_eq!(h.device.uniform_mat4("u_camView"), Some(&[camera.view][..]));
    assert!(h.device.uniform_mat4("u_camInvProj").is_some());
}

#[test]
fn test_missing_quad_material_uses_debug_material() {
    let mut h = Harness::new();
    h.add_material("debug.mat", &["OTHER", "MAIN"]);
    h.load(
        r#"(
            materials: [
                (name: "screen", path: "pipelines/missing.mat"),
                (name: "debug", path: "debug.mat"),
            ],
            debug_material: Some("debug"),
            frame: [SetPass("MAIN"), DrawQuad(x: -1.0, y: -1.0, w: 2.0, h: 2.0, material: "screen")],
        )"#,
    );
    h.render();

    assert_eq!(h.programs(), vec![fixtures::program_for(1, ShaderDefines::NONE)]);
}

#[test]
fn test_bound_framebuffer_texture_follows_material_textures() {
    let mut h = Harness::new();
    h.add_material("pipelines/screen.mat", &["MAIN"]);
    h.load(
        r#"(
            framebuffers: [(name: "gbuffer", width: 320, height: 200,
                            attachments: [(format: Rgba8), (format: Depth24, depth: true)])],
            materials: [(name: "screen", path: "pipelines/screen.mat")],
            uniforms: ["u_texDepth"],
            frame: [
                SetPass("MAIN"),
                BindFramebufferTexture(framebuffer: "gbuffer", attachment: 1, uniform: "u_texDepth"),
                DrawQuad(x: -1.0, y: -1.0, w: 2.0, h: 2.0, material: "screen"),
            ],
        )"#,
    );
    h.render();

    let fb = h.pipeline.framebuffer("gbuffer").unwrap().handle;
    let depth = h.device.framebuffer_texture(fb, 1).unwrap();
    let sampler = h.device.uniform("u_texDepth").unwrap();
    assert_eq!(h.device.submissions()[0].textures, vec![(0, sampler, depth)]);
    let size = h.device.uniform_vec4("u_textureSize").unwrap()[0];
    assert_eq!((size.x, size.y), (320.0, 200.0));
}

#[test]
fn test_custom_command_runs_on_current_view() {
    let mut h = Harness::new();
    h.load(
        r#"(frame: [SetPass("MAIN"), ExecuteCustomCommand("gizmos"), ExecuteCustomCommand("unknown")])"#,
    );
    let seen = Rc::new(Cell::new(None));
    let captured = Rc::clone(&seen);
    h.pipeline.register_command("gizmos", move |ctx| {
        captured.set(Some(ctx.view));
        ctx.device.touch(ctx.view);
    });
    h.render();

    let view = h.pipeline.allocated_views()[0];
    assert_eq!(seen.get(), Some(view));
    assert!(h.device.calls().contains(&DeviceCall::Touch(view)));
}

#[test]
fn test_debug_texts_print_one_row_each() {
    let mut h = Harness::new();
    h.scene.debug_texts = vec!["fps: 60".into(), "draws: 3".into()];
    h.load(r#"(frame: [RenderDebugTexts])"#);
    h.render();

    assert_eq!(
        h.device.calls(),
        &[
            DeviceCall::DebugTextClear,
            DeviceCall::DebugTextPrint {
                x: 0,
                y: 0,
                text: "fps: 60".into()
            },
            DeviceCall::DebugTextPrint {
                x: 0,
                y: 1,
                text: "draws: 3".into()
            },
        ]
    );
}

#[test]
fn test_debug_shapes_use_line_and_point_topology() {
    let mut h = Harness::new();
    h.add_material("debug.mat", &["MAIN"]);
    h.scene.debug_lines.push(sable_core::scene::DebugLine {
        from: Vec3::ZERO,
        to: Vec3::X,
        color: LinearRgba::WHITE,
    });
    h.scene.debug_points.push(sable_core::scene::DebugPoint {
        pos: Vec3::Y,
        color: LinearRgba::MAGENTA,
    });
    h.load(
        r#"(
            materials: [(name: "debug", path: "debug.mat")],
            debug_material: Some("debug"),
            frame: [SetPass("MAIN"), ApplyCamera("main"), RenderDebugShapes],
        )"#,
    );
    h.render();

    let subs = h.device.submissions();
    assert_eq!(subs.len(), 2);
    assert!(subs[0].state.unwrap().contains(RenderState::PT_LINES));
    assert_eq!(subs[0].transient_vertices.map(|v| v.count), Some(2));
    assert!(subs[1].state.unwrap().contains(RenderState::PT_POINTS));
}

#[test]
fn test_point_light_models_draw_once_per_visible_light() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    for x in [-1.0, 1.0] {
        h.scene.add_light(PointLightInfo {
            matrix: Mat4::from_translation(Vec3::new(x, 0.0, -5.0)),
            ..Default::default()
        });
    }
    h.scene.add_light(PointLightInfo {
        matrix: Mat4::from_translation(Vec3::new(0.0, 0.0, 500.0)),
        ..Default::default()
    });
    h.load(
        r#"(frame: [
            SetPass("MAIN"), ApplyCamera("main"),
            EnableBlending(Add),
            RenderModels(layer_mask: 1, point_lights: true),
        ])"#,
    );
    h.render();

    let point = fixtures::program_for(0, ShaderDefines::POINT_LIGHT);
    assert_eq!(h.programs(), vec![point, point]);
    let position = h.device.uniform_vec4("u_lightPosRadius").unwrap()[0];
    assert_eq!((position.x, position.w), (1.0, 10.0));
    assert_eq!(h.scene.influence_queries.borrow().len(), 2);
}

#[test]
fn test_global_light_uniforms_uploaded_for_models() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.scene.global_light = Some(common::sun());
    h.load(r#"(frame: [SetPass("MAIN"), ApplyCamera("main"), RenderModels(layer_mask: 1)])"#);
    h.render();

    assert!(h.device.uniform_vec4("u_lightDirFov").is_some());
    assert!(h.device.uniform_vec4("u_fogColorDensity").is_some());
    assert!(h.device.uniform_mat4("u_shadowmapMatrices").is_none());
    assert_eq!(h.programs(), vec![fixtures::program_for(0, ShaderDefines::NONE)]);
}

#[test]
fn test_failed_load_keeps_running_definition() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.load(r#"(frame: [SetPass("MAIN"), ApplyCamera("main"), RenderModels(layer_mask: 1)])"#);

    let err = h
        .pipeline
        .load_ron(
            &mut h.device,
            &mut h.library,
            r#"(frame: [DrawQuad(x: 0.0, y: 0.0, w: 1.0, h: 1.0, material: "nope")])"#,
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownMaterial(_)));

    h.device.fail_framebuffers = true;
    let err = h
        .pipeline
        .load_ron(
            &mut h.device,
            &mut h.library,
            r#"(framebuffers: [(name: "hdr", width: 64, height: 64, attachments: [(format: Rgba16F)])])"#,
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::Resource(_)));
    assert_eq!(h.device.live_framebuffer_count(), 0);

    h.render();
    assert_eq!(h.device.submissions().len(), 1);
}

#[test]
fn test_resize_recreates_size_following_framebuffers() {
    let mut h = Harness::new();
    h.load(
        r#"(framebuffers: [
            (name: "hdr", width: 1, height: 1, attachments: [(format: Rgba16F)], default: true),
            (name: "shadowmap", width: 1024, height: 1024, attachments: [(format: Depth24, depth: true)]),
        ])"#,
    );
    let hdr = h.pipeline.framebuffer("hdr").unwrap().handle;
    assert_eq!(h.device.framebuffer_size(hdr), Some((WIDTH, HEIGHT)));
    let shadow = h.pipeline.framebuffer("shadowmap").unwrap().handle;

    h.pipeline.resize(&mut h.device, 1024, 768);
    let resized = h.pipeline.framebuffer("hdr").unwrap().handle;
    assert_ne!(resized, hdr);
    assert_eq!(h.device.framebuffer_size(resized), Some((1024, 768)));
    assert_eq!(h.pipeline.framebuffer("shadowmap").unwrap().handle, shadow);
    assert!(h.device.calls().contains(&DeviceCall::Reset {
        width: 1024,
        height: 768
    }));
}

#[test]
fn test_failed_resize_keeps_a_live_framebuffer() {
    let mut h = Harness::new();
    h.load(
        r#"(framebuffers: [
            (name: "hdr", width: 1, height: 1, attachments: [(format: Rgba16F)], default: true),
        ])"#,
    );
    let hdr = h.pipeline.framebuffer("hdr").unwrap().handle;

    h.device.fail_framebuffers = true;
    h.pipeline.resize(&mut h.device, 1024, 768);
    assert_eq!(h.pipeline.framebuffer("hdr").unwrap().handle, hdr);
    assert_eq!(h.device.framebuffer_size(hdr), Some((WIDTH, HEIGHT)));

    h.pipeline.unload(&mut h.device);
    assert_eq!(h.device.live_framebuffer_count(), 0);
    assert_eq!(
        h.device
            .calls()
            .iter()
            .filter(|c| **c == DeviceCall::DestroyFramebuffer(hdr))
            .count(),
        1
    );
}

#[test]
fn test_unload_releases_device_resources() {
    let mut h = Harness::new();
    h.load(
        r#"(
            framebuffers: [(name: "hdr", width: 64, height: 64, attachments: [(format: Rgba16F)])],
            uniforms: ["u_texHdr"],
        )"#,
    );
    assert_eq!(h.device.live_framebuffer_count(), 1);
    h.pipeline.unload(&mut h.device);
    assert!(!h.pipeline.is_loaded());
    assert_eq!(h.device.live_framebuffer_count(), 0);
    assert!(h.device.uniform("u_texHdr").is_none());
    assert!(h.device.uniform("u_lightPosRadius").is_none());

    h.render();
    assert!(h.device.calls().is_empty());
}

#[test]
fn test_wireframe_toggle_reaches_device() {
    let mut h = Harness::new();
    h.pipeline.set_wireframe(&mut h.device, true);
    assert!(h.pipeline.wireframe());
    assert!(h.device.calls().contains(&DeviceCall::SetDebugWireframe(true)));
}

#[test]
fn test_stats_count_last_frame_only() {
    let mut h = Harness::new();
    one_mesh(&mut h, &["MAIN"]);
    h.load(r#"(frame: [SetPass("MAIN"), ApplyCamera("main"), RenderModels(layer_mask: 1)])"#);
    h.render();
    h.render();
    let stats = h.pipeline.stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.instances, 1);
    assert_eq!(stats.triangles, 12);
}
