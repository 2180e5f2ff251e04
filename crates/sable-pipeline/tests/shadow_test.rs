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

use common::{sun, Harness};
use sable_core::math::{Mat4, Vec3};
use sable_core::renderer::{GpuDevice, ShaderDefines};
use sable_core::scene::{GrassInfo, PointLightInfo};
use sable_core::testing::fixtures;
use sable_pipeline::shadow::quadrant_rect;
use std::f32::consts::FRAC_PI_3;

const CASCADES: &str = r#"(
    framebuffers: [(name: "shadowmap", width: 1024, height: 1024,
                    attachments: [(format: Depth24, depth: true)])],
    frame: [
        SetPass("SHADOW"), SetFramebuffer("shadowmap"), RenderShadowmap(camera: "main"),
        SetPass("MAIN"), UnbindFramebuffer, ApplyCamera("main"), RenderModels(layer_mask: 1),
    ],
)"#;

fn lit_scene(h: &mut Harness) {
    let material = h.add_material("rock.mat", &["SHADOW", "MAIN"]);
    let rock = fixtures::model(1, &material, 1);
    h.scene
        .add_renderable(fixtures::renderable(1, &rock, 0, Vec3::new(0.0, 0.0, -5.0)));
    h.scene.global_light = Some(sun());
}

#[test]
fn test_cascades_render_into_four_quadrants() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    h.scene.bounding_radius = 1000.0;
    h.load(CASCADES);
    h.render();

    let shadows = h.pipeline.directional_shadows();
    assert_eq!(shadows.matrices.len(), 4);
    assert_eq!(shadows.ranges.len(), 4);
    assert_eq!(shadows.ranges[0], (0.01, 5.0));
    assert_eq!(shadows.splits, sun().cascades);

    let shadowmap = h.pipeline.framebuffer("shadowmap").unwrap().handle;
    assert_eq!(shadows.framebuffer, Some(shadowmap));
    let depth = h.device.framebuffer_texture(shadowmap, 0);
    assert_eq!(shadows.texture, depth);

    let caster = fixtures::program_for(0, ShaderDefines::NONE);
    let casters: Vec<_> = h
        .device
        .submissions()
        .iter()
        .filter(|s| s.program == Some(caster))
        .collect();
    assert_eq!(casters.len(), 4);
    let mut views: Vec<_> = casters.iter().map(|s| s.view).collect();
    views.dedup();
    assert_eq!(views.len(), 4);
    for (index, view) in views.iter().enumerate() {
        assert_eq!(h.device.view_framebuffer(*view), Some(Some(shadowmap)));
        assert_eq!(h.device.view_rect(*view), Some(quadrant_rect(index, 1024, 1024)));
    }
}

#[test]
fn test_lit_pass_samples_cascades() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    h.scene.bounding_radius = 1000.0;
    h.load(CASCADES);
    h.render();

    let main_view = *h.pipeline.allocated_views().last().unwrap();
    assert_eq!(h.device.view_framebuffer(main_view), Some(None));
    let lit = h.device.submissions_to(main_view);
    assert_eq!(lit.len(), 1);
    assert_eq!(
        lit[0].program,
        Some(fixtures::program_for(1, ShaderDefines::HAS_SHADOWMAP))
    );

    let shadowmap = h.pipeline.framebuffer("shadowmap").unwrap().handle;
    let depth = h.device.framebuffer_texture(shadowmap, 0).unwrap();
    let sampler = h.device.uniform("u_texShadowmap").unwrap();
    assert_eq!(lit[0].textures, vec![(0, sampler, depth)]);

    let uploaded = h.device.uniform_mat4("u_shadowmapMatrices").unwrap();
    assert_eq!(uploaded, &h.pipeline.directional_shadows().matrices[..]);
    assert_eq!(
        h.device.uniform_vec4("u_shadowmapSplits").unwrap()[0],
        sun().cascades
    );
}

#[test]
fn test_zero_height_skips_cascades() {
    let mut h = Harness::with_size(800, 0);
    lit_scene(&mut h);
    h.load(CASCADES);
    h.render();

    assert!(h.pipeline.directional_shadows().matrices.is_empty());
    assert!(!h.pipeline.directional_shadows().is_available());
    assert!(h.device.submissions().is_empty());
}

#[test]
fn test_cascades_need_a_bound_framebuffer() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    h.load(r#"(frame: [SetPass("SHADOW"), RenderShadowmap(camera: "main")])"#);
    h.render();

    assert!(h.pipeline.directional_shadows().matrices.is_empty());
    assert!(h.device.submissions().is_empty());
}

#[test]
fn test_cascades_without_global_light_are_skipped() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    h.scene.global_light = None;
    h.load(CASCADES);
    h.render();

    assert!(!h.pipeline.directional_shadows().is_available());
    assert_eq!(
        h.programs(),
        vec![fixtures::program_for(1, ShaderDefines::NONE)]
    );
}

#[test]
fn test_shadow_state_does_not_leak_into_next_frame() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    h.scene.bounding_radius = 1000.0;
    h.load(CASCADES);
    h.render();
    assert!(h.pipeline.directional_shadows().is_available());

    h.scene.global_light = None;
    h.render();
    assert!(!h.pipeline.directional_shadows().is_available());
    assert!(h
        .device
        .submissions()
        .iter()
        .all(|s| s.textures.is_empty()));
}

#[test]
fn test_shadow_pass_skips_grass() {
    let mut h = Harness::new();
    lit_scene(&mut h);
    let material = h.add_material("grass.mat", &["SHADOW", "MAIN"]);
    h.scene.grass.push(GrassInfo {
        model: fixtures::model(9, &material, 1),
        matrices: vec![Mat4::IDENTITY; 3].into(),
    });
    h.load(
        r#"(
            framebuffers: [(name: "shadowmap", width: 1024, height: 1024,
                            attachments: [(format: Depth24, depth: true)])],
            frame: [SetPass("SHADOW"), SetFramebuffer("shadowmap"), RenderShadowmap(camera: "main")],
        )"#,
    );
    h.render();

    assert_eq!(h.scene.grass_queries.get(), 0);
    assert_eq!(h.pipeline.directional_shadows().matrices.len(), 4);
}

const LOCAL: &str = r#"(
    framebuffers: [
        (name: "local0", width: 512, height: 512, attachments: [(format: Depth24, depth: true)]),
        (name: "local1", width: 512, height: 512, attachments: [(format: Depth24, depth: true)]),
    ],
    frame: [
        SetPass("SHADOW"),
        RenderLocalLightsShadowmaps(framebuffers: ["local0", "local1"], camera: "main"),
        SetPass("MAIN"), ApplyCamera("main"), EnableBlending(Add),
        RenderModels(layer_mask: 1, point_lights: true),
    ],
)"#;

fn local_lights(h: &mut Harness) {
    let material = h.add_material("rock.mat", &["SHADOW", "MAIN"]);
    let rock = fixtures::model(1, &material, 1);
    h.scene
        .add_renderable(fixtures::renderable(1, &rock, 0, Vec3::new(0.0, 0.0, -5.0)));
    h.scene.add_light(PointLightInfo {
        matrix: Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        cast_shadows: true,
        ..Default::default()
    });
    h.scene.add_light(PointLightInfo {
        matrix: Mat4::from_translation(Vec3::new(3.0, 0.0, -5.0)),
        fov: FRAC_PI_3,
        cast_shadows: true,
        ..Default::default()
    });
    h.scene.add_light(PointLightInfo {
        matrix: Mat4::from_translation(Vec3::new(-3.0, 0.0, -5.0)),
        ..Default::default()
    });
}

#[test]
fn test_local_lights_fill_their_framebuffers() {
    let mut h = Harness::new();
    local_lights(&mut h);
    h.load(LOCAL);
    h.render();

    let records: Vec<_> = h.pipeline.shadow_records().iter().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].matrices.len(), 4);
    assert_eq!(records[1].matrices.len(), 1);

    let local0 = h.pipeline.framebuffer("local0").unwrap().handle;
    let local1 = h.pipeline.framebuffer("local1").unwrap().handle;
    assert_eq!(records[0].framebuffer, local0);
    assert_eq!(records[1].framebuffer, local1);

    let bound_to = |fb: sable_core::renderer::FrameBufferHandle| {
        h.pipeline
            .allocated_views()
            .iter()
            .filter(|v| h.device.view_framebuffer(**v) == Some(Some(fb)))
            .count()
    };
    assert_eq!(bound_to(local0), 4);
    assert_eq!(bound_to(local1), 1);

    let omni_rects: Vec<_> = h
        .pipeline
        .allocated_views()
        .iter()
        .filter(|v| h.device.view_framebuffer(**v) == Some(Some(local0)))
        .filter_map(|v| h.device.view_rect(*v))
        .collect();
    let quadrants: Vec<_> = (0..4).map(|i| quadrant_rect(i, 512, 512)).collect();
    assert_eq!(omni_rects, quadrants);
}

#[test]
fn test_point_light_pass_binds_each_light_shadow() {
    let mut h = Harness::new();
    local_lights(&mut h);
    h.load(LOCAL);
    h.render();

    let main_view = *h.pipeline.allocated_views().last().unwrap();
    assert_eq!(h.device.view_framebuffer(main_view), Some(None));
    let lit = h.device.submissions_to(main_view);
    let shadowed = fixtures::program_for(1, ShaderDefines::POINT_LIGHT | ShaderDefines::HAS_SHADOWMAP);
    let unshadowed = fixtures::program_for(1, ShaderDefines::POINT_LIGHT);
    let programs: Vec<_> = lit.iter().filter_map(|s| s.program).collect();
    assert_eq!(programs, vec![shadowed, shadowed, unshadowed]);

    let local0 = h.pipeline.framebuffer("local0").unwrap().handle;
    let sampler = h.device.uniform("u_texShadowmap").unwrap();
    let depth = h.device.framebuffer_texture(local0, 0).unwrap();
    assert_eq!(lit[0].textures, vec![(0, sampler, depth)]);
    assert!(lit[2].textures.is_empty());

    // Four omni views, one spot view, then one query per lit light.
    assert_eq!(h.scene.influence_queries.borrow().len(), 8);
}

#[test]
fn test_shadow_records_are_capped() {
    let mut h = Harness::new();
    local_lights(&mut h);
    let capped = LOCAL.replacen("(\n", "(\n    settings: (max_shadow_records: 1),\n", 1);
    h.load(&capped);
    h.render();

    assert_eq!(h.pipeline.shadow_records().len(), 1);
    let main_view = *h.pipeline.allocated_views().last().unwrap();
    let unshadowed = fixtures::program_for(1, ShaderDefines::POINT_LIGHT);
    let programs: Vec<_> = h
        .device
        .submissions_to(main_view)
        .iter()
        .filter_map(|s| s.program)
        .collect();
    assert_eq!(programs[1..], [unshadowed, unshadowed]);
}

#[test]
fn test_local_shadows_run_out_of_framebuffers() {
    let mut h = Harness::new();
    local_lights(&mut h);
    let single = LOCAL.replace(r#"framebuffers: ["local0", "local1"]"#, r#"framebuffers: ["local0"]"#);
    h.load(&single);
    h.render();

    let records: Vec<_> = h.pipeline.shadow_records().iter().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].matrices.len(), 4);
}
