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

#![allow(dead_code)]

use sable_core::math::{Mat4, Vec3, Vec4};
use sable_core::renderer::{Material, ProgramHandle};
use sable_core::scene::{CameraParams, GlobalLightInfo};
use sable_core::testing::{fixtures, MaterialLibrary, RecordingDevice, Submission, TestScene};
use sable_pipeline::{FrameContext, Pipeline};
use std::sync::Arc;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}

/// A camera at the origin looking down -Z.
pub fn main_camera() -> CameraParams {
    CameraParams::default()
}

pub fn sun() -> GlobalLightInfo {
    GlobalLightInfo {
        matrix: Mat4::from_rotation_x(-1.0),
        cascades: Vec4::new(5.0, 20.0, 100.0, 300.0),
        ..Default::default()
    }
}

/// Device, scene, materials and a pipeline, wired together.
pub struct Harness {
    pub device: RecordingDevice,
    pub library: MaterialLibrary,
    pub ctx: FrameContext,
    pub scene: TestScene,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_size(WIDTH, HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        init_logging();
        let mut scene = TestScene::new();
        scene.add_camera("main", main_camera());
        Self {
            device: RecordingDevice::new(),
            library: MaterialLibrary::default(),
            ctx: FrameContext::new(),
            scene,
            pipeline: Pipeline::new(width, height),
        }
    }

    pub fn add_material(&mut self, path: &str, passes: &[&str]) -> Arc<Material> {
        let material = fixtures::material(path, passes);
        self.library.insert(Arc::clone(&material));
        material
    }

    pub fn load(&mut self, ron: &str) {
        self.pipeline
            .load_ron(&mut self.device, &mut self.library, ron)
            .expect("definition loads");
    }

    /// Renders one frame, dropping the calls made by earlier frames and loads.
    pub fn render(&mut self) {
        self.device.clear_calls();
        self.pipeline
            .render(&mut self.ctx, &mut self.device, &self.scene);
    }

    /// Adds `count` instances of mesh 0 of `model`, spread in front of the camera.
    pub fn add_instances(&mut self, model: &Arc<sable_core::scene::Model>, count: usize, first_entity: u32) {
        for i in 0..count {
            let position = Vec3::new((i % 10) as f32 * 0.1, (i / 10) as f32 * 0.1, -10.0);
            self.scene
                .add_renderable(fixtures::renderable(first_entity + i as u32, model, 0, position));
        }
    }

    pub fn programs(&self) -> Vec<ProgramHandle> {
        self.device
            .submissions()
            .iter()
            .filter_map(|s| s.program)
            .collect()
    }

    pub fn instance_counts(&self) -> Vec<u32> {
        self.device
            .submissions()
            .iter()
            .map(Submission::instance_count)
            .collect()
    }
}
