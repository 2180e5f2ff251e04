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

//! The retained scene as seen by the render pipeline.
//!
//! The scene owns entities and their render components. The pipeline never stores
//! anything it gets from here past the frame: it queries visible sets under a frustum
//! and reads light and camera records by id.

pub mod camera;
pub mod debug;
pub mod light;
pub mod model;
pub mod terrain;

pub use self::camera::CameraParams;
pub use self::debug::{DebugLine, DebugPoint, ParticleEmitter};
pub use self::light::{GlobalLightInfo, PointLightInfo};
pub use self::model::{Bone, Mesh, Model, Pose, RenderableMesh};
pub use self::terrain::{GrassInfo, Terrain, TerrainInfo};

use crate::math::{Frustum, Vec3};

macro_rules! scene_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

scene_id!(
    /// An entity of the scene.
    EntityId
);
scene_id!(
    /// A camera component.
    CameraId
);
scene_id!(
    /// A point or spot light component.
    LightId
);
scene_id!(
    /// A terrain component.
    TerrainId
);
scene_id!(
    /// A loaded model resource.
    ModelId
);

/// Visibility and lookup queries the pipeline runs against the scene.
///
/// The `collect_*` methods append to `out` without clearing it, so callers can hand in
/// recycled buffers.
pub trait RenderScene {
    /// Meshes whose bounds touch `frustum` and whose layer is in `layer_mask`.
    fn collect_renderables(&self, frustum: &Frustum, layer_mask: u64, out: &mut Vec<RenderableMesh>);

    /// Visible terrain quads, refined around `camera_pos`.
    fn collect_terrains(&self, layer_mask: u64, camera_pos: Vec3, out: &mut Vec<TerrainInfo>);

    /// Grass patches visible in `frustum`, generated around `camera`.
    fn collect_grass(
        &self,
        frustum: &Frustum,
        layer_mask: u64,
        camera: CameraId,
        out: &mut Vec<GrassInfo>,
    );

    /// Point and spot lights whose range touches `frustum`.
    fn collect_point_lights(&self, frustum: &Frustum, out: &mut Vec<LightId>);

    /// Up to `max` point and spot lights, nearest to `pos` first.
    fn collect_closest_point_lights(&self, pos: Vec3, max: usize, out: &mut Vec<LightId>);

    /// Meshes within range of `light`, optionally restricted to `frustum`.
    fn collect_point_light_influenced_geometry(
        &self,
        light: LightId,
        frustum: Option<&Frustum>,
        layer_mask: u64,
        out: &mut Vec<RenderableMesh>,
    );

    /// The camera assigned to a named slot ("main", "editor", ...).
    fn camera_in_slot(&self, slot: &str) -> Option<CameraId>;

    /// Parameters of a camera.
    fn camera_params(&self, camera: CameraId) -> Option<CameraParams>;

    /// The global directional light, if any.
    fn active_global_light(&self) -> Option<GlobalLightInfo>;

    /// Parameters of a point or spot light.
    fn point_light(&self, light: LightId) -> Option<PointLightInfo>;

    /// Debug lines accumulated for this frame.
    fn debug_lines(&self) -> &[DebugLine] {
        &[]
    }

    /// Debug points accumulated for this frame.
    fn debug_points(&self) -> &[DebugPoint] {
        &[]
    }

    /// Debug text lines, top to bottom.
    fn debug_texts(&self) -> &[String] {
        &[]
    }

    /// Particle emitters with live particles.
    fn particle_emitters(&self) -> &[ParticleEmitter] {
        &[]
    }

    /// Simulation clock in seconds.
    fn time(&self) -> f32 {
        0.0
    }
}
