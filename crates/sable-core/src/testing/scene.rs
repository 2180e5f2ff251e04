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

//! A plain-data [`RenderScene`] for tests.

use crate::math::{Frustum, Vec3};
use crate::scene::*;
use std::cell::{Cell, RefCell};

/// A renderable placed on a set of layers.
#[derive(Debug, Clone)]
pub struct LayeredRenderable {
    /// The draw record.
    pub mesh: RenderableMesh,
    /// Layer bits.
    pub layers: u64,
}

/// A light placed in the scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneLight {
    /// Light id.
    pub id: LightId,
    /// Light parameters.
    pub info: PointLightInfo,
}

/// A scene made of public vectors. Culling treats every renderable as a sphere of
/// [`TestScene::bounding_radius`] around its world translation.
///
/// Frusta passed to the visibility queries are recorded for assertions.
#[derive(Debug)]
pub struct TestScene {
    /// Renderables.
    pub renderables: Vec<LayeredRenderable>,
    /// Terrain quads, returned for any camera position.
    pub terrains: Vec<TerrainInfo>,
    /// Grass patches, returned for any frustum.
    pub grass: Vec<GrassInfo>,
    /// Cameras by slot name.
    pub cameras: Vec<(String, CameraId, CameraParams)>,
    /// The global light.
    pub global_light: Option<GlobalLightInfo>,
    /// Point and spot lights.
    pub lights: Vec<SceneLight>,
    /// Debug lines.
    pub debug_lines: Vec<DebugLine>,
    /// Debug points.
    pub debug_points: Vec<DebugPoint>,
    /// Debug text.
    pub debug_texts: Vec<String>,
    /// Particle emitters.
    pub emitters: Vec<ParticleEmitter>,
    /// Simulation clock.
    pub time: f32,
    /// Culling radius of every renderable.
    pub bounding_radius: f32,
    /// Frusta passed to [`RenderScene::collect_renderables`].
    pub renderable_queries: RefCell<Vec<Frustum>>,
    /// Lights and frusta passed to the influenced-geometry query.
    pub influence_queries: RefCell<Vec<(LightId, Option<Frustum>)>>,
    /// Number of grass queries.
    pub grass_queries: Cell<u32>,
}

impl TestScene {
    /// An empty scene.
    pub fn new() -> Self {
        Self {
            renderables: Vec::new(),
            terrains: Vec::new(),
            grass: Vec::new(),
            cameras: Vec::new(),
            global_light: None,
            lights: Vec::new(),
            debug_lines: Vec::new(),
            debug_points: Vec::new(),
            debug_texts: Vec::new(),
            emitters: Vec::new(),
            time: 0.0,
            bounding_radius: 1.0,
            renderable_queries: RefCell::new(Vec::new()),
            influence_queries: RefCell::new(Vec::new()),
            grass_queries: Cell::new(0),
        }
    }

    /// Adds a renderable on layer 0.
    pub fn add_renderable(&mut self, mesh: RenderableMesh) {
        self.renderables.push(LayeredRenderable { mesh, layers: 1 });
    }

    /// Assigns a camera to `slot` and returns its id.
    pub fn add_camera(&mut self, slot: &str, params: CameraParams) -> CameraId {
        let id = CameraId(self.cameras.len() as u32);
        self.cameras.push((slot.to_string(), id, params));
        id
    }

    /// Adds a point or spot light and returns its id.
    pub fn add_light(&mut self, info: PointLightInfo) -> LightId {
        let id = LightId(self.lights.len() as u32 + 1);
        self.lights.push(SceneLight { id, info });
        id
    }

    /// Forgets recorded queries.
    pub fn clear_queries(&self) {
        self.renderable_queries.borrow_mut().clear();
        self.influence_queries.borrow_mut().clear();
        self.grass_queries.set(0);
    }

    fn find_light(&self, id: LightId) -> Option<&SceneLight> {
        self.lights.iter().find(|l| l.id == id)
    }
}

impl Default for TestScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScene for TestScene {
    fn collect_renderables(&self, frustum: &Frustum, layer_mask: u64, out: &mut Vec<RenderableMesh>) {
        self.renderable_queries.borrow_mut().push(*frustum);
        out.extend(
            self.renderables
                .iter()
                .filter(|r| r.layers & layer_mask != 0)
                .filter(|r| frustum.intersects_sphere(r.mesh.world.translation(), self.bounding_radius))
                .map(|r| r.mesh.clone()),
        );
    }

    fn collect_terrains(&self, _layer_mask: u64, _camera_pos: Vec3, out: &mut Vec<TerrainInfo>) {
        out.extend(self.terrains.iter().cloned());
    }

    fn collect_grass(
        &self,
        _frustum: &Frustum,
        _layer_mask: u64,
        _camera: CameraId,
        out: &mut Vec<GrassInfo>,
    ) {
        self.grass_queries.set(self.grass_queries.get() + 1);
        out.extend(self.grass.iter().cloned());
    }

    fn collect_point_lights(&self, frustum: &Frustum, out: &mut Vec<LightId>) {
        out.extend(
            self.lights
                .iter()
                .filter(|l| frustum.intersects_sphere(l.info.position(), l.info.range))
                .map(|l| l.id),
        );
    }

    fn collect_closest_point_lights(&self, pos: Vec3, max: usize, out: &mut Vec<LightId>) {
        let mut sorted: Vec<_> = self.lights.iter().collect();
        sorted.sort_by(|a, b| {
            let da = a.info.position().distance_squared(pos);
            let db = b.info.position().distance_squared(pos);
            da.total_cmp(&db)
        });
        out.extend(sorted.into_iter().take(max).map(|l| l.id));
    }

    fn collect_point_light_influenced_geometry(
        &self,
        light: LightId,
        frustum: Option<&Frustum>,
        layer_mask: u64,
        out: &mut Vec<RenderableMesh>,
    ) {
        self.influence_queries
            .borrow_mut()
            .push((light, frustum.copied()));
        let Some(light) = self.find_light(light) else {
            return;
        };
        let center = light.info.position();
        let reach = light.info.range + self.bounding_radius;
        out.extend(
            self.renderables
                .iter()
                .filter(|r| r.layers & layer_mask != 0)
                .filter(|r| r.mesh.world.translation().distance(center) <= reach)
                .filter(|r| {
                    frustum.map_or(true, |f| {
                        f.intersects_sphere(r.mesh.world.translation(), self.bounding_radius)
                    })
                })
                .map(|r| r.mesh.clone()),
        );
    }

    fn camera_in_slot(&self, slot: &str) -> Option<CameraId> {
        self.cameras
            .iter()
            .find(|(name, _, _)| name == slot)
            .map(|(_, id, _)| *id)
    }

    fn camera_params(&self, camera: CameraId) -> Option<CameraParams> {
        self.cameras
            .iter()
            .find(|(_, id, _)| *id == camera)
            .map(|(_, _, params)| *params)
    }

    fn active_global_light(&self) -> Option<GlobalLightInfo> {
        self.global_light
    }

    fn point_light(&self, light: LightId) -> Option<PointLightInfo> {
        self.find_light(light).map(|l| l.info)
    }

    fn debug_lines(&self) -> &[DebugLine] {
        &self.debug_lines
    }

    fn debug_points(&self) -> &[DebugPoint] {
        &self.debug_points
    }

    fn debug_texts(&self) -> &[String] {
        &self.debug_texts
    }

    fn particle_emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    fn time(&self) -> f32 {
        self.time
    }
}
