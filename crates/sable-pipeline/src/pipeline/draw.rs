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

//! Draw submission: meshes, instanced batches, terrain, grass, particles, screen
//! quads and debug shapes.

use super::{Frame, FrameState, Resources};
use crate::batch::{pack_particles, particle_groups, InstanceBatch, TerrainBatch, TerrainInstance};
use crate::binding::{apply_material, MaterialInputs, ResolvedLight};
use bytemuck::{Pod, Zeroable};
use sable_core::math::{Frustum, LinearRgba, Mat4, Vec3, Vec4};
use sable_core::renderer::{Material, ProgramHandle, RenderState, ShaderDefines, ViewId};
use sable_core::scene::{CameraId, GrassInfo, Mesh, Model, Pose, RenderableMesh, TerrainInfo};
use std::mem::size_of;

const MATRIX_STRIDE: u16 = size_of::<Mat4>() as u16;
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Vertex of screen quads and particle billboards.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct ScreenVertex {
    pub pos: [f32; 3],
    pub color: u32,
    pub uv: [f32; 2],
}

/// Vertex of debug lines and points.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct DebugVertex {
    pub pos: [f32; 3],
    pub color: u32,
}

impl DebugVertex {
    fn new(pos: Vec3, color: LinearRgba) -> Self {
        Self {
            pos: [pos.x, pos.y, pos.z],
            color: color.to_abgr_u32(),
        }
    }
}

fn quad_vertices(rect: [f32; 4], color: u32) -> [ScreenVertex; 4] {
    let [x, y, w, h] = rect;
    let vertex = |px: f32, py: f32, u: f32, v: f32| ScreenVertex {
        pos: [px, py, 0.0],
        color,
        uv: [u, v],
    };
    [
        vertex(x, y, 0.0, 0.0),
        vertex(x + w, y, 1.0, 0.0),
        vertex(x + w, y + h, 1.0, 1.0),
        vertex(x, y + h, 0.0, 1.0),
    ]
}

/// Draws sharing a view, a pass, a light and the script's render state.
#[derive(Debug, Clone)]
pub(crate) struct DrawGroup {
    pub view: ViewId,
    pub pass: String,
    pub light: ResolvedLight,
    pub state: RenderState,
}

impl FrameState {
    /// Opens a group on the current view.
    pub(super) fn begin_group(&mut self, frame: &mut Frame<'_>, light: ResolvedLight) -> Option<DrawGroup> {
        let view = self.views.ensure_view(frame.ctx, frame.device);
        self.group_on(frame, view, light)
    }

    /// Opens a group on `view`, drawing with the current pass.
    pub(super) fn group_on(
        &self,
        frame: &Frame<'_>,
        view: ViewId,
        light: ResolvedLight,
    ) -> Option<DrawGroup> {
        let pass = self
            .views
            .current_pass()
            .and_then(|id| frame.ctx.pass_name(id));
        match pass {
            Some(pass) => Some(DrawGroup {
                view,
                pass: pass.to_string(),
                light,
                state: self.render_state,
            }),
            None => {
                log::warn!("Pipeline: drawing without a pass, SetPass must come first");
                None
            }
        }
    }

    fn program(material: &Material, group: &DrawGroup, extra: ShaderDefines) -> Option<ProgramHandle> {
        if !material.is_ready() {
            return None;
        }
        let program = material.shader.program(&group.pass, group.light.defines | extra);
        if program.is_none() {
            log::trace!(
                "Pipeline: '{}' has no program for pass '{}'",
                material.path,
                group.pass
            );
        }
        program
    }

    fn bind_material(&self, res: &Resources, frame: &mut Frame<'_>, group: &DrawGroup, material: &Material) {
        let inputs = MaterialInputs {
            uniforms: &res.builtins,
            shadow_texture: group.light.shadow_texture,
            global_textures: &self.global_textures,
            time: frame.scene.time(),
        };
        apply_material(frame.device, material, &inputs);
    }

    fn set_mesh_buffers(frame: &mut Frame<'_>, model: &Model, mesh: &Mesh) {
        frame
            .device
            .set_vertex_buffer(model.vertex_buffer, mesh.first_vertex, mesh.vertex_count);
        frame
            .device
            .set_index_buffer(model.index_buffer, mesh.first_index, mesh.index_count);
    }

    /// Queues meshes for instancing. Skinned meshes with a pose are drawn at once.
    pub(super) fn render_meshes(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        meshes: &[RenderableMesh],
    ) {
        for renderable in meshes {
            let Some(mesh) = renderable.mesh() else {
                continue;
            };
            if !renderable.model.ready || !mesh.material.is_ready() {
                continue;
            }
            match renderable.pose.as_deref() {
                Some(pose) if mesh.skinned => {
                    self.draw_skinned(res, frame, group, renderable, mesh, pose)
                }
                _ => {
                    let flushed =
                        self.batcher
                            .add_instance(&renderable.model, renderable.mesh_index, renderable.world);
                    for batch in flushed.into_batches() {
                        self.submit_batch(res, frame, group, batch);
                    }
                }
            }
        }
    }

    /// Submits every staged batch.
    pub(super) fn flush_group(&mut self, res: &Resources, frame: &mut Frame<'_>, group: &DrawGroup) {
        for batch in self.batcher.flush_all() {
            self.submit_batch(res, frame, group, batch);
        }
    }

    fn submit_batch(&mut self, res: &Resources, frame: &mut Frame<'_>, group: &DrawGroup, batch: InstanceBatch) {
        if let Some(mesh) = batch.mesh() {
            self.draw_instanced(res, frame, group, &batch.model, mesh, &batch.matrices);
        }
        self.batcher.recycle(batch);
    }

    fn draw_instanced(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        model: &Model,
        mesh: &Mesh,
        matrices: &[Mat4],
    ) {
        let material = &mesh.material;
        let Some(program) = Self::program(material, group, ShaderDefines::NONE) else {
            return;
        };
        let Some(instances) = frame
            .device
            .alloc_instance_data_buffer(bytemuck::cast_slice(matrices), MATRIX_STRIDE)
        else {
            log::warn!(
                "Pipeline: instance buffer exhausted, dropping {} instances",
                matrices.len()
            );
            return;
        };
        self.bind_material(res, frame, group, material);
        Self::set_mesh_buffers(frame, model, mesh);
        frame.device.set_instance_data_buffer(&instances);
        frame.device.set_state(group.state | material.render_states);
        frame.device.submit(group.view, program);
        self.stats.record_draw(mesh.index_count, instances.count);
    }

    fn draw_skinned(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        renderable: &RenderableMesh,
        mesh: &Mesh,
        pose: &Pose,
    ) {
        let material = &mesh.material;
        let Some(program) = Self::program(material, group, ShaderDefines::SKINNED) else {
            return;
        };
        let bones = &renderable.model.bones;
        let count = bones.len().min(pose.len()).min(res.settings.max_bone_count);
        if count < bones.len() {
            log::debug!(
                "Pipeline: skinning {} of {} bones of model {:?}",
                count,
                bones.len(),
                renderable.model.id
            );
        }
        let mut palette = self.arena.matrices.take();
        palette.extend((0..count).map(|i| {
            Mat4::from_translation(pose.positions[i])
                * Mat4::from_quat(pose.rotations[i])
                * bones[i].inv_bind
        }));
        frame.device.set_uniform_mat4(res.builtins.bone_matrices, &palette);
        self.arena.matrices.recycle(palette);

        self.bind_material(res, frame, group, material);
        frame.device.set_transform(&renderable.world);
        Self::set_mesh_buffers(frame, &renderable.model, mesh);
        frame.device.set_state(group.state | material.render_states);
        frame.device.submit(group.view, program);
        self.stats.record_draw(mesh.index_count, 1);
    }

    /// Draws terrain quads, one instanced draw per terrain run.
    pub(super) fn render_terrains(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        terrains: &[TerrainInfo],
        camera_pos: Vec3,
    ) {
        for info in terrains {
            if let Some(batch) = self.terrain_batcher.add(info) {
                self.draw_terrain(res, frame, group, batch, camera_pos);
            }
        }
        if let Some(batch) = self.terrain_batcher.finish() {
            self.draw_terrain(res, frame, group, batch, camera_pos);
        }
    }

    fn draw_terrain(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        batch: TerrainBatch,
        camera_pos: Vec3,
    ) {
        let terrain = &batch.terrain;
        let material = &terrain.material;
        let Some(program) = Self::program(material, group, ShaderDefines::NONE) else {
            return;
        };
        let Some(instances) = frame.device.alloc_instance_data_buffer(
            bytemuck::cast_slice(&batch.instances),
            size_of::<TerrainInstance>() as u16,
        ) else {
            log::warn!(
                "Pipeline: instance buffer exhausted, dropping {} terrain quads",
                batch.instances.len()
            );
            return;
        };

        let local = batch
            .world
            .affine_inverse()
            .map_or(camera_pos, |inverse| inverse.transform_point3(camera_pos));
        let scale = terrain.scale;
        let per_axis = |v: f32, s: f32| if s.abs() > f32::EPSILON { v / s } else { v };
        let relative = Vec3::new(
            per_axis(local.x, scale.x),
            per_axis(local.y, scale.y),
            per_axis(local.z, scale.z),
        );
        frame.device.set_uniform_vec4(
            res.builtins.terrain_params,
            &[Vec4::new(terrain.root_size, scale.x, scale.y, scale.z)],
        );
        frame
            .device
            .set_uniform_vec4(res.builtins.terrain_rel_camera_pos, &[relative.extend(1.0)]);

        self.bind_material(res, frame, group, material);
        frame.device.set_transform(&batch.world);
        frame.device.set_vertex_buffer(terrain.vertex_buffer, 0, u32::MAX);
        frame
            .device
            .set_index_buffer(terrain.index_buffer, 0, terrain.index_count);
        frame.device.set_instance_data_buffer(&instances);
        frame.device.set_state(group.state | material.render_states);
        frame.device.submit(group.view, program);
        self.stats.record_draw(terrain.index_count, instances.count);
    }

    /// Draws every mesh of every grass patch, instanced by the patch matrices.
    pub(super) fn render_grass(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        patches: &[GrassInfo],
    ) {
        for patch in patches {
            if !patch.model.ready || patch.matrices.is_empty() {
                continue;
            }
            for mesh in &patch.model.meshes {
                self.draw_instanced(res, frame, group, &patch.model, mesh, &patch.matrices);
            }
        }
    }

    /// Renderables, terrains and, outside shadow maps, grass visible in `frustum`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn render_geometry(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        frustum: &Frustum,
        layer_mask: u64,
        camera: CameraId,
        camera_pos: Vec3,
    ) {
        let scene = frame.scene;

        let mut meshes = self.arena.renderables.take();
        scene.collect_renderables(frustum, layer_mask, &mut meshes);
        self.render_meshes(res, frame, group, &meshes);
        self.arena.renderables.recycle(meshes);

        let mut terrains = self.arena.terrains.take();
        scene.collect_terrains(layer_mask, camera_pos, &mut terrains);
        self.render_terrains(res, frame, group, &terrains, camera_pos);
        self.arena.terrains.recycle(terrains);

        if !self.rendering_shadowmap {
            let mut grass = self.arena.grass.take();
            scene.collect_grass(frustum, layer_mask, camera, &mut grass);
            self.render_grass(res, frame, group, &grass);
            self.arena.grass.recycle(grass);
        }
    }

    /// Draws particle emitters as instanced billboards.
    pub(super) fn render_particles(&mut self, res: &Resources, frame: &mut Frame<'_>, group: &DrawGroup) {
        let scene = frame.scene;
        let emitters = scene.particle_emitters();
        if emitters.is_empty() {
            return;
        }
        let corners = quad_vertices([-1.0, -1.0, 2.0, 2.0], LinearRgba::WHITE.to_abgr_u32());
        let vertices = frame
            .device
            .alloc_transient_vertex_buffer(bytemuck::cast_slice(&corners), size_of::<ScreenVertex>() as u16);
        let indices = frame.device.alloc_transient_index_buffer(&QUAD_INDICES);
        let (Some(vertices), Some(indices)) = (vertices, indices) else {
            log::warn!("Pipeline: transient buffers exhausted, skipping particles");
            return;
        };

        let mut packed = Vec::new();
        for emitter in emitters {
            let material = &emitter.material;
            let Some(program) = Self::program(material, group, ShaderDefines::NONE) else {
                continue;
            };
            for range in particle_groups(emitter.len(), res.settings.particle_group_size) {
                pack_particles(emitter, range, &mut packed);
                let Some(instances) = frame.device.alloc_instance_data_buffer(
                    bytemuck::cast_slice(&packed),
                    size_of::<crate::batch::ParticleInstance>() as u16,
                ) else {
                    log::warn!("Pipeline: instance buffer exhausted, skipping particles");
                    return;
                };
                self.bind_material(res, frame, group, material);
                frame.device.set_transient_vertex_buffer(&vertices);
                frame.device.set_transient_index_buffer(&indices);
                frame.device.set_instance_data_buffer(&instances);
                frame.device.set_state(group.state | material.render_states);
                frame.device.submit(group.view, program);
                self.stats.record_draw(QUAD_INDICES.len() as u32, instances.count);
            }
        }
    }

    /// Draws a quad in `[-1, 1]` screen space, tinted by `color`.
    pub(super) fn draw_screen_quad(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        rect: [f32; 4],
        material: &Material,
        color: LinearRgba,
    ) {
        let Some(program) = Self::program(material, group, ShaderDefines::NONE) else {
            return;
        };
        let corners = quad_vertices(rect, color.to_abgr_u32());
        let vertices = frame
            .device
            .alloc_transient_vertex_buffer(bytemuck::cast_slice(&corners), size_of::<ScreenVertex>() as u16);
        let indices = frame.device.alloc_transient_index_buffer(&QUAD_INDICES);
        let (Some(vertices), Some(indices)) = (vertices, indices) else {
            log::warn!("Pipeline: transient buffers exhausted, skipping quad");
            return;
        };
        self.bind_material(res, frame, group, material);
        frame.device.set_transform(&Mat4::IDENTITY);
        frame.device.set_transient_vertex_buffer(&vertices);
        frame.device.set_transient_index_buffer(&indices);
        let state = (group.state | material.render_states)
            .difference(RenderState::CULL_CW | RenderState::CULL_CCW);
        frame.device.set_state(state);
        frame.device.submit(group.view, program);
        self.stats.record_draw(QUAD_INDICES.len() as u32, 1);
    }

    /// Draws the scene's debug lines, then its debug points.
    pub(super) fn render_debug_shapes(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        material: &Material,
    ) {
        let scene = frame.scene;
        let mut vertices: Vec<DebugVertex> = scene
            .debug_lines()
            .iter()
            .flat_map(|line| {
                [
                    DebugVertex::new(line.from, line.color),
                    DebugVertex::new(line.to, line.color),
                ]
            })
            .collect();
        self.draw_debug_vertices(res, frame, group, material, &vertices, RenderState::PT_LINES);

        vertices.clear();
        vertices.extend(
            scene
                .debug_points()
                .iter()
                .map(|point| DebugVertex::new(point.pos, point.color)),
        );
        self.draw_debug_vertices(res, frame, group, material, &vertices, RenderState::PT_POINTS);
    }

    fn draw_debug_vertices(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        group: &DrawGroup,
        material: &Material,
        vertices: &[DebugVertex],
        topology: RenderState,
    ) {
        if vertices.is_empty() {
            return;
        }
        let Some(program) = Self::program(material, group, ShaderDefines::NONE) else {
            return;
        };
        let Some(buffer) = frame
            .device
            .alloc_transient_vertex_buffer(bytemuck::cast_slice(vertices), size_of::<DebugVertex>() as u16)
        else {
            log::warn!(
                "Pipeline: transient buffers exhausted, dropping {} debug vertices",
                vertices.len()
            );
            return;
        };
        self.bind_material(res, frame, group, material);
        frame.device.set_transform(&Mat4::IDENTITY);
        frame.device.set_transient_vertex_buffer(&buffer);
        frame
            .device
            .set_state(group.state | material.render_states | topology);
        frame.device.submit(group.view, program);
        self.stats.record_draw(0, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layouts() {
        assert_eq!(size_of::<ScreenVertex>(), 24);
        assert_eq!(size_of::<DebugVertex>(), 16);
    }

    #[test]
    fn test_quad_corners_wind_from_origin() {
        let quad = quad_vertices([-1.0, -1.0, 2.0, 1.0], 7);
        assert_eq!(quad[0].pos, [-1.0, -1.0, 0.0]);
        assert_eq!(quad[2].pos, [1.0, 0.0, 0.0]);
        assert_eq!(quad[3].uv, [0.0, 1.0]);
        assert!(quad.iter().all(|v| v.color == 7));
    }
}
