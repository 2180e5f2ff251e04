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

//! Directional cascades and local light shadow maps.

use super::{Frame, FrameState, Resources};
use crate::binding::ResolvedLight;
use crate::framebuffer::FrameBuffer;
use crate::shadow::{fit_cascade, local_views, ShadowRecord, CASCADE_COUNT};
use sable_core::math::{Frustum, LinearRgba, Mat4};
use sable_core::renderer::{ClearFlags, GpuDevice, TextureHandle, ViewId, ViewRect};
use sable_core::scene::CameraParams;

/// The texture a shadow framebuffer is sampled through: its depth attachment, or
/// the first one.
fn shadow_texture(device: &dyn GpuDevice, fb: &FrameBuffer) -> Option<TextureHandle> {
    fb.depth_attachment()
        .and_then(|i| device.framebuffer_texture(fb.handle, i))
        .or_else(|| device.framebuffer_texture(fb.handle, 0))
}

fn prepare_view(device: &mut dyn GpuDevice, view: ViewId, rect: ViewRect, view_matrix: &Mat4, projection: &Mat4) {
    device.set_view_rect(view, rect);
    device.set_view_transform(view, view_matrix, projection);
    device.set_view_clear(view, ClearFlags::ALL, LinearRgba::WHITE, 1.0);
    device.touch(view);
}

impl FrameState {
    fn slot_camera(&self, frame: &Frame<'_>, slot: &str) -> Option<(sable_core::scene::CameraId, CameraParams)> {
        let Some(id) = frame.scene.camera_in_slot(slot) else {
            log::warn!("Pipeline: no camera in slot '{}' for shadows", slot);
            return None;
        };
        let mut params = frame.scene.camera_params(id)?;
        params.width = self.width as f32;
        params.height = self.height as f32;
        Some((id, params))
    }

    /// Renders the four cascades of the global light into the bound framebuffer.
    pub(super) fn render_shadowmap(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        layer_mask: u64,
        slot: &str,
    ) {
        let Some(light) = frame.scene.active_global_light() else {
            log::debug!("Pipeline: no global light, skipping cascades");
            return;
        };
        let Some((camera_id, camera)) = self.slot_camera(frame, slot) else {
            return;
        };
        if camera.height <= 0.0 {
            log::debug!("Pipeline: zero-height camera, skipping cascades");
            return;
        }
        let Some(handle) = self.views.current_framebuffer() else {
            log::warn!("Pipeline: renderShadowmap needs a bound framebuffer");
            return;
        };
        let Some(fb) = res.framebuffers.find_by_handle(handle) else {
            log::warn!("Pipeline: bound framebuffer {:?} is not a shadow map", handle);
            return;
        };
        let size = (fb.width, fb.height);

        self.directional.reset();
        self.rendering_shadowmap = true;
        for index in 0..CASCADE_COUNT {
            let Some(cascade) = fit_cascade(&camera, &light, index, size, &res.settings) else {
                log::debug!("Pipeline: cascade {} is degenerate", index);
                continue;
            };
            let view = if self.directional.matrices.is_empty() {
                self.views.ensure_view(frame.ctx, frame.device)
            } else {
                self.views.allocate_view(frame.ctx, frame.device)
            };
            prepare_view(frame.device, view, cascade.rect, &cascade.view, &cascade.projection);
            self.render_casters(res, frame, view, &cascade.frustum, layer_mask, camera_id, &camera);
            self.directional.matrices.push(cascade.matrix);
            self.directional.ranges.push(cascade.range);
        }
        self.rendering_shadowmap = false;

        if !self.directional.matrices.is_empty() {
            self.directional.splits = light.cascades;
            self.directional.framebuffer = Some(handle);
            self.directional.texture = shadow_texture(frame.device, fb);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_casters(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        view: ViewId,
        frustum: &Frustum,
        layer_mask: u64,
        camera_id: sable_core::scene::CameraId,
        camera: &CameraParams,
    ) {
        let Some(group) = self.group_on(frame, view, ResolvedLight::CASTER) else {
            return;
        };
        self.render_geometry(res, frame, &group, frustum, layer_mask, camera_id, camera.position());
        self.flush_group(res, frame, &group);
    }

    /// Renders shadow maps of the shadow-casting lights closest to the slot camera,
    /// one framebuffer of `framebuffers` per light.
    pub(super) fn render_local_shadowmaps(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        layer_mask: u64,
        framebuffers: &[String],
        slot: &str,
    ) {
        let Some((_, camera)) = self.slot_camera(frame, slot) else {
            return;
        };
        let scene = frame.scene;
        let mut lights = self.arena.lights.take();
        scene.collect_closest_point_lights(
            camera.position(),
            res.settings.max_local_shadow_lights,
            &mut lights,
        );

        let previous = self.views.current_framebuffer();
        let mut targets = framebuffers.iter();
        self.rendering_shadowmap = true;
        for &id in &lights {
            let Some(info) = scene.point_light(id).filter(|l| l.cast_shadows) else {
                continue;
            };
            if !self.records.has_room() {
                log::debug!("Pipeline: shadow records full, {:?} stays unshadowed", id);
                break;
            }
            let Some(name) = targets.next() else {
                log::debug!("Pipeline: out of local shadow framebuffers");
                break;
            };
            let Some(fb) = res.framebuffers.find(name) else {
                log::warn!("Pipeline: unknown shadow framebuffer '{}'", name);
                continue;
            };

            self.views.set_next_framebuffer(Some(fb.handle));
            let views = local_views(&info, res.settings.local_shadow_near, fb.width, fb.height);
            let mut matrices = Vec::with_capacity(views.len());
            for local in &views {
                let view = self.views.allocate_view(frame.ctx, frame.device);
                prepare_view(frame.device, view, local.rect, &local.view, &local.projection);
                let Some(group) = self.group_on(frame, view, ResolvedLight::CASTER) else {
                    break;
                };
                let mut meshes = self.arena.renderables.take();
                scene.collect_point_light_influenced_geometry(
                    id,
                    Some(&local.frustum),
                    layer_mask,
                    &mut meshes,
                );
                self.render_meshes(res, frame, &group, &meshes);
                self.arena.renderables.recycle(meshes);
                self.flush_group(res, frame, &group);
                matrices.push(local.matrix);
            }
            if matrices.is_empty() {
                continue;
            }
            self.records.push(ShadowRecord {
                light: id,
                framebuffer: fb.handle,
                texture: shadow_texture(frame.device, fb),
                matrices,
            });
        }
        self.rendering_shadowmap = false;
        self.views.set_next_framebuffer(previous);
        self.arena.lights.recycle(lights);
    }
}
