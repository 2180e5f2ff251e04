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

use super::{AppliedCamera, Frame, FrameState, Resources};
use crate::binding::{upload_camera_matrices, GlobalTexture, LightBinding, ResolvedLight};
use crate::commands::{CommandContext, CommandRegistry};
use crate::definition::ClearTarget;
use crate::framebuffer::SWAP_CHAIN_NAME;
use crate::program::{MaterialIndex, Operation, UniformIndex};
use sable_core::math::{LinearRgba, Mat4, Vec4};
use sable_core::renderer::{ClearFlags, RenderState, ViewRect};
use std::sync::Arc;

const DEBUG_TEXT_ATTRIBUTE: u8 = 0x4f;

fn clamp_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

impl FrameState {
    /// Runs one operation. Failures are logged and the operation is skipped.
    pub(super) fn execute(
        &mut self,
        res: &Resources,
        commands: &mut CommandRegistry,
        frame: &mut Frame<'_>,
        operation: &Operation,
    ) {
        log::trace!("Pipeline: {}", operation.name());
        match operation {
            Operation::SetPass(name) => {
                self.views.set_pass(frame.ctx, frame.device, name);
            }
            Operation::SetFramebuffer(name) => self.set_framebuffer(res, frame, name),
            Operation::UnbindFramebuffer => self.views.set_framebuffer(frame.device, None),
            Operation::ApplyCamera(slot) => self.apply_camera(res, frame, slot),
            Operation::Clear { buffers, color } => self.clear(frame, *buffers, *color),
            Operation::RenderModels {
                layer_mask,
                point_lights,
            } => self.render_models(res, frame, *layer_mask, *point_lights),
            Operation::RenderShadowmap { layer_mask, camera } => {
                self.render_shadowmap(res, frame, *layer_mask, camera)
            }
            Operation::RenderLocalLightsShadowmaps {
                layer_mask,
                framebuffers,
                camera,
            } => self.render_local_shadowmaps(res, frame, *layer_mask, framebuffers, camera),
            Operation::BindFramebufferTexture {
                framebuffer,
                attachment,
                uniform,
            } => self.bind_framebuffer_texture(res, frame, framebuffer, *attachment, *uniform),
            Operation::DrawQuad { rect, material } => self.draw_quad(res, frame, *rect, *material),
            Operation::ExecuteCustomCommand(name) => self.execute_command(commands, frame, name),
            Operation::EnableBlending(mode) => {
                self.render_state.set(RenderState::BLEND_MASK, false);
                self.render_state |= mode.state();
            }
            Operation::DisableBlending => self.render_state.set(RenderState::BLEND_MASK, false),
            Operation::SetDepthWrite(enabled) => self.render_state.set(RenderState::WRITE_Z, *enabled),
            Operation::SetAlphaWrite(enabled) => {
                self.render_state.set(RenderState::WRITE_ALPHA, *enabled)
            }
            Operation::SetRgbWrite(enabled) => self.render_state.set(RenderState::WRITE_RGB, *enabled),
            Operation::RenderParticles => {
                if let Some(group) = self.begin_group(frame, ResolvedLight::default()) {
                    self.render_particles(res, frame, &group);
                }
            }
            Operation::RenderDebugShapes => self.debug_shapes(res, frame),
            Operation::RenderDebugTexts => {
                let scene = frame.scene;
                frame.device.debug_text_clear();
                for (row, text) in scene.debug_texts().iter().enumerate() {
                    frame
                        .device
                        .debug_text_print(0, clamp_u16(row as u32), DEBUG_TEXT_ATTRIBUTE, text);
                }
            }
        }
    }

    fn set_framebuffer(&mut self, res: &Resources, frame: &mut Frame<'_>, name: &str) {
        if name == SWAP_CHAIN_NAME {
            self.views.set_framebuffer(frame.device, None);
            return;
        }
        match res.framebuffers.find(name) {
            Some(fb) => self.views.set_framebuffer(frame.device, Some(fb.handle)),
            None => log::warn!("Pipeline: unknown framebuffer '{}'", name),
        }
    }

    fn apply_camera(&mut self, res: &Resources, frame: &mut Frame<'_>, slot: &str) {
        let Some(id) = frame.scene.camera_in_slot(slot) else {
            log::warn!("Pipeline: no camera in slot '{}'", slot);
            return;
        };
        let Some(mut params) = frame.scene.camera_params(id) else {
            log::warn!("Pipeline: camera {:?} has no parameters", id);
            return;
        };
        params.width = self.width as f32;
        params.height = self.height as f32;
        let (Some(view_matrix), Some(projection), Some(frustum)) =
            (params.view(), params.projection(), params.frustum())
        else {
            log::debug!(
                "Pipeline: camera '{}' skipped at {}x{}",
                slot,
                self.width,
                self.height
            );
            return;
        };

        let view = self.views.ensure_view(frame.ctx, frame.device);
        frame.device.set_view_rect(
            view,
            ViewRect::new(0, 0, clamp_u16(self.width), clamp_u16(self.height)),
        );
        frame.device.set_view_transform(view, &view_matrix, &projection);
        frame
            .device
            .set_uniform_vec4(res.builtins.camera_pos, &[params.position().extend(1.0)]);
        self.camera = Some(AppliedCamera {
            id,
            params,
            view: view_matrix,
            projection,
            frustum,
        });
    }

    fn clear(&mut self, frame: &mut Frame<'_>, buffers: ClearTarget, color: u32) {
        let flags = match buffers {
            ClearTarget::All => ClearFlags::ALL,
            ClearTarget::Depth => ClearFlags::DEPTH,
        };
        let view = self.views.ensure_view(frame.ctx, frame.device);
        frame
            .device
            .set_view_clear(view, flags, LinearRgba::from_rgba_u32(color), 1.0);
        frame.device.touch(view);
    }

    /// Uploads the global light's uniforms and resolves its draw inputs.
    fn bind_global_light(&self, res: &Resources, frame: &mut Frame<'_>) -> ResolvedLight {
        match frame.scene.active_global_light() {
            Some(light) => {
                let binding = LightBinding::Global(light);
                binding.upload(frame.device, &res.builtins, &self.directional, &self.records);
                binding.resolve(&self.directional, &self.records, self.rendering_shadowmap)
            }
            None => ResolvedLight::default(),
        }
    }

    fn render_models(&mut self, res: &Resources, frame: &mut Frame<'_>, layer_mask: u64, point_lights: bool) {
        let Some(camera) = self.camera else {
            log::warn!("Pipeline: renderModels needs an applied camera");
            return;
        };
        if point_lights {
            self.render_point_light_models(res, frame, &camera, layer_mask);
            return;
        }
        let light = self.bind_global_light(res, frame);
        let Some(group) = self.begin_group(frame, light) else {
            return;
        };
        self.render_geometry(
            res,
            frame,
            &group,
            &camera.frustum,
            layer_mask,
            camera.id,
            camera.params.position(),
        );
        self.flush_group(res, frame, &group);
    }

    fn render_point_light_models(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        camera: &AppliedCamera,
        layer_mask: u64,
    ) {
        let Some(template) = self.begin_group(frame, ResolvedLight::default()) else {
            return;
        };
        let scene = frame.scene;
        let mut lights = self.arena.lights.take();
        scene.collect_point_lights(&camera.frustum, &mut lights);
        for &id in &lights {
            let Some(info) = scene.point_light(id) else {
                continue;
            };
            let binding = LightBinding::Local { id, info };
            binding.upload(frame.device, &res.builtins, &self.directional, &self.records);
            let group = super::draw::DrawGroup {
                light: binding.resolve(&self.directional, &self.records, self.rendering_shadowmap),
                ..template.clone()
            };

            let mut meshes = self.arena.renderables.take();
            scene.collect_point_light_influenced_geometry(id, Some(&camera.frustum), layer_mask, &mut meshes);
            self.render_meshes(res, frame, &group, &meshes);
            self.arena.renderables.recycle(meshes);
            self.flush_group(res, frame, &group);
        }
        self.arena.lights.recycle(lights);
    }

    fn bind_framebuffer_texture(
        &mut self,
        res: &Resources,
        frame: &mut Frame<'_>,
        name: &str,
        attachment: usize,
        uniform: UniformIndex,
    ) {
        if self.global_textures.len() >= res.settings.max_global_textures {
            log::warn!(
                "Pipeline: more than {} framebuffer textures bound, ignoring '{}'",
                res.settings.max_global_textures,
                name
            );
            return;
        }
        let Some(fb) = res.framebuffers.find(name) else {
            log::warn!("Pipeline: unknown framebuffer '{}'", name);
            return;
        };
        let Some(texture) = frame.device.framebuffer_texture(fb.handle, attachment) else {
            log::warn!("Pipeline: framebuffer '{}' has no attachment {}", name, attachment);
            return;
        };
        let Some(&sampler) = res.uniforms.get(uniform.0) else {
            log::warn!("Pipeline: uniform {} is not loaded", uniform.0);
            return;
        };
        self.global_textures.push(GlobalTexture { sampler, texture });
        let w = fb.width.max(1) as f32;
        let h = fb.height.max(1) as f32;
        frame
            .device
            .set_uniform_vec4(res.builtins.texture_size, &[Vec4::new(w, h, 1.0 / w, 1.0 / h)]);
    }

    fn draw_quad(&mut self, res: &Resources, frame: &mut Frame<'_>, rect: [f32; 4], material: MaterialIndex) {
        let view = self.views.ensure_view(frame.ctx, frame.device);
        let projection = Mat4::orthographic_rh_zo(-1.0, 1.0, 1.0, -1.0, 0.0, 30.0);
        frame
            .device
            .set_view_transform(view, &Mat4::IDENTITY, &projection);
        if let Some(camera) = self.camera {
            upload_camera_matrices(frame.device, &res.builtins, &camera.view, &camera.projection);
        }
        let light = self.bind_global_light(res, frame);

        let (material, color) = match res.material(material).filter(|m| m.is_ready()) {
            Some(material) => (Arc::clone(material), LinearRgba::WHITE),
            None => match res.program.debug_material().and_then(|i| res.material(i)) {
                Some(debug) => (Arc::clone(debug), LinearRgba::MAGENTA),
                None => {
                    log::warn!("Pipeline: quad material {} is not loaded", material.0);
                    return;
                }
            },
        };
        let Some(group) = self.group_on(frame, view, light) else {
            return;
        };
        self.draw_screen_quad(res, frame, &group, rect, &material, color);
    }

    fn execute_command(&mut self, commands: &mut CommandRegistry, frame: &mut Frame<'_>, name: &str) {
        let view = self.views.ensure_view(frame.ctx, frame.device);
        let mut context = CommandContext {
            device: &mut *frame.device,
            scene: frame.scene,
            view,
            camera: self.camera.map(|c| c.params),
        };
        if !commands.execute(name, &mut context) {
            log::warn!("Pipeline: unknown custom command '{}'", name);
        }
    }

    fn debug_shapes(&mut self, res: &Resources, frame: &mut Frame<'_>) {
        let Some(material) = res.program.debug_material().and_then(|i| res.material(i)) else {
            log::debug!("Pipeline: no debug material, skipping debug shapes");
            return;
        };
        let material = Arc::clone(material);
        if let Some(group) = self.begin_group(frame, ResolvedLight::default()) {
            self.render_debug_shapes(res, frame, &group, &material);
        }
    }
}
