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

//! Light and material uniform binding.
//!
//! Light uniforms are uploaded once per draw group through [`LightBinding::upload`].
//! The same binding resolves, also once per group, the shader defines and the shadow
//! map texture every draw of the group uses. Material uniforms and textures are
//! per draw, through [`apply_material`].

use crate::error::Result;
use crate::shadow::{DirectionalShadows, ShadowRecords};
use sable_core::math::{Mat4, Vec4};
use sable_core::renderer::{
    GpuDevice, Material, ShaderDefines, TextureHandle, UniformHandle, UniformKind, UniformValue,
};
use sable_core::scene::{GlobalLightInfo, LightId, PointLightInfo};

/// Uniforms the pipeline itself writes.
#[derive(Debug, Clone)]
pub struct BuiltinUniforms {
    /// Local light position in `xyz`, range in `w`.
    pub light_pos_radius: UniformHandle,
    /// Light color times intensity in `rgb`, attenuation in `w`.
    pub light_rgb_attenuation: UniformHandle,
    /// Light direction in `xyz`, cone angle in `w`.
    pub light_dir_fov: UniformHandle,
    /// Local light specular color times intensity.
    pub light_specular: UniformHandle,
    /// Ambient color times intensity.
    pub ambient_color: UniformHandle,
    /// Fog color in `rgb`, density in `w`.
    pub fog_color_density: UniformHandle,
    /// Fog band bottom in `x`, height in `y`.
    pub fog_params: UniformHandle,
    /// Shadow map matrices, up to four.
    pub shadowmap_matrices: UniformHandle,
    /// Far distance of each cascade.
    pub shadowmap_splits: UniformHandle,
    /// Shadow map sampler.
    pub shadowmap_sampler: UniformHandle,
    /// Specular color in `rgb`, shininess in `w`.
    pub material_specular_shininess: UniformHandle,
    /// Bone palette of skinned draws.
    pub bone_matrices: UniformHandle,
    /// Applied camera position.
    pub camera_pos: UniformHandle,
    /// Inverse projection of the applied camera.
    pub camera_inv_projection: UniformHandle,
    /// View matrix of the applied camera.
    pub camera_view: UniformHandle,
    /// Size of the last bound framebuffer texture: `w, h, 1/w, 1/h`.
    pub texture_size: UniformHandle,
    /// Terrain root size in `x`, scale in `yzw`.
    pub terrain_params: UniformHandle,
    /// Camera position in the terrain's scaled local space.
    pub terrain_rel_camera_pos: UniformHandle,
}

impl BuiltinUniforms {
    /// Creates every builtin uniform on `device`.
    pub fn create(device: &mut dyn GpuDevice, max_bone_count: usize) -> Result<Self> {
        let bones = max_bone_count.clamp(1, u16::MAX as usize) as u16;
        let mut vec4 = |name: &str| device.create_uniform(name, UniformKind::Vec4, 1);
        let light_pos_radius = vec4("u_lightPosRadius")?;
        let light_rgb_attenuation = vec4("u_lightRgbAttenuation")?;
        let light_dir_fov = vec4("u_lightDirFov")?;
        let light_specular = vec4("u_lightSpecular")?;
        let ambient_color = vec4("u_ambientColor")?;
        let fog_color_density = vec4("u_fogColorDensity")?;
        let fog_params = vec4("u_fogParams")?;
        let shadowmap_splits = vec4("u_shadowmapSplits")?;
        let material_specular_shininess = vec4("u_materialSpecularShininess")?;
        let camera_pos = vec4("u_cameraPos")?;
        let texture_size = vec4("u_textureSize")?;
        let terrain_params = vec4("u_terrainParams")?;
        let terrain_rel_camera_pos = vec4("u_relCamPos")?;

        Ok(Self {
            light_pos_radius,
            light_rgb_attenuation,
            light_dir_fov,
            light_specular,
            ambient_color,
            fog_color_density,
            fog_params,
            shadowmap_splits,
            material_specular_shininess,
            camera_pos,
            texture_size,
            terrain_params,
            terrain_rel_camera_pos,
            shadowmap_matrices: device.create_uniform("u_shadowmapMatrices", UniformKind::Mat4, 4)?,
            shadowmap_sampler: device.create_uniform("u_texShadowmap", UniformKind::Sampler, 1)?,
            bone_matrices: device.create_uniform("u_boneMatrices", UniformKind::Mat4, bones)?,
            camera_inv_projection: device.create_uniform("u_camInvProj", UniformKind::Mat4, 1)?,
            camera_view: device.create_uniform("u_camView", UniformKind::Mat4, 1)?,
        })
    }

    /// Destroys every builtin uniform.
    pub fn destroy(&self, device: &mut dyn GpuDevice) {
        for handle in [
            self.light_pos_radius,
            self.light_rgb_attenuation,
            self.light_dir_fov,
            self.light_specular,
            self.ambient_color,
            self.fog_color_density,
            self.fog_params,
            self.shadowmap_matrices,
            self.shadowmap_splits,
            self.shadowmap_sampler,
            self.material_specular_shininess,
            self.bone_matrices,
            self.camera_pos,
            self.camera_inv_projection,
            self.camera_view,
            self.texture_size,
            self.terrain_params,
            self.terrain_rel_camera_pos,
        ] {
            device.destroy_uniform(handle);
        }
    }
}

/// A framebuffer attachment bound for every later draw of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalTexture {
    /// Sampler uniform.
    pub sampler: UniformHandle,
    /// Attachment texture.
    pub texture: TextureHandle,
}

/// The light a draw group is lit by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightBinding {
    /// The scene's directional light.
    Global(GlobalLightInfo),
    /// A point or spot light.
    Local {
        /// Light id, used to find the light's shadow map.
        id: LightId,
        /// Light parameters.
        info: PointLightInfo,
    },
}

/// Per-group draw inputs derived from a [`LightBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedLight {
    /// Defines every draw of the group adds.
    pub defines: ShaderDefines,
    /// Shadow map bound past the material's textures.
    pub shadow_texture: Option<TextureHandle>,
}

impl ResolvedLight {
    /// Inputs of shadow caster draws: no defines, no shadow map.
    pub const CASTER: Self = Self {
        defines: ShaderDefines::NONE,
        shadow_texture: None,
    };
}

impl LightBinding {
    /// Uploads the light's uniform set.
    pub fn upload(
        &self,
        device: &mut dyn GpuDevice,
        uniforms: &BuiltinUniforms,
        directional: &DirectionalShadows,
        records: &ShadowRecords,
    ) {
        match self {
            LightBinding::Global(light) => {
                let forward = light.forward();
                device.set_uniform_vec4(
                    uniforms.light_rgb_attenuation,
                    &[light.color.scaled_rgb(light.intensity, 1.0)],
                );
                device.set_uniform_vec4(uniforms.light_dir_fov, &[forward.extend(0.0)]);
                device.set_uniform_vec4(
                    uniforms.ambient_color,
                    &[light.ambient_color.scaled_rgb(light.ambient_intensity, 1.0)],
                );
                device.set_uniform_vec4(
                    uniforms.fog_color_density,
                    &[light.fog_color.scaled_rgb(1.0, light.fog_density)],
                );
                device.set_uniform_vec4(
                    uniforms.fog_params,
                    &[Vec4::new(light.fog_bottom, light.fog_height, 0.0, 0.0)],
                );
                if directional.is_available() {
                    device.set_uniform_mat4(uniforms.shadowmap_matrices, &directional.padded_matrices());
                    device.set_uniform_vec4(uniforms.shadowmap_splits, &[directional.splits]);
                }
            }
            LightBinding::Local { id, info } => {
                device.set_uniform_vec4(
                    uniforms.light_pos_radius,
                    &[info.position().extend(info.range)],
                );
                device.set_uniform_vec4(
                    uniforms.light_rgb_attenuation,
                    &[info.color.scaled_rgb(info.intensity, info.attenuation)],
                );
                device.set_uniform_vec4(uniforms.light_dir_fov, &[info.forward().extend(info.fov)]);
                device.set_uniform_vec4(
                    uniforms.light_specular,
                    &[info.specular_color.scaled_rgb(info.specular_intensity, 1.0)],
                );
                if let Some(record) = records.find(*id).filter(|_| info.cast_shadows) {
                    device.set_uniform_mat4(uniforms.shadowmap_matrices, &record.matrices);
                }
            }
        }
    }

    /// Defines and shadow texture for draws lit by this light.
    ///
    /// While a shadow map is being rendered the directional map is never bound, since
    /// it may be the render target.
    pub fn resolve(
        &self,
        directional: &DirectionalShadows,
        records: &ShadowRecords,
        rendering_shadowmap: bool,
    ) -> ResolvedLight {
        match self {
            LightBinding::Global(_) => {
                if !rendering_shadowmap && directional.is_available() {
                    ResolvedLight {
                        defines: ShaderDefines::HAS_SHADOWMAP,
                        shadow_texture: directional.texture,
                    }
                } else {
                    ResolvedLight::default()
                }
            }
            LightBinding::Local { id, info } => {
                let record = records
                    .find(*id)
                    .filter(|_| info.cast_shadows)
                    .filter(|r| r.texture.is_some());
                match record {
                    Some(record) => ResolvedLight {
                        defines: ShaderDefines::POINT_LIGHT | ShaderDefines::HAS_SHADOWMAP,
                        shadow_texture: record.texture,
                    },
                    None => ResolvedLight {
                        defines: ShaderDefines::POINT_LIGHT,
                        shadow_texture: None,
                    },
                }
            }
        }
    }
}

/// Everything [`apply_material`] binds besides the material itself.
#[derive(Debug, Clone, Copy)]
pub struct MaterialInputs<'a> {
    /// Builtin uniforms.
    pub uniforms: &'a BuiltinUniforms,
    /// Shadow map of the current light.
    pub shadow_texture: Option<TextureHandle>,
    /// Framebuffer textures bound by the script.
    pub global_textures: &'a [GlobalTexture],
    /// Scene clock.
    pub time: f32,
}

/// Binds `material`'s uniforms and textures, then the shadow map and framebuffer
/// textures on the following stages. Returns the first unused stage.
pub fn apply_material(
    device: &mut dyn GpuDevice,
    material: &Material,
    inputs: &MaterialInputs<'_>,
) -> u8 {
    for uniform in &material.uniforms {
        let value = match uniform.value {
            UniformValue::Float(v) => v,
            UniformValue::Time => inputs.time,
        };
        device.set_uniform_vec4(uniform.handle, &[Vec4::new(value, 0.0, 0.0, 0.0)]);
    }
    for (stage, slot) in material.textures.iter().enumerate() {
        if let Some(texture) = slot.texture {
            device.set_texture(stage as u8, slot.sampler, texture);
        }
    }
    device.set_uniform_vec4(
        inputs.uniforms.material_specular_shininess,
        &[material.specular.scaled_rgb(1.0, material.shininess)],
    );

    let mut stage = material.texture_count();
    if let Some(texture) = inputs.shadow_texture {
        device.set_texture(stage, inputs.uniforms.shadowmap_sampler, texture);
        stage = stage.saturating_add(1);
    }
    for global in inputs.global_textures {
        device.set_texture(stage, global.sampler, global.texture);
        stage = stage.saturating_add(1);
    }
    stage
}

/// Uploads the camera matrices screen-space shaders reconstruct positions with.
pub fn upload_camera_matrices(
    device: &mut dyn GpuDevice,
    uniforms: &BuiltinUniforms,
    view: &Mat4,
    projection: &Mat4,
) {
    if let Some(inverse) = projection.inverse() {
        device.set_uniform_mat4(uniforms.camera_inv_projection, &[inverse]);
    }
    device.set_uniform_mat4(uniforms.camera_view, &[*view]);
}
