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

//! Shaders, shader variants and materials as seen by the render pipeline.
//!
//! Materials are owned by the engine's resource manager and shared through `Arc`.
//! The pipeline only reads them: it never toggles defines on a shared material,
//! it computes the define mask of each draw and asks the shader for that variant.

use super::handle::{ProgramHandle, TextureHandle, UniformHandle};
use super::state::RenderState;
use crate::math::LinearRgba;
use crate::sable_bitflags;
use std::sync::Arc;

sable_bitflags! {
    /// Compile-time switches selecting a shader variant.
    pub struct ShaderDefines: u32 {
        /// No defines.
        const NONE = 0;
        /// A shadow map texture and its matrices are bound.
        const HAS_SHADOWMAP = 1 << 0;
        /// The draw is lit by a point or spot light instead of the global light.
        const POINT_LIGHT = 1 << 1;
        /// The mesh is skinned and reads the bone matrix array.
        const SKINNED = 1 << 2;
    }
}

/// One compiled program of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderVariant {
    /// Defines the program was compiled with.
    pub defines: ShaderDefines,
    /// The linked program.
    pub program: ProgramHandle,
}

/// The variants a shader provides for one named pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPass {
    /// Pass name, matched against the pipeline's current pass.
    pub name: String,
    /// Compiled variants.
    pub variants: Vec<ShaderVariant>,
}

/// A compiled shader: programs per pass and define combination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shader {
    /// Resource name.
    pub name: String,
    /// Supported passes.
    pub passes: Vec<ShaderPass>,
}

impl Shader {
    /// Finds the program for `pass` compiled with `defines`.
    ///
    /// An exact match wins. Otherwise the variant with the most defines that are all
    /// part of `defines` is chosen, so a shader without a shadow-map variant still
    /// renders, unshadowed. Returns `None` when the shader does not support the pass.
    pub fn program(&self, pass: &str, defines: ShaderDefines) -> Option<ProgramHandle> {
        let pass = self.passes.iter().find(|p| p.name == pass)?;
        if let Some(exact) = pass.variants.iter().find(|v| v.defines == defines) {
            return Some(exact.program);
        }
        let fallback = pass
            .variants
            .iter()
            .filter(|v| defines.contains(v.defines))
            .fold(None::<&ShaderVariant>, |best, v| match best {
                Some(b) if b.defines.count() >= v.defines.count() => Some(b),
                _ => Some(v),
            })?;
        log::trace!(
            "Shader: '{}' pass '{}' has no {:?} variant, using {:?}",
            self.name,
            pass.name,
            defines,
            fallback.defines
        );
        Some(fallback.program)
    }

    /// Whether the shader has programs for `pass`.
    pub fn has_pass(&self, pass: &str) -> bool {
        self.passes.iter().any(|p| p.name == pass)
    }
}

/// The value a material uniform takes at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A constant.
    Float(f32),
    /// The scene's simulation clock, read every frame.
    Time,
}

/// A scalar uniform declared by a material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialUniform {
    /// Shader-side name.
    pub name: String,
    /// Device uniform.
    pub handle: UniformHandle,
    /// Value source.
    pub value: UniformValue,
}

/// A texture slot declared by a material. Slot `i` binds to sampler stage `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    /// Sampler uniform of the slot.
    pub sampler: UniformHandle,
    /// Bound texture, if loaded.
    pub texture: Option<TextureHandle>,
}

/// A material resource.
#[derive(Debug, Clone)]
pub struct Material {
    /// Resource path.
    pub path: String,
    /// Shader providing the programs.
    pub shader: Arc<Shader>,
    /// Scalar uniforms.
    pub uniforms: Vec<MaterialUniform>,
    /// Texture slots.
    pub textures: Vec<TextureSlot>,
    /// Specular color.
    pub specular: LinearRgba,
    /// Specular exponent.
    pub shininess: f32,
    /// State flags the material adds to every draw (depth test, culling, blending).
    pub render_states: RenderState,
    /// Whether the material and everything it depends on finished loading.
    pub ready: bool,
}

impl Material {
    /// Creates a ready material with depth testing and back-face culling.
    pub fn new(path: impl Into<String>, shader: Arc<Shader>) -> Self {
        Self {
            path: path.into(),
            shader,
            uniforms: Vec::new(),
            textures: Vec::new(),
            specular: LinearRgba::WHITE,
            shininess: 4.0,
            render_states: RenderState::DEPTH_TEST_LESS | RenderState::CULL_CW,
            ready: true,
        }
    }

    /// Whether the material can be drawn.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of texture slots, i.e. the first sampler stage free for the pipeline.
    pub fn texture_count(&self) -> u8 {
        self.textures.len().min(u8::MAX as usize) as u8
    }
}

/// The resource manager side of material loading.
pub trait MaterialProvider {
    /// Resolves a material by path. `None` when the resource does not exist.
    fn load_material(&mut self, path: &str) -> Option<Arc<Material>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader() -> Shader {
        let variant = |defines, id| ShaderVariant {
            defines,
            program: ProgramHandle(id),
        };
        Shader {
            name: "mesh".into(),
            passes: vec![ShaderPass {
                name: "MAIN".into(),
                variants: vec![
                    variant(ShaderDefines::NONE, 1),
                    variant(ShaderDefines::HAS_SHADOWMAP, 2),
                    variant(ShaderDefines::POINT_LIGHT, 3),
                ],
            }],
        }
    }

    #[test]
    fn test_exact_variant() {
        let s = shader();
        assert_eq!(s.program("MAIN", ShaderDefines::HAS_SHADOWMAP), Some(ProgramHandle(2)));
        assert_eq!(s.program("MAIN", ShaderDefines::NONE), Some(ProgramHandle(1)));
    }

    #[test]
    fn test_richest_subset_fallback() {
        let s = shader();
        let wanted = ShaderDefines::POINT_LIGHT | ShaderDefines::SKINNED;
        assert_eq!(s.program("MAIN", wanted), Some(ProgramHandle(3)));
    }

    #[test]
    fn test_unknown_pass() {
        assert_eq!(shader().program("SHADOW", ShaderDefines::NONE), None);
    }
}
