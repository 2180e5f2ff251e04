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

//! Builders for shaders, materials and models used across tests.

use crate::math::{Mat4, Vec3};
use crate::renderer::*;
use crate::scene::{EntityId, Mesh, Model, ModelId, RenderableMesh};
use std::collections::HashMap;
use std::sync::Arc;

/// Program handle [`shader`] assigns to `pass_index` compiled with `defines`.
pub fn program_for(pass_index: usize, defines: ShaderDefines) -> ProgramHandle {
    ProgramHandle(1000 * (pass_index as u32 + 1) + defines.bits())
}

/// A shader with every define combination compiled for each of `passes`.
pub fn shader(name: &str, passes: &[&str]) -> Arc<Shader> {
    let all = [ShaderDefines::HAS_SHADOWMAP, ShaderDefines::POINT_LIGHT, ShaderDefines::SKINNED];
    let passes = passes
        .iter()
        .enumerate()
        .map(|(index, pass)| {
            let variants = (0u32..8)
                .map(|mask| {
                    let defines = all
                        .iter()
                        .enumerate()
                        .filter(|(bit, _)| mask & (1 << bit) != 0)
                        .fold(ShaderDefines::NONE, |acc, (_, d)| acc | *d);
                    ShaderVariant {
                        defines,
                        program: program_for(index, defines),
                    }
                })
                .collect();
            ShaderPass {
                name: pass.to_string(),
                variants,
            }
        })
        .collect();
    Arc::new(Shader {
        name: name.to_string(),
        passes,
    })
}

/// A ready material whose shader supports `passes`.
pub fn material(path: &str, passes: &[&str]) -> Arc<Material> {
    Arc::new(Material::new(path, shader(path, passes)))
}

/// A ready model with `mesh_count` 36-index meshes sharing `material`.
pub fn model(id: u32, material: &Arc<Material>, mesh_count: usize) -> Arc<Model> {
    let meshes = (0..mesh_count as u32)
        .map(|i| Mesh {
            material: Arc::clone(material),
            first_vertex: i * 24,
            vertex_count: 24,
            first_index: i * 36,
            index_count: 36,
            skinned: false,
        })
        .collect();
    Arc::new(Model {
        id: ModelId(id),
        vertex_buffer: VertexBufferHandle(id),
        index_buffer: IndexBufferHandle(id),
        meshes,
        bones: Vec::new(),
        ready: true,
    })
}

/// A draw record for mesh `mesh_index` of `model` placed at `position`.
pub fn renderable(entity: u32, model: &Arc<Model>, mesh_index: usize, position: Vec3) -> RenderableMesh {
    RenderableMesh {
        entity: EntityId(entity),
        model: Arc::clone(model),
        mesh_index,
        world: Mat4::from_translation(position),
        pose: None,
    }
}

/// A [`MaterialProvider`] serving a fixed set of materials by path.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    /// Materials by path.
    pub materials: HashMap<String, Arc<Material>>,
    /// Paths requested so far.
    pub requests: Vec<String>,
}

impl MaterialLibrary {
    /// Registers a material under its path.
    pub fn insert(&mut self, material: Arc<Material>) {
        self.materials.insert(material.path.clone(), material);
    }
}

impl MaterialProvider for MaterialLibrary {
    fn load_material(&mut self, path: &str) -> Option<Arc<Material>> {
        self.requests.push(path.to_string());
        self.materials.get(path).cloned()
    }
}
