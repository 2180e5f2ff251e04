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

//! Models, meshes and the per-frame draw records the scene hands to the pipeline.

use super::EntityId;
use super::ModelId;
use crate::math::{Mat4, Quaternion, Vec3};
use crate::renderer::{IndexBufferHandle, Material, VertexBufferHandle};
use std::sync::Arc;

/// A sub-range of a model's buffers drawn with one material.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Material of the range.
    pub material: Arc<Material>,
    /// First vertex in the model's vertex buffer.
    pub first_vertex: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// First index in the model's index buffer.
    pub first_index: u32,
    /// Number of indices.
    pub index_count: u32,
    /// Whether the vertices carry bone weights.
    pub skinned: bool,
}

/// A skeleton bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    /// Inverse of the bone's bind-pose transform.
    pub inv_bind: Mat4,
}

/// A loaded model: shared GPU buffers, meshes and skeleton.
#[derive(Debug, Clone)]
pub struct Model {
    /// Identity used to key instance batches.
    pub id: ModelId,
    /// Vertex buffer shared by all meshes.
    pub vertex_buffer: VertexBufferHandle,
    /// Index buffer shared by all meshes.
    pub index_buffer: IndexBufferHandle,
    /// Meshes in draw order.
    pub meshes: Vec<Mesh>,
    /// Skeleton, empty for rigid models.
    pub bones: Vec<Bone>,
    /// Whether the buffers finished loading.
    pub ready: bool,
}

/// Animated bone transforms in model space, one entry per bone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    /// Bone positions.
    pub positions: Vec<Vec3>,
    /// Bone rotations.
    pub rotations: Vec<Quaternion>,
}

impl Pose {
    /// Number of posed bones.
    pub fn len(&self) -> usize {
        self.positions.len().min(self.rotations.len())
    }

    /// Whether the pose has no bones.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One mesh of one model instance, produced by a visibility query.
#[derive(Debug, Clone)]
pub struct RenderableMesh {
    /// Owning entity.
    pub entity: EntityId,
    /// The model.
    pub model: Arc<Model>,
    /// Index of the mesh in [`Model::meshes`].
    pub mesh_index: usize,
    /// World transform.
    pub world: Mat4,
    /// Animated pose, for skinned meshes.
    pub pose: Option<Arc<Pose>>,
}

impl RenderableMesh {
    /// The mesh this record draws.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.model.meshes.get(self.mesh_index)
    }
}
