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

//! Terrain quads and grass patches.

use super::model::Model;
use super::TerrainId;
use crate::math::{Mat4, Vec3};
use crate::renderer::{IndexBufferHandle, Material, VertexBufferHandle};
use std::sync::Arc;

/// A heightmap terrain. Every visible quad draws the same patch geometry, scaled and
/// morphed by its instance data.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Identity used to group quads into batches.
    pub id: TerrainId,
    /// Terrain material.
    pub material: Arc<Material>,
    /// Patch vertices.
    pub vertex_buffer: VertexBufferHandle,
    /// Patch indices.
    pub index_buffer: IndexBufferHandle,
    /// Number of patch indices.
    pub index_count: u32,
    /// Size of the root quad in heightmap texels.
    pub root_size: f32,
    /// Horizontal and vertical scale.
    pub scale: Vec3,
}

/// One visible quad of a terrain's quadtree.
#[derive(Debug, Clone)]
pub struct TerrainInfo {
    /// The terrain.
    pub terrain: Arc<Terrain>,
    /// World transform of the terrain.
    pub world: Mat4,
    /// Geomorphing constants.
    pub morph_const: Vec3,
    /// Quad edge length.
    pub size: f32,
    /// Quad minimum corner.
    pub min: Vec3,
    /// Child index of the quad in its parent.
    pub index: u32,
}

/// A patch of grass blades sharing one model.
#[derive(Debug, Clone)]
pub struct GrassInfo {
    /// Blade model.
    pub model: Arc<Model>,
    /// World transform of every blade.
    pub matrices: Arc<[Mat4]>,
}
