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

//! Terrain quad batching.

use bytemuck::{Pod, Zeroable};
use sable_core::math::{Mat4, Vec4};
use sable_core::scene::{Terrain, TerrainInfo};
use std::sync::Arc;

/// Per-quad instance record read by the terrain shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainInstance {
    /// Quad minimum corner in `xyz`, quad size in `w`.
    pub min_size: Vec4,
    /// Morph constants in `xyz`, child index in `w`.
    pub morph: Vec4,
}

impl TerrainInstance {
    /// Packs a visible quad.
    pub fn from_info(info: &TerrainInfo) -> Self {
        Self {
            min_size: Vec4::from_vec3(info.min, info.size),
            morph: Vec4::from_vec3(info.morph_const, info.index as f32),
        }
    }
}

/// Quads of one terrain ready for one instanced draw.
#[derive(Debug, Clone)]
pub struct TerrainBatch {
    /// The terrain.
    pub terrain: Arc<Terrain>,
    /// World transform of the terrain.
    pub world: Mat4,
    /// Quad records.
    pub instances: Vec<TerrainInstance>,
}

/// Groups consecutive quads of the same terrain, up to a fixed count per draw.
#[derive(Debug)]
pub struct TerrainBatcher {
    capacity: usize,
    current: Option<(Arc<Terrain>, Mat4)>,
    instances: Vec<TerrainInstance>,
}

impl TerrainBatcher {
    /// Creates a batcher drawing up to `capacity` quads at once.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            current: None,
            instances: Vec::new(),
        }
    }

    /// Adds a quad. Returns the previous batch when the terrain changed or the batch
    /// was already full.
    pub fn add(&mut self, info: &TerrainInfo) -> Option<TerrainBatch> {
        let same_terrain = self
            .current
            .as_ref()
            .is_some_and(|(terrain, _)| terrain.id == info.terrain.id);
        let flushed = if !same_terrain || self.instances.len() >= self.capacity {
            self.finish()
        } else {
            None
        };
        if self.current.is_none() {
            self.current = Some((Arc::clone(&info.terrain), info.world));
        }
        self.instances.push(TerrainInstance::from_info(info));
        flushed
    }

    /// Closes the open batch.
    pub fn finish(&mut self) -> Option<TerrainBatch> {
        let (terrain, world) = self.current.take()?;
        if self.instances.is_empty() {
            return None;
        }
        Some(TerrainBatch {
            terrain,
            world,
            instances: std::mem::take(&mut self.instances),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::math::Vec3;
    use sable_core::renderer::{IndexBufferHandle, VertexBufferHandle};
    use sable_core::scene::TerrainId;
    use sable_core::testing::fixtures;

    fn terrain(id: u32) -> Arc<Terrain> {
        Arc::new(Terrain {
            id: TerrainId(id),
            material: fixtures::material("terrain.mat", &["MAIN"]),
            vertex_buffer: VertexBufferHandle(1),
            index_buffer: IndexBufferHandle(1),
            index_count: 96,
            root_size: 1024.0,
            scale: Vec3::ONE,
        })
    }

    fn quad(terrain: &Arc<Terrain>, index: u32) -> TerrainInfo {
        TerrainInfo {
            terrain: Arc::clone(terrain),
            world: Mat4::IDENTITY,
            morph_const: Vec3::new(1.0, 2.0, 3.0),
            size: 16.0,
            min: Vec3::new(index as f32 * 16.0, 0.0, 0.0),
            index,
        }
    }

    #[test]
    fn test_terrain_change_closes_batch() {
        let a = terrain(1);
        let b = terrain(2);
        let mut batcher = TerrainBatcher::new(256);
        assert!(batcher.add(&quad(&a, 0)).is_none());
        assert!(batcher.add(&quad(&a, 1)).is_none());
        let closed = batcher.add(&quad(&b, 0)).unwrap();
        assert_eq!(closed.terrain.id, TerrainId(1));
        assert_eq!(closed.instances.len(), 2);
        assert_eq!(closed.instances[1].min_size, Vec4::new(16.0, 0.0, 0.0, 16.0));
        assert_eq!(batcher.finish().unwrap().terrain.id, TerrainId(2));
    }

    #[test]
    fn test_cap_splits_batches() {
        let a = terrain(1);
        let mut batcher = TerrainBatcher::new(2);
        let mut sizes = Vec::new();
        for i in 0..5 {
            if let Some(batch) = batcher.add(&quad(&a, i)) {
                sizes.push(batch.instances.len());
            }
        }
        sizes.extend(batcher.finish().map(|b| b.instances.len()));
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
