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

//! Frame-scoped scratch lists.
//!
//! Visibility queries run many times per frame (once per cascade, once per light).
//! Their result lists are taken from a pool and handed back when the draw group is
//! done, so steady-state frames reuse the same allocations. Lists are cleared on
//! return, which drops the `Arc` references they held into the scene.

use sable_core::math::Mat4;
use sable_core::scene::{GrassInfo, LightId, RenderableMesh, TerrainInfo};

/// A pool of reusable `Vec<T>`.
#[derive(Debug)]
pub struct VecPool<T> {
    free: Vec<Vec<T>>,
    outstanding: usize,
}

impl<T> Default for VecPool<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            outstanding: 0,
        }
    }
}

impl<T> VecPool<T> {
    /// Takes an empty list, reusing a returned one if possible.
    pub fn take(&mut self) -> Vec<T> {
        self.outstanding += 1;
        self.free.pop().unwrap_or_default()
    }

    /// Returns a list to the pool, dropping its contents.
    pub fn recycle(&mut self, mut list: Vec<T>) {
        list.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push(list);
    }

    /// Lists taken and not returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Lists ready for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    fn reset(&mut self) -> usize {
        std::mem::replace(&mut self.outstanding, 0)
    }
}

/// Scratch lists used while rendering one frame.
#[derive(Debug, Default)]
pub struct FrameArena {
    /// Mesh draw records.
    pub renderables: VecPool<RenderableMesh>,
    /// Terrain quads.
    pub terrains: VecPool<TerrainInfo>,
    /// Grass patches.
    pub grass: VecPool<GrassInfo>,
    /// Light ids.
    pub lights: VecPool<LightId>,
    /// Matrices staged for upload.
    pub matrices: VecPool<Mat4>,
}

impl FrameArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the frame. Lists still out are dropped by their holders; the counters
    /// start over.
    pub fn reset(&mut self) {
        let leaked = self.renderables.reset()
            + self.terrains.reset()
            + self.grass.reset()
            + self.lights.reset()
            + self.matrices.reset();
        if leaked > 0 {
            log::debug!("FrameArena: {} scratch lists not returned this frame", leaked);
        }
    }

    /// Lists taken and not returned, over every pool.
    pub fn outstanding(&self) -> usize {
        self.renderables.outstanding()
            + self.terrains.outstanding()
            + self.grass.outstanding()
            + self.lights.outstanding()
            + self.matrices.outstanding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recycled_list_is_reused_empty() {
        let mut arena = FrameArena::new();
        let mut lights = arena.lights.take();
        lights.push(LightId(3));
        let capacity = lights.capacity();
        arena.lights.recycle(lights);

        let again = arena.lights.take();
        assert!(again.is_empty());
        assert_eq!(again.capacity(), capacity);
        arena.lights.recycle(again);
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    fn test_reset_forgets_outstanding_lists() {
        let mut arena = FrameArena::new();
        let _kept = arena.matrices.take();
        assert_eq!(arena.outstanding(), 1);
        arena.reset();
        assert_eq!(arena.outstanding(), 0);
    }
}
