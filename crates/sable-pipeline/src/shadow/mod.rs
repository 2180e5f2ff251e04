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

//! Shadow map bookkeeping for one frame.
//!
//! The directional light owns one set of four cascade matrices. Every local light
//! that rendered a shadow map this frame leaves a [`ShadowRecord`], found again by
//! light id when the light is bound for lighting.

pub mod cascade;
pub mod local;

pub use self::cascade::{
    cascade_ranges, fit_cascade, light_basis, quadrant_rect, snap_to_texel, texel_step,
    CascadeView, CASCADE_COUNT, QUADRANTS, SHADOW_BIAS,
};
pub use self::local::{local_views, omni_view, spot_view, LocalShadowView};

use sable_core::math::{Mat4, Vec4};
use sable_core::renderer::{FrameBufferHandle, TextureHandle};
use sable_core::scene::LightId;

/// Cascades of the directional light rendered this frame.
#[derive(Debug, Clone, Default)]
pub struct DirectionalShadows {
    /// `bias * projection * view` per rendered cascade, near to far.
    pub matrices: Vec<Mat4>,
    /// Camera distance range of each rendered cascade.
    pub ranges: Vec<(f32, f32)>,
    /// Far distance of each cascade.
    pub splits: Vec4,
    /// Framebuffer the cascades were rendered into.
    pub framebuffer: Option<FrameBufferHandle>,
    /// Depth texture sampled by lit draws.
    pub texture: Option<TextureHandle>,
}

impl DirectionalShadows {
    /// Forgets the previous frame's cascades.
    pub fn reset(&mut self) {
        self.matrices.clear();
        self.ranges.clear();
        self.splits = Vec4::ZERO;
        self.framebuffer = None;
        self.texture = None;
    }

    /// Whether a shadow map can be sampled.
    pub fn is_available(&self) -> bool {
        self.texture.is_some() && !self.matrices.is_empty()
    }

    /// The matrices padded with identity to the full cascade count, as uploaded.
    pub fn padded_matrices(&self) -> [Mat4; CASCADE_COUNT] {
        std::array::from_fn(|i| self.matrices.get(i).copied().unwrap_or(Mat4::IDENTITY))
    }
}

/// The shadow map of one local light.
#[derive(Debug, Clone)]
pub struct ShadowRecord {
    /// The light.
    pub light: LightId,
    /// Framebuffer holding the map.
    pub framebuffer: FrameBufferHandle,
    /// Depth texture of the framebuffer.
    pub texture: Option<TextureHandle>,
    /// One matrix for a spot light, four for an omni light.
    pub matrices: Vec<Mat4>,
}

/// Local shadow maps rendered this frame, capped.
#[derive(Debug, Clone, Default)]
pub struct ShadowRecords {
    records: Vec<ShadowRecord>,
    capacity: usize,
}

impl ShadowRecords {
    /// A list holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Changes the cap. Records past it are dropped.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.records.truncate(capacity);
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Whether another record fits.
    pub fn has_room(&self) -> bool {
        self.records.len() < self.capacity
    }

    /// Stores a record. Returns `false` and drops it when the list is full.
    pub fn push(&mut self, record: ShadowRecord) -> bool {
        if !self.has_room() {
            log::warn!(
                "ShadowRecords: list full ({}), dropping shadow map of light {:?}",
                self.capacity,
                record.light
            );
            return false;
        }
        self.records.push(record);
        true
    }

    /// The record of `light`, if it rendered a shadow map this frame.
    pub fn find(&self, light: LightId) -> Option<&ShadowRecord> {
        self.records.iter().find(|r| r.light == light)
    }

    /// Records in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &ShadowRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no light rendered a shadow map.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(light: u32) -> ShadowRecord {
        ShadowRecord {
            light: LightId(light),
            framebuffer: FrameBufferHandle(light),
            texture: Some(TextureHandle(light)),
            matrices: vec![Mat4::IDENTITY],
        }
    }

    #[test]
    fn test_lookup_is_by_light_not_position() {
        let mut records = ShadowRecords::new(4);
        records.push(record(7));
        records.push(record(3));
        assert_eq!(records.find(LightId(3)).unwrap().framebuffer, FrameBufferHandle(3));
        assert!(records.find(LightId(5)).is_none());
    }

    #[test]
    fn test_full_list_drops_excess() {
        let mut records = ShadowRecords::new(1);
        assert!(records.push(record(1)));
        assert!(!records.push(record(2)));
        assert_eq!(records.len(), 1);
        assert!(records.find(LightId(2)).is_none());
    }

    #[test]
    fn test_directional_reset() {
        let mut shadows = DirectionalShadows {
            matrices: vec![Mat4::ZERO; 2],
            texture: Some(TextureHandle(4)),
            ..Default::default()
        };
        assert!(shadows.is_available());
        let padded = shadows.padded_matrices();
        assert_eq!(padded[1], Mat4::ZERO);
        assert_eq!(padded[3], Mat4::IDENTITY);

        shadows.reset();
        assert!(!shadows.is_available());
        assert!(shadows.matrices.is_empty());
    }
}
