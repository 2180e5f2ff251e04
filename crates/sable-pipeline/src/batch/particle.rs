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

//! Billboard particle groups.

use bytemuck::{Pod, Zeroable};
use sable_core::math::Vec4;
use sable_core::scene::ParticleEmitter;
use std::ops::Range;

/// Per-particle instance record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Center in `xyz`, half size in `w`.
    pub position_size: Vec4,
    /// Opacity in `x`.
    pub params: Vec4,
}

/// Ranges of `len` particles split into groups of `group_size`, in emission order.
pub fn particle_groups(len: usize, group_size: usize) -> impl Iterator<Item = Range<usize>> {
    let group_size = group_size.max(1);
    (0..len)
        .step_by(group_size)
        .map(move |start| start..(start + group_size).min(len))
}

/// Packs particles `range` of `emitter` into `out`, replacing its contents.
pub fn pack_particles(emitter: &ParticleEmitter, range: Range<usize>, out: &mut Vec<ParticleInstance>) {
    out.clear();
    let end = range.end.min(emitter.len());
    for i in range.start..end {
        out.push(ParticleInstance {
            position_size: Vec4::from_vec3(emitter.positions[i], emitter.sizes[i]),
            params: Vec4::new(emitter.alphas[i], 0.0, 0.0, 0.0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::math::Vec3;
    use sable_core::testing::fixtures;

    #[test]
    fn test_groups_cover_every_particle() {
        let groups: Vec<_> = particle_groups(600, 256).collect();
        assert_eq!(groups, vec![0..256, 256..512, 512..600]);
        assert_eq!(particle_groups(0, 256).count(), 0);
    }

    #[test]
    fn test_packing_stops_at_shortest_array() {
        let emitter = ParticleEmitter {
            material: fixtures::material("smoke.mat", &["MAIN"]),
            positions: vec![Vec3::X, Vec3::Y, Vec3::Z],
            sizes: vec![0.5, 1.0, 2.0],
            alphas: vec![1.0, 0.5],
        };
        let mut out = Vec::new();
        pack_particles(&emitter, 0..3, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].position_size, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(out[1].params.x, 0.5);
    }
}
