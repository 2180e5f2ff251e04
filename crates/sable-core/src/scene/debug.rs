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

//! Debug primitives and particle emitters.

use crate::math::{LinearRgba, Vec3};
use crate::renderer::Material;
use std::sync::Arc;

/// A colored line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Start point.
    pub from: Vec3,
    /// End point.
    pub to: Vec3,
    /// Line color.
    pub color: LinearRgba,
}

/// A colored point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugPoint {
    /// Position.
    pub pos: Vec3,
    /// Point color.
    pub color: LinearRgba,
}

/// The live particles of one emitter, in emission order.
///
/// The three arrays are parallel; only the common prefix is drawn.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    /// Billboard material.
    pub material: Arc<Material>,
    /// Particle centers.
    pub positions: Vec<Vec3>,
    /// Billboard half sizes.
    pub sizes: Vec<f32>,
    /// Opacity.
    pub alphas: Vec<f32>,
}

impl ParticleEmitter {
    /// Number of drawable particles.
    pub fn len(&self) -> usize {
        self.positions
            .len()
            .min(self.sizes.len())
            .min(self.alphas.len())
    }

    /// Whether the emitter has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
