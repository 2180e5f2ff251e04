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

//! Instance accumulation for meshes, terrain quads and particles.
//!
//! Batchers only stage CPU data. Uploading and submitting a batch is the pipeline's
//! job, since it needs the material and light state of the draw group.

pub mod instance;
pub mod particle;
pub mod terrain;

pub use self::instance::{BatchKey, Flushed, InstanceBatch, InstanceBatcher};
pub use self::particle::{pack_particles, particle_groups, ParticleInstance};
pub use self::terrain::{TerrainBatch, TerrainBatcher, TerrainInstance};
