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

//! Tunable limits and constants of the pipeline.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Tunables read from the `settings` block of a pipeline definition.
///
/// Every field has a default, so a definition only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Number of instance batch slots.
    pub instance_batch_slots: usize,
    /// Instances per batch before a forced flush.
    pub instance_batch_capacity: usize,
    /// Terrain quads per instanced terrain draw.
    pub terrain_instance_capacity: usize,
    /// Particles per instanced particle draw.
    pub particle_group_size: usize,
    /// Candidate lights considered for local shadow maps, nearest first.
    pub max_local_shadow_lights: usize,
    /// Local shadow records kept per frame.
    pub max_shadow_records: usize,
    /// Near plane of the directional shadow projection.
    pub shadow_ortho_near: f32,
    /// Far plane of the directional shadow projection.
    pub shadow_ortho_far: f32,
    /// Near distance of the first cascade.
    pub first_cascade_near: f32,
    /// Near plane of local light shadow projections.
    pub local_shadow_near: f32,
    /// Bones uploaded per skinned draw.
    pub max_bone_count: usize,
    /// Framebuffer textures bound for later draws.
    pub max_global_textures: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            instance_batch_slots: 128,
            instance_batch_capacity: 64,
            terrain_instance_capacity: 256,
            particle_group_size: 256,
            max_local_shadow_lights: 16,
            max_shadow_records: 16,
            shadow_ortho_near: 50.0,
            shadow_ortho_far: 5000.0,
            first_cascade_near: 0.01,
            local_shadow_near: 0.01,
            max_bone_count: 64,
            max_global_textures: 8,
        }
    }
}

impl PipelineSettings {
    /// Parses settings from a RON document.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::de::from_bytes(text.as_bytes()).map_err(|e| PipelineError::Parse(e.to_string()))
    }

    /// Serializes the settings to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PipelineError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let settings = PipelineSettings::from_ron("(instance_batch_capacity: 32)").unwrap();
        assert_eq!(settings.instance_batch_capacity, 32);
        assert_eq!(settings.instance_batch_slots, 128);
        assert_eq!(settings.shadow_ortho_far, 5000.0);
    }

    #[test]
    fn test_pretty_output_parses_back() {
        let settings = PipelineSettings {
            max_bone_count: 32,
            ..Default::default()
        };
        let text = settings.to_ron().unwrap();
        assert_eq!(PipelineSettings::from_ron(&text).unwrap(), settings);
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let err = PipelineSettings::from_ron("(batch_size: 3)").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }
}
