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

//! Per-frame submission statistics.

/// Counters for one `render()` call of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Number of `submit` calls.
    pub draw_calls: u32,
    /// Number of instances drawn, counting a non-instanced draw as one.
    pub instances: u32,
    /// Number of triangles drawn.
    pub triangles: u32,
}

impl RenderStats {
    /// Records one draw of `instances` copies of `index_count` indices.
    pub fn record_draw(&mut self, index_count: u32, instances: u32) {
        self.draw_calls += 1;
        self.instances += instances;
        self.triangles += index_count / 3 * instances;
    }
}
