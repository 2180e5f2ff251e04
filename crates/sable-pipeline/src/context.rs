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

//! State shared by every pipeline rendering within the same host frame.

use ahash::AHashMap;
use sable_core::renderer::ViewId;

/// Index of a named pass. A name keeps its index for the life of the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(pub u16);

/// The view allocator and pass-name table shared by all pipelines.
///
/// Several pipelines (a game view, an editor preview) render into the same device
/// each frame and must not hand out the same view twice, so the view counter lives
/// here instead of in a pipeline, and is never reset.
#[derive(Debug, Default)]
pub struct FrameContext {
    next_view: u16,
    pass_names: Vec<String>,
    pass_ids: AHashMap<String, PassId>,
}

impl FrameContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next view slot, wrapping at `max_views`.
    pub fn next_view(&mut self, max_views: u16) -> ViewId {
        let limit = max_views.max(1);
        let view = self.next_view % limit;
        self.next_view = (view + 1) % limit;
        view
    }

    /// Returns the index of `name`, registering it on first use.
    pub fn pass_id(&mut self, name: &str) -> PassId {
        if let Some(id) = self.pass_ids.get(name) {
            return *id;
        }
        let id = PassId(self.pass_names.len() as u16);
        self.pass_names.push(name.to_string());
        self.pass_ids.insert(name.to_string(), id);
        log::trace!("FrameContext: registered pass '{}' as {}", name, id.0);
        id
    }

    /// Name registered for `id`.
    pub fn pass_name(&self, id: PassId) -> Option<&str> {
        self.pass_names.get(id.0 as usize).map(String::as_str)
    }

    /// Number of registered passes.
    pub fn pass_count(&self) -> usize {
        self.pass_names.len()
    }
}
