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

//! Mapping of named passes onto device view slots.
//!
//! A pass requested twice in one frame lands in the same view, so separate script
//! sections can keep adding draws to one phase. Shadow rendering and framebuffer
//! switches force fresh views through [`ViewMultiplexer::allocate_view`].

use crate::context::{FrameContext, PassId};
use sable_core::math::LinearRgba;
use sable_core::renderer::{ClearFlags, FrameBufferHandle, GpuDevice, ViewId};

/// Per-pipeline view bookkeeping for the current frame.
#[derive(Debug, Default)]
pub struct ViewMultiplexer {
    view_to_pass: Vec<Option<PassId>>,
    allocated: Vec<ViewId>,
    current_view: Option<ViewId>,
    current_pass: Option<PassId>,
    current_framebuffer: Option<FrameBufferHandle>,
}

impl ViewMultiplexer {
    /// Creates an empty multiplexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every mapping made this frame. The shared view counter is untouched.
    pub fn reset(&mut self, max_views: u16) {
        self.view_to_pass.clear();
        self.view_to_pass.resize(max_views as usize, None);
        self.allocated.clear();
        self.current_view = None;
        self.current_pass = None;
        self.current_framebuffer = None;
    }

    /// Selects the view for pass `name`, reusing the latest view of that pass if the
    /// frame already has one.
    pub fn set_pass(
        &mut self,
        ctx: &mut FrameContext,
        device: &mut dyn GpuDevice,
        name: &str,
    ) -> ViewId {
        let pass = ctx.pass_id(name);
        self.current_pass = Some(pass);
        let reused = self
            .allocated
            .iter()
            .rev()
            .copied()
            .find(|view| self.pass_of(*view) == Some(pass));
        match reused {
            Some(view) => {
                self.current_view = Some(view);
                view
            }
            None => self.allocate_view(ctx, device),
        }
    }

    /// Takes a fresh view for the current pass, bound to the current framebuffer.
    pub fn allocate_view(&mut self, ctx: &mut FrameContext, device: &mut dyn GpuDevice) -> ViewId {
        let max_views = device.max_views();
        if self.view_to_pass.len() < max_views as usize {
            self.view_to_pass.resize(max_views as usize, None);
        }
        let view = ctx.next_view(max_views);
        if let Some(slot) = self.view_to_pass.get_mut(view as usize) {
            *slot = self.current_pass;
        }
        self.allocated.push(view);
        self.current_view = Some(view);
        device.set_view_framebuffer(view, self.current_framebuffer);
        device.set_view_clear(view, ClearFlags::NONE, LinearRgba::BLACK, 1.0);
        log::trace!(
            "ViewMultiplexer: allocated view {} for pass {:?}",
            view,
            self.current_pass
        );
        view
    }

    /// The current view, allocating one if the frame has none yet.
    pub fn ensure_view(&mut self, ctx: &mut FrameContext, device: &mut dyn GpuDevice) -> ViewId {
        match self.current_view {
            Some(view) => view,
            None => self.allocate_view(ctx, device),
        }
    }

    /// Binds `framebuffer` (`None` for the swap chain) to the current view and to
    /// every view allocated after this call.
    pub fn set_framebuffer(
        &mut self,
        device: &mut dyn GpuDevice,
        framebuffer: Option<FrameBufferHandle>,
    ) {
        self.current_framebuffer = framebuffer;
        if let Some(view) = self.current_view {
            device.set_view_framebuffer(view, framebuffer);
        }
    }

    /// Sets the framebuffer of views allocated from now on, leaving the current view
    /// bound where it is.
    pub fn set_next_framebuffer(&mut self, framebuffer: Option<FrameBufferHandle>) {
        self.current_framebuffer = framebuffer;
    }

    /// Pass recorded for `view` this frame.
    pub fn pass_of(&self, view: ViewId) -> Option<PassId> {
        self.view_to_pass.get(view as usize).copied().flatten()
    }

    /// The current view.
    pub fn current_view(&self) -> Option<ViewId> {
        self.current_view
    }

    /// The current pass.
    pub fn current_pass(&self) -> Option<PassId> {
        self.current_pass
    }

    /// The framebuffer new views are bound to.
    pub fn current_framebuffer(&self) -> Option<FrameBufferHandle> {
        self.current_framebuffer
    }

    /// Views allocated this frame, in allocation order.
    pub fn allocated_views(&self) -> &[ViewId] {
        &self.allocated
    }
}
