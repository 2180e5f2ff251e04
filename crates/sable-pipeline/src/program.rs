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

//! The compiled per-frame operation list.

use crate::definition::ClearTarget;
use sable_core::renderer::BlendMode;

/// Index of a material loaded by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialIndex(pub usize);

/// Index of a sampler uniform created by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformIndex(pub usize);

/// One step of a frame.
///
/// Framebuffer names and camera slots stay names: they are looked up when the
/// operation runs and a miss skips the operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Selects the view of a named pass.
    SetPass(String),
    /// Binds a framebuffer by name; `"default"` is the swap chain.
    SetFramebuffer(String),
    /// Binds the swap chain.
    UnbindFramebuffer,
    /// Applies the camera in a slot.
    ApplyCamera(String),
    /// Clears the current view.
    Clear {
        /// Buffers to clear.
        buffers: ClearTarget,
        /// `0xRRGGBBAA`.
        color: u32,
    },
    /// Draws the visible scene.
    RenderModels {
        /// Layers drawn.
        layer_mask: u64,
        /// Draw per visible point light.
        point_lights: bool,
    },
    /// Renders the directional cascades.
    RenderShadowmap {
        /// Layers casting shadows.
        layer_mask: u64,
        /// Camera slot.
        camera: String,
    },
    /// Renders local light shadow maps.
    RenderLocalLightsShadowmaps {
        /// Layers casting shadows.
        layer_mask: u64,
        /// Framebuffers handed out to lights.
        framebuffers: Vec<String>,
        /// Camera slot.
        camera: String,
    },
    /// Binds a framebuffer attachment for later draws.
    BindFramebufferTexture {
        /// Framebuffer name.
        framebuffer: String,
        /// Attachment index.
        attachment: usize,
        /// Sampler uniform.
        uniform: UniformIndex,
    },
    /// Draws a screen quad.
    DrawQuad {
        /// `x, y, w, h` in `[-1, 1]` screen space.
        rect: [f32; 4],
        /// Material.
        material: MaterialIndex,
    },
    /// Runs a host callback.
    ExecuteCustomCommand(String),
    /// Enables a blend equation.
    EnableBlending(BlendMode),
    /// Disables blending.
    DisableBlending,
    /// Toggles depth writes.
    SetDepthWrite(bool),
    /// Toggles alpha writes.
    SetAlphaWrite(bool),
    /// Toggles color writes.
    SetRgbWrite(bool),
    /// Draws particle emitters.
    RenderParticles,
    /// Draws debug lines and points.
    RenderDebugShapes,
    /// Prints debug text.
    RenderDebugTexts,
}

impl Operation {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetPass(_) => "setPass",
            Operation::SetFramebuffer(_) => "setFramebuffer",
            Operation::UnbindFramebuffer => "unbindFramebuffer",
            Operation::ApplyCamera(_) => "applyCamera",
            Operation::Clear { .. } => "clear",
            Operation::RenderModels { .. } => "renderModels",
            Operation::RenderShadowmap { .. } => "renderShadowmap",
            Operation::RenderLocalLightsShadowmaps { .. } => "renderLocalLightsShadowmaps",
            Operation::BindFramebufferTexture { .. } => "bindFramebufferTexture",
            Operation::DrawQuad { .. } => "drawQuad",
            Operation::ExecuteCustomCommand(_) => "executeCustomCommand",
            Operation::EnableBlending(_) => "enableBlending",
            Operation::DisableBlending => "disableBlending",
            Operation::SetDepthWrite(_) => "setDepthWrite",
            Operation::SetAlphaWrite(_) => "setAlphaWrite",
            Operation::SetRgbWrite(_) => "setRgbWrite",
            Operation::RenderParticles => "renderParticles",
            Operation::RenderDebugShapes => "renderDebugShapes",
            Operation::RenderDebugTexts => "renderDebugTexts",
        }
    }
}

/// A compiled frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    operations: Vec<Operation>,
    debug_material: Option<MaterialIndex>,
}

impl Program {
    /// Wraps an operation list.
    pub fn new(operations: Vec<Operation>, debug_material: Option<MaterialIndex>) -> Self {
        Self {
            operations,
            debug_material,
        }
    }

    /// Operations in execution order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Material for debug shapes and placeholders.
    pub fn debug_material(&self) -> Option<MaterialIndex> {
        self.debug_material
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the frame does nothing.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
