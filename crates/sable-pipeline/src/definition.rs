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

//! The pipeline definition document.
//!
//! A definition is a RON file naming the framebuffers, materials and sampler
//! uniforms a pipeline needs, and the operations it runs every frame:
//!
//! ```ron
//! (
//!     framebuffers: [
//!         (name: "shadowmap", width: 2048, height: 2048,
//!          attachments: [(format: Depth24, depth: true)]),
//!     ],
//!     materials: [(name: "screen", path: "pipelines/screen.mat")],
//!     uniforms: ["u_texShadowmapView"],
//!     frame: [
//!         SetPass("SHADOW"),
//!         SetFramebuffer("shadowmap"),
//!         Clear(buffers: Depth),
//!         RenderShadowmap(layer_mask: 1, camera: "main"),
//!         SetPass("MAIN"),
//!         SetFramebuffer("default"),
//!         ApplyCamera("main"),
//!         Clear(buffers: All, color: 0x303030ff),
//!         RenderModels(layer_mask: 1),
//!     ],
//! )
//! ```

use crate::error::{PipelineError, Result};
use crate::framebuffer::FrameBufferDecl;
use crate::program::{MaterialIndex, Operation, Program, UniformIndex};
use crate::settings::PipelineSettings;
use ahash::AHashMap;
use sable_core::renderer::BlendMode;
use serde::{Deserialize, Serialize};

/// A material the definition refers to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDecl {
    /// Name used by operations.
    pub name: String,
    /// Resource path handed to the material provider.
    pub path: String,
}

/// Buffers a `Clear` operation resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearTarget {
    /// Color, depth and stencil.
    All,
    /// Depth only.
    Depth,
}

fn default_layer_mask() -> u64 {
    u64::MAX
}

fn default_clear_color() -> u32 {
    0x0000_00ff
}

/// One operation as written in a definition, with names instead of indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationDef {
    /// Selects the view of a named pass.
    SetPass(String),
    /// Binds a framebuffer, or the swap chain for `"default"`.
    SetFramebuffer(String),
    /// Binds the swap chain.
    UnbindFramebuffer,
    /// Applies the camera assigned to a slot.
    ApplyCamera(String),
    /// Clears the current view.
    Clear {
        /// Buffers to clear.
        buffers: ClearTarget,
        /// `0xRRGGBBAA`.
        #[serde(default = "default_clear_color")]
        color: u32,
    },
    /// Draws the visible scene.
    RenderModels {
        /// Layers drawn.
        #[serde(default = "default_layer_mask")]
        layer_mask: u64,
        /// Draw once per visible point light instead of with the global light.
        #[serde(default)]
        point_lights: bool,
    },
    /// Renders the directional cascades into the current framebuffer.
    RenderShadowmap {
        /// Layers casting shadows.
        #[serde(default = "default_layer_mask")]
        layer_mask: u64,
        /// Camera slot the cascades are fitted to.
        camera: String,
    },
    /// Renders shadow maps of the local lights closest to a camera.
    RenderLocalLightsShadowmaps {
        /// Layers casting shadows.
        #[serde(default = "default_layer_mask")]
        layer_mask: u64,
        /// Framebuffers handed out to lights, in order.
        framebuffers: Vec<String>,
        /// Camera slot the lights are sorted by.
        camera: String,
    },
    /// Binds a framebuffer attachment as a sampler for later draws.
    BindFramebufferTexture {
        /// Framebuffer name.
        framebuffer: String,
        /// Attachment index.
        attachment: usize,
        /// Declared sampler uniform name.
        uniform: String,
    },
    /// Draws a screen quad in `[-1, 1]` coordinates.
    DrawQuad {
        /// Left.
        x: f32,
        /// Top.
        y: f32,
        /// Width.
        w: f32,
        /// Height.
        h: f32,
        /// Declared material name.
        material: String,
    },
    /// Runs a host callback.
    ExecuteCustomCommand(String),
    /// Enables a blend equation.
    EnableBlending(BlendMode),
    /// Disables blending.
    DisableBlending,
    /// Enables depth writes.
    EnableDepthWrite,
    /// Disables depth writes.
    DisableDepthWrite,
    /// Enables alpha writes.
    EnableAlphaWrite,
    /// Disables alpha writes.
    DisableAlphaWrite,
    /// Enables color writes.
    EnableRgbWrite,
    /// Disables color writes.
    DisableRgbWrite,
    /// Draws particle emitters.
    RenderParticles,
    /// Draws debug lines and points.
    RenderDebugShapes,
    /// Prints debug text.
    RenderDebugTexts,
}

/// A pipeline definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefinition {
    /// Tunables.
    pub settings: PipelineSettings,
    /// Render targets.
    pub framebuffers: Vec<FrameBufferDecl>,
    /// Materials used by `DrawQuad`.
    pub materials: Vec<MaterialDecl>,
    /// Sampler uniforms used by `BindFramebufferTexture`.
    pub uniforms: Vec<String>,
    /// Material drawing debug shapes and placeholders.
    pub debug_material: Option<String>,
    /// Operations run every frame, in order.
    pub frame: Vec<OperationDef>,
}

impl PipelineDefinition {
    /// Parses a RON document.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::de::from_bytes(text.as_bytes()).map_err(|e| PipelineError::Parse(e.to_string()))
    }

    /// Serializes the definition to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PipelineError::Parse(e.to_string()))
    }

    /// Resolves material and uniform names into indices.
    ///
    /// ## Errors
    /// * `UnknownMaterial` - If an operation or `debug_material` names an undeclared material.
    /// * `UnknownUniform` - If an operation names an undeclared uniform.
    pub fn compile(&self) -> Result<Program> {
        let materials: AHashMap<&str, MaterialIndex> = self
            .materials
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), MaterialIndex(i)))
            .collect();
        let uniforms: AHashMap<&str, UniformIndex> = self
            .uniforms
            .iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), UniformIndex(i)))
            .collect();
        let material = |name: &str| {
            materials
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::UnknownMaterial(name.to_string()))
        };

        let debug_material = self.debug_material.as_deref().map(material).transpose()?;
        let operations = self
            .frame
            .iter()
            .map(|op| {
                Ok(match op {
                    OperationDef::SetPass(name) => Operation::SetPass(name.clone()),
                    OperationDef::SetFramebuffer(name) => Operation::SetFramebuffer(name.clone()),
                    OperationDef::UnbindFramebuffer => Operation::UnbindFramebuffer,
                    OperationDef::ApplyCamera(slot) => Operation::ApplyCamera(slot.clone()),
                    OperationDef::Clear { buffers, color } => Operation::Clear {
                        buffers: *buffers,
                        color: *color,
                    },
                    OperationDef::RenderModels {
                        layer_mask,
                        point_lights,
                    } => Operation::RenderModels {
                        layer_mask: *layer_mask,
                        point_lights: *point_lights,
                    },
                    OperationDef::RenderShadowmap { layer_mask, camera } => {
                        Operation::RenderShadowmap {
                            layer_mask: *layer_mask,
                            camera: camera.clone(),
                        }
                    }
                    OperationDef::RenderLocalLightsShadowmaps {
                        layer_mask,
                        framebuffers,
                        camera,
                    } => Operation::RenderLocalLightsShadowmaps {
                        layer_mask: *layer_mask,
                        framebuffers: framebuffers.clone(),
                        camera: camera.clone(),
                    },
                    OperationDef::BindFramebufferTexture {
                        framebuffer,
                        attachment,
                        uniform,
                    } => Operation::BindFramebufferTexture {
                        framebuffer: framebuffer.clone(),
                        attachment: *attachment,
                        uniform: uniforms
                            .get(uniform.as_str())
                            .copied()
                            .ok_or_else(|| PipelineError::UnknownUniform(uniform.clone()))?,
                    },
                    OperationDef::DrawQuad {
                        x,
                        y,
                        w,
                        h,
                        material: name,
                    } => Operation::DrawQuad {
                        rect: [*x, *y, *w, *h],
                        material: material(name)?,
                    },
                    OperationDef::ExecuteCustomCommand(name) => {
                        Operation::ExecuteCustomCommand(name.clone())
                    }
                    OperationDef::EnableBlending(mode) => Operation::EnableBlending(*mode),
                    OperationDef::DisableBlending => Operation::DisableBlending,
                    OperationDef::EnableDepthWrite => Operation::SetDepthWrite(true),
                    OperationDef::DisableDepthWrite => Operation::SetDepthWrite(false),
                    OperationDef::EnableAlphaWrite => Operation::SetAlphaWrite(true),
                    OperationDef::DisableAlphaWrite => Operation::SetAlphaWrite(false),
                    OperationDef::EnableRgbWrite => Operation::SetRgbWrite(true),
                    OperationDef::DisableRgbWrite => Operation::SetRgbWrite(false),
                    OperationDef::RenderParticles => Operation::RenderParticles,
                    OperationDef::RenderDebugShapes => Operation::RenderDebugShapes,
                    OperationDef::RenderDebugTexts => Operation::RenderDebugTexts,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Program::new(operations, debug_material))
    }
}
