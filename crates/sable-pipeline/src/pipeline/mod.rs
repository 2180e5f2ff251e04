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

//! The pipeline: loaded resources plus the frame driver running its program.
//!
//! Loading turns a [`PipelineDefinition`] into framebuffers, uniforms, materials and
//! a compiled [`Program`]. Every [`Pipeline::render`] call starts from a clean frame
//! state, runs the program operation by operation and leaves nothing from the scene
//! behind. A failing operation logs and is skipped; the frame always completes.

mod draw;
mod ops;
mod shadow_pass;

use crate::arena::FrameArena;
use crate::batch::{InstanceBatcher, TerrainBatcher};
use crate::binding::{BuiltinUniforms, GlobalTexture};
use crate::commands::{CommandContext, CommandRegistry};
use crate::context::FrameContext;
use crate::definition::PipelineDefinition;
use crate::error::{PipelineError, Result};
use crate::framebuffer::{FrameBuffer, FrameBufferDecl, FrameBufferRegistry};
use crate::program::{MaterialIndex, Program, UniformIndex};
use crate::settings::PipelineSettings;
use crate::shadow::{DirectionalShadows, ShadowRecords};
use crate::source::PipelineSource;
use crate::view::ViewMultiplexer;
use sable_core::math::{Frustum, Mat4};
use sable_core::renderer::{
    GpuDevice, Material, MaterialProvider, RenderState, RenderStats, UniformHandle, UniformKind,
};
use sable_core::scene::{CameraId, CameraParams, RenderScene};
use std::path::Path;
use std::sync::Arc;

/// The camera applied by the last `ApplyCamera` of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedCamera {
    /// Scene camera.
    pub id: CameraId,
    /// Its parameters at the time it was applied.
    pub params: CameraParams,
    /// View matrix.
    pub view: Mat4,
    /// Projection matrix.
    pub projection: Mat4,
    /// Culling volume.
    pub frustum: Frustum,
}

/// Collaborators of one `render` call.
pub(crate) struct Frame<'a> {
    pub ctx: &'a mut FrameContext,
    pub device: &'a mut dyn GpuDevice,
    pub scene: &'a dyn RenderScene,
}

/// Everything a loaded definition created.
pub(crate) struct Resources {
    pub settings: PipelineSettings,
    pub framebuffers: FrameBufferRegistry,
    pub program: Program,
    pub builtins: BuiltinUniforms,
    pub materials: Vec<Option<Arc<Material>>>,
    pub material_paths: Vec<String>,
    pub uniforms: Vec<UniformHandle>,
    pub uniform_names: Vec<String>,
}

impl Resources {
    pub fn material(&self, index: MaterialIndex) -> Option<&Arc<Material>> {
        self.materials.get(index.0).and_then(Option::as_ref)
    }

    fn release(mut self, device: &mut dyn GpuDevice, keep: &[UniformHandle]) {
        self.framebuffers.clear(device);
        for handle in self.uniforms.iter().filter(|h| !keep.contains(h)) {
            device.destroy_uniform(*handle);
        }
    }
}

/// Per-frame state, rebuilt at the start of every `render`.
pub(crate) struct FrameState {
    pub width: u32,
    pub height: u32,
    pub views: ViewMultiplexer,
    pub arena: FrameArena,
    pub batcher: InstanceBatcher,
    pub terrain_batcher: TerrainBatcher,
    pub directional: DirectionalShadows,
    pub records: ShadowRecords,
    pub render_state: RenderState,
    pub camera: Option<AppliedCamera>,
    pub global_textures: Vec<GlobalTexture>,
    pub stats: RenderStats,
    pub rendering_shadowmap: bool,
}

impl FrameState {
    fn new(width: u32, height: u32, settings: &PipelineSettings) -> Self {
        Self {
            width,
            height,
            views: ViewMultiplexer::new(),
            arena: FrameArena::new(),
            batcher: InstanceBatcher::new(
                settings.instance_batch_slots,
                settings.instance_batch_capacity,
            ),
            terrain_batcher: TerrainBatcher::new(settings.terrain_instance_capacity),
            directional: DirectionalShadows::default(),
            records: ShadowRecords::new(settings.max_shadow_records),
            render_state: RenderState::FRAME_DEFAULT,
            camera: None,
            global_textures: Vec::new(),
            stats: RenderStats::default(),
            rendering_shadowmap: false,
        }
    }

    fn configure(&mut self, settings: &PipelineSettings) {
        self.batcher = InstanceBatcher::new(
            settings.instance_batch_slots,
            settings.instance_batch_capacity,
        );
        self.terrain_batcher = TerrainBatcher::new(settings.terrain_instance_capacity);
        self.records.set_capacity(settings.max_shadow_records);
    }

    fn begin(&mut self, max_views: u16) {
        self.views.reset(max_views);
        self.batcher.clear();
        self.terrain_batcher.finish();
        self.directional.reset();
        self.records.clear();
        self.render_state = RenderState::FRAME_DEFAULT;
        self.camera = None;
        self.global_textures.clear();
        self.stats = RenderStats::default();
        self.rendering_shadowmap = false;
    }

    fn end(&mut self) {
        let pending = self.batcher.pending_instances();
        if pending > 0 {
            log::debug!("Pipeline: dropping {} unflushed instances at frame end", pending);
            self.batcher.clear();
        }
        self.arena.reset();
    }
}

/// A render pipeline.
///
/// Rendering requires a loaded definition; an unloaded pipeline renders nothing.
pub struct Pipeline {
    resources: Option<Resources>,
    frame: FrameState,
    commands: CommandRegistry,
    source: Option<PipelineSource>,
    wireframe: bool,
}

impl Pipeline {
    /// Creates an unloaded pipeline rendering at `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resources: None,
            frame: FrameState::new(width, height, &PipelineSettings::default()),
            commands: CommandRegistry::new(),
            source: None,
            wireframe: false,
        }
    }

    /// Creates every resource of `definition` and makes it the running configuration.
    ///
    /// Either the whole definition is loaded, or the previous configuration keeps
    /// running untouched.
    ///
    /// ## Errors
    /// * `UnknownMaterial`, `UnknownUniform` - If an operation names an undeclared resource.
    /// * `DuplicateFramebuffer`, `ReservedFramebufferName` - If framebuffer names clash.
    /// * `Resource` - If the device refuses a framebuffer or uniform.
    pub fn load(
        &mut self,
        device: &mut dyn GpuDevice,
        materials: &mut dyn MaterialProvider,
        definition: &PipelineDefinition,
    ) -> Result<()> {
        match self.build(device, materials, definition) {
            Ok(resources) => {
                let keep = resources.uniforms.clone();
                if let Some(old) = self.resources.replace(resources) {
                    old.release(device, &keep);
                }
                self.frame.configure(&definition.settings);
                log::info!(
                    "Pipeline: loaded {} operations, {} framebuffers, {} materials",
                    definition.frame.len(),
                    definition.framebuffers.len(),
                    definition.materials.len()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("Pipeline: failed to load definition: {}", e);
                Err(e)
            }
        }
    }

    fn build(
        &self,
        device: &mut dyn GpuDevice,
        provider: &mut dyn MaterialProvider,
        definition: &PipelineDefinition,
    ) -> Result<Resources> {
        let program = definition.compile()?;
        let settings = definition.settings.clone();

        let (builtins, fresh_builtins) = match &self.resources {
            Some(old) => (old.builtins.clone(), false),
            None => (BuiltinUniforms::create(device, settings.max_bone_count)?, true),
        };
        // Handles alive before this load; a device may hand them out again by name.
        let live: Vec<UniformHandle> = self
            .resources
            .iter()
            .flat_map(|old| old.uniforms.iter().copied())
            .collect();
        let mut framebuffers = FrameBufferRegistry::new();
        let mut uniforms = Vec::with_capacity(definition.uniforms.len());
        let discard = |device: &mut dyn GpuDevice,
                       framebuffers: &mut FrameBufferRegistry,
                       uniforms: &[UniformHandle]| {
            framebuffers.clear(device);
            for handle in uniforms.iter().filter(|h| !live.contains(h)) {
                device.destroy_uniform(*handle);
            }
            if fresh_builtins {
                builtins.destroy(device);
            }
        };

        for decl in &definition.framebuffers {
            let decl = self.sized(decl);
            if let Err(e) = framebuffers.declare(device, &decl) {
                discard(device, &mut framebuffers, &uniforms);
                return Err(e);
            }
        }

        for name in &definition.uniforms {
            match device.create_uniform(name, UniformKind::Sampler, 1) {
                Ok(handle) => uniforms.push(handle),
                Err(e) => {
                    discard(device, &mut framebuffers, &uniforms);
                    return Err(e.into());
                }
            }
        }

        let loaded = definition
            .materials
            .iter()
            .map(|decl| {
                let material = provider.load_material(&decl.path);
                if material.is_none() {
                    log::warn!(
                        "Pipeline: material '{}' ({}) not found, drawing a placeholder",
                        decl.name,
                        decl.path
                    );
                }
                material
            })
            .collect();

        Ok(Resources {
            settings,
            framebuffers,
            program,
            builtins,
            materials: loaded,
            material_paths: definition.materials.iter().map(|m| m.path.clone()).collect(),
            uniforms,
            uniform_names: definition.uniforms.clone(),
        })
    }

    fn sized(&self, decl: &FrameBufferDecl) -> FrameBufferDecl {
        let mut decl = decl.clone();
        if decl.default && self.frame.width > 0 && self.frame.height > 0 {
            decl.width = self.frame.width;
            decl.height = self.frame.height;
        }
        decl
    }

    /// Parses a RON definition and loads it.
    pub fn load_ron(
        &mut self,
        device: &mut dyn GpuDevice,
        materials: &mut dyn MaterialProvider,
        text: &str,
    ) -> Result<()> {
        let definition = PipelineDefinition::from_ron(text).inspect_err(|e| {
            log::error!("Pipeline: {}", e);
        })?;
        self.load(device, materials, &definition)
    }

    /// Loads the definition at `path` and watches it for [`Self::reload_if_changed`].
    pub fn load_file(
        &mut self,
        device: &mut dyn GpuDevice,
        materials: &mut dyn MaterialProvider,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut source = PipelineSource::new(path);
        let definition = source.read().inspect_err(|e| {
            log::error!("Pipeline: {}", e);
        })?;
        self.source = Some(source);
        self.load(device, materials, &definition)
    }

    /// Reloads the watched definition file if it changed. Returns `true` when a new
    /// definition is running. On any failure the previous one keeps running.
    pub fn reload_if_changed(
        &mut self,
        device: &mut dyn GpuDevice,
        materials: &mut dyn MaterialProvider,
    ) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        match source.poll() {
            Ok(Some(definition)) => self.load(device, materials, &definition).is_ok(),
            Ok(None) => false,
            Err(e) => {
                log::error!("Pipeline: {:#}", e);
                false
            }
        }
    }

    /// Destroys every resource. The pipeline renders nothing until loaded again.
    pub fn unload(&mut self, device: &mut dyn GpuDevice) {
        if let Some(resources) = self.resources.take() {
            resources.builtins.destroy(device);
            resources.release(device, &[]);
            log::debug!("Pipeline: unloaded");
        }
    }

    /// Whether a definition is loaded.
    pub fn is_loaded(&self) -> bool {
        self.resources.is_some()
    }

    /// Runs the loaded program once.
    ///
    /// Frame state from the previous call (views, shadow records, batches, render
    /// state, bound textures) is reset first, whatever happened in that call.
    pub fn render(
        &mut self,
        ctx: &mut FrameContext,
        device: &mut dyn GpuDevice,
        scene: &dyn RenderScene,
    ) {
        self.frame.begin(device.max_views());
        let Some(resources) = self.resources.as_ref() else {
            log::trace!("Pipeline: render called without a loaded definition");
            return;
        };
        let mut frame = Frame { ctx, device, scene };
        for operation in resources.program.operations() {
            self.frame
                .execute(resources, &mut self.commands, &mut frame, operation);
        }
        self.frame.end();
    }

    /// Changes the output size. The swap chain is reset and size-following
    /// framebuffers are recreated.
    pub fn resize(&mut self, device: &mut dyn GpuDevice, width: u32, height: u32) {
        self.frame.width = width;
        self.frame.height = height;
        device.reset(width, height);
        let Some(resources) = self.resources.as_mut() else {
            return;
        };
        for name in resources.framebuffers.size_following() {
            if let Err(e) = resources.framebuffers.resize(device, &name, width, height) {
                log::error!("Pipeline: failed to resize '{}': {}", name, e);
            }
        }
    }

    /// Toggles wireframe rendering.
    pub fn set_wireframe(&mut self, device: &mut dyn GpuDevice, enabled: bool) {
        self.wireframe = enabled;
        device.set_debug_wireframe(enabled);
    }

    /// Whether wireframe rendering is on.
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Registers a callback for `ExecuteCustomCommand(name)`.
    pub fn register_command(
        &mut self,
        name: &str,
        command: impl FnMut(&mut CommandContext<'_>) + 'static,
    ) {
        self.commands.register(name, command);
    }

    /// Loads a material for the running configuration. The index stays valid until
    /// the next load.
    ///
    /// ## Errors
    /// * `MaterialLoad` - If no definition is loaded or the provider misses the path.
    pub fn load_material(
        &mut self,
        materials: &mut dyn MaterialProvider,
        path: &str,
    ) -> Result<MaterialIndex> {
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| PipelineError::MaterialLoad(path.to_string()))?;
        if let Some(index) = resources.material_paths.iter().position(|p| p == path) {
            if resources.materials[index].is_some() {
                return Ok(MaterialIndex(index));
            }
        }
        let material = materials
            .load_material(path)
            .ok_or_else(|| PipelineError::MaterialLoad(path.to_string()))?;
        resources.materials.push(Some(material));
        resources.material_paths.push(path.to_string());
        Ok(MaterialIndex(resources.materials.len() - 1))
    }

    /// Creates a sampler uniform for the running configuration.
    ///
    /// ## Errors
    /// * `UnknownUniform` - If no definition is loaded.
    /// * `Resource` - If the device refuses the uniform.
    pub fn create_uniform(&mut self, device: &mut dyn GpuDevice, name: &str) -> Result<UniformIndex> {
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| PipelineError::UnknownUniform(name.to_string()))?;
        if let Some(index) = resources.uniform_names.iter().position(|n| n == name) {
            return Ok(UniformIndex(index));
        }
        let handle = device.create_uniform(name, UniformKind::Sampler, 1)?;
        resources.uniforms.push(handle);
        resources.uniform_names.push(name.to_string());
        Ok(UniformIndex(resources.uniforms.len() - 1))
    }

    /// Counters of the last `render` call.
    pub fn stats(&self) -> RenderStats {
        self.frame.stats
    }

    /// Output width.
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    /// Output height.
    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Settings of the running configuration.
    pub fn settings(&self) -> Option<&PipelineSettings> {
        self.resources.as_ref().map(|r| &r.settings)
    }

    /// The framebuffer named `name` in the running configuration.
    pub fn framebuffer(&self, name: &str) -> Option<&FrameBuffer> {
        self.resources.as_ref()?.framebuffers.find(name)
    }

    /// Directional cascades rendered by the last frame.
    pub fn directional_shadows(&self) -> &DirectionalShadows {
        &self.frame.directional
    }

    /// Local shadow maps rendered by the last frame.
    pub fn shadow_records(&self) -> &ShadowRecords {
        &self.frame.records
    }

    /// Camera applied last in the last frame.
    pub fn applied_camera(&self) -> Option<&AppliedCamera> {
        self.frame.camera.as_ref()
    }

    /// Render state word at the end of the last frame.
    pub fn render_state(&self) -> RenderState {
        self.frame.render_state
    }

    /// Views allocated by the last frame, in allocation order.
    pub fn allocated_views(&self) -> &[sable_core::renderer::ViewId] {
        self.frame.views.allocated_views()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("loaded", &self.resources.is_some())
            .field("width", &self.frame.width)
            .field("height", &self.frame.height)
            .field("commands", &self.commands)
            .finish()
    }
}
