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

//! The immediate-mode GPU contract the render pipeline drives.

use super::error::ResourceError;
use super::handle::*;
use super::state::{ClearFlags, RenderState};
use super::target::{FrameBufferDesc, UniformKind};
use crate::math::{LinearRgba, Mat4, Vec4};

/// An immediate-mode, view-based graphics API.
///
/// Draw state (buffers, textures, transform, render state) is accumulated by the
/// `set_*` calls and consumed by the next [`GpuDevice::submit`]. Uniform values stay
/// set until overwritten. Views are executed in id order by the backend, each with
/// its own rect, transform, framebuffer and clear.
pub trait GpuDevice {
    /// Number of view slots available. View ids wrap at this value.
    fn max_views(&self) -> u16;

    /// Creates a framebuffer with the given attachments.
    /// ## Arguments
    /// * `desc` - Name, size and attachments.
    /// ## Errors
    /// * `ResourceError` - If the backend cannot allocate the render targets.
    fn create_framebuffer(&mut self, desc: &FrameBufferDesc<'_>)
        -> Result<FrameBufferHandle, ResourceError>;

    /// Destroys a framebuffer and its attachments.
    fn destroy_framebuffer(&mut self, handle: FrameBufferHandle);

    /// Returns the texture backing attachment `attachment` of a framebuffer.
    fn framebuffer_texture(
        &self,
        handle: FrameBufferHandle,
        attachment: usize,
    ) -> Option<TextureHandle>;

    /// Creates a named uniform.
    /// ## Arguments
    /// * `name` - Shader-side uniform name.
    /// * `kind` - Vector, matrix or sampler.
    /// * `count` - Array length (1 for scalars and samplers).
    /// ## Errors
    /// * `ResourceError` - If the backend refuses the uniform.
    fn create_uniform(
        &mut self,
        name: &str,
        kind: UniformKind,
        count: u16,
    ) -> Result<UniformHandle, ResourceError>;

    /// Destroys a uniform.
    fn destroy_uniform(&mut self, handle: UniformHandle);

    /// Resizes the swap chain.
    fn reset(&mut self, width: u32, height: u32);

    /// Sets the viewport of a view.
    fn set_view_rect(&mut self, view: ViewId, rect: ViewRect);

    /// Sets the view and projection matrices of a view.
    fn set_view_transform(&mut self, view: ViewId, view_matrix: &Mat4, projection: &Mat4);

    /// Binds a framebuffer to a view. `None` targets the swap chain.
    fn set_view_framebuffer(&mut self, view: ViewId, framebuffer: Option<FrameBufferHandle>);

    /// Sets what a view clears before its draws.
    fn set_view_clear(&mut self, view: ViewId, flags: ClearFlags, color: LinearRgba, depth: f32);

    /// Forces a view to execute even if nothing is submitted to it.
    fn touch(&mut self, view: ViewId);

    /// Uploads an array of `vec4` values.
    fn set_uniform_vec4(&mut self, uniform: UniformHandle, values: &[Vec4]);

    /// Uploads an array of `mat4` values.
    fn set_uniform_mat4(&mut self, uniform: UniformHandle, values: &[Mat4]);

    /// Binds a texture to a sampler stage for the next draw.
    fn set_texture(&mut self, stage: u8, sampler: UniformHandle, texture: TextureHandle);

    /// Sets the model matrix for the next draw.
    fn set_transform(&mut self, matrix: &Mat4);

    /// Sets the render-state word for the next draw.
    fn set_state(&mut self, state: RenderState);

    /// Sets a range of a static vertex buffer for the next draw.
    fn set_vertex_buffer(&mut self, buffer: VertexBufferHandle, first_vertex: u32, count: u32);

    /// Sets a range of a static index buffer for the next draw.
    fn set_index_buffer(&mut self, buffer: IndexBufferHandle, first_index: u32, count: u32);

    /// Sets a transient vertex buffer for the next draw.
    fn set_transient_vertex_buffer(&mut self, buffer: &TransientVertexBuffer);

    /// Sets a transient index buffer for the next draw.
    fn set_transient_index_buffer(&mut self, buffer: &TransientIndexBuffer);

    /// Sets per-instance data for the next draw.
    fn set_instance_data_buffer(&mut self, buffer: &InstanceDataBuffer);

    /// Allocates frame-lifetime vertex data. `None` when the transient pool is exhausted.
    fn alloc_transient_vertex_buffer(
        &mut self,
        data: &[u8],
        stride: u16,
    ) -> Option<TransientVertexBuffer>;

    /// Allocates frame-lifetime 16-bit indices.
    fn alloc_transient_index_buffer(&mut self, indices: &[u16]) -> Option<TransientIndexBuffer>;

    /// Allocates frame-lifetime instance data.
    fn alloc_instance_data_buffer(&mut self, data: &[u8], stride: u16)
        -> Option<InstanceDataBuffer>;

    /// Submits the accumulated draw state to a view and resets it.
    fn submit(&mut self, view: ViewId, program: ProgramHandle);

    /// Clears the debug text overlay.
    fn debug_text_clear(&mut self);

    /// Prints a line on the debug text overlay.
    fn debug_text_print(&mut self, x: u16, y: u16, attribute: u8, text: &str);

    /// Toggles wireframe rendering of every draw.
    fn set_debug_wireframe(&mut self, enabled: bool);
}
