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

//! A [`GpuDevice`] that records every call instead of rendering.

use crate::math::{LinearRgba, Mat4, Vec4};
use crate::renderer::*;
use std::collections::HashMap;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// A framebuffer was created.
    CreateFramebuffer {
        /// Returned handle.
        handle: FrameBufferHandle,
        /// Debug name.
        name: String,
        /// Width.
        width: u32,
        /// Height.
        height: u32,
        /// Number of attachments.
        attachments: usize,
    },
    /// A framebuffer was destroyed.
    DestroyFramebuffer(FrameBufferHandle),
    /// A uniform was created.
    CreateUniform {
        /// Returned handle.
        handle: UniformHandle,
        /// Uniform name.
        name: String,
        /// Shape.
        kind: UniformKind,
        /// Array length.
        count: u16,
    },
    /// A uniform was destroyed.
    DestroyUniform(UniformHandle),
    /// The swap chain was resized.
    Reset {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// A view rect was set.
    SetViewRect(ViewId, ViewRect),
    /// A view transform was set.
    SetViewTransform {
        /// View.
        view: ViewId,
        /// View matrix.
        view_matrix: Mat4,
        /// Projection matrix.
        projection: Mat4,
    },
    /// A framebuffer was bound to a view.
    SetViewFramebuffer(ViewId, Option<FrameBufferHandle>),
    /// A view clear was set.
    SetViewClear {
        /// View.
        view: ViewId,
        /// What to clear.
        flags: ClearFlags,
        /// Clear color.
        color: LinearRgba,
        /// Clear depth.
        depth: f32,
    },
    /// A view was touched.
    Touch(ViewId),
    /// A `vec4` array was uploaded.
    SetUniformVec4(UniformHandle, Vec<Vec4>),
    /// A `mat4` array was uploaded.
    SetUniformMat4(UniformHandle, Vec<Mat4>),
    /// A texture was bound.
    SetTexture {
        /// Sampler stage.
        stage: u8,
        /// Sampler uniform.
        sampler: UniformHandle,
        /// Texture.
        texture: TextureHandle,
    },
    /// A model matrix was set.
    SetTransform(Mat4),
    /// A render state was set.
    SetState(RenderState),
    /// A static vertex buffer was set.
    SetVertexBuffer(VertexBufferHandle, u32, u32),
    /// A static index buffer was set.
    SetIndexBuffer(IndexBufferHandle, u32, u32),
    /// A transient vertex buffer was set.
    SetTransientVertexBuffer(TransientVertexBuffer),
    /// A transient index buffer was set.
    SetTransientIndexBuffer(TransientIndexBuffer),
    /// An instance data buffer was set.
    SetInstanceDataBuffer(InstanceDataBuffer),
    /// Transient vertices were allocated.
    AllocTransientVertexBuffer(TransientVertexBuffer),
    /// Transient indices were allocated.
    AllocTransientIndexBuffer(TransientIndexBuffer),
    /// Instance data was allocated.
    AllocInstanceDataBuffer(InstanceDataBuffer),
    /// A draw was submitted.
    Submit(ViewId, ProgramHandle),
    /// The debug text overlay was cleared.
    DebugTextClear,
    /// A debug text line was printed.
    DebugTextPrint {
        /// Column.
        x: u16,
        /// Row.
        y: u16,
        /// Text.
        text: String,
    },
    /// Wireframe mode was toggled.
    SetDebugWireframe(bool),
}

/// Draw state captured at one `submit`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Submission {
    /// Target view.
    pub view: ViewId,
    /// Program.
    pub program: Option<ProgramHandle>,
    /// Model matrix, if set.
    pub transform: Option<Mat4>,
    /// Render state, if set.
    pub state: Option<RenderState>,
    /// Bound textures as `(stage, sampler, texture)`.
    pub textures: Vec<(u8, UniformHandle, TextureHandle)>,
    /// Static vertex buffer range.
    pub vertex_buffer: Option<(VertexBufferHandle, u32, u32)>,
    /// Static index buffer range.
    pub index_buffer: Option<(IndexBufferHandle, u32, u32)>,
    /// Transient vertices.
    pub transient_vertices: Option<TransientVertexBuffer>,
    /// Transient indices.
    pub transient_indices: Option<TransientIndexBuffer>,
    /// Instance data.
    pub instances: Option<InstanceDataBuffer>,
}

impl Submission {
    /// Number of instances drawn (1 without instance data).
    pub fn instance_count(&self) -> u32 {
        self.instances.map_or(1, |i| i.count)
    }
}

#[derive(Debug, Clone)]
struct RecordedFrameBuffer {
    name: String,
    width: u32,
    height: u32,
    textures: Vec<TextureHandle>,
}

/// Records device calls and tracks the resulting state for assertions.
#[derive(Debug)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    submissions: Vec<Submission>,
    pending: Submission,
    next_id: u32,
    max_views: u16,
    framebuffers: HashMap<FrameBufferHandle, RecordedFrameBuffer>,
    uniforms: HashMap<String, UniformHandle>,
    uniform_values_vec4: HashMap<UniformHandle, Vec<Vec4>>,
    uniform_values_mat4: HashMap<UniformHandle, Vec<Mat4>>,
    instance_data: HashMap<u32, Vec<u8>>,
    view_framebuffers: HashMap<ViewId, Option<FrameBufferHandle>>,
    view_rects: HashMap<ViewId, ViewRect>,
    /// When set, framebuffer creation fails.
    pub fail_framebuffers: bool,
    /// When set, transient and instance allocations fail.
    pub transient_exhausted: bool,
}

impl RecordingDevice {
    /// A device with 256 views.
    pub fn new() -> Self {
        Self::with_max_views(256)
    }

    /// A device with `max_views` views.
    pub fn with_max_views(max_views: u16) -> Self {
        Self {
            calls: Vec::new(),
            submissions: Vec::new(),
            pending: Submission::default(),
            next_id: 1,
            max_views,
            framebuffers: HashMap::new(),
            uniforms: HashMap::new(),
            uniform_values_vec4: HashMap::new(),
            uniform_values_mat4: HashMap::new(),
            instance_data: HashMap::new(),
            view_framebuffers: HashMap::new(),
            view_rects: HashMap::new(),
            fail_framebuffers: false,
            transient_exhausted: false,
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Every call since creation or the last [`Self::clear_calls`].
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Every submission since creation or the last [`Self::clear_calls`].
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Forgets recorded calls and submissions. Resource and uniform state is kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.submissions.clear();
        self.instance_data.clear();
    }

    /// Submissions that went to `view`.
    pub fn submissions_to(&self, view: ViewId) -> Vec<&Submission> {
        self.submissions.iter().filter(|s| s.view == view).collect()
    }

    /// The handle of a uniform created with `name`.
    pub fn uniform(&self, name: &str) -> Option<UniformHandle> {
        self.uniforms.get(name).copied()
    }

    /// Last `vec4` values uploaded to the uniform named `name`.
    pub fn uniform_vec4(&self, name: &str) -> Option<&[Vec4]> {
        let handle = self.uniform(name)?;
        self.uniform_values_vec4.get(&handle).map(Vec::as_slice)
    }

    /// Last `mat4` values uploaded to the uniform named `name`.
    pub fn uniform_mat4(&self, name: &str) -> Option<&[Mat4]> {
        let handle = self.uniform(name)?;
        self.uniform_values_mat4.get(&handle).map(Vec::as_slice)
    }

    /// Bytes of an instance data buffer allocated since the last [`Self::clear_calls`].
    pub fn instance_bytes(&self, buffer: &InstanceDataBuffer) -> Option<&[u8]> {
        self.instance_data.get(&buffer.id).map(Vec::as_slice)
    }

    /// Handles of the live framebuffers named `name`.
    pub fn framebuffers_named(&self, name: &str) -> Vec<FrameBufferHandle> {
        let mut handles: Vec<_> = self
            .framebuffers
            .iter()
            .filter(|(_, fb)| fb.name == name)
            .map(|(h, _)| *h)
            .collect();
        handles.sort();
        handles
    }

    /// Size of a live framebuffer.
    pub fn framebuffer_size(&self, handle: FrameBufferHandle) -> Option<(u32, u32)> {
        self.framebuffers.get(&handle).map(|fb| (fb.width, fb.height))
    }

    /// Number of live framebuffers.
    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Framebuffer currently bound to `view`. Outer `None` if the view was never bound.
    pub fn view_framebuffer(&self, view: ViewId) -> Option<Option<FrameBufferHandle>> {
        self.view_framebuffers.get(&view).copied()
    }

    /// Rect currently set on `view`.
    pub fn view_rect(&self, view: ViewId) -> Option<ViewRect> {
        self.view_rects.get(&view).copied()
    }

    /// Views that received a framebuffer binding, in first-binding order.
    pub fn bound_views(&self) -> Vec<ViewId> {
        let mut views = Vec::new();
        for call in &self.calls {
            if let DeviceCall::SetViewFramebuffer(view, _) = call {
                if !views.contains(view) {
                    views.push(*view);
                }
            }
        }
        views
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for RecordingDevice {
    fn max_views(&self) -> u16 {
        self.max_views
    }

    fn create_framebuffer(
        &mut self,
        desc: &FrameBufferDesc<'_>,
    ) -> Result<FrameBufferHandle, ResourceError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(ResourceError::InvalidDimensions {
                name: desc.name.to_string(),
                width: desc.width,
                height: desc.height,
            });
        }
        if self.fail_framebuffers {
            log::debug!("RecordingDevice: refusing framebuffer '{}'", desc.name);
            return Err(ResourceError::FrameBufferCreation {
                name: desc.name.to_string(),
                reason: "device configured to fail".to_string(),
            });
        }
        let handle = FrameBufferHandle(self.next_id());
        let textures = desc
            .attachments
            .iter()
            .map(|_| TextureHandle(self.next_id()))
            .collect();
        self.framebuffers.insert(
            handle,
            RecordedFrameBuffer {
                name: desc.name.to_string(),
                width: desc.width,
                height: desc.height,
                textures,
            },
        );
        self.calls.push(DeviceCall::CreateFramebuffer {
            handle,
            name: desc.name.to_string(),
            width: desc.width,
            height: desc.height,
            attachments: desc.attachments.len(),
        });
        Ok(handle)
    }

    fn destroy_framebuffer(&mut self, handle: FrameBufferHandle) {
        self.framebuffers.remove(&handle);
        self.calls.push(DeviceCall::DestroyFramebuffer(handle));
    }

    fn framebuffer_texture(
        &self,
        handle: FrameBufferHandle,
        attachment: usize,
    ) -> Option<TextureHandle> {
        self.framebuffers
            .get(&handle)
            .and_then(|fb| fb.textures.get(attachment).copied())
    }

    fn create_uniform(
        &mut self,
        name: &str,
        kind: UniformKind,
        count: u16,
    ) -> Result<UniformHandle, ResourceError> {
        if name.is_empty() {
            return Err(ResourceError::UniformCreation {
                name: String::new(),
                reason: "empty name".to_string(),
            });
        }
        if let Some(handle) = self.uniforms.get(name) {
            return Ok(*handle);
        }
        let handle = UniformHandle(self.next_id());
        self.uniforms.insert(name.to_string(), handle);
        self.calls.push(DeviceCall::CreateUniform {
            handle,
            name: name.to_string(),
            kind,
            count,
        });
        Ok(handle)
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        self.uniforms.retain(|_, h| *h != handle);
        self.calls.push(DeviceCall::DestroyUniform(handle));
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.calls.push(DeviceCall::Reset { width, height });
    }

    fn set_view_rect(&mut self, view: ViewId, rect: ViewRect) {
        self.view_rects.insert(view, rect);
        self.calls.push(DeviceCall::SetViewRect(view, rect));
    }

    fn set_view_transform(&mut self, view: ViewId, view_matrix: &Mat4, projection: &Mat4) {
        self.calls.push(DeviceCall::SetViewTransform {
            view,
            view_matrix: *view_matrix,
            projection: *projection,
        });
    }

    fn set_view_framebuffer(&mut self, view: ViewId, framebuffer: Option<FrameBufferHandle>) {
        self.view_framebuffers.insert(view, framebuffer);
        self.calls.push(DeviceCall::SetViewFramebuffer(view, framebuffer));
    }

    fn set_view_clear(&mut self, view: ViewId, flags: ClearFlags, color: LinearRgba, depth: f32) {
        self.calls.push(DeviceCall::SetViewClear {
            view,
            flags,
            color,
            depth,
        });
    }

    fn touch(&mut self, view: ViewId) {
        self.calls.push(DeviceCall::Touch(view));
    }

    fn set_uniform_vec4(&mut self, uniform: UniformHandle, values: &[Vec4]) {
        self.uniform_values_vec4.insert(uniform, values.to_vec());
        self.calls.push(DeviceCall::SetUniformVec4(uniform, values.to_vec()));
    }

    fn set_uniform_mat4(&mut self, uniform: UniformHandle, values: &[Mat4]) {
        self.uniform_values_mat4.insert(uniform, values.to_vec());
        self.calls.push(DeviceCall::SetUniformMat4(uniform, values.to_vec()));
    }

    fn set_texture(&mut self, stage: u8, sampler: UniformHandle, texture: TextureHandle) {
        self.pending.textures.push((stage, sampler, texture));
        self.calls.push(DeviceCall::SetTexture {
            stage,
            sampler,
            texture,
        });
    }

    fn set_transform(&mut self, matrix: &Mat4) {
        self.pending.transform = Some(*matrix);
        self.calls.push(DeviceCall::SetTransform(*matrix));
    }

    fn set_state(&mut self, state: RenderState) {
        self.pending.state = Some(state);
        self.calls.push(DeviceCall::SetState(state));
    }

    fn set_vertex_buffer(&mut self, buffer: VertexBufferHandle, first_vertex: u32, count: u32) {
        self.pending.vertex_buffer = Some((buffer, first_vertex, count));
        self.calls
            .push(DeviceCall::SetVertexBuffer(buffer, first_vertex, count));
    }

    fn set_index_buffer(&mut self, buffer: IndexBufferHandle, first_index: u32, count: u32) {
        self.pending.index_buffer = Some((buffer, first_index, count));
        self.calls
            .push(DeviceCall::SetIndexBuffer(buffer, first_index, count));
    }

    fn set_transient_vertex_buffer(&mut self, buffer: &TransientVertexBuffer) {
        self.pending.transient_vertices = Some(*buffer);
        self.calls.push(DeviceCall::SetTransientVertexBuffer(*buffer));
    }

    fn set_transient_index_buffer(&mut self, buffer: &TransientIndexBuffer) {
        self.pending.transient_indices = Some(*buffer);
        self.calls.push(DeviceCall::SetTransientIndexBuffer(*buffer));
    }

    fn set_instance_data_buffer(&mut self, buffer: &InstanceDataBuffer) {
        self.pending.instances = Some(*buffer);
        self.calls.push(DeviceCall::SetInstanceDataBuffer(*buffer));
    }

    fn alloc_transient_vertex_buffer(
        &mut self,
        data: &[u8],
        stride: u16,
    ) -> Option<TransientVertexBuffer> {
        if self.transient_exhausted || stride == 0 {
            log::debug!("RecordingDevice: alloc_transient_vertex_buffer refused ({} bytes)", data.len());
            return None;
        }
        let buffer = TransientVertexBuffer {
            id: self.next_id(),
            count: (data.len() / stride as usize) as u32,
            stride,
        };
        self.calls.push(DeviceCall::AllocTransientVertexBuffer(buffer));
        Some(buffer)
    }

    fn alloc_transient_index_buffer(&mut self, indices: &[u16]) -> Option<TransientIndexBuffer> {
        if self.transient_exhausted {
            log::debug!("RecordingDevice: alloc_transient_index_buffer refused");
            return None;
        }
        let buffer = TransientIndexBuffer {
            id: self.next_id(),
            count: indices.len() as u32,
        };
        self.calls.push(DeviceCall::AllocTransientIndexBuffer(buffer));
        Some(buffer)
    }

    fn alloc_instance_data_buffer(
        &mut self,
        data: &[u8],
        stride: u16,
    ) -> Option<InstanceDataBuffer> {
        if self.transient_exhausted || stride == 0 {
            log::debug!("RecordingDevice: alloc_instance_data_buffer refused ({} bytes)", data.len());
            return None;
        }
        let buffer = InstanceDataBuffer {
            id: self.next_id(),
            count: (data.len() / stride as usize) as u32,
            stride,
        };
        self.instance_data.insert(buffer.id, data.to_vec());
        self.calls.push(DeviceCall::AllocInstanceDataBuffer(buffer));
        Some(buffer)
    }

    fn submit(&mut self, view: ViewId, program: ProgramHandle) {
        let mut submission = std::mem::take(&mut self.pending);
        submission.view = view;
        submission.program = Some(program);
        self.submissions.push(submission);
        self.calls.push(DeviceCall::Submit(view, program));
    }

    fn debug_text_clear(&mut self) {
        self.calls.push(DeviceCall::DebugTextClear);
    }

    fn debug_text_print(&mut self, x: u16, y: u16, _attribute: u8, text: &str) {
        self.calls.push(DeviceCall::DebugTextPrint {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn set_debug_wireframe(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::SetDebugWireframe(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{AttachmentDesc, TextureFormat};

    #[test]
    fn test_submit_captures_pending_state() {
        let mut device = RecordingDevice::new();
        device.set_state(RenderState::WRITE_RGB);
        device.set_transform(&Mat4::IDENTITY);
        device.submit(3, ProgramHandle(7));
        device.submit(3, ProgramHandle(7));

        let subs = device.submissions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].state, Some(RenderState::WRITE_RGB));
        assert_eq!(subs[1].state, None);
        assert_eq!(subs[1].instance_count(), 1);
    }

    #[test]
    fn test_framebuffer_textures_follow_attachments() {
        let mut device = RecordingDevice::new();
        let attachments = [
            AttachmentDesc {
                format: TextureFormat::Rgba8,
                depth: false,
            },
            AttachmentDesc {
                format: TextureFormat::Depth24,
                depth: true,
            },
        ];
        let fb = device
            .create_framebuffer(&FrameBufferDesc {
                name: "g_buffer",
                width: 64,
                height: 32,
                attachments: &attachments,
            })
            .unwrap();
        assert!(device.framebuffer_texture(fb, 1).is_some());
        assert!(device.framebuffer_texture(fb, 2).is_none());
        assert_eq!(device.framebuffer_size(fb), Some((64, 32)));
    }

    #[test]
    fn test_refusals_record_nothing() {
        let mut device = RecordingDevice::new();
        device.fail_framebuffers = true;
        device.transient_exhausted = true;
        let err = device.create_framebuffer(&FrameBufferDesc {
            name: "hdr",
            width: 8,
            height: 8,
            attachments: &[],
        });
        assert!(matches!(err, Err(ResourceError::FrameBufferCreation { .. })));
        assert!(device.alloc_transient_vertex_buffer(&[0; 16], 4).is_none());
        assert!(device.alloc_transient_index_buffer(&[0, 1, 2]).is_none());
        assert!(device.alloc_instance_data_buffer(&[0; 64], 64).is_none());
        assert_eq!(device.live_framebuffer_count(), 0);
        assert!(device.calls().is_empty());
    }
}
