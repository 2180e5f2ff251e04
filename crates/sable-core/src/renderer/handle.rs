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

//! Opaque GPU handles, view identifiers and transient buffer records.

/// Index into the device's fixed array of views.
pub type ViewId = u16;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

gpu_handle!(
    /// A render target made of one or more attachments.
    FrameBufferHandle
);
gpu_handle!(
    /// A texture, including framebuffer attachments.
    TextureHandle
);
gpu_handle!(
    /// A named shader uniform (vector, matrix array or sampler).
    UniformHandle
);
gpu_handle!(
    /// A linked shader program for one pass and define combination.
    ProgramHandle
);
gpu_handle!(
    /// A static vertex buffer.
    VertexBufferHandle
);
gpu_handle!(
    /// A static index buffer.
    IndexBufferHandle
);

/// A viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewRect {
    /// Left edge.
    pub x: u16,
    /// Top edge.
    pub y: u16,
    /// Width.
    pub width: u16,
    /// Height.
    pub height: u16,
}

impl ViewRect {
    /// Creates a new rectangle.
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Frame-lifetime vertex data, valid until the device finishes the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientVertexBuffer {
    /// Backend allocation id.
    pub id: u32,
    /// Number of vertices.
    pub count: u32,
    /// Size of one vertex in bytes.
    pub stride: u16,
}

/// Frame-lifetime 16-bit index data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientIndexBuffer {
    /// Backend allocation id.
    pub id: u32,
    /// Number of indices.
    pub count: u32,
}

/// Frame-lifetime per-instance data consumed by one instanced draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceDataBuffer {
    /// Backend allocation id.
    pub id: u32,
    /// Number of instances.
    pub count: u32,
    /// Size of one instance record in bytes.
    pub stride: u16,
}
