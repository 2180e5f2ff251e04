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

//! Render-target and uniform descriptors passed to the device at creation time.

use serde::{Deserialize, Serialize};

/// Pixel format of a framebuffer attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA, normalized.
    Rgba8,
    /// 16-bit float RGBA.
    Rgba16F,
    /// 32-bit float RGBA.
    Rgba32F,
    /// Single 32-bit float channel.
    R32F,
    /// 16-bit depth.
    Depth16,
    /// 24-bit depth.
    Depth24,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
    /// 32-bit float depth.
    Depth32F,
}

impl TextureFormat {
    /// Whether the format stores depth.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16
                | TextureFormat::Depth24
                | TextureFormat::Depth24Stencil8
                | TextureFormat::Depth32F
        )
    }
}

/// One render buffer of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDesc {
    /// Pixel format.
    pub format: TextureFormat,
    /// Whether this attachment is the depth target.
    #[serde(default)]
    pub depth: bool,
}

/// Everything the device needs to create a framebuffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameBufferDesc<'a> {
    /// Debug name.
    pub name: &'a str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Attachments in binding order.
    pub attachments: &'a [AttachmentDesc],
}

/// The shape of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// Array of `vec4`.
    Vec4,
    /// Array of `mat4`.
    Mat4,
    /// Texture sampler.
    Sampler,
}
