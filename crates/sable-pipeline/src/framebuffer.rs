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

//! Named render targets owned by a pipeline.

use crate::error::{PipelineError, Result};
use sable_core::renderer::{
    AttachmentDesc, FrameBufferDesc, FrameBufferHandle, GpuDevice, TextureHandle,
};
use serde::{Deserialize, Serialize};

/// Name that always resolves to the swap chain.
pub const SWAP_CHAIN_NAME: &str = "default";

/// A framebuffer as declared in a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBufferDecl {
    /// Unique name.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Render buffers in binding order.
    pub attachments: Vec<AttachmentDesc>,
    /// Whether the framebuffer follows the pipeline size.
    #[serde(default)]
    pub default: bool,
}

/// A created framebuffer.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Unique name.
    pub name: String,
    /// Current width.
    pub width: u32,
    /// Current height.
    pub height: u32,
    /// Render buffers.
    pub attachments: Vec<AttachmentDesc>,
    /// Device handle.
    pub handle: FrameBufferHandle,
    /// Whether [`FrameBufferRegistry::resize`] may change it.
    pub follows_pipeline_size: bool,
}

impl FrameBuffer {
    /// Index of the first depth attachment.
    pub fn depth_attachment(&self) -> Option<usize> {
        self.attachments
            .iter()
            .position(|a| a.depth || a.format.is_depth())
    }
}

/// The framebuffers of one loaded pipeline definition.
#[derive(Debug, Default)]
pub struct FrameBufferRegistry {
    framebuffers: Vec<FrameBuffer>,
}

impl FrameBufferRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the render targets of `decl`.
    ///
    /// ## Errors
    /// * `ReservedFramebufferName` - If `decl` uses the swap chain name.
    /// * `DuplicateFramebuffer` - If the name is already declared.
    /// * `Resource` - If the device refuses the framebuffer.
    pub fn declare(
        &mut self,
        device: &mut dyn GpuDevice,
        decl: &FrameBufferDecl,
    ) -> Result<FrameBufferHandle> {
        if decl.name == SWAP_CHAIN_NAME {
            return Err(PipelineError::ReservedFramebufferName(decl.name.clone()));
        }
        if self.find(&decl.name).is_some() {
            return Err(PipelineError::DuplicateFramebuffer(decl.name.clone()));
        }
        let handle = device.create_framebuffer(&FrameBufferDesc {
            name: &decl.name,
            width: decl.width,
            height: decl.height,
            attachments: &decl.attachments,
        })?;
        log::debug!(
            "FrameBufferRegistry: created '{}' ({}x{}, {} attachments)",
            decl.name,
            decl.width,
            decl.height,
            decl.attachments.len()
        );
        self.framebuffers.push(FrameBuffer {
            name: decl.name.clone(),
            width: decl.width,
            height: decl.height,
            attachments: decl.attachments.clone(),
            handle,
            follows_pipeline_size: decl.default,
        });
        Ok(handle)
    }

    /// Looks a framebuffer up by name.
    pub fn find(&self, name: &str) -> Option<&FrameBuffer> {
        self.framebuffers.iter().find(|fb| fb.name == name)
    }

    /// Looks a framebuffer up by device handle.
    pub fn find_by_handle(&self, handle: FrameBufferHandle) -> Option<&FrameBuffer> {
        self.framebuffers.iter().find(|fb| fb.handle == handle)
    }

    /// Texture of attachment `attachment` of the framebuffer named `name`.
    pub fn texture(
        &self,
        device: &dyn GpuDevice,
        name: &str,
        attachment: usize,
    ) -> Option<TextureHandle> {
        let fb = self.find(name)?;
        device.framebuffer_texture(fb.handle, attachment)
    }

    /// Recreates a size-following framebuffer at a new size.
    ///
    /// ## Errors
    /// * `UnknownFramebuffer` - If no framebuffer has that name.
    /// * `NotDefaultFramebuffer` - If the framebuffer has a fixed size.
    /// * `Resource` - If the device refuses the new framebuffer. The old one is kept.
    pub fn resize(
        &mut self,
        device: &mut dyn GpuDevice,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let fb = self
            .framebuffers
            .iter_mut()
            .find(|fb| fb.name == name)
            .ok_or_else(|| PipelineError::UnknownFramebuffer(name.to_string()))?;
        if !fb.follows_pipeline_size {
            return Err(PipelineError::NotDefaultFramebuffer(name.to_string()));
        }
        if fb.width == width && fb.height == height {
            return Ok(());
        }
        let handle = device.create_framebuffer(&FrameBufferDesc {
            name: &fb.name,
            width,
            height,
            attachments: &fb.attachments,
        })?;
        device.destroy_framebuffer(std::mem::replace(&mut fb.handle, handle));
        fb.width = width;
        fb.height = height;
        log::debug!("FrameBufferRegistry: resized '{}' to {}x{}", name, width, height);
        Ok(())
    }

    /// Names of the framebuffers following the pipeline size.
    pub fn size_following(&self) -> Vec<String> {
        self.framebuffers
            .iter()
            .filter(|fb| fb.follows_pipeline_size)
            .map(|fb| fb.name.clone())
            .collect()
    }

    /// Destroys every framebuffer.
    pub fn clear(&mut self, device: &mut dyn GpuDevice) {
        for fb in self.framebuffers.drain(..) {
            device.destroy_framebuffer(fb.handle);
        }
    }

    /// Iterates over the framebuffers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameBuffer> {
        self.framebuffers.iter()
    }

    /// Number of framebuffers.
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Whether no framebuffer is declared.
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::renderer::{GpuDevice, TextureFormat};
    use sable_core::testing::RecordingDevice;

    fn decl(name: &str, default: bool) -> FrameBufferDecl {
        FrameBufferDecl {
            name: name.to_string(),
            width: 256,
            height: 128,
            attachments: vec![
                AttachmentDesc {
                    format: TextureFormat::Rgba8,
                    depth: false,
                },
                AttachmentDesc {
                    format: TextureFormat::Depth24,
                    depth: true,
                },
            ],
            default,
        }
    }

    #[test]
    fn test_duplicate_name_fails_fast() {
        let mut device = RecordingDevice::new();
        let mut registry = FrameBufferRegistry::new();
        registry.declare(&mut device, &decl("g_buffer", false)).unwrap();
        let err = registry
            .declare(&mut device, &decl("g_buffer", false))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateFramebuffer(name) if name == "g_buffer"));
        assert_eq!(device.live_framebuffer_count(), 1);
    }

    #[test]
    fn test_swap_chain_name_is_reserved() {
        let mut device = RecordingDevice::new();
        let mut registry = FrameBufferRegistry::new();
        let err = registry
            .declare(&mut device, &decl(SWAP_CHAIN_NAME, true))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReservedFramebufferName(_)));
    }

    #[test]
    fn test_find_misses_are_not_errors() {
        let registry = FrameBufferRegistry::new();
        assert!(registry.find("shadowmap").is_none());
    }

    #[test]
    fn test_only_default_framebuffers_resize() {
        let mut device = RecordingDevice::new();
        let mut registry = FrameBufferRegistry::new();
        registry.declare(&mut device, &decl("main", true)).unwrap();
        registry.declare(&mut device, &decl("shadowmap", false)).unwrap();

        registry.resize(&mut device, "main", 640, 480).unwrap();
        let main = registry.find("main").unwrap();
        assert_eq!((main.width, main.height), (640, 480));
        assert_eq!(device.framebuffer_size(main.handle), Some((640, 480)));

        let err = registry.resize(&mut device, "shadowmap", 1, 1).unwrap_err();
        assert!(matches!(err, PipelineError::NotDefaultFramebuffer(_)));
        assert_eq!(device.live_framebuffer_count(), 2);
    }

    #[test]
    fn test_failed_resize_keeps_the_old_framebuffer() {
        let mut device = RecordingDevice::new();
        let mut registry = FrameBufferRegistry::new();
        registry.declare(&mut device, &decl("main", true)).unwrap();
        let before = registry.find("main").unwrap().handle;

        device.fail_framebuffers = true;
        let err = registry.resize(&mut device, "main", 640, 480).unwrap_err();
        assert!(matches!(err, PipelineError::Resource(_)));

        let main = registry.find("main").unwrap();
        assert_eq!(main.handle, before);
        assert_eq!((main.width, main.height), (256, 128));
        assert_eq!(device.framebuffer_size(before), Some((256, 128)));
        assert!(device.framebuffer_texture(before, 0).is_some());
        assert_eq!(device.live_framebuffer_count(), 1);

        registry.clear(&mut device);
        assert_eq!(device.live_framebuffer_count(), 0);
    }

    #[test]
    fn test_depth_attachment_lookup() {
        let mut device = RecordingDevice::new();
        let mut registry = FrameBufferRegistry::new();
        registry.declare(&mut device, &decl("g_buffer", false)).unwrap();
        let fb = registry.find("g_buffer").unwrap();
        assert_eq!(fb.depth_attachment(), Some(1));
        assert!(registry.texture(&device, "g_buffer", 1).is_some());
    }
}
