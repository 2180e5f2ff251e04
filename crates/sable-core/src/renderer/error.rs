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

//! Error types reported by a [`super::GpuDevice`].

use std::fmt;

/// An error related to the creation of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// The device refused to create a framebuffer.
    FrameBufferCreation {
        /// Name of the framebuffer being created.
        name: String,
        /// Backend-provided reason.
        reason: String,
    },
    /// A framebuffer was requested with a zero dimension.
    InvalidDimensions {
        /// Name of the framebuffer being created.
        name: String,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The device refused to create a uniform.
    UniformCreation {
        /// Name of the uniform.
        name: String,
        /// Backend-provided reason.
        reason: String,
    },
    /// The handle used to reference a resource is not known to the device.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::FrameBufferCreation { name, reason } => {
                write!(f, "Failed to create framebuffer '{name}': {reason}")
            }
            ResourceError::InvalidDimensions {
                name,
                width,
                height,
            } => {
                write!(f, "Invalid dimensions {width}x{height} for framebuffer '{name}'")
            }
            ResourceError::UniformCreation { name, reason } => {
                write!(f, "Failed to create uniform '{name}': {reason}")
            }
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}
