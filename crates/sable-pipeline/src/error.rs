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

//! Pipeline error types

use sable_core::renderer::ResourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration and loading errors of a pipeline.
///
/// Nothing here is raised while a frame renders: per-frame failures are logged and
/// the offending operation is skipped.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Two framebuffers share a name
    #[error("Framebuffer '{0}' is declared twice")]
    DuplicateFramebuffer(String),

    /// The swap chain name was used for a declared framebuffer
    #[error("Framebuffer name '{0}' is reserved for the swap chain")]
    ReservedFramebufferName(String),

    /// A framebuffer name does not resolve
    #[error("Unknown framebuffer '{0}'")]
    UnknownFramebuffer(String),

    /// Only framebuffers following the pipeline size can be resized
    #[error("Framebuffer '{0}' does not follow the pipeline size")]
    NotDefaultFramebuffer(String),

    /// An operation names a material that was not declared
    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    /// An operation names a uniform that was not declared
    #[error("Unknown uniform '{0}'")]
    UnknownUniform(String),

    /// The material provider could not resolve a path
    #[error("Failed to load material '{0}'")]
    MaterialLoad(String),

    /// The pipeline definition is not valid RON
    #[error("Failed to parse pipeline definition: {0}")]
    Parse(String),

    /// The definition file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The device refused a resource
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
