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

//! # Sable Pipeline
//!
//! A scripted render pipeline. A [`PipelineDefinition`] (RON) declares framebuffers,
//! materials, sampler uniforms and the list of operations a frame runs. The
//! [`Pipeline`] turns those operations into view setup and draw submissions on a
//! [`GpuDevice`](sable_core::renderer::GpuDevice): pass views, mesh instancing,
//! terrain and grass, global and point lighting, cascaded and local shadow maps,
//! screen quads, particles and debug overlays.

#![warn(missing_docs)]

pub mod arena;
pub mod batch;
pub mod binding;
pub mod commands;
pub mod context;
pub mod definition;
pub mod error;
pub mod framebuffer;
pub mod pipeline;
pub mod program;
pub mod settings;
pub mod shadow;
pub mod source;
pub mod view;

pub use self::commands::{CommandContext, CommandRegistry};
pub use self::context::{FrameContext, PassId};
pub use self::definition::{ClearTarget, MaterialDecl, OperationDef, PipelineDefinition};
pub use self::error::{PipelineError, Result};
pub use self::framebuffer::{FrameBuffer, FrameBufferDecl, SWAP_CHAIN_NAME};
pub use self::pipeline::{AppliedCamera, Pipeline};
pub use self::program::{MaterialIndex, Operation, Program, UniformIndex};
pub use self::settings::PipelineSettings;
pub use self::source::PipelineSource;
