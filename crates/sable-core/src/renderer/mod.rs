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

//! The GPU-facing contracts: device trait, handles, state words and materials.

pub mod device;
pub mod error;
pub mod handle;
pub mod material;
pub mod state;
pub mod stats;
pub mod target;

pub use self::device::GpuDevice;
pub use self::error::ResourceError;
pub use self::handle::*;
pub use self::material::{
    Material, MaterialProvider, MaterialUniform, Shader, ShaderDefines, ShaderPass, ShaderVariant,
    TextureSlot, UniformValue,
};
pub use self::state::{BlendMode, ClearFlags, RenderState};
pub use self::stats::RenderStats;
pub use self::target::{AttachmentDesc, FrameBufferDesc, TextureFormat, UniformKind};
