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

//! Test doubles for the GPU device and the scene.
//!
//! Enabled with the `testing` feature.

pub mod device;
pub mod fixtures;
pub mod scene;

pub use self::device::{DeviceCall, RecordingDevice, Submission};
pub use self::fixtures::MaterialLibrary;
pub use self::scene::{LayeredRenderable, SceneLight, TestScene};
