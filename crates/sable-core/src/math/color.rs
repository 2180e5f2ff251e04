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

//! Defines the `LinearRgba` color type.

use crate::math::vector::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A color in linear RGBA space with `f32` components.
///
/// Light colors, clear colors and the debug/placeholder vertex colors all use this type.
/// Components may exceed `1.0` for HDR light intensities.
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LinearRgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque magenta, the "something is missing" signal color.
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Unpacks a `0xRRGGBBAA` value, the clear-color notation used in pipeline definitions.
    pub fn from_rgba_u32(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(24), channel(16), channel(8), channel(0))
    }

    /// Packs into `0xRRGGBBAA`.
    pub fn to_rgba_u32(&self) -> u32 {
        let channel = |c: f32| ((c.clamp(0.0, 1.0) * 255.0).round() as u32) & 0xff;
        (channel(self.r) << 24) | (channel(self.g) << 16) | (channel(self.b) << 8) | channel(self.a)
    }

    /// Packs into `0xAABBGGRR`, the byte order of a little-endian RGBA8 vertex attribute.
    pub fn to_abgr_u32(&self) -> u32 {
        self.to_rgba_u32().swap_bytes()
    }

    /// RGB multiplied by `intensity`, with `w` set to `w`.
    #[inline]
    pub fn scaled_rgb(&self, intensity: f32, w: f32) -> Vec4 {
        Vec4::new(self.r * intensity, self.g * intensity, self.b * intensity, w)
    }

    /// The RGB part as a `Vec3`.
    #[inline]
    pub fn rgb_vec3(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// All four components as a `Vec4`.
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::BLACK
    }
}
