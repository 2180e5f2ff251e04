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

//! Light records returned by the scene.
//!
//! Both light kinds carry their world matrix: the translation is the light position,
//! the local −Z axis is the direction it shines towards and the local +Y axis is the
//! up vector used when building shadow views.

use crate::math::{LinearRgba, Mat4, Vec3, Vec4, PI};

/// The scene's global directional light, with the ambient and fog terms attached to it.
///
/// # Examples
///
/// ```
/// use sable_core::math::{Mat4, Vec3, Vec4};
/// use sable_core::scene::GlobalLightInfo;
///
/// let sun = GlobalLightInfo {
///     matrix: Mat4::from_rotation_x(-1.2),
///     cascades: Vec4::new(5.0, 20.0, 100.0, 300.0),
///     ..Default::default()
/// };
/// assert!(sun.forward().y < 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalLightInfo {
    /// World orientation of the light.
    pub matrix: Mat4,
    /// Diffuse color.
    pub color: LinearRgba,
    /// Diffuse intensity.
    pub intensity: f32,
    /// Ambient color.
    pub ambient_color: LinearRgba,
    /// Ambient intensity.
    pub ambient_intensity: f32,
    /// Fog color.
    pub fog_color: LinearRgba,
    /// Fog density.
    pub fog_density: f32,
    /// Lowest altitude of the fog band.
    pub fog_bottom: f32,
    /// Thickness of the fog band.
    pub fog_height: f32,
    /// Far distance of each of the four shadow cascades, near to far.
    pub cascades: Vec4,
}

impl GlobalLightInfo {
    /// Direction the light shines towards.
    pub fn forward(&self) -> Vec3 {
        (-self.matrix.z_axis()).normalize()
    }

    /// The light's up axis.
    pub fn up(&self) -> Vec3 {
        self.matrix.y_axis().normalize()
    }
}

impl Default for GlobalLightInfo {
    fn default() -> Self {
        Self {
            matrix: Mat4::from_rotation_x(-PI * 0.25),
            color: LinearRgba::WHITE,
            intensity: 1.0,
            ambient_color: LinearRgba::WHITE,
            ambient_intensity: 0.1,
            fog_color: LinearRgba::rgb(0.5, 0.5, 0.5),
            fog_density: 0.0,
            fog_bottom: 0.0,
            fog_height: 10.0,
            cascades: Vec4::new(5.0, 20.0, 100.0, 300.0),
        }
    }
}

/// A point or spot light. A field of view below 180 degrees makes it a spot light.
///
/// # Examples
///
/// ```
/// use sable_core::scene::PointLightInfo;
///
/// let bulb = PointLightInfo { cast_shadows: true, ..Default::default() };
/// assert!(!bulb.is_spot());
/// let torch = PointLightInfo { fov: 60f32.to_radians(), ..bulb };
/// assert!(torch.is_spot());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightInfo {
    /// World transform of the light.
    pub matrix: Mat4,
    /// Diffuse color.
    pub color: LinearRgba,
    /// Diffuse intensity.
    pub intensity: f32,
    /// Radius of influence in world units.
    pub range: f32,
    /// Falloff exponent.
    pub attenuation: f32,
    /// Cone angle in radians; `PI * 2` (or anything at or above `PI`) for omni lights.
    pub fov: f32,
    /// Specular color.
    pub specular_color: LinearRgba,
    /// Specular intensity.
    pub specular_intensity: f32,
    /// Whether the light renders shadow maps.
    pub cast_shadows: bool,
}

impl PointLightInfo {
    /// World position.
    pub fn position(&self) -> Vec3 {
        self.matrix.translation()
    }

    /// Direction the light shines towards.
    pub fn forward(&self) -> Vec3 {
        (-self.matrix.z_axis()).normalize()
    }

    /// Whether the light is a spot light (cone narrower than a hemisphere).
    pub fn is_spot(&self) -> bool {
        self.fov < PI
    }
}

impl Default for PointLightInfo {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range: 10.0,
            attenuation: 2.0,
            fov: PI * 2.0,
            specular_color: LinearRgba::WHITE,
            specular_intensity: 1.0,
            cast_shadows: false,
        }
    }
}
