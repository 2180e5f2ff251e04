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

//! Camera parameters as exposed by the scene.

use crate::math::{Frustum, Mat4, Vec3, FRAC_PI_4};

/// A camera component resolved for rendering.
///
/// `width` and `height` are the camera's own viewport size. They only feed the aspect
/// ratio; a zero height makes the camera unusable for projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Viewport width.
    pub width: f32,
    /// Viewport height.
    pub height: f32,
    /// World transform.
    pub world: Mat4,
}

impl CameraParams {
    /// World position.
    pub fn position(&self) -> Vec3 {
        self.world.translation()
    }

    /// Viewing direction.
    pub fn forward(&self) -> Vec3 {
        (-self.world.z_axis()).normalize()
    }

    /// Up axis.
    pub fn up(&self) -> Vec3 {
        self.world.y_axis().normalize()
    }

    /// Width over height, `None` for a zero height.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.height == 0.0 {
            None
        } else {
            Some(self.width / self.height)
        }
    }

    /// Perspective projection over `[near, far]`.
    pub fn projection(&self) -> Option<Mat4> {
        let ratio = self.aspect_ratio()?;
        Some(Mat4::perspective_rh_zo(self.fov, ratio, self.near, self.far))
    }

    /// World-to-view matrix.
    pub fn view(&self) -> Option<Mat4> {
        self.world.affine_inverse()
    }

    /// View frustum restricted to `[near, far]`.
    pub fn frustum_range(&self, near: f32, far: f32) -> Option<Frustum> {
        let ratio = self.aspect_ratio()?;
        Some(Frustum::perspective(
            self.position(),
            self.forward(),
            self.up(),
            self.fov,
            ratio,
            near,
            far,
        ))
    }

    /// Full view frustum.
    pub fn frustum(&self) -> Option<Frustum> {
        self.frustum_range(self.near, self.far)
    }
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: FRAC_PI_4,
            near: 0.1,
            far: 1000.0,
            width: 1280.0,
            height: 720.0,
            world: Mat4::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_height_has_no_projection() {
        let camera = CameraParams {
            height: 0.0,
            ..Default::default()
        };
        assert!(camera.projection().is_none());
        assert!(camera.frustum().is_none());
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = CameraParams::default();
        let forward = camera.forward();
        assert_relative_eq!(forward.z, -1.0);
        let frustum = camera.frustum().unwrap();
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));
    }
}
