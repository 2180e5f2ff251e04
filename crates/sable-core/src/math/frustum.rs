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

//! View frustums built from camera parameters.
//!
//! A [`Frustum`] keeps both its eight corner points and its six inward-facing planes.
//! The corners feed shadow-cascade fitting (bounding sphere of a camera slice), the
//! planes feed visibility queries on the scene.

use super::Vec3;

/// A plane `normal · p + d = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    /// Unit normal, pointing towards the inside of the frustum.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub d: f32,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here).
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance from `point`; positive on the inner side.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// A convex view volume with six planes and eight corners.
///
/// Corner order: near plane `[bottom-left, bottom-right, top-right, top-left]`,
/// then the far plane in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frustum {
    /// The corner points.
    pub points: [Vec3; 8],
    /// Near, far, left, right, bottom, top.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Index of the near plane.
    pub const NEAR: usize = 0;
    /// Index of the far plane.
    pub const FAR: usize = 1;
    /// Index of the left plane.
    pub const LEFT: usize = 2;
    /// Index of the right plane.
    pub const RIGHT: usize = 3;
    /// Index of the bottom plane.
    pub const BOTTOM: usize = 4;
    /// Index of the top plane.
    pub const TOP: usize = 5;

    /// Builds a perspective frustum.
    ///
    /// # Arguments
    ///
    /// * `position`: Apex of the frustum.
    /// * `direction`: Viewing direction.
    /// * `up`: Up vector, need not be exactly orthogonal to `direction`.
    /// * `fov`: Vertical field of view in radians.
    /// * `ratio`: Width over height.
    /// * `near`, `far`: Distances of the clipping planes along `direction`.
    pub fn perspective(
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        fov: f32,
        ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let z = direction.normalize();
        let right = z.cross(up).normalize();
        let up = right.cross(z);
        let scale = (fov * 0.5).tan();

        Self::from_slices(
            position + z * near,
            position + z * far,
            right * (near * scale * ratio),
            up * (near * scale),
            right * (far * scale * ratio),
            up * (far * scale),
        )
    }

    /// Builds an orthographic box looking along `direction`.
    ///
    /// `half_width` and `half_height` are the half extents of the box cross-section.
    pub fn orthographic(
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let z = direction.normalize();
        let right = z.cross(up).normalize();
        let up = right.cross(z);
        let x = right * half_width;
        let y = up * half_height;

        Self::from_slices(position + z * near, position + z * far, x, y, x, y)
    }

    fn from_slices(
        near_center: Vec3,
        far_center: Vec3,
        right_near: Vec3,
        up_near: Vec3,
        right_far: Vec3,
        up_far: Vec3,
    ) -> Self {
        let points = [
            near_center - right_near - up_near,
            near_center + right_near - up_near,
            near_center + right_near + up_near,
            near_center - right_near + up_near,
            far_center - right_far - up_far,
            far_center + right_far - up_far,
            far_center + right_far + up_far,
            far_center - right_far + up_far,
        ];
        let mut frustum = Self {
            points,
            planes: [Plane::default(); 6],
        };
        frustum.update_planes();
        frustum
    }

    fn update_planes(&mut self) {
        let p = &self.points;
        let center = self.center();
        let faces = [
            (p[0], p[1], p[2]), // near
            (p[4], p[5], p[6]), // far
            (p[0], p[3], p[7]), // left
            (p[1], p[2], p[6]), // right
            (p[0], p[1], p[5]), // bottom
            (p[3], p[2], p[6]), // top
        ];
        for (plane, (a, b, c)) in self.planes.iter_mut().zip(faces) {
            let mut candidate = Plane::from_normal_and_point((b - a).cross(c - a), a);
            if candidate.distance(center) < 0.0 {
                candidate = Plane {
                    normal: -candidate.normal,
                    d: -candidate.d,
                };
            }
            *plane = candidate;
        }
    }

    /// Average of the eight corners.
    pub fn center(&self) -> Vec3 {
        let sum = self.points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
        sum / 8.0
    }

    /// Radius of the sphere around [`Self::center`] enclosing every corner.
    pub fn radius(&self) -> f32 {
        let center = self.center();
        self.points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0, f32::max)
    }

    /// Whether a sphere touches the frustum (conservative: may accept near corners).
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| plane.distance(center) >= -radius)
    }

    /// Whether a point lies inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(point, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera_frustum(near: f32, far: f32) -> Frustum {
        Frustum::perspective(
            Vec3::ZERO,
            -Vec3::Z,
            Vec3::Y,
            std::f32::consts::FRAC_PI_2,
            1.0,
            near,
            far,
        )
    }

    #[test]
    fn test_perspective_contains_points_along_direction() {
        let f = camera_frustum(1.0, 100.0);
        assert!(f.contains_point(Vec3::new(0.0, 0.0, -50.0)));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, 50.0)));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, -150.0)));
        assert!(!f.contains_point(Vec3::new(80.0, 0.0, -50.0)));
    }

    #[test]
    fn test_bounding_sphere_encloses_corners() {
        let f = camera_frustum(5.0, 20.0);
        let center = f.center();
        let radius = f.radius();
        assert!(center.z < -5.0 && center.z > -20.0);
        for p in f.points {
            assert!(p.distance(center) <= radius + 1e-4);
        }
        // The far corners of a 90 degree frustum are at (+-20, +-20, -20).
        assert_relative_eq!(f.points[6].x, 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_sphere_outside_near_plane_is_rejected() {
        let f = camera_frustum(10.0, 100.0);
        assert!(!f.intersects_sphere(Vec3::new(0.0, 0.0, -2.0), 1.0));
        assert!(f.intersects_sphere(Vec3::new(0.0, 0.0, -9.5), 1.0));
    }

    #[test]
    fn test_orthographic_box() {
        let f = Frustum::orthographic(Vec3::ZERO, Vec3::X, Vec3::Y, 2.0, 3.0, 1.0, 10.0);
        assert!(f.contains_point(Vec3::new(5.0, 2.5, 1.5)));
        assert!(!f.contains_point(Vec3::new(5.0, 3.5, 0.0)));
        assert!(!f.contains_point(Vec3::new(0.5, 0.0, 0.0)));
    }
}
