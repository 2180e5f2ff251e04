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

//! Directional light cascade fitting.
//!
//! Each cascade covers one distance range of the camera frustum. The range's
//! sub-frustum is wrapped in a sphere, the sphere center is snapped to the shadow map
//! texel grid in light space, and an orthographic projection sized to the sphere is
//! aimed at it along the light direction.

use crate::settings::PipelineSettings;
use sable_core::math::{Frustum, Mat4, Vec3, Vec4, EPSILON};
use sable_core::renderer::ViewRect;
use sable_core::scene::{CameraParams, GlobalLightInfo};

/// Number of directional cascades.
pub const CASCADE_COUNT: usize = 4;

/// Maps clip space to shadow map texture space. Y is flipped for a top-left texture
/// origin; depth is already in `[0, 1]`.
pub const SHADOW_BIAS: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

/// Quadrant origins, as fractions of the shadow map size, in cascade order.
pub const QUADRANTS: [(f32, f32); 4] = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)];

/// Near and far distance of every cascade: `[first_near, c0]`, `[c0, c1]`, ...
pub fn cascade_ranges(first_near: f32, cascades: Vec4) -> [(f32, f32); CASCADE_COUNT] {
    let distances = [first_near, cascades.x, cascades.y, cascades.z, cascades.w];
    std::array::from_fn(|i| (distances[i], distances[i + 1]))
}

/// Viewport of quadrant `index` of a `width` x `height` shadow map, with a one texel
/// border so cascades never sample each other.
pub fn quadrant_rect(index: usize, width: u32, height: u32) -> ViewRect {
    let (fx, fy) = QUADRANTS[index % QUADRANTS.len()];
    let (w, h) = (width as f32, height as f32);
    ViewRect::new(
        (1.0 + w * fx) as u16,
        (1.0 + h * fy) as u16,
        (0.5 * w - 2.0).max(1.0) as u16,
        (0.5 * h - 2.0).max(1.0) as u16,
    )
}

/// Snap grid step for a cascade of bounding `radius`: `2r / (quadrant / 2 - 2)` where
/// the quadrant is `width / 2 - 2` texels wide.
pub fn texel_step(radius: f32, shadowmap_width: u32) -> f32 {
    let quadrant = (shadowmap_width as f32 * 0.5 - 2.0).max(1.0);
    2.0 * radius / (quadrant * 0.5 - 2.0).max(1.0)
}

/// Orthonormal light basis `(right, up, forward)`. `None` for a degenerate direction.
pub fn light_basis(forward: Vec3, up: Vec3) -> Option<(Vec3, Vec3, Vec3)> {
    if forward.length_squared() < EPSILON * EPSILON {
        return None;
    }
    let forward = forward.normalize();
    let right = forward.cross(up);
    if right.length_squared() < EPSILON * EPSILON {
        return None;
    }
    let right = right.normalize();
    Some((right, right.cross(forward), forward))
}

/// Snaps `position` to multiples of `step` along the local x and y axes of the light
/// entity `light`. The grid origin is the light's translation and the local z
/// component is kept. A non-invertible light matrix leaves `position` unchanged.
pub fn snap_to_texel(position: Vec3, light: &Mat4, step: f32) -> Vec3 {
    if step <= 0.0 {
        return position;
    }
    let Some(to_light) = light.affine_inverse() else {
        return position;
    };
    let local = to_light.transform_point3(position);
    let snapped = Vec3::new(
        (local.x / step).round() * step,
        (local.y / step).round() * step,
        local.z,
    );
    light.transform_point3(snapped)
}

/// Everything needed to render and sample one cascade.
#[derive(Debug, Clone, Copy)]
pub struct CascadeView {
    /// Camera distance range covered.
    pub range: (f32, f32),
    /// Radius of the sphere bounding the range's sub-frustum.
    pub radius: f32,
    /// Light view matrix.
    pub view: Mat4,
    /// Orthographic projection.
    pub projection: Mat4,
    /// `bias * projection * view`.
    pub matrix: Mat4,
    /// Culling volume of the cascade.
    pub frustum: Frustum,
    /// Quadrant of the shadow map.
    pub rect: ViewRect,
}

/// Fits cascade `index` of `light` to `camera`.
///
/// Returns `None` for a zero-height camera or a degenerate light orientation.
pub fn fit_cascade(
    camera: &CameraParams,
    light: &GlobalLightInfo,
    index: usize,
    shadowmap_size: (u32, u32),
    settings: &PipelineSettings,
) -> Option<CascadeView> {
    let range = cascade_ranges(settings.first_cascade_near, light.cascades)[index];
    let split = camera.frustum_range(range.0, range.1)?;
    let radius = split.radius();
    let (_, up, forward) = light_basis(light.forward(), light.up())?;

    let step = texel_step(radius, shadowmap_size.0);
    let center = snap_to_texel(split.center(), &light.matrix, step);

    let far = settings.shadow_ortho_far;
    let near = settings.shadow_ortho_near;
    let eye = center - forward * (far * 0.5);
    let view = Mat4::look_at_rh(eye, eye + forward, up)?;
    let projection = Mat4::orthographic_rh_zo(-radius, radius, -radius, radius, near, far);
    let frustum = Frustum::orthographic(eye, forward, up, radius, radius, near, far);

    Some(CascadeView {
        range,
        radius,
        view,
        projection,
        matrix: SHADOW_BIAS * projection * view,
        frustum,
        rect: quadrant_rect(index, shadowmap_size.0, shadowmap_size.1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sable_core::math::FRAC_PI_4;

    fn camera() -> CameraParams {
        CameraParams {
            fov: FRAC_PI_4,
            near: 0.1,
            far: 1000.0,
            width: 800.0,
            height: 600.0,
            world: Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0)),
        }
    }

    fn sun() -> GlobalLightInfo {
        GlobalLightInfo {
            matrix: Mat4::from_rotation_x(-1.0),
            cascades: Vec4::new(5.0, 20.0, 100.0, 300.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_ranges_follow_cascade_table() {
        let ranges = cascade_ranges(0.01, Vec4::new(5.0, 20.0, 100.0, 300.0));
        assert_eq!(ranges, [(0.01, 5.0), (5.0, 20.0), (20.0, 100.0), (100.0, 300.0)]);
    }

    #[test]
    fn test_quadrants_tile_the_map() {
        assert_eq!(quadrant_rect(0, 1024, 1024), ViewRect::new(1, 1, 510, 510));
        assert_eq!(quadrant_rect(1, 1024, 1024), ViewRect::new(513, 1, 510, 510));
        assert_eq!(quadrant_rect(2, 1024, 1024), ViewRect::new(1, 513, 510, 510));
        assert_eq!(quadrant_rect(3, 1024, 1024), ViewRect::new(513, 513, 510, 510));
    }

    #[test]
    fn test_texel_step_halves_the_quadrant() {
        // 1024 wide: quadrant of 510 texels, grid of 510 / 2 - 2 = 253 cells.
        assert_relative_eq!(texel_step(10.0, 1024), 20.0 / 253.0, epsilon = 1e-6);
        assert_relative_eq!(texel_step(10.0, 1024), 0.079_051_38, epsilon = 1e-6);
        assert_relative_eq!(texel_step(37.5, 2048), 75.0 / 509.0, epsilon = 1e-6);
        assert_eq!(texel_step(1.0, 4), 2.0);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let light = GlobalLightInfo {
            matrix: Mat4::from_translation(Vec3::new(1.7, -4.2, 3.3)) * sun().matrix,
            ..sun()
        };
        let step = texel_step(37.5, 2048);
        let position = Vec3::new(12.345, -3.21, 98.7);

        let once = snap_to_texel(position, &light.matrix, step);
        let twice = snap_to_texel(once, &light.matrix, step);
        assert_relative_eq!(once.x, twice.x, epsilon = 1e-3);
        assert_relative_eq!(once.y, twice.y, epsilon = 1e-3);
        assert_relative_eq!(once.z, twice.z, epsilon = 1e-3);
        assert!(once.distance(position) <= step);
    }

    #[test]
    fn test_snap_keeps_depth_along_light() {
        let light = sun();
        let basis = light_basis(light.forward(), light.up()).unwrap();
        let position = Vec3::new(3.3, 4.4, 5.5);
        let snapped = snap_to_texel(position, &light.matrix, 0.5);
        assert_relative_eq!(snapped.dot(basis.2), position.dot(basis.2), epsilon = 1e-4);
    }

    #[test]
    fn test_snap_grid_starts_at_light_position() {
        let light = Mat4::from_translation(Vec3::new(0.25, 0.0, 0.0));
        let snapped = snap_to_texel(Vec3::new(0.3, 0.0, 2.0), &light, 0.5);
        assert_relative_eq!(snapped.x, 0.25, epsilon = 1e-5);
        assert_relative_eq!(snapped.z, 2.0, epsilon = 1e-5);

        let at_origin = snap_to_texel(Vec3::new(0.3, 0.0, 2.0), &Mat4::IDENTITY, 0.5);
        assert_relative_eq!(at_origin.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_cascades_grow_near_to_far() {
        let settings = PipelineSettings::default();
        let views: Vec<_> = (0..CASCADE_COUNT)
            .map(|i| fit_cascade(&camera(), &sun(), i, (1024, 1024), &settings).unwrap())
            .collect();
        for pair in views.windows(2) {
            assert!(pair[0].range.1 <= pair[1].range.0 + f32::EPSILON);
            assert!(pair[0].radius < pair[1].radius);
        }
    }

    #[test]
    fn test_zero_height_camera_has_no_cascade() {
        let camera = CameraParams {
            height: 0.0,
            ..camera()
        };
        let settings = PipelineSettings::default();
        assert!(fit_cascade(&camera, &sun(), 0, (1024, 1024), &settings).is_none());
    }

    #[test]
    fn test_cascade_matrix_maps_center_inside_texture() {
        let settings = PipelineSettings::default();
        let view = fit_cascade(&camera(), &sun(), 1, (1024, 1024), &settings).unwrap();
        let center = view.frustum.center();
        let uv = view.matrix * center.extend(1.0);
        assert!((0.0..=1.0).contains(&uv.x));
        assert!((0.0..=1.0).contains(&uv.y));
        assert!((0.0..=1.0).contains(&uv.z));
    }
}
