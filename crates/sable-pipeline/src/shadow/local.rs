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

//! Spot and omni light shadow views.
//!
//! A spot light renders one perspective view over the whole shadow map. An omni light
//! splits the sphere into four wide views arranged like the faces of a tetrahedron,
//! one per quadrant.

use super::cascade::{light_basis, quadrant_rect, SHADOW_BIAS};
use sable_core::math::{degrees_to_radians, Frustum, Mat4, Vec3};
use sable_core::renderer::ViewRect;
use sable_core::scene::PointLightInfo;

/// Yaw, pitch and roll in degrees of the four omni views, relative to the light.
pub const OMNI_YAW_PITCH_ROLL: [(f32, f32, f32); 4] = [
    (0.0, -54.7356, 45.0),
    (180.0, -54.7356, 45.0),
    (90.0, 54.7356, 45.0),
    (-90.0, 54.7356, 45.0),
];

/// Horizontal field of view of an omni view in degrees, overscan included.
pub const OMNI_FOV_X: f32 = 143.985_708_68 + 3.0 + 8.0;
/// Vertical field of view of an omni view in degrees, overscan included.
pub const OMNI_FOV_Y: f32 = 125.264_389_68 + 3.0 + 8.0;

/// One shadow view of a local light.
#[derive(Debug, Clone, Copy)]
pub struct LocalShadowView {
    /// Light view matrix.
    pub view: Mat4,
    /// Perspective projection.
    pub projection: Mat4,
    /// `bias * projection * view`.
    pub matrix: Mat4,
    /// Culling volume.
    pub frustum: Frustum,
    /// Viewport in the shadow map.
    pub rect: ViewRect,
}

/// Aspect ratio of an omni view.
pub fn omni_aspect_ratio() -> f32 {
    let x = degrees_to_radians(OMNI_FOV_X) * 0.5;
    let y = degrees_to_radians(OMNI_FOV_Y) * 0.5;
    x.tan() / y.tan()
}

/// Rotation of omni view `index`: the light's rotation followed by the table entry.
pub fn omni_rotation(light: &PointLightInfo, index: usize) -> Mat4 {
    let (yaw, pitch, roll) = OMNI_YAW_PITCH_ROLL[index % OMNI_YAW_PITCH_ROLL.len()];
    light.matrix.without_translation()
        * Mat4::from_rotation_y(degrees_to_radians(yaw))
        * Mat4::from_rotation_x(degrees_to_radians(pitch))
        * Mat4::from_rotation_z(degrees_to_radians(roll))
}

fn perspective_view(
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    fov: f32,
    ratio: f32,
    near: f32,
    far: f32,
    rect: ViewRect,
) -> Option<LocalShadowView> {
    if far <= near {
        return None;
    }
    let (_, up, forward) = light_basis(forward, up)?;
    let view = Mat4::look_at_rh(position, position + forward, up)?;
    let projection = Mat4::perspective_rh_zo(fov, ratio, near, far);
    Some(LocalShadowView {
        view,
        projection,
        matrix: SHADOW_BIAS * projection * view,
        frustum: Frustum::perspective(position, forward, up, fov, ratio, near, far),
        rect,
    })
}

/// The single view of a spot light, covering the whole `width` x `height` map.
pub fn spot_view(light: &PointLightInfo, near: f32, width: u32, height: u32) -> Option<LocalShadowView> {
    perspective_view(
        light.position(),
        light.forward(),
        light.matrix.y_axis(),
        light.fov,
        1.0,
        near,
        light.range,
        ViewRect::new(0, 0, width as u16, height as u16),
    )
}

/// Omni view `index` of a point light, in quadrant `index` of the map.
pub fn omni_view(
    light: &PointLightInfo,
    index: usize,
    near: f32,
    width: u32,
    height: u32,
) -> Option<LocalShadowView> {
    let rotation = omni_rotation(light, index);
    perspective_view(
        light.position(),
        -rotation.z_axis(),
        rotation.y_axis(),
        degrees_to_radians(OMNI_FOV_Y),
        omni_aspect_ratio(),
        near,
        light.range,
        quadrant_rect(index, width, height),
    )
}

/// Every shadow view of `light`: one for a spot light, four for an omni light.
pub fn local_views(light: &PointLightInfo, near: f32, width: u32, height: u32) -> Vec<LocalShadowView> {
    if light.is_spot() {
        spot_view(light, near, width, height).into_iter().collect()
    } else {
        (0..OMNI_YAW_PITCH_ROLL.len())
            .filter_map(|i| omni_view(light, i, near, width, height))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sable_core::math::PI;

    fn omni() -> PointLightInfo {
        PointLightInfo {
            matrix: Mat4::from_translation(Vec3::new(2.0, 3.0, 4.0)),
            range: 25.0,
            cast_shadows: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_omni_light_has_four_views() {
        let views = local_views(&omni(), 0.01, 512, 512);
        assert_eq!(views.len(), 4);
        let rects: Vec<_> = views.iter().map(|v| v.rect).collect();
        assert_eq!(rects[0], quadrant_rect(0, 512, 512));
        assert_eq!(rects[3], quadrant_rect(3, 512, 512));
    }

    #[test]
    fn test_spot_light_has_one_full_view() {
        let spot = PointLightInfo {
            fov: PI / 3.0,
            ..omni()
        };
        let views = local_views(&spot, 0.01, 512, 256);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].rect, ViewRect::new(0, 0, 512, 256));
        let ahead = spot.position() + spot.forward() * 10.0;
        assert!(views[0].frustum.contains_point(ahead));
    }

    #[test]
    fn test_omni_views_cover_all_directions() {
        let light = omni();
        let views = local_views(&light, 0.01, 512, 512);
        let directions = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for direction in directions {
            let point = light.position() + direction * 5.0;
            assert!(
                views.iter().any(|v| v.frustum.contains_point(point)),
                "direction {:?} not covered",
                direction
            );
        }
    }

    #[test]
    fn test_omni_aspect_ratio_is_wider_than_tall() {
        assert!(omni_aspect_ratio() > 1.0);
        let expected = (degrees_to_radians(OMNI_FOV_X) * 0.5).tan()
            / (degrees_to_radians(OMNI_FOV_Y) * 0.5).tan();
        assert_relative_eq!(omni_aspect_ratio(), expected);
    }
}
