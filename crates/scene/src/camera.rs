use serde::Serialize;

use cosmos_core::Vec3;

use crate::math::{add, cross, dot, normalize, scale, sub};

const WORLD_UP: Vec3 = [0.0, 1.0, 0.0];

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view.
    pub fov_degrees: f32,
}

/// A half-line used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize(direction),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        add(self.origin, scale(self.direction, t))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 12.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 50.0,
        }
    }
}

impl Camera {
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = normalize(sub(self.target, self.position));
        let right = normalize(cross(forward, WORLD_UP));
        let up = cross(right, forward);
        (forward, right, up)
    }

    fn tan_half_fov(&self) -> f32 {
        (self.fov_degrees.to_radians() / 2.0).tan()
    }

    /// Ray from the eye through a pointer position in normalized device
    /// coordinates (`-1..1` on both axes, +Y up). `aspect` is width / height.
    pub fn ray_through(&self, ndc_x: f32, ndc_y: f32, aspect: f32) -> Ray {
        let (forward, right, up) = self.basis();
        let t = self.tan_half_fov();
        let direction = add(
            forward,
            add(scale(right, ndc_x * t * aspect), scale(up, ndc_y * t)),
        );
        Ray::new(self.position, direction)
    }

    /// Normalized device coordinates of a world point, or `None` when it is
    /// behind the camera.
    pub fn project(&self, point: Vec3, aspect: f32) -> Option<[f32; 2]> {
        let (forward, right, up) = self.basis();
        let v = sub(point, self.position);
        let depth = dot(v, forward);
        if depth <= f32::EPSILON {
            return None;
        }
        let t = self.tan_half_fov();
        Some([
            dot(v, right) / (depth * t * aspect),
            dot(v, up) / (depth * t),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::length;

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::default();
        let ray = camera.ray_through(0.0, 0.0, 16.0 / 9.0);
        let expected = normalize(sub(camera.target, camera.position));
        assert!(length(sub(ray.direction, expected)) < 1e-5);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn project_inverts_ray_through() {
        let camera = Camera::default();
        let aspect = 1.5;
        let ray = camera.ray_through(0.4, -0.25, aspect);
        let ndc = camera.project(ray.at(10.0), aspect).unwrap();
        assert!((ndc[0] - 0.4).abs() < 1e-4);
        assert!((ndc[1] + 0.25).abs() < 1e-4);
    }

    #[test]
    fn points_behind_are_not_projected() {
        let camera = Camera::default();
        assert!(camera.project([0.0, 5.0, 20.0], 1.0).is_none());
    }

    #[test]
    fn screen_right_is_world_right() {
        let camera = Camera::default();
        let ray = camera.ray_through(1.0, 0.0, 1.0);
        assert!(ray.direction[0] > 0.0);
    }
}
