use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};

/// Radians of orbit per pixel of pointer drag.
const ROTATE_SPEED: f32 = 0.005;
/// Keeps the camera off the poles so `look_at` stays well defined.
const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Z-up orbit camera with damped inertia.
///
/// Drags accumulate angular velocity; every [`OrbitCamera::advance`] applies a
/// `damping` fraction of it and bleeds the same fraction off.
#[derive(Debug, Clone)]
pub(crate) struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    azimuth: f32,
    elevation: f32,
    velocity: Vec2,
    damping: f32,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 4.5,
            azimuth: -FRAC_PI_2,
            elevation: 0.45,
            velocity: Vec2::ZERO,
            damping: 0.05,
            fov_y: 50f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    pub fn drag(&mut self, delta_x: f32, delta_y: f32) {
        self.velocity += Vec2::new(delta_x, delta_y) * ROTATE_SPEED;
    }

    pub fn advance(&mut self) {
        let step = self.velocity * self.damping;
        self.azimuth -= step.x;
        self.elevation = (self.elevation + step.y).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        self.velocity *= 1.0 - self.damping;
        if self.velocity.length_squared() < 1e-10 {
            self.velocity = Vec2::ZERO;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.velocity == Vec2::ZERO
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        self.target + Vec3::new(cos_el * cos_az, cos_el * sin_az, sin_el) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Z)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_sits_at_distance_from_target() {
        let camera = OrbitCamera::default();
        assert!(((camera.eye() - camera.target).length() - camera.distance).abs() < 1e-5);
        assert!(camera.eye().z > 0.0);
    }

    #[test]
    fn drag_inertia_decays_to_rest() {
        let mut camera = OrbitCamera::default();
        let before = camera.eye();
        camera.drag(120.0, 0.0);
        let mut steps = 0;
        while !camera.is_settled() {
            camera.advance();
            steps += 1;
            assert!(steps < 2_000, "camera never settled");
        }
        assert!((camera.eye() - before).length() > 0.1);
    }

    #[test]
    fn elevation_is_clamped() {
        let mut camera = OrbitCamera::default();
        camera.drag(0.0, 1.0e6);
        for _ in 0..50 {
            camera.advance();
        }
        assert!(camera.eye().z < camera.distance);
        assert!(camera.view().is_finite());
    }
}
