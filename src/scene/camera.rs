//! Perspective camera with a physical lens model

use glam::{Vec2, Vec3};

/// Camera model selector the kernels dispatch on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraType {
    #[default]
    Default,
    Physical,
}

/// Thin-lens perspective camera
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    position: Vec3,
    aperture: f32,
    aspect_ratio: f32,
    sensor_size: Vec2,
    focal_length: f32,
    focus_distance: f32,
    depth_range: Vec2,
    dirty: bool,
}

impl PerspectiveCamera {
    /// Build a camera looking from `eye` towards `at` with the given up
    /// hint; the basis is re-orthogonalized.
    pub fn look_at(eye: Vec3, at: Vec3, up: Vec3) -> Self {
        let forward = (at - eye).normalize();
        let right = forward.cross(up.normalize()).normalize();
        let up = right.cross(forward);
        Self {
            forward,
            right,
            up,
            position: eye,
            aperture: 0.0,
            aspect_ratio: 1.0,
            sensor_size: Vec2::new(0.036, 0.024),
            focal_length: 0.035,
            focus_distance: 1.0,
            depth_range: Vec2::new(0.01, 10_000.0),
            dirty: true,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn aperture(&self) -> f32 {
        self.aperture
    }

    /// Lens radius; a non-zero aperture switches kernels to the physical
    /// camera model.
    pub fn set_aperture(&mut self, aperture: f32) {
        self.aperture = aperture;
        self.dirty = true;
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.dirty = true;
    }

    pub fn sensor_size(&self) -> Vec2 {
        self.sensor_size
    }

    pub fn set_sensor_size(&mut self, sensor_size: Vec2) {
        self.sensor_size = sensor_size;
        self.dirty = true;
    }

    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.focal_length = focal_length;
        self.dirty = true;
    }

    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    pub fn set_focus_distance(&mut self, focus_distance: f32) {
        self.focus_distance = focus_distance;
        self.dirty = true;
    }

    pub fn depth_range(&self) -> Vec2 {
        self.depth_range
    }

    pub fn set_depth_range(&mut self, depth_range: Vec2) {
        self.depth_range = depth_range;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_basis_is_orthonormal() {
        let cam = PerspectiveCamera::look_at(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);

        assert!(cam.forward().dot(cam.right()).abs() < 1e-6);
        assert!(cam.forward().dot(cam.up()).abs() < 1e-6);
        assert!((cam.forward().length() - 1.0).abs() < 1e-6);
        assert!((cam.up().length() - 1.0).abs() < 1e-6);
    }
}
