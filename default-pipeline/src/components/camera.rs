use glam::Mat4;

use super::Transform;

/// Perspective camera. The view comes from the entity's [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: 45f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn with_aspect_ratio(mut self, width: f32, height: f32) -> Self {
        self.aspect_ratio = width / height;
        self
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// Inverse of the transform without its scale.
    pub fn view_matrix(transform: &Transform) -> Mat4 {
        Mat4::from_rotation_translation(transform.rotation, transform.position).inverse()
    }

    pub fn view_projection(&self, transform: &Transform) -> Mat4 {
        self.projection_matrix() * Self::view_matrix(transform)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::default();
        let transform = Transform::from_position(Vec3::new(3.0, 4.0, 5.0)).looking_at(Vec3::ZERO, Vec3::Y);
        let clip = camera.view_projection(&transform) * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
