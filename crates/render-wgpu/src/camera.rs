use glam::{Mat4, Vec3};

/// Perspective camera orbiting a fixed target point.
///
/// Position is derived from yaw, pitch, and radius rather than stored, so
/// the camera can never drift off its orbit sphere. `OrbitController` is the
/// only writer of the orbit fields during interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Azimuth around +Y, measured from +Z. Zero puts the camera on +Z.
    pub yaw: f32,
    /// Elevation above the target's horizontal plane.
    pub pitch: f32,
    pub radius: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            radius: 2.0,
            fov_y: 75.0_f32.to_radians(),
            aspect: 2.0,
            near: 0.1,
            far: 5.0,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.radius * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    /// Recompute the projection aspect from a viewport size in pixels.
    /// Zero dimensions (minimized window) are treated as one pixel.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_on_plus_z() {
        let cam = OrbitCamera::default();
        let pos = cam.position();
        assert!((pos - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-6);
        let vp = cam.view_projection();
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn position_stays_on_orbit_sphere() {
        let mut cam = OrbitCamera::default();
        cam.yaw = 1.3;
        cam.pitch = -0.7;
        cam.target = Vec3::new(2.0, -1.0, 0.5);
        let offset = cam.position() - cam.target;
        assert!((offset.length() - cam.radius).abs() < 1e-6);
    }

    #[test]
    fn aspect_follows_viewport() {
        let mut cam = OrbitCamera::default();
        cam.set_aspect(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.set_aspect(0, 0);
        assert_eq!(cam.aspect, 1.0);
    }
}
