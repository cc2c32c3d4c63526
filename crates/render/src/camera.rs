use glam::{Mat4, Vec3};

/// Free camera with position, yaw, and pitch, plus a follow helper that
/// trails a target from a fixed offset. The scene holds several cameras
/// and switches the active one; only the active camera's view matrix is
/// consumed per frame.
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    /// Offset behind and above the target used by [`Camera::follow`].
    pub follow_offset: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 18.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -20.0_f32.to_radians(),
            speed: 10.0,
            sensitivity: 0.003,
            follow_offset: Vec3::new(0.0, 4.0, 10.0),
        }
    }
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn move_forward(&mut self, dt: f32) {
        let fwd = self.forward();
        self.position += fwd * self.speed * dt;
    }

    pub fn move_backward(&mut self, dt: f32) {
        let fwd = self.forward();
        self.position -= fwd * self.speed * dt;
    }

    pub fn move_left(&mut self, dt: f32) {
        let right = self.right();
        self.position -= right * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        let right = self.right();
        self.position += right * self.speed * dt;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Place the camera at the follow offset behind `target`, rotated by
    /// the target's yaw, and aim at the target.
    pub fn follow(&mut self, target: Vec3, target_yaw: f32) {
        let behind = Mat4::from_rotation_y(target_yaw)
            .transform_vector3(Vec3::new(0.0, 0.0, 1.0))
            * self.follow_offset.z;
        self.position = target + Vec3::new(behind.x, self.follow_offset.y, behind.z);
        let to_target = target - self.position;
        self.yaw = to_target.z.atan2(to_target.x);
        self.pitch = (to_target.y / to_target.length().max(1e-6)).asin();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_is_finite() {
        let cam = Camera::default();
        let view = cam.view_matrix();
        assert!(view.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn movement_changes_position() {
        let mut cam = Camera::default();
        let start = cam.position;
        cam.move_forward(1.0);
        assert_ne!(cam.position, start);
    }

    #[test]
    fn follow_trails_behind_target() {
        let mut cam = Camera::default();
        let target = Vec3::new(5.0, 0.0, -3.0);
        cam.follow(target, 0.0);
        assert!((cam.position.z - (target.z + cam.follow_offset.z)).abs() < 1e-4);
        assert!((cam.position.y - cam.follow_offset.y).abs() < 1e-4);
        // The camera looks toward the target.
        let fwd = cam.forward();
        let to_target = (target - cam.position).normalize();
        assert!(fwd.dot(to_target) > 0.99);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.rotate(0.0, -100_000.0);
        assert!(cam.pitch <= 89.0_f32.to_radians() + 1e-6);
    }
}
