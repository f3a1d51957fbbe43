use glam::{Mat4, Vec3};

/// World-space up axis used for look-at and the right vector.
pub const WORLD_UP: Vec3 = Vec3::Y;
/// Pitch is clamped to this many degrees either side of the horizon so the
/// view direction never becomes parallel to [`WORLD_UP`].
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// Horizontal movement relative to the current view direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera with position, yaw and pitch (degrees) and a fixed
/// perspective. Orientation vectors are derived on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.5, 3.0), 16.0 / 9.0)
    }
}

impl Camera {
    /// Camera looking down -Z (yaw -90 degrees, level pitch) with a 60 degree
    /// field of view.
    pub fn new(position: Vec3, aspect: f32) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect,
        }
    }

    /// Replace the orientation. Pitch is clamped like [`Camera::add_yaw_pitch`].
    pub fn with_orientation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(WORLD_UP).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), WORLD_UP)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio from a framebuffer size. A zero height is
    /// treated as one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Translate along the view direction or its right vector. No collision.
    pub fn move_by(&mut self, direction: Direction, distance: f32) {
        match direction {
            Direction::Forward => self.position += self.front() * distance,
            Direction::Backward => self.position -= self.front() * distance,
            Direction::Left => self.position -= self.right() * distance,
            Direction::Right => self.position += self.right() * distance,
        }
    }

    /// Yaw accumulates without wrapping; pitch is clamped after accumulation.
    pub fn add_yaw_pitch(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn default_camera() {
        let cam = Camera::default();
        assert!(cam.position.y > 0.0);
        let vp = cam.view_projection();
        assert!(!vp.is_nan());
        assert!((cam.front() - Vec3::NEG_Z).length() < EPS);
    }

    #[test]
    fn basis_is_orthonormal_across_orientations() {
        let mut yaw = -720.0;
        while yaw <= 720.0 {
            let mut pitch = -PITCH_LIMIT_DEGREES;
            while pitch <= PITCH_LIMIT_DEGREES {
                let cam = Camera::default().with_orientation(yaw, pitch);
                let (f, r, u) = (cam.front(), cam.right(), cam.up());
                assert!((f.length() - 1.0).abs() < EPS, "yaw={yaw} pitch={pitch}");
                assert!((r.length() - 1.0).abs() < EPS);
                assert!((u.length() - 1.0).abs() < EPS);
                assert!(f.dot(r).abs() < 1e-4);
                assert!(f.dot(u).abs() < 1e-4);
                assert!(r.dot(u).abs() < 1e-4);
                pitch += 8.9;
            }
            yaw += 37.5;
        }
    }

    #[test]
    fn pitch_clamps_exactly() {
        let mut cam = Camera::default();
        for _ in 0..10 {
            cam.add_yaw_pitch(0.0, 1000.0);
        }
        assert_eq!(cam.pitch(), PITCH_LIMIT_DEGREES);
        cam.add_yaw_pitch(0.0, -5000.0);
        assert_eq!(cam.pitch(), -PITCH_LIMIT_DEGREES);
    }

    #[test]
    fn yaw_is_not_wrapped() {
        let mut cam = Camera::default();
        cam.add_yaw_pitch(720.0, 0.0);
        assert_eq!(cam.yaw(), 630.0);
        let reference = Camera::default().with_orientation(-90.0, 0.0);
        assert!((cam.front() - reference.front()).length() < 1e-4);
    }

    #[test]
    fn resize_only_changes_aspect() {
        let mut cam = Camera::default().with_orientation(10.0, 20.0);
        cam.position = Vec3::new(1.0, 2.0, 3.0);
        let before = cam.projection_matrix();
        cam.resize(800, 800);
        assert_eq!(cam.aspect, 1.0);
        assert_eq!(cam.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cam.yaw(), 10.0);
        assert_eq!(cam.pitch(), 20.0);
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn resize_with_zero_height_stays_finite() {
        let mut cam = Camera::default();
        cam.resize(640, 0);
        assert_eq!(cam.aspect, 640.0);
        assert!(!cam.projection_matrix().is_nan());
    }

    #[test]
    fn movement_follows_view_basis() {
        let mut cam = Camera::new(Vec3::ZERO, 1.0);
        cam.move_by(Direction::Forward, 2.0);
        assert!((cam.position - Vec3::new(0.0, 0.0, -2.0)).length() < EPS);
        cam.move_by(Direction::Right, 1.0);
        assert!((cam.position - Vec3::new(1.0, 0.0, -2.0)).length() < EPS);
        cam.move_by(Direction::Left, 1.0);
        cam.move_by(Direction::Backward, 2.0);
        assert!(cam.position.length() < EPS);
    }

    #[test]
    fn view_matrix_puts_camera_at_origin() {
        let cam = Camera::new(Vec3::new(3.0, 1.0, -2.0), 1.0).with_orientation(45.0, -30.0);
        let eye = cam.view_matrix().transform_point3(cam.position);
        assert!(eye.length() < 1e-4);
        let ahead = cam.view_matrix().transform_point3(cam.position + cam.front());
        assert!((ahead - Vec3::NEG_Z).length() < 1e-4);
    }
}
