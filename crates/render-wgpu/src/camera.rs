use glam::{Mat4, Vec3};
use lanternfield_common::CameraConfig;
use std::f32::consts::{PI, TAU};

/// Keeps the camera off the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-4;

/// Perspective camera orbiting a target point.
///
/// Input accumulates into pending rotation/pan which `update` applies once
/// per frame. With damping enabled only a fraction is applied each frame, so
/// motion eases out after the mouse stops.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Angle around Y, measured from +Z towards +X.
    pub azimuth: f32,
    /// Angle down from +Y.
    pub polar: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_pan: Vec3,
    pending_scale: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let offset = config.position - config.target;
        let distance = offset.length();
        let (azimuth, polar) = if distance > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target: config.target,
            distance: distance.clamp(config.min_distance, config.max_distance),
            azimuth,
            polar: polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON),
            fov: config.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            damping: config.damping,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or(Vec3::X)
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels.
    /// A drag across the full viewport height turns a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending_azimuth -= TAU * dx / h * self.rotate_speed;
        self.pending_polar -= TAU * dy / h * self.rotate_speed;
    }

    /// Queue a zoom. Positive steps move towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_scale *= 0.95_f32.powf(self.zoom_speed * steps);
    }

    /// Queue a pan from a pointer drag so the point under the cursor follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let visible = self.distance * (self.fov / 2.0).tan();
        let right = self.right();
        let up = self.up();
        self.pending_pan += -right * (2.0 * dx * visible / h) + up * (2.0 * dy * visible / h);
    }

    /// Apply queued input. Call once per frame before reading matrices.
    pub fn update(&mut self) {
        let damped = self.damping > 0.0;
        let step = if damped { self.damping } else { 1.0 };

        self.azimuth = (self.azimuth + self.pending_azimuth * step).rem_euclid(TAU);
        self.polar = (self.polar + self.pending_polar * step).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.target += self.pending_pan * step;
        self.distance =
            (self.distance * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.pending_scale = 1.0;

        if damped {
            let keep = 1.0 - self.damping;
            self.pending_azimuth *= keep;
            self.pending_polar *= keep;
            self.pending_pan *= keep;
        } else {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            self.pending_pan = Vec3::ZERO;
        }
    }

    /// Track a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matches_start_position() {
        let cam = OrbitCamera::default();
        let p = cam.position();
        assert!((p - Vec3::new(0.0, -25.0, 80.0)).length() < 1e-3);
        assert!((cam.fov.to_degrees() - 60.0).abs() < 1e-4);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn resize_sets_aspect() {
        let mut cam = OrbitCamera::default();
        for (w, h) in [(1280u32, 720u32), (800, 600), (333, 1000), (1, 1)] {
            cam.resize(w, h);
            assert_eq!(cam.aspect, w as f32 / h as f32);
        }
    }

    #[test]
    fn resize_zero_height_does_not_divide_by_zero() {
        let mut cam = OrbitCamera::default();
        cam.resize(640, 0);
        assert_eq!(cam.aspect, 640.0);
    }

    #[test]
    fn zoom_out_clamped_to_max_distance() {
        let mut cam = OrbitCamera::default();
        for _ in 0..200 {
            cam.zoom(-1.0);
            cam.update();
            assert!(cam.distance <= cam.max_distance);
        }
        assert_eq!(cam.distance, 150.0);
    }

    #[test]
    fn zoom_in_stops_at_min_distance() {
        let mut cam = OrbitCamera::default();
        for _ in 0..500 {
            cam.zoom(5.0);
            cam.update();
        }
        assert_eq!(cam.distance, cam.min_distance);
        assert!(cam.distance > 0.0);
        assert!(cam.position().distance(cam.target) > 0.5);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn zoom_in_moves_closer() {
        let mut cam = OrbitCamera::default();
        let before = cam.distance;
        cam.zoom(3.0);
        cam.update();
        assert!(cam.distance < before);
    }

    #[test]
    fn rotation_is_damped_and_settles() {
        let mut cam = OrbitCamera::default();
        let start = cam.azimuth;
        cam.rotate(100.0, 0.0, 720.0);
        cam.update();
        let first_step = (start - cam.azimuth).rem_euclid(TAU);
        let expected_total = TAU * 100.0 / 720.0;
        assert!(first_step > 0.0 && first_step < expected_total);

        for _ in 0..1_000 {
            cam.update();
        }
        let moved = (start - cam.azimuth).rem_euclid(TAU);
        assert!((moved - expected_total).abs() < 1e-3, "moved {moved}");
    }

    #[test]
    fn undamped_rotation_applies_at_once() {
        let mut cam = OrbitCamera {
            damping: 0.0,
            ..OrbitCamera::default()
        };
        let start = cam.polar;
        cam.rotate(0.0, -36.0, 720.0);
        cam.update();
        assert!((cam.polar - (start + TAU * 36.0 / 720.0)).abs() < 1e-5);
        cam.update();
        assert!((cam.polar - (start + TAU * 36.0 / 720.0)).abs() < 1e-5);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut cam = OrbitCamera {
            damping: 0.0,
            ..OrbitCamera::default()
        };
        cam.rotate(0.0, 10_000.0, 720.0);
        cam.update();
        assert!(cam.polar >= POLAR_EPSILON);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn pan_moves_target_and_keeps_distance() {
        let mut cam = OrbitCamera {
            damping: 0.0,
            ..OrbitCamera::default()
        };
        let distance = cam.distance;
        cam.pan(50.0, 0.0, 720.0);
        cam.update();
        assert!(cam.target.length() > 0.0);
        assert!((cam.distance - distance).abs() < 1e-4);
    }
}
