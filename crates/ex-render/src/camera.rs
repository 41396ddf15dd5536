use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

/// Vertical field of view, degrees.
pub const FOV_Y_DEG: f32 = 60.0;
/// Near clip plane.
pub const NEAR: f32 = 1.0;
/// Far clip plane.
pub const FAR: f32 = 5000.0;
/// Position de base, avant le décalage `camera_nudge`.
pub const BASE_POSITION: Vec3 = Vec3::new(0.0, 100.0, 1000.0);

/// Caméra perspective regardant sa cible.
///
/// The nudge shifts the position and the target together, so it translates
/// the whole view without changing the viewing direction.
///
/// # Example
/// ```
/// use ex_render::camera::Camera;
/// use glam::Vec3;
/// let cam = Camera::new([10.0, 0.0, 0.0]);
/// assert_eq!(cam.position, Vec3::new(10.0, 100.0, 1000.0));
/// assert_eq!(cam.target, Vec3::new(10.0, 0.0, 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Position monde.
    pub position: Vec3,
    /// Point regardé.
    pub target: Vec3,
}

impl Camera {
    /// Camera at the base position, shifted by `nudge`.
    #[must_use]
    pub fn new(nudge: [f32; 3]) -> Self {
        let nudge = Vec3::from_array(nudge);
        Self {
            position: BASE_POSITION + nudge,
            target: nudge,
        }
    }

    /// Re-apply a nudge while keeping the current orbit offset.
    pub fn set_nudge(&mut self, nudge: [f32; 3]) {
        let offset = self.position - self.target;
        self.target = Vec3::from_array(nudge);
        self.position = self.target + offset;
    }

    /// Matrice vue (monde → caméra), repère main droite, Y vers le haut.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection for a viewport of the given pixel aspect (width / height).
    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEG.to_radians(), aspect.max(1e-3), NEAR, FAR)
    }
}

/// Orbite autour de la cible, sans zoom ni pan.
///
/// Horizontal drag turns around the Y axis. Vertical drag tilts, with the
/// polar angle kept strictly inside (0, π) so the camera never flips over
/// the pole. A full-height drag is one full turn.
///
/// # Example
/// ```
/// use ex_render::camera::{Camera, OrbitControls};
/// let mut cam = Camera::new([0.0; 3]);
/// let orbit = OrbitControls::default();
/// let before = cam.position.distance(cam.target);
/// orbit.drag(&mut cam, 25.0, 0.0, 100.0);
/// assert!((cam.position.distance(cam.target) - before).abs() < 1e-2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct OrbitControls {
    /// Multiplicateur de vitesse de rotation.
    pub rotate_speed: f32,
    /// Angle (radians) d'un appui sur une flèche.
    pub key_step: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            key_step: 0.1,
        }
    }
}

const POLAR_EPS: f32 = 1e-4;

impl OrbitControls {
    /// Rotate by a drag of `(dx, dy)` cells over a viewport `height` cells tall.
    pub fn drag(&self, camera: &mut Camera, dx: f32, dy: f32, height: f32) {
        let h = height.max(1.0);
        self.rotate(
            camera,
            TAU * dx / h * self.rotate_speed,
            TAU * dy / h * self.rotate_speed,
        );
    }

    /// Rotate by `left` radians around Y and `up` radians towards the pole.
    pub fn rotate(&self, camera: &mut Camera, left: f32, up: f32) {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let theta = offset.x.atan2(offset.z) - left;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() - up).clamp(POLAR_EPS, PI - POLAR_EPS);
        let sin_phi = phi.sin();
        let rotated = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + rotated;
    }

    /// Arrow-key step: `(left, up)` in units of `key_step`.
    pub fn step(&self, camera: &mut Camera, left: f32, up: f32) {
        self.rotate(camera, left * self.key_step, up * self.key_step);
    }
}
