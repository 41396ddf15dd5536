use std::f32::consts::PI;
use std::sync::Arc;

use ex_core::config::Material;
use ex_mesh::extrude::Solid;
use glam::{Mat3, Mat4, Vec3};

/// Ambient light intensity (white).
pub const AMBIENT_INTENSITY: f32 = 0.5;
/// Directional light intensity (white).
pub const DIRECTIONAL_INTENSITY: f32 = 0.7;
/// Position of the directional light; it shines towards the origin.
pub const DIRECTIONAL_POSITION: Vec3 = Vec3::new(10.0, 10.0, 20.0);

/// Éclairage de la scène : une ambiante + une directionnelle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lights {
    /// Intensité ambiante.
    pub ambient: f32,
    /// Intensité directionnelle.
    pub directional: f32,
    /// Direction vers la lumière, normalisée, en espace monde.
    pub direction: Vec3,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AMBIENT_INTENSITY,
            directional: DIRECTIONAL_INTENSITY,
            direction: DIRECTIONAL_POSITION.normalize(),
        }
    }
}

/// Couleur d'une surface de normale `normal`.
///
/// `world_normal` feeds Lambert, `view_normal` feeds the normal material.
/// Both must face the camera already (two-sided shading).
///
/// # Example
/// ```
/// use ex_core::config::Material;
/// use ex_render::scene::{Lights, shade};
/// use glam::Vec3;
/// let rgb = shade(Material::Normal, &Lights::default(), Vec3::Z, Vec3::Z);
/// assert_eq!(rgb, (127, 127, 255));
/// ```
#[must_use]
pub fn shade(material: Material, lights: &Lights, world_normal: Vec3, view_normal: Vec3) -> (u8, u8, u8) {
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
    match material {
        Material::Normal => {
            let c = view_normal * 0.5 + Vec3::splat(0.5);
            (to_u8(c.x), to_u8(c.y), to_u8(c.z))
        }
        Material::Lambert => {
            let diffuse = world_normal.dot(lights.direction).max(0.0);
            let v = to_u8(lights.ambient + lights.directional * diffuse);
            (v, v, v)
        }
    }
}

/// Objet maillé de la scène : le solide partagé et son état de rotation.
///
/// Rotation order is X then Y (`R = Rx(FLIP_X) · Ry(rotation_y)`): the flip
/// turns the y-down SVG outline upright, the spin happens around the mesh's
/// own vertical axis.
///
/// # Example
/// ```
/// use ex_render::scene::MeshObject;
/// let mut object = MeshObject::default();
/// object.advance(0.2, 0.5);
/// assert!((object.rotation_y - 0.1).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MeshObject {
    /// Solide courant, `None` tant que le chargement est en attente.
    pub solid: Option<Arc<Solid>>,
    /// Angle autour de Y, radians. Non borné.
    pub rotation_y: f32,
}

impl MeshObject {
    /// Fixed half-turn about X.
    pub const FLIP_X: f32 = PI;

    /// Advance the spin by `spin_speed × dt`.
    pub fn advance(&mut self, spin_speed: f32, dt: f32) {
        self.rotation_y += spin_speed * dt;
    }

    /// Matrice modèle (objet → monde).
    #[must_use]
    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(Self::FLIP_X) * Mat4::from_rotation_y(self.rotation_y)
    }

    /// Rotation part of [`Self::model`], for normals.
    #[must_use]
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_rotation_x(Self::FLIP_X) * Mat3::from_rotation_y(self.rotation_y)
    }
}
