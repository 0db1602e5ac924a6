use glam::{Mat4, Vec3};

use crate::math::rotate;
use crate::webgl::ToArray;

/// Position, rotation (Euler angles in radians) and scale, with the model
/// matrix derived from them.
///
/// The model matrix scales, then translates, then rotates about x, y and z
/// in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Object3D {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    model: Mat4,
}

impl Default for Object3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Object3D {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            model: Mat4::IDENTITY,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn translate_to(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.update_model_matrix();
    }

    pub fn translate_by(&mut self, offset: impl Into<Vec3>) {
        self.position += offset.into();
        self.update_model_matrix();
    }

    pub fn scale_to(&mut self, scale: impl Into<Vec3>) {
        self.scale = scale.into();
        self.update_model_matrix();
    }

    /// Multiply the current scale component-wise.
    pub fn scale_by(&mut self, factor: impl Into<Vec3>) {
        self.scale *= factor.into();
        self.update_model_matrix();
    }

    pub fn rotate_to(&mut self, rotation: impl Into<Vec3>) {
        self.rotation = rotation.into();
        self.update_model_matrix();
    }

    pub fn rotate_by(&mut self, angles: impl Into<Vec3>) {
        self.rotation += angles.into();
        self.update_model_matrix();
    }

    fn update_model_matrix(&mut self) {
        let placed = Mat4::from_translation(self.position) * Mat4::from_scale(self.scale);
        let m = rotate::x(placed, self.rotation.x);
        let m = rotate::y(m, self.rotation.y);
        self.model = rotate::z(m, self.rotation.z);
    }
}

impl ToArray for Object3D {
    fn to_array(&self) -> Vec<f64> {
        self.model.to_array()
    }
}
