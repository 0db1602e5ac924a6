use std::ops::{Deref, DerefMut};

use glam::{Mat4, Vec3};

use super::Object3D;
use crate::math;
use crate::webgl::ToArray;

/// How a camera maps view space to clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lens {
    /// No projection at all.
    Identity,
    /// Vertical field of view in radians and width / height ratio.
    Perspective { fov: f32, aspect: f32 },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

impl Lens {
    pub const DEFAULT_PERSPECTIVE: Lens = Lens::Perspective {
        fov: 0.8726,
        aspect: 1.0,
    };

    pub const DEFAULT_ORTHOGRAPHIC: Lens = Lens::Orthographic {
        left: -1.0,
        right: 1.0,
        top: 1.0,
        bottom: -1.0,
    };
}

/// An [`Object3D`] with a projection matrix.
///
/// The object part is reachable through `Deref`, so a camera moves and
/// turns like any other object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    object: Object3D,
    near: f32,
    far: f32,
    lens: Lens,
    projection: Mat4,
}

impl Camera {
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 2000.0;

    pub fn new(lens: Lens, near: f32, far: f32) -> Self {
        let mut camera = Self {
            object: Object3D::new(),
            near,
            far,
            lens,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Lens::Perspective { fov, aspect }, near, far)
    }

    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self::new(
            Lens::Orthographic {
                left,
                right,
                top,
                bottom,
            },
            near,
            far,
        )
    }

    /// Perspective camera with a 50 degree field of view and a square aspect.
    pub fn default_perspective() -> Self {
        Self::new(Lens::DEFAULT_PERSPECTIVE, Self::DEFAULT_NEAR, Self::DEFAULT_FAR)
    }

    /// Orthographic camera over the `[-1, 1]` square.
    pub fn default_orthographic() -> Self {
        Self::new(Lens::DEFAULT_ORTHOGRAPHIC, Self::DEFAULT_NEAR, Self::DEFAULT_FAR)
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn lens(&self) -> Lens {
        self.lens
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
        self.update_projection_matrix();
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
        self.update_projection_matrix();
    }

    pub fn set_lens(&mut self, lens: Lens) {
        self.lens = lens;
        self.update_projection_matrix();
    }

    /// Ignored unless the lens is a perspective one.
    pub fn set_fov(&mut self, value: f32) {
        if let Lens::Perspective { fov, .. } = &mut self.lens {
            *fov = value;
            self.update_projection_matrix();
        }
    }

    /// Ignored unless the lens is a perspective one.
    pub fn set_aspect(&mut self, value: f32) {
        if let Lens::Perspective { aspect, .. } = &mut self.lens {
            *aspect = value;
            self.update_projection_matrix();
        }
    }

    /// Ignored unless the lens is an orthographic one.
    pub fn set_bounds(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
        if let Lens::Orthographic { .. } = self.lens {
            self.set_lens(Lens::Orthographic {
                left,
                right,
                top,
                bottom,
            });
        }
    }

    /// Turn towards `target`: pitch from the y/z offset, yaw from the x/z
    /// offset, no roll.
    pub fn look_at(&mut self, target: &Object3D) {
        let d: Vec3 = target.position() - self.object.position();
        self.object
            .rotate_to([d.y.atan2(d.z), d.x.atan2(d.z), 0.0]);
    }

    fn update_projection_matrix(&mut self) {
        self.projection = match self.lens {
            Lens::Identity => math::IDENTITY,
            Lens::Perspective { fov, aspect } => math::perspective(fov, aspect, self.near, self.far),
            Lens::Orthographic {
                left,
                right,
                top,
                bottom,
            } => Mat4::orthographic_rh_gl(left, right, bottom, top, self.near, self.far),
        };
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Lens::Identity, Self::DEFAULT_NEAR, Self::DEFAULT_FAR)
    }
}

impl Deref for Camera {
    type Target = Object3D;

    fn deref(&self) -> &Object3D {
        &self.object
    }
}

impl DerefMut for Camera {
    fn deref_mut(&mut self) -> &mut Object3D {
        &mut self.object
    }
}

/// Pushes the model matrix, like any [`Object3D`]; the projection goes
/// through [`Camera::projection_matrix`].
impl ToArray for Camera {
    fn to_array(&self) -> Vec<f64> {
        self.object.to_array()
    }
}
