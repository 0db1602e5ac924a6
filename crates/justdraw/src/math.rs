//! Projection and rotation helpers over glam types.
//!
//! Matrices are column-major and act on column vectors, so `rotate::x(m, a)`
//! applies `m` first and the rotation after it.

use glam::{Mat4, Vec2, Vec3};

/// The 4x4 identity.
pub const IDENTITY: Mat4 = Mat4::IDENTITY;

/// Perspective projection for a vertical field of view in radians, with
/// OpenGL clip-space depth in `[-1, 1]`.
pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov, aspect, near, far)
}

/// Projections of a 3D point onto the 2D plane.
pub mod project {
    use super::{Vec2, Vec3};

    /// Default viewer distance for [`perspective`].
    pub const DEFAULT_DEPTH: f32 = 3.0;

    /// Drop the z component.
    pub fn orthographic(point: Vec3) -> Vec2 {
        point.truncate()
    }

    /// Weak perspective: `x` and `y` are scaled by `scale / (depth - z)`.
    pub fn perspective(point: Vec3, scale: f32, depth: f32) -> Vec2 {
        let z = 1.0 / (depth - point.z);
        Vec2::new(z * scale * point.x, z * scale * point.y)
    }
}

/// Rotations applied after an existing transform.
pub mod rotate {
    use glam::Mat4;

    pub fn x(matrix: Mat4, angle: f32) -> Mat4 {
        Mat4::from_rotation_x(angle) * matrix
    }

    pub fn y(matrix: Mat4, angle: f32) -> Mat4 {
        Mat4::from_rotation_y(angle) * matrix
    }

    pub fn z(matrix: Mat4, angle: f32) -> Mat4 {
        Mat4::from_rotation_z(angle) * matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_orthographic() {
        assert_eq!(project::orthographic(Vec3::new(1.0, -2.0, 9.0)), Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_perspective_projection() {
        let p = project::perspective(Vec3::new(1.0, 2.0, 1.0), 100.0, project::DEFAULT_DEPTH);
        assert_eq!(p, Vec2::new(50.0, 100.0));
    }

    #[test]
    fn test_rotation_order() {
        let translated = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let m = rotate::z(translated, FRAC_PI_2);
        let p = m.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));

        let p = rotate::x(IDENTITY, FRAC_PI_2).transform_point3(Vec3::Y);
        assert!(p.abs_diff_eq(Vec3::Z, 1e-6));
        let p = rotate::y(IDENTITY, FRAC_PI_2).transform_point3(Vec3::Z);
        assert!(p.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_perspective_matrix() {
        let m = perspective(FRAC_PI_2, 2.0, 1.0, 10.0);
        assert!((m.x_axis.x - 0.5).abs() < 1e-6);
        assert!((m.y_axis.y - 1.0).abs() < 1e-6);
        assert_eq!(m.z_axis.w, -1.0);

        let near = m.project_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!((near.z + 1.0).abs() < 1e-5);
    }
}
