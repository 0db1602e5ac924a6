//! Transformable objects and cameras.
//!
//! Both keep their matrices current: every setter recomputes the model
//! (and, for cameras, the projection) matrix before returning, so the
//! matrices can be pushed into uniforms at any time.

mod camera;
mod object3d;

pub use camera::{Camera, Lens};
pub use object3d::Object3D;
