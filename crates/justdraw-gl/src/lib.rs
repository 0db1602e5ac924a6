//! # JustDraw GL
//!
//! The WebGL 1.0 call surface JustDraw forwards to.
//!
//! ## Features
//!
//! - **GlContext**: the native calls the wrapper objects issue
//! - **HeadlessGl**: an in-memory context tracking GL state, buffer and
//!   texture storage, uniform values and draw calls
//! - **Source checks**: driver-style compile logs for malformed shaders
//!
//! ## Architecture
//!
//! ```text
//! GlContext (trait)
//!    └── HeadlessGl
//!           ├── WebGLState (bindings, clear color, vertex attribs)
//!           ├── Shaders / Programs / Buffers / Textures
//!           └── Recorded DrawCalls + GlCallStats
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

mod headless;
pub mod validate;

pub use headless::{
    BufferData, DrawCall, GlCallStats, HeadlessGl, ProgramData, ShaderData, TextureData,
    UniformValue, VertexAttribPointer, WebGLState,
};

// ==================== Errors ====================

/// Errors reported by a GL context through `getError`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    #[error("Invalid enum")]
    InvalidEnum,

    #[error("Invalid value")]
    InvalidValue,

    #[error("Invalid operation")]
    InvalidOperation,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Context lost")]
    ContextLost,
}

impl GlError {
    /// Map a `getError` code; `NO_ERROR` and unknown codes map to `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            constants::INVALID_ENUM => Some(Self::InvalidEnum),
            constants::INVALID_VALUE => Some(Self::InvalidValue),
            constants::INVALID_OPERATION => Some(Self::InvalidOperation),
            constants::OUT_OF_MEMORY => Some(Self::OutOfMemory),
            constants::CONTEXT_LOST_WEBGL => Some(Self::ContextLost),
            _ => None,
        }
    }
}

// ==================== Constants ====================

/// WebGL constants (matches OpenGL ES 2.0).
pub mod constants {
    // Clear bits
    pub const COLOR_BUFFER_BIT: u32 = 0x00004000;
    pub const DEPTH_BUFFER_BIT: u32 = 0x00000100;
    pub const STENCIL_BUFFER_BIT: u32 = 0x00000400;

    // Primitive types
    pub const POINTS: u32 = 0x0000;
    pub const LINES: u32 = 0x0001;
    pub const LINE_LOOP: u32 = 0x0002;
    pub const LINE_STRIP: u32 = 0x0003;
    pub const TRIANGLES: u32 = 0x0004;
    pub const TRIANGLE_STRIP: u32 = 0x0005;
    pub const TRIANGLE_FAN: u32 = 0x0006;

    // Buffer types
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

    // Buffer usage
    pub const STATIC_DRAW: u32 = 0x88E4;
    pub const DYNAMIC_DRAW: u32 = 0x88E8;
    pub const STREAM_DRAW: u32 = 0x88E0;

    // Data types
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;

    // Shader types
    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const FRAGMENT_SHADER: u32 = 0x8B30;

    // Shader parameters
    pub const COMPILE_STATUS: u32 = 0x8B81;
    pub const LINK_STATUS: u32 = 0x8B82;
    pub const DELETE_STATUS: u32 = 0x8B80;

    // Texture targets
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE0: u32 = 0x84C0;

    // Texture parameters
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;

    // Texture filter values
    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;

    // Texture wrap values
    pub const REPEAT: u32 = 0x2901;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const MIRRORED_REPEAT: u32 = 0x8370;

    // Texture formats
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;

    // Error codes
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    pub const CONTEXT_LOST_WEBGL: u32 = 0x9242;
}

// ==================== Object IDs ====================

/// WebGL object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlObject(u32);

impl GlObject {
    fn new() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

// ==================== Context ====================

/// The native WebGL calls the JustDraw wrappers forward to.
///
/// Method names and argument order follow the WebGL IDL. Objects are opaque
/// [`GlObject`] handles; attribute locations are plain indices with `-1`
/// meaning "not found".
pub trait GlContext {
    /// Whether the context has been lost and can no longer render.
    fn is_context_lost(&self) -> bool {
        false
    }

    /// Get and clear the last error code.
    fn get_error(&mut self) -> u32;

    // ==================== State ====================

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&mut self, mask: u32);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    // ==================== Shaders and programs ====================

    fn create_shader(&mut self, shader_type: u32) -> GlObject;
    fn shader_source(&mut self, shader: GlObject, source: &str);
    fn compile_shader(&mut self, shader: GlObject);
    fn get_shader_parameter(&self, shader: GlObject, pname: u32) -> Option<i32>;
    fn get_shader_info_log(&self, shader: GlObject) -> String;

    fn create_program(&mut self) -> GlObject;
    fn attach_shader(&mut self, program: GlObject, shader: GlObject);
    fn link_program(&mut self, program: GlObject);
    fn get_program_parameter(&self, program: GlObject, pname: u32) -> Option<i32>;
    fn get_program_info_log(&self, program: GlObject) -> String;
    fn use_program(&mut self, program: Option<GlObject>);

    fn get_attrib_location(&mut self, program: GlObject, name: &str) -> i32;
    fn get_uniform_location(&mut self, program: GlObject, name: &str) -> Option<GlObject>;

    // ==================== Uniforms ====================

    fn uniform1f(&mut self, location: GlObject, x: f32);
    fn uniform1i(&mut self, location: GlObject, x: i32);
    /// `uniform{arity}fv`
    fn uniform_fv(&mut self, location: GlObject, arity: usize, value: &[f32]);
    /// `uniform{arity}iv`
    fn uniform_iv(&mut self, location: GlObject, arity: usize, value: &[i32]);
    /// `uniformMatrix{order}fv`
    fn uniform_matrix_fv(&mut self, location: GlObject, order: usize, transpose: bool, value: &[f32]);

    // ==================== Buffers ====================

    fn create_buffer(&mut self) -> GlObject;
    fn bind_buffer(&mut self, target: u32, buffer: Option<GlObject>);
    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32);
    /// Replace bytes of the bound buffer starting at byte `offset`.
    fn buffer_sub_data(&mut self, target: u32, offset: usize, data: &[u8]);

    /// Raw contents of a buffer's data store, when the host allows reading it back.
    fn read_buffer_data(&self, _buffer: GlObject) -> Option<Vec<u8>> {
        None
    }

    // ==================== Vertex attributes ====================

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);

    // ==================== Textures ====================

    fn create_texture(&mut self) -> GlObject;
    fn active_texture(&mut self, texture: u32);
    fn bind_texture(&mut self, target: u32, texture: Option<GlObject>);
    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        type_: u32,
        pixels: Option<&[u8]>,
    );
    fn generate_mipmap(&mut self, target: u32);

    // ==================== Drawing ====================

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, type_: u32, offset: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_are_unique() {
        let a = GlObject::new();
        let b = GlObject::new();
        assert_ne!(a, b);
        assert!(a.is_valid() && b.is_valid());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GlError::from_code(constants::NO_ERROR), None);
        assert_eq!(GlError::from_code(constants::INVALID_VALUE), Some(GlError::InvalidValue));
        assert_eq!(GlError::from_code(0x1234), None);
    }
}
