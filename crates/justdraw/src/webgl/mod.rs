//! WebGL object wrappers.
//!
//! Programs, buffers, attributes, uniforms and textures live in arenas
//! owned by [`Renderer3D`](crate::Renderer3D) and are addressed by the typed
//! ids defined here. The operations on them are `impl Renderer3D` blocks in
//! the submodules.

use std::fmt;

use justdraw_gl::constants;

mod attribute;
mod buffer;
mod data_type;
pub mod diagnostics;
mod program;
mod texture;
mod uniform;

pub use attribute::{Attribute, AttributeOptions};
pub use buffer::{Buffer, BufferOptions};
pub use data_type::DataType;
pub use program::{DrawOptions, Program};
pub use texture::{Texture, TextureOptions, TextureParameters, TextureSource};
pub use uniform::{ToArray, Uniform, UniformType};

// ==================== Ids ====================

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub(crate) const KIND: &'static str = $kind;

            /// Position in the owning renderer's arena.
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

resource_id!(
    /// Handle to a linked shader program.
    ProgramId,
    "program"
);
resource_id!(
    /// Handle to a vertex or index buffer.
    BufferId,
    "buffer"
);
resource_id!(AttributeId, "attribute");
resource_id!(UniformId, "uniform");
resource_id!(TextureId, "texture");

// ==================== Enums ====================

/// Primitive assembled by a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    pub fn gl_enum(self) -> u32 {
        match self {
            DrawMode::Points => constants::POINTS,
            DrawMode::Lines => constants::LINES,
            DrawMode::LineLoop => constants::LINE_LOOP,
            DrawMode::LineStrip => constants::LINE_STRIP,
            DrawMode::Triangles => constants::TRIANGLES,
            DrawMode::TriangleStrip => constants::TRIANGLE_STRIP,
            DrawMode::TriangleFan => constants::TRIANGLE_FAN,
        }
    }
}

/// What a buffer feeds: vertex attributes or element indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferTarget {
    #[default]
    Array,
    ElementArray,
}

impl BufferTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => constants::ARRAY_BUFFER,
            BufferTarget::ElementArray => constants::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Expected update pattern of a buffer's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

impl BufferUsage {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => constants::STATIC_DRAW,
            BufferUsage::DynamicDraw => constants::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => constants::STREAM_DRAW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureTarget {
    #[default]
    Texture2D,
    CubeMap,
}

impl TextureTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureTarget::Texture2D => constants::TEXTURE_2D,
            TextureTarget::CubeMap => constants::TEXTURE_CUBE_MAP,
        }
    }
}

/// Sampling function, used for minification, magnification and mipmap
/// selection alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

impl TextureFilter {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureFilter::Nearest => constants::NEAREST,
            TextureFilter::Linear => constants::LINEAR,
        }
    }

    /// Minification filter that also samples mipmap levels, with `self`
    /// choosing between levels and `within` filtering inside a level.
    pub fn mipmapped(self, within: TextureFilter) -> u32 {
        match (self, within) {
            (TextureFilter::Linear, TextureFilter::Linear) => constants::LINEAR_MIPMAP_LINEAR,
            (TextureFilter::Linear, TextureFilter::Nearest) => constants::LINEAR_MIPMAP_NEAREST,
            (TextureFilter::Nearest, TextureFilter::Linear) => constants::NEAREST_MIPMAP_LINEAR,
            (TextureFilter::Nearest, TextureFilter::Nearest) => constants::NEAREST_MIPMAP_NEAREST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    #[default]
    ClampToEdge,
}

impl TextureWrap {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureWrap::Repeat => constants::REPEAT,
            TextureWrap::MirroredRepeat => constants::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => constants::CLAMP_TO_EDGE,
        }
    }
}
