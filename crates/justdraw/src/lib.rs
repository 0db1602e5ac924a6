//! # JustDraw
//!
//! Convenience wrappers over a Canvas 2D context and a WebGL context.
//!
//! Every drawing primitive, buffer upload and shader compile is forwarded
//! almost 1:1 to the native context. The wrappers add default parameters
//! and a binding cache that skips redundant program, buffer and texture
//! binds.
//!
//! ## Features
//!
//! - **Renderer2D**: background, transform stack and shape helpers
//! - **Renderer3D**: owns programs, buffers, attributes, uniforms and
//!   textures, addressed by typed ids
//! - **Draw assembly**: count resolution, attribute setup, indexed or
//!   array draws
//! - **Shader diagnostics**: annotated source excerpts on compile failure
//! - **Scene**: `Object3D` transforms and perspective / orthographic cameras
//! - **Legacy**: the deprecated free-function API over explicit canvases
//!
//! ## Architecture
//!
//! ```text
//! Renderer3D<G: GlContext>
//!    ├── BindingCache (program / buffer / texture slot)
//!    ├── Programs ── Attributes ── Buffers
//!    │          ├── Uniforms (UniformType, ToArray)
//!    │          └── index Buffer
//!    ├── Textures ── ImageLoader (background decode, polled completions)
//!    └── G (HeadlessGl by default)
//!
//! Renderer2D
//!    └── Canvas2D
//! ```

pub mod binding;
pub mod legacy;
pub mod loader;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod webgl;

pub use binding::{BindSlot, BindingCache};
pub use loader::{FileImageLoader, HttpImageLoader, ImageLoader, LoadError, LoadSink, SourceLoader};
pub use renderer::{
    LineStyle, Outline, Renderer, Renderer2D, Renderer3D, ShapeStyle, Surface, TextStyle,
};
pub use scene::{Camera, Lens, Object3D};
pub use webgl::{
    Attribute, AttributeId, AttributeOptions, Buffer, BufferId, BufferOptions, BufferTarget,
    BufferUsage, DataType, DrawMode, DrawOptions, Program, ProgramId, Texture, TextureFilter,
    TextureId, TextureOptions, TextureParameters, TextureSource, TextureTarget, TextureWrap,
    ToArray, Uniform, UniformId, UniformType,
};

pub use justdraw_animation as animation;
pub use justdraw_canvas as canvas;
pub use justdraw_common::{Color, DrawError, RendererOptions, Result};
pub use justdraw_gl as gl;
