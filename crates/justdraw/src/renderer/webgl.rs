//! The WebGL renderer.

use std::fmt;

use justdraw_common::{Color, DrawError, RendererOptions, Result};
use justdraw_gl::{constants, GlContext, HeadlessGl};
use tracing::{debug, trace};

use super::{Renderer, Surface};
use crate::binding::BindingCache;
use crate::loader::{ImageLoader, SourceLoader, TextureLoads};
use crate::webgl::{Attribute, Buffer, Program, Texture, Uniform};

/// A surface drawn through a WebGL context.
///
/// The renderer owns every program, buffer, attribute, uniform and texture
/// created on it, together with the [`BindingCache`] that decides which
/// binds reach the context.
pub struct Renderer3D<G: GlContext = HeadlessGl> {
    surface: Surface,
    pub(crate) gl: G,
    pub(crate) cache: BindingCache,
    pub(crate) programs: Vec<Program>,
    pub(crate) buffers: Vec<Buffer>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) uniforms: Vec<Uniform>,
    pub(crate) textures: Vec<Texture>,
    pub(crate) loads: TextureLoads,
}

impl Renderer3D<HeadlessGl> {
    /// A renderer over an in-memory context of the configured size.
    pub fn headless(options: RendererOptions) -> Result<Self> {
        let gl = HeadlessGl::new(options.width, options.height);
        Self::new(gl, options)
    }
}

impl<G: GlContext> Renderer3D<G> {
    /// Wrap `gl`. Fails if the context is already lost.
    pub fn new(gl: G, options: RendererOptions) -> Result<Self> {
        if gl.is_context_lost() {
            return Err(DrawError::ContextUnavailable { kind: "webgl" });
        }

        debug!(
            width = options.width,
            height = options.height,
            "webgl renderer created"
        );
        Ok(Self {
            surface: Surface::new(&options),
            gl,
            cache: BindingCache::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            attributes: Vec::new(),
            uniforms: Vec::new(),
            textures: Vec::new(),
            loads: TextureLoads::new(Box::new(SourceLoader::new())),
        })
    }

    /// Use `loader` for URL texture sources instead of [`SourceLoader`].
    pub fn with_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loads.set_loader(Box::new(loader));
        self
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Raw access to the context. The binding cache is reset, since binds
    /// made through this reference are invisible to it.
    pub fn gl_mut(&mut self) -> &mut G {
        trace!("binding cache reset for raw context access");
        self.cache.reset();
        &mut self.gl
    }

    pub fn cache(&self) -> &BindingCache {
        &self.cache
    }

    pub fn into_gl(self) -> G {
        self.gl
    }
}

impl<G: GlContext> Renderer for Renderer3D<G> {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn fullscreen(&mut self, viewport_width: u32, viewport_height: u32) {
        self.surface.set_fullscreen(true);
        self.resize(viewport_width, viewport_height);
    }

    /// Clear color and depth; the color channels are scaled to `[0, 1]`.
    fn set_background(&mut self, color: Color) {
        let [r, g, b, a] = color.to_normalized();
        trace!(r, g, b, a, "webgl background");
        self.gl.clear_color(r, g, b, a);
        self.gl
            .clear(constants::COLOR_BUFFER_BIT | constants::DEPTH_BUFFER_BIT);
    }
}

impl<G: GlContext + fmt::Debug> fmt::Debug for Renderer3D<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer3D")
            .field("surface", &self.surface)
            .field("gl", &self.gl)
            .field("cache", &self.cache)
            .field("programs", &self.programs.len())
            .field("buffers", &self.buffers.len())
            .field("attributes", &self.attributes.len())
            .field("uniforms", &self.uniforms.len())
            .field("textures", &self.textures.len())
            .field("loads", &self.loads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use justdraw_gl::DrawCall;

    #[test]
    fn test_background_scales_color() {
        let mut renderer = Renderer3D::headless(RendererOptions::sized(64, 64)).unwrap();
        renderer.set_background(Color::new(255.0, 51.0, 0.0, 0.5));

        let calls = renderer.gl().draw_calls();
        assert_eq!(
            calls,
            &[DrawCall::Clear {
                mask: constants::COLOR_BUFFER_BIT | constants::DEPTH_BUFFER_BIT,
                color: [1.0, 0.2, 0.0, 0.5],
            }]
        );
    }

    #[test]
    fn test_lost_context_is_rejected() {
        let mut gl = HeadlessGl::new(10, 10);
        gl.lose_context();
        let err = Renderer3D::new(gl, RendererOptions::default()).unwrap_err();
        assert!(matches!(err, DrawError::ContextUnavailable { kind: "webgl" }));
    }

    #[test]
    fn test_resize_sets_viewport() {
        let mut renderer = Renderer3D::headless(RendererOptions::default()).unwrap();
        renderer.resize(320, 200);
        assert_eq!(renderer.gl().state().viewport, [0, 0, 320, 200]);
        assert_eq!(renderer.center(), glam::Vec2::new(160.0, 100.0));
    }
}
