//! Drawable surfaces.
//!
//! A renderer pairs a [`Surface`] (size, center, fullscreen flag) with the
//! native context that draws on it.

use glam::Vec2;
use justdraw_common::{Color, ContextOptions, RendererOptions};
use tracing::debug;

mod canvas;
mod style;
mod webgl;

pub use canvas::Renderer2D;
pub use style::{LineStyle, Outline, ShapeStyle, TextStyle};
pub use webgl::Renderer3D;

/// Size and placement of a drawable surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    center: Vec2,
    fullscreen: bool,
    context: ContextOptions,
}

impl Surface {
    pub fn new(options: &RendererOptions) -> Self {
        let mut surface = Self {
            width: 0,
            height: 0,
            center: Vec2::ZERO,
            fullscreen: options.fullscreen,
            context: options.context.clone(),
        };
        surface.resize(options.width, options.height);
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width / 2, height / 2)`, kept in step with every resize.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn context_options(&self) -> &ContextOptions {
        &self.context
    }

    pub(crate) fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.center = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
        debug!(width, height, "surface resized");
    }
}

/// Operations shared by the 2D and WebGL renderers.
pub trait Renderer {
    fn surface(&self) -> &Surface;

    fn resize(&mut self, width: u32, height: u32);

    /// Fill the whole surface with `color`.
    fn set_background(&mut self, color: Color);

    /// Size the surface to the host viewport and keep following it.
    fn fullscreen(&mut self, viewport_width: u32, viewport_height: u32);

    /// Follow the host viewport while fullscreen. Returns whether the
    /// surface was resized.
    fn viewport_resized(&mut self, width: u32, height: u32) -> bool {
        if !self.surface().is_fullscreen() {
            return false;
        }
        self.resize(width, height);
        true
    }

    fn width(&self) -> u32 {
        self.surface().width()
    }

    fn height(&self) -> u32 {
        self.surface().height()
    }

    fn center(&self) -> Vec2 {
        self.surface().center()
    }
}
