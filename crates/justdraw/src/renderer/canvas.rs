//! The 2D renderer.

use std::f32::consts::TAU;

use glam::Vec2;
use justdraw_canvas::Canvas2D;
use justdraw_common::{Color, RendererOptions};
use tracing::trace;

use super::{LineStyle, Renderer, ShapeStyle, Surface, TextStyle};

/// A surface drawn through a Canvas 2D context.
#[derive(Debug)]
pub struct Renderer2D {
    surface: Surface,
    ctx: Canvas2D,
}

impl Default for Renderer2D {
    fn default() -> Self {
        Self::new(RendererOptions::default())
    }
}

impl Renderer2D {
    pub fn new(options: RendererOptions) -> Self {
        let surface = Surface::new(&options);
        let ctx = Canvas2D::new(surface.width(), surface.height());
        Self { surface, ctx }
    }

    pub fn context(&self) -> &Canvas2D {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Canvas2D {
        &mut self.ctx
    }

    /// Clear the content and reset all context state.
    pub fn clear(&mut self) {
        self.ctx.reset();
    }

    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx.clear_rect(x, y, width, height);
    }

    /// Move the origin; accepts a vector, an `(x, y)` tuple or an array.
    pub fn translate(&mut self, offset: impl Into<Vec2>) {
        let offset = offset.into();
        self.ctx.translate(offset.x, offset.y);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.ctx.rotate(angle);
    }

    pub fn save(&mut self) {
        self.ctx.save();
    }

    pub fn restore(&mut self) {
        self.ctx.restore();
    }

    // ==================== Shapes ====================

    /// Draw `text` at `position`. Centered text is shifted left by half its
    /// measured width and down by `size / 2.5`.
    pub fn write(&mut self, position: Vec2, text: &str, style: &TextStyle) {
        self.ctx.begin_path();
        self.ctx.set_font(style.font());
        self.ctx.set_fill_style(style.color);

        let (dx, dy) = if style.center {
            (self.ctx.measure_text(text).width / 2.0, style.size / 2.5)
        } else {
            (0.0, 0.0)
        };
        self.ctx.fill_text(text, position.x - dx, position.y + dy);
        self.ctx.close_path();
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, style: LineStyle) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.set_line_width(style.width);
        self.ctx.set_stroke_style(style.color);
        self.ctx.stroke();
        self.ctx.close_path();
    }

    /// A filled circle of `radius` around `position`.
    pub fn point(&mut self, position: Vec2, radius: f32, style: ShapeStyle) {
        self.ctx.begin_path();
        self.ctx.arc(position.x, position.y, radius, 0.0, TAU, false);
        self.ctx.set_fill_style(style.fill);
        self.ctx.fill();
        if let Some(outline) = style.outline {
            self.ctx.set_stroke_style(outline.color);
            self.ctx.set_line_width(outline.width);
            self.ctx.stroke();
        }
        self.ctx.close_path();
    }

    pub fn rectangle(&mut self, position: Vec2, width: f32, height: f32, style: ShapeStyle) {
        self.ctx.begin_path();
        self.ctx.set_fill_style(style.fill);
        self.ctx.fill_rect(position.x, position.y, width, height);
        if let Some(outline) = style.outline {
            self.ctx.set_stroke_style(outline.color);
            self.ctx.set_line_width(outline.width);
            self.ctx.stroke_rect(position.x, position.y, width, height);
        }
        self.ctx.close_path();
    }

    /// The outline, when given, is stroked before the fill.
    pub fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, style: ShapeStyle) {
        self.ctx.begin_path();
        self.ctx.move_to(a.x, a.y);
        self.ctx.line_to(b.x, b.y);
        self.ctx.line_to(c.x, c.y);
        self.ctx.set_fill_style(style.fill);
        self.ctx.set_stroke_style(style.fill);
        if let Some(outline) = style.outline {
            self.ctx.set_line_width(outline.width);
            self.ctx.set_stroke_style(outline.color);
            self.ctx.stroke();
        }
        self.ctx.fill();
        self.ctx.close_path();
    }

    // ==================== Glow ====================

    /// Every shape drawn after this gets a shadow of `color` blurred by
    /// `blur` pixels, until [`restore_glow`](Self::restore_glow).
    pub fn set_glow(&mut self, color: Color, blur: f32) {
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_color(color);
    }

    pub fn restore_glow(&mut self) {
        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_shadow_color(Color::TRANSPARENT);
    }
}

impl Renderer for Renderer2D {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.ctx.resize(width, height);
    }

    fn fullscreen(&mut self, viewport_width: u32, viewport_height: u32) {
        self.surface.set_fullscreen(true);
        self.resize(viewport_width, viewport_height);
    }

    fn set_background(&mut self, color: Color) {
        trace!(color = %color, "2d background");
        self.ctx.set_fill_style(color);
        self.ctx
            .fill_rect(0.0, 0.0, self.surface.width() as f32, self.surface.height() as f32);
    }
}
