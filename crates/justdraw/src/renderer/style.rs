//! Styles taken by the 2D shape helpers.

use justdraw_canvas::Font;
use justdraw_common::Color;

/// Stroke drawn around a filled shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub width: f32,
    pub color: Color,
}

impl Outline {
    /// Red outline of `width` pixels.
    pub fn new(width: f32) -> Self {
        Self {
            width,
            color: Color::RED,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Fill color and optional outline of a point, rectangle or triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill: Color,
    pub outline: Option<Outline>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            outline: None,
        }
    }
}

impl ShapeStyle {
    pub fn filled(fill: Color) -> Self {
        Self {
            fill,
            outline: None,
        }
    }

    pub fn outlined(mut self, outline: Outline) -> Self {
        // a zero-width outline is the same as none
        self.outline = (outline.width > 0.0).then_some(outline);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: Color,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::WHITE,
        }
    }
}

/// Font and placement of text drawn by `write`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f32,
    pub color: Color,
    pub family: String,
    /// CSS font style, e.g. `normal`, `italic`, `bold`.
    pub style: String,
    /// Center the text on the position instead of starting at it.
    pub center: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 18.0,
            color: Color::WHITE,
            family: "monospace".to_string(),
            style: "normal".to_string(),
            center: false,
        }
    }
}

impl TextStyle {
    pub fn sized(size: f32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    pub fn font(&self) -> Font {
        Font::new(self.style.as_str(), self.size, self.family.as_str())
    }
}
