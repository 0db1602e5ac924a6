//! The recording 2D context.

use std::fmt;

use justdraw_common::Color;
use tracing::trace;

use crate::path::Path2D;
use crate::transform::Transform;
use crate::CanvasError;

// ==================== Font ====================

/// A parsed CSS font shorthand, `"<style> <size>px <family>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub style: String,
    pub size: f32,
    pub family: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            style: "normal".to_string(),
            size: 10.0,
            family: "sans-serif".to_string(),
        }
    }
}

impl Font {
    pub fn new(style: impl Into<String>, size: f32, family: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            size,
            family: family.into(),
        }
    }

    /// Parse a font shorthand. The style words are optional; the size must
    /// be given in pixels.
    pub fn parse(s: &str) -> Result<Self, CanvasError> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let size_at = words
            .iter()
            .position(|w| w.ends_with("px"))
            .ok_or_else(|| CanvasError::InvalidFont(s.to_string()))?;

        let size: f32 = words[size_at]
            .trim_end_matches("px")
            .parse()
            .map_err(|_| CanvasError::InvalidFont(s.to_string()))?;
        let family = words[size_at + 1..].join(" ");
        if family.is_empty() {
            return Err(CanvasError::InvalidFont(s.to_string()));
        }
        let style = if size_at == 0 {
            "normal".to_string()
        } else {
            words[..size_at].join(" ")
        };

        Ok(Self { style, size, family })
    }

    /// Average advance width of one character.
    fn advance(&self) -> f32 {
        if self.family.contains("monospace") {
            self.size * 0.6
        } else {
            self.size * 0.5
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px {}", self.style, self.size, self.family)
    }
}

/// Result of `measure_text`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
}

// ==================== Context State ====================

/// Shadow drawn under painted shapes; the glow effect of the 2D renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f32,
    pub color: Color,
}

/// Canvas context state (for save/restore).
#[derive(Debug, Clone, PartialEq)]
pub struct ContextState {
    pub transform: Transform,
    pub fill_style: Color,
    pub stroke_style: Color,
    pub line_width: f32,
    pub font: Font,
    pub global_alpha: f32,
    pub shadow_blur: f32,
    pub shadow_color: Color,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            line_width: 1.0,
            font: Font::default(),
            global_alpha: 1.0,
            shadow_blur: 0.0,
            shadow_color: Color::TRANSPARENT,
        }
    }
}

impl ContextState {
    fn shadow(&self) -> Option<Shadow> {
        (self.shadow_blur > 0.0 && self.shadow_color.a > 0.0).then_some(Shadow {
            blur: self.shadow_blur,
            color: self.shadow_color,
        })
    }

    fn paint(&self, color: Color) -> Paint {
        Paint {
            color: Color {
                a: color.a * self.global_alpha,
                ..color
            },
            transform: self.transform,
            shadow: self.shadow(),
        }
    }
}

// ==================== Draw Command ====================

/// Color, transform and shadow captured when a command is recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub transform: Transform,
    pub shadow: Option<Shadow>,
}

/// A canvas drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        paint: Paint,
    },
    ClearRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        transform: Transform,
    },
    FillPath {
        segments: Vec<Vec<(f32, f32)>>,
        paint: Paint,
    },
    StrokePath {
        segments: Vec<Vec<(f32, f32)>>,
        line_width: f32,
        paint: Paint,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        font: Font,
        paint: Paint,
    },
}

// ==================== Canvas Context ====================

/// The 2D rendering context.
#[derive(Debug)]
pub struct Canvas2D {
    width: u32,
    height: u32,
    state: ContextState,
    state_stack: Vec<ContextState>,
    path: Path2D,
    commands: Vec<DrawCommand>,
}

impl Canvas2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: ContextState::default(),
            state_stack: Vec::new(),
            path: Path2D::new(),
            commands: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize the surface. Like assigning a canvas element's size, this
    /// discards the content and resets all state.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.reset();
    }

    /// Discard the content, the path and the state stack.
    pub fn reset(&mut self) {
        trace!(commands = self.commands.len(), "canvas reset");
        self.state = ContextState::default();
        self.state_stack.clear();
        self.path = Path2D::new();
        self.commands.clear();
    }

    // ==================== State ====================

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn save(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    /// Restore the last saved state; a no-op on an empty stack.
    pub fn restore(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    pub fn save_depth(&self) -> usize {
        self.state_stack.len()
    }

    // ==================== Transforms ====================

    pub fn get_transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::IDENTITY;
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.then(&Transform::translation(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform.then(&Transform::rotation(angle));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.then(&Transform::scaling(x, y));
    }

    // ==================== Styles ====================

    pub fn set_fill_style(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    pub fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke_style = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        // Non-positive and non-finite widths are ignored, as in browsers
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn set_shadow_blur(&mut self, blur: f32) {
        if blur.is_finite() && blur >= 0.0 {
            self.state.shadow_blur = blur;
        }
    }

    pub fn set_shadow_color(&mut self, color: Color) {
        self.state.shadow_color = color;
    }

    // ==================== Path Methods ====================

    pub fn begin_path(&mut self) {
        self.path = Path2D::new();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(x, y);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(x, y);
    }

    pub fn arc(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        counterclockwise: bool,
    ) {
        self.path.arc(x, y, radius, start_angle, end_angle, counterclockwise);
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.path.rect(x, y, width, height);
    }

    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    // ==================== Drawing Methods ====================

    pub fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::FillPath {
            segments: self.path.to_segments(),
            paint: self.state.paint(self.state.fill_style),
        });
    }

    pub fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::StrokePath {
            segments: self.path.to_segments(),
            line_width: self.state.line_width,
            paint: self.state.paint(self.state.stroke_style),
        });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            paint: self.state.paint(self.state.fill_style),
        });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            x,
            y,
            width,
            height,
            line_width: self.state.line_width,
            paint: self.state.paint(self.state.stroke_style),
        });
    }

    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
            transform: self.state.transform,
        });
    }

    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font: self.state.font.clone(),
            paint: self.state.paint(self.state.fill_style),
        });
    }

    /// Estimate the advance width of `text` in the current font.
    pub fn measure_text(&self, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f32 * self.state.font.advance(),
        }
    }

    // ==================== Output ====================

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}
