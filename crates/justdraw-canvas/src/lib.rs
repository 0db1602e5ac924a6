//! # JustDraw Canvas
//!
//! A recording implementation of the Canvas 2D context.
//!
//! ## Features
//!
//! - **Canvas2D**: the 2D drawing context the 2D renderer draws through
//! - **Path operations**: moveTo, lineTo, arc, rect, closePath
//! - **Drawing**: fillRect, strokeRect, clearRect, fillText, fill, stroke
//! - **State management**: save, restore, transform stack, shadow state
//! - **Image data**: RGBA pixel buffers used as texture sources
//!
//! ## Architecture
//!
//! ```text
//! Canvas2D
//!    ├── Context State Stack
//!    │      ├── Transform Matrix
//!    │      ├── Fill/Stroke Color, Line Width, Font
//!    │      └── Shadow (glow) and Global Alpha
//!    ├── Current Path
//!    └── Recorded DrawCommands
//! ```

use thiserror::Error;

mod context;
mod image_data;
mod path;
mod transform;

pub use context::{Canvas2D, ContextState, DrawCommand, Font, Paint, Shadow, TextMetrics};
pub use image_data::ImageData;
pub use justdraw_common::Color;
pub use path::{PathCommand, Path2D};
pub use transform::Transform;

// ==================== Errors ====================

/// Errors that can occur in canvas operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Invalid image data: expected {expected} bytes, got {actual}")]
    InvalidImageData { expected: usize, actual: usize },

    #[error("Invalid font: {0}")]
    InvalidFont(String),
}
