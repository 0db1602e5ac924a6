//! Renderer configuration

use serde::{Deserialize, Serialize};

use crate::{DrawError, Result};

/// Surface creation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Surface width in pixels
    pub width: u32,

    /// Surface height in pixels
    pub height: u32,

    /// Track the host viewport size instead of a fixed size
    pub fullscreen: bool,

    /// Attributes forwarded to the context on creation
    pub context: ContextOptions,
}

/// Context creation attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Drawing buffer has an alpha channel
    pub alpha: bool,

    /// Request antialiasing
    pub antialias: bool,

    /// Drawing buffer has a depth buffer
    pub depth: bool,

    /// Drawing buffer has a stencil buffer
    pub stencil: bool,

    /// Colors in the drawing buffer are premultiplied
    pub premultiplied_alpha: bool,

    /// Keep the drawing buffer between frames
    pub preserve_drawing_buffer: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fullscreen: false,
            context: ContextOptions::default(),
        }
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            depth: true,
            stencil: false,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
        }
    }
}

impl RendererOptions {
    /// Options for a fixed-size surface.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Load options from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DrawError::config_with_source("invalid renderer options", e))
    }
}
