//! # JustDraw Common
//!
//! Common utilities, error types, and logging configuration shared by the
//! JustDraw crates.
//!
//! ## Features
//!
//! - Unified error type for every fallible drawing operation
//! - `Color` with CSS-style parsing and formatting
//! - Renderer configuration (serde)
//! - Logging configuration and setup

use thiserror::Error;

pub mod color;
pub mod config;
pub mod logging;

pub use color::Color;
pub use config::{ContextOptions, RendererOptions};
pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for JustDraw.
#[derive(Error, Debug)]
pub enum DrawError {
    /// The surface cannot provide the requested context.
    #[error("{kind} rendering context is not available")]
    ContextUnavailable { kind: &'static str },

    /// Unknown context kind requested by name.
    #[error("Unknown rendering context {0}")]
    UnknownContext(String),

    /// A main-canvas operation ran before any canvas was created.
    #[error("Main canvas does not exist!")]
    NoMainCanvas,

    /// Target framerate must be positive.
    #[error("Framerate cannot be set to value equal or less than 0 (got {0})")]
    InvalidFramerate(f64),

    /// Uniform type string not in the supported set.
    #[error("{0} is not valid uniform data type")]
    InvalidUniformType(String),

    /// Value pushed into a uniform does not fit its type.
    #[error("Invalid value for uniform '{name}': {reason}")]
    InvalidUniformValue { name: String, reason: String },

    /// Attribute component count outside 1..=4.
    #[error("Attribute '{name}' has {size} components, expected 1 to 4")]
    InvalidAttributeSize { name: String, size: u8 },

    /// Index buffers hold unsigned integers only.
    #[error("{0} is not a valid index data type, expected Uint8, Uint16 or Uint32")]
    InvalidIndexType(String),

    /// Shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile {
        stage: &'static str,
        log: String,
        /// Annotated source excerpt around the failing line, if it could be located.
        excerpt: Option<String>,
    },

    /// Program failed to link.
    #[error("Unable to initialize the shader program: {0}")]
    ProgramLink(String),

    /// Handle that does not belong to this renderer.
    #[error("Unknown {kind} handle {id}")]
    UnknownResource { kind: &'static str, id: usize },

    /// Sub-range write past the allocated buffer.
    #[error("Buffer write of {len} elements at offset {offset} exceeds length {capacity}")]
    BufferOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrawError {
    /// Create an unknown-handle error.
    pub fn unknown(kind: &'static str, id: usize) -> Self {
        Self::UnknownResource { kind, id }
    }

    /// Create a uniform value error.
    pub fn uniform_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUniformValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Whether this error is raised while constructing a resource.
    ///
    /// Construction errors are always fatal for the object being built.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            DrawError::ContextUnavailable { .. }
                | DrawError::UnknownContext(_)
                | DrawError::InvalidUniformType(_)
                | DrawError::InvalidAttributeSize { .. }
                | DrawError::InvalidIndexType(_)
                | DrawError::ShaderCompile { .. }
                | DrawError::ProgramLink(_)
        )
    }

    /// Get the error category for logs.
    pub fn category(&self) -> &'static str {
        match self {
            DrawError::ContextUnavailable { .. } | DrawError::UnknownContext(_) => "context",
            DrawError::NoMainCanvas => "canvas",
            DrawError::InvalidFramerate(_) => "timing",
            DrawError::InvalidUniformType(_) | DrawError::InvalidUniformValue { .. } => "uniform",
            DrawError::InvalidAttributeSize { .. } => "attribute",
            DrawError::ShaderCompile { .. } | DrawError::ProgramLink(_) => "shader",
            DrawError::UnknownResource { .. } => "resource",
            DrawError::BufferOverflow { .. } | DrawError::InvalidIndexType(_) => "buffer",
            DrawError::Config { .. } => "config",
            DrawError::Io(_) => "io",
        }
    }
}

/// Result type alias for JustDraw operations.
pub type Result<T> = std::result::Result<T, DrawError>;

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to an unknown-handle error.
    fn ok_or_unknown(self, kind: &'static str, id: usize) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown(self, kind: &'static str, id: usize) -> Result<T> {
        self.ok_or(DrawError::UnknownResource { kind, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(DrawError::NoMainCanvas.category(), "canvas");
        assert_eq!(DrawError::InvalidUniformType("5f".into()).category(), "uniform");
        assert_eq!(DrawError::config("bad").category(), "config");
        assert_eq!(DrawError::InvalidIndexType("Float32".into()).category(), "buffer");
    }

    #[test]
    fn test_construction_errors() {
        assert!(DrawError::InvalidUniformType("x".into()).is_construction_error());
        assert!(DrawError::ProgramLink("log".into()).is_construction_error());
        assert!(!DrawError::NoMainCanvas.is_construction_error());
        assert!(!DrawError::unknown("buffer", 3).is_construction_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DrawError::InvalidUniformType("5f".into()).to_string(),
            "5f is not valid uniform data type"
        );
        assert_eq!(
            DrawError::UnknownContext("webgl3".into()).to_string(),
            "Unknown rendering context webgl3"
        );
    }

    #[test]
    fn test_option_ext() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_unknown("program", 0).unwrap(), 42);

        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_unknown("program", 7),
            Err(DrawError::UnknownResource { kind: "program", id: 7 })
        ));
    }
}
