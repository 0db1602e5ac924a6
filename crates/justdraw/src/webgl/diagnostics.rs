//! Shader compile diagnostics.
//!
//! Driver logs name the failing line as `ERROR: <source>:<line>: ...`. The
//! source around that line is rendered with a line-number gutter, a `>` on
//! the failing line and a caret under the offending token:
//!
//! ```text
//!   2 | uniform mat4 model;
//! > 3 | void main() { gl_Position = vec4(1.0; }
//!     |                                       ^
//!   4 | // end
//! ```

use justdraw_common::{DrawError, Result};
use justdraw_gl::{constants, GlContext, GlObject};
use tracing::{error, trace};

/// Lines shown on each side of the failing line.
const CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => constants::VERTEX_SHADER,
            ShaderStage::Fragment => constants::FRAGMENT_SHADER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Where a compile log says the first error is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Source string index, `0` for single-source shaders.
    pub source: u32,
    /// 1-based line.
    pub line: usize,
    /// First quoted token of the message, if any.
    pub token: Option<String>,
}

/// Find the first `ERROR: <source>:<line>:` entry of a compile log.
pub fn locate(log: &str) -> Option<ErrorLocation> {
    log.lines().find_map(|entry| {
        let start = entry.find("ERROR:")? + "ERROR:".len();
        let mut parts = entry[start..].splitn(3, ':');
        let source = parts.next()?.trim().parse().ok()?;
        let line = parts.next()?.trim().parse().ok()?;
        let token = parts
            .next()
            .and_then(first_quoted)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Some(ErrorLocation {
            source,
            line,
            token,
        })
    })
}

fn first_quoted(message: &str) -> Option<&str> {
    let open = message.find('\'')? + 1;
    let len = message[open..].find('\'')?;
    Some(&message[open..open + len])
}

/// Render the source around `location`. `None` when the line is not in
/// the source.
pub fn excerpt(source: &str, location: &ErrorLocation) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if location.line == 0 || location.line > lines.len() {
        return None;
    }

    let first = location.line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (location.line + CONTEXT_LINES).min(lines.len());
    let gutter = last.to_string().len();

    let mut out = String::new();
    for number in first..=last {
        let text = lines[number - 1];
        if number == location.line {
            out.push_str(&format!("> {number:>gutter$} | {text}\n"));
            let (column, width) = underline(text, location.token.as_deref());
            out.push_str(&format!(
                "  {:gutter$} | {}^{}\n",
                "",
                " ".repeat(column),
                "~".repeat(width.saturating_sub(1))
            ));
        } else {
            out.push_str(&format!("  {number:>gutter$} | {text}\n"));
        }
    }
    Some(out)
}

/// Column and width to underline: the token when it occurs on the line,
/// otherwise the whole trimmed line.
fn underline(text: &str, token: Option<&str>) -> (usize, usize) {
    if let Some(token) = token {
        if let Some(byte) = text.find(token) {
            return (text[..byte].chars().count(), token.chars().count());
        }
    }
    let indent = text.len() - text.trim_start().len();
    (text[..indent].chars().count(), text.trim().chars().count().max(1))
}

/// Annotated excerpt for a compile log, if the log names a line.
pub fn annotate(source: &str, log: &str) -> Option<String> {
    excerpt(source, &locate(log)?)
}

/// Compile one stage. On failure the annotated excerpt is logged and
/// carried in the error.
pub(crate) fn compile_shader<G: GlContext>(
    gl: &mut G,
    stage: ShaderStage,
    source: &str,
) -> Result<GlObject> {
    let shader = gl.create_shader(stage.gl_enum());
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if gl.get_shader_parameter(shader, constants::COMPILE_STATUS) == Some(1) {
        trace!(stage = stage.name(), shader = shader.id(), "shader compiled");
        return Ok(shader);
    }

    let log = gl.get_shader_info_log(shader);
    let excerpt = annotate(source, &log);
    match &excerpt {
        Some(excerpt) => error!(stage = stage.name(), "shader compile failed: {log}\n{excerpt}"),
        None => error!(stage = stage.name(), "shader compile failed: {log}"),
    }
    Err(DrawError::ShaderCompile {
        stage: stage.name(),
        log,
        excerpt,
    })
}
