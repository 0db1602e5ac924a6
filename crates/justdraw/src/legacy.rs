//! The deprecated free-function API.
//!
//! Canvases live in an explicit [`Canvases`] registry instead of global
//! state, and the raw helpers take the context they act on. Every entry
//! point logs a deprecation warning the first time it is called.

use std::str::FromStr;

use justdraw_canvas::ImageData;
use justdraw_common::{Color, DrawError, RendererOptions, Result};
use justdraw_gl::{constants, GlContext, GlObject};
use tracing::{debug, warn};

use crate::renderer::{Renderer, Renderer2D, Renderer3D};
use crate::webgl::{BufferUsage, DataType};

macro_rules! deprecated_call {
    ($name:literal, $replacement:literal) => {{
        static ONCE: std::sync::Once = std::sync::Once::new();
        ONCE.call_once(|| {
            warn!(
                function = $name,
                replacement = $replacement,
                "deprecated call, this function will be removed"
            )
        });
    }};
}

/// The kind of context a canvas is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    TwoD,
    WebGl,
}

impl FromStr for ContextKind {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2d" => Ok(ContextKind::TwoD),
            "webgl" => Ok(ContextKind::WebGl),
            other => Err(DrawError::UnknownContext(other.to_string())),
        }
    }
}

/// A canvas created through [`Canvases::create_canvas`].
#[derive(Debug)]
pub enum LegacyCanvas {
    TwoD(Renderer2D),
    WebGl(Renderer3D),
}

impl LegacyCanvas {
    pub fn kind(&self) -> ContextKind {
        match self {
            LegacyCanvas::TwoD(_) => ContextKind::TwoD,
            LegacyCanvas::WebGl(_) => ContextKind::WebGl,
        }
    }

    pub fn as_2d(&self) -> Option<&Renderer2D> {
        match self {
            LegacyCanvas::TwoD(r) => Some(r),
            LegacyCanvas::WebGl(_) => None,
        }
    }

    pub fn as_webgl(&self) -> Option<&Renderer3D> {
        match self {
            LegacyCanvas::WebGl(r) => Some(r),
            LegacyCanvas::TwoD(_) => None,
        }
    }

    pub fn as_webgl_mut(&mut self) -> Option<&mut Renderer3D> {
        match self {
            LegacyCanvas::WebGl(r) => Some(r),
            LegacyCanvas::TwoD(_) => None,
        }
    }
}

/// Named canvases plus the main canvas the drawing helpers act on.
#[derive(Debug, Default)]
pub struct Canvases {
    entries: Vec<(String, LegacyCanvas)>,
    main: Option<usize>,
}

impl Canvases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&LegacyCanvas> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, canvas)| canvas)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LegacyCanvas> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, canvas)| canvas)
    }

    /// The first canvas created, whatever its kind.
    pub fn main_canvas(&self) -> Option<&LegacyCanvas> {
        let index = self.main?;
        self.entries.get(index).map(|(_, canvas)| canvas)
    }

    /// The main canvas when it is a 2D one.
    pub fn main(&self) -> Option<&Renderer2D> {
        self.main_canvas().and_then(LegacyCanvas::as_2d)
    }

    fn main_mut(&mut self) -> Result<&mut Renderer2D> {
        let index = self.main.ok_or(DrawError::NoMainCanvas)?;
        match self.entries.get_mut(index) {
            Some((_, LegacyCanvas::TwoD(r))) => Ok(r),
            _ => Err(DrawError::NoMainCanvas),
        }
    }

    /// Create a canvas of `kind` (`"2d"` or `"webgl"`) under `name`, or
    /// under its position when no name is given. A canvas with the same
    /// name is replaced in place. The first canvas created becomes the main
    /// one; the drawing helpers fail with [`DrawError::NoMainCanvas`] while
    /// it is a WebGL canvas.
    #[deprecated(note = "use Renderer2D::new or Renderer3D::new")]
    pub fn create_canvas(
        &mut self,
        width: u32,
        height: u32,
        kind: &str,
        name: Option<&str>,
    ) -> Result<&mut LegacyCanvas> {
        deprecated_call!("create_canvas", "Renderer2D::new / Renderer3D::new");

        let kind: ContextKind = kind.parse()?;
        let options = RendererOptions::sized(width, height);
        let canvas = match kind {
            ContextKind::TwoD => LegacyCanvas::TwoD(Renderer2D::new(options)),
            ContextKind::WebGl => LegacyCanvas::WebGl(Renderer3D::headless(options)?),
        };

        let name = name.map_or_else(|| self.entries.len().to_string(), str::to_string);
        let index = match self.entries.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                self.entries[index].1 = canvas;
                index
            }
            None => {
                self.entries.push((name.clone(), canvas));
                self.entries.len() - 1
            }
        };
        if self.main.is_none() {
            self.main = Some(index);
        }
        debug!(name = %name, ?kind, width, height, "legacy canvas created");

        Ok(&mut self.entries[index].1)
    }

    /// Reset the main canvas, or clear only `[x, y, width, height]`.
    #[deprecated(note = "use Renderer2D::clear or Renderer2D::clear_rect")]
    pub fn clear(&mut self, rect: Option<[f32; 4]>) -> Result<()> {
        deprecated_call!("clear", "Renderer2D::clear");
        let main = self.main_mut()?;
        match rect {
            Some([x, y, width, height]) => main.clear_rect(x, y, width, height),
            None => main.clear(),
        }
        Ok(())
    }

    #[deprecated(note = "use Renderer2D::translate")]
    pub fn translate(&mut self, x: f32, y: f32) -> Result<()> {
        deprecated_call!("translate", "Renderer2D::translate");
        self.main_mut()?.translate((x, y));
        Ok(())
    }

    #[deprecated(note = "use Renderer2D::rotate")]
    pub fn rotate(&mut self, angle: f32) -> Result<()> {
        deprecated_call!("rotate", "Renderer2D::rotate");
        self.main_mut()?.rotate(angle);
        Ok(())
    }

    #[deprecated(note = "use Renderer2D::save")]
    pub fn push(&mut self) -> Result<()> {
        deprecated_call!("push", "Renderer2D::save");
        self.main_mut()?.save();
        Ok(())
    }

    #[deprecated(note = "use Renderer2D::restore")]
    pub fn pop(&mut self) -> Result<()> {
        deprecated_call!("pop", "Renderer2D::restore");
        self.main_mut()?.restore();
        Ok(())
    }

    /// Fill the main canvas. Missing green and blue repeat `r`, missing
    /// alpha is opaque.
    #[deprecated(note = "use Renderer::set_background")]
    pub fn background(
        &mut self,
        r: f32,
        g: Option<f32>,
        b: Option<f32>,
        a: Option<f32>,
    ) -> Result<()> {
        deprecated_call!("background", "Renderer::set_background");
        let color = Color::new(r, g.unwrap_or(r), b.unwrap_or(r), a.unwrap_or(1.0));
        self.main_mut()?.set_background(color);
        Ok(())
    }

    #[deprecated(note = "use Renderer::resize")]
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        deprecated_call!("resize", "Renderer::resize");
        self.main_mut()?.resize(width, height);
        Ok(())
    }

    #[deprecated(note = "use Renderer::fullscreen")]
    pub fn fullscreen(&mut self, viewport_width: u32, viewport_height: u32) -> Result<()> {
        deprecated_call!("fullscreen", "Renderer::fullscreen");
        self.main_mut()?.fullscreen(viewport_width, viewport_height);
        Ok(())
    }
}

// ==================== Raw context helpers ====================

/// Upload `data` as float32 into a new array buffer.
#[deprecated(note = "use Renderer3D::create_buffer")]
pub fn create_buffer<G: GlContext>(gl: &mut G, data: &[f64], usage: BufferUsage) -> GlObject {
    deprecated_call!("create_buffer", "Renderer3D::create_buffer");
    let buffer = gl.create_buffer();
    gl.bind_buffer(constants::ARRAY_BUFFER, Some(buffer));
    gl.buffer_data(
        constants::ARRAY_BUFFER,
        &DataType::Float32.encode(data, false),
        usage.gl_enum(),
    );
    buffer
}

/// Overwrite the start of `buffer` with `data` as float32.
#[deprecated(note = "use Renderer3D::update_buffer")]
pub fn update_buffer<G: GlContext>(gl: &mut G, buffer: GlObject, data: &[f64]) {
    deprecated_call!("update_buffer", "Renderer3D::update_buffer");
    gl.bind_buffer(constants::ARRAY_BUFFER, Some(buffer));
    gl.buffer_sub_data(
        constants::ARRAY_BUFFER,
        0,
        &DataType::Float32.encode(data, false),
    );
}

/// Point attribute `name` of `program` at `buffer`. Returns the attribute
/// location, `-1` when the program has no such active attribute.
#[deprecated(note = "use Renderer3D::add_attribute")]
pub fn manage_attribute<G: GlContext>(
    gl: &mut G,
    program: GlObject,
    name: &str,
    buffer: GlObject,
    size: i32,
    data_type: DataType,
) -> i32 {
    deprecated_call!("manage_attribute", "Renderer3D::add_attribute");
    gl.use_program(Some(program));
    let location = gl.get_attrib_location(program, name);
    let Ok(index) = u32::try_from(location) else {
        warn!(attribute = name, "attribute is not active in program");
        return location;
    };

    gl.enable_vertex_attrib_array(index);
    gl.bind_buffer(constants::ARRAY_BUFFER, Some(buffer));
    gl.vertex_attrib_pointer(index, size, data_type.gl_enum(), false, 0, 0);
    location
}

/// A 2D texture holding `image`, or a single blue pixel until one is
/// uploaded. Edges clamp, minification is linear and magnification nearest.
#[deprecated(note = "use Renderer3D::create_texture")]
pub fn create_texture<G: GlContext>(gl: &mut G, image: Option<&ImageData>) -> GlObject {
    deprecated_call!("create_texture", "Renderer3D::create_texture");
    let texture = gl.create_texture();
    gl.bind_texture(constants::TEXTURE_2D, Some(texture));
    upload(gl, 1, 1, &[0, 0, 255, 255]);
    if let Some(image) = image {
        upload(gl, image.width, image.height, &image.data);
    }

    let parameters = [
        (constants::TEXTURE_WRAP_S, constants::CLAMP_TO_EDGE),
        (constants::TEXTURE_WRAP_T, constants::CLAMP_TO_EDGE),
        (constants::TEXTURE_MIN_FILTER, constants::LINEAR),
        (constants::TEXTURE_MAG_FILTER, constants::NEAREST),
    ];
    for (pname, param) in parameters {
        gl.tex_parameteri(constants::TEXTURE_2D, pname, param as i32);
    }
    texture
}

#[deprecated(note = "use Renderer3D::update_texture")]
pub fn update_texture<G: GlContext>(gl: &mut G, texture: GlObject, image: &ImageData) {
    deprecated_call!("update_texture", "Renderer3D::update_texture");
    gl.bind_texture(constants::TEXTURE_2D, Some(texture));
    upload(gl, image.width, image.height, &image.data);
}

fn upload<G: GlContext>(gl: &mut G, width: u32, height: u32, pixels: &[u8]) {
    gl.tex_image_2d(
        constants::TEXTURE_2D,
        0,
        constants::RGBA as i32,
        width as i32,
        height as i32,
        0,
        constants::RGBA,
        constants::UNSIGNED_BYTE,
        Some(pixels),
    );
}
