//! In-memory GL context.
//!
//! `HeadlessGl` keeps the state a WebGL implementation would keep (object
//! tables, bindings, buffer stores, uniform values) and records draw calls
//! instead of rasterizing. It backs the test suites and offscreen use.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{constants, validate, GlContext, GlObject};

// ==================== Shader ====================

/// Shader data.
#[derive(Debug, Clone)]
pub struct ShaderData {
    pub shader_type: u32,
    pub source: String,
    pub compiled: bool,
    pub info_log: String,
}

impl ShaderData {
    pub fn new(shader_type: u32) -> Self {
        Self {
            shader_type,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
        }
    }
}

// ==================== Program ====================

/// Program data.
#[derive(Debug, Clone, Default)]
pub struct ProgramData {
    pub vertex_shader: Option<GlObject>,
    pub fragment_shader: Option<GlObject>,
    pub linked: bool,
    pub info_log: String,
    /// Active attributes and their locations, assigned in declaration order.
    pub attributes: HashMap<String, i32>,
    pub uniforms: HashMap<String, GlObject>,
}

// ==================== Buffer ====================

/// Buffer data.
#[derive(Debug, Clone)]
pub struct BufferData {
    pub target: u32,
    pub usage: u32,
    pub data: Vec<u8>,
}

impl Default for BufferData {
    fn default() -> Self {
        Self {
            target: 0,
            usage: constants::STATIC_DRAW,
            data: Vec::new(),
        }
    }
}

// ==================== Texture ====================

/// Texture data.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub target: u32,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub data: Vec<u8>,
    pub mag_filter: u32,
    pub min_filter: u32,
    pub wrap_s: u32,
    pub wrap_t: u32,
    pub has_mipmaps: bool,
}

impl TextureData {
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

impl Default for TextureData {
    fn default() -> Self {
        Self {
            target: constants::TEXTURE_2D,
            width: 0,
            height: 0,
            format: constants::RGBA,
            data: Vec::new(),
            mag_filter: constants::LINEAR,
            min_filter: constants::NEAREST_MIPMAP_LINEAR,
            wrap_s: constants::REPEAT,
            wrap_t: constants::REPEAT,
            has_mipmaps: false,
        }
    }
}

// ==================== Vertex Attribute ====================

/// Vertex attribute pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexAttribPointer {
    pub enabled: bool,
    pub size: i32,
    pub type_: u32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<GlObject>,
}

// ==================== Context State ====================

/// Bindings and fixed state of the context.
#[derive(Debug, Clone)]
pub struct WebGLState {
    pub clear_color: [f32; 4],
    pub viewport: [i32; 4],
    pub current_program: Option<GlObject>,
    pub current_array_buffer: Option<GlObject>,
    pub current_element_buffer: Option<GlObject>,
    /// Active unit index, `0` for `TEXTURE0`.
    pub active_texture: u32,
    pub texture_units: Vec<Option<GlObject>>,
    pub vertex_attribs: Vec<VertexAttribPointer>,
}

impl Default for WebGLState {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            viewport: [0, 0, 0, 0],
            current_program: None,
            current_array_buffer: None,
            current_element_buffer: None,
            active_texture: 0,
            texture_units: vec![None; 32],
            vertex_attribs: vec![VertexAttribPointer::default(); 16],
        }
    }
}

// ==================== Draw Call ====================

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear {
        mask: u32,
        color: [f32; 4],
    },
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
        program: GlObject,
        /// Enabled attribute arrays as `(location, pointer)`.
        attribs: Vec<(u32, VertexAttribPointer)>,
    },
    DrawElements {
        mode: u32,
        count: i32,
        type_: u32,
        offset: i32,
        program: GlObject,
        element_buffer: GlObject,
        attribs: Vec<(u32, VertexAttribPointer)>,
    },
}

/// Uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    FloatVec { arity: usize, data: Vec<f32> },
    IntVec { arity: usize, data: Vec<i32> },
    Matrix { order: usize, data: Vec<f32> },
}

/// Number of native calls issued, per call kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlCallStats {
    pub use_program: usize,
    pub bind_buffer: usize,
    pub buffer_data: usize,
    pub buffer_sub_data: usize,
    pub vertex_attrib_pointer: usize,
    pub enable_vertex_attrib_array: usize,
    pub uniform: usize,
    pub active_texture: usize,
    pub bind_texture: usize,
    pub tex_parameter: usize,
    pub tex_image_2d: usize,
    pub generate_mipmap: usize,
    pub clear: usize,
    pub draw_arrays: usize,
    pub draw_elements: usize,
}

// ==================== Headless Context ====================

/// A GL context that keeps state in memory and records draw calls.
#[derive(Debug)]
pub struct HeadlessGl {
    pub width: u32,
    pub height: u32,
    state: WebGLState,
    shaders: HashMap<GlObject, ShaderData>,
    programs: HashMap<GlObject, ProgramData>,
    buffers: HashMap<GlObject, BufferData>,
    textures: HashMap<GlObject, TextureData>,
    uniform_values: HashMap<GlObject, UniformValue>,
    draw_calls: Vec<DrawCall>,
    stats: GlCallStats,
    last_error: u32,
    lost: bool,
}

impl Default for HeadlessGl {
    fn default() -> Self {
        Self::new(300, 150)
    }
}

impl HeadlessGl {
    /// Create a new context.
    pub fn new(width: u32, height: u32) -> Self {
        let state = WebGLState {
            viewport: [0, 0, width as i32, height as i32],
            ..Default::default()
        };

        Self {
            width,
            height,
            state,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            uniform_values: HashMap::new(),
            draw_calls: Vec::new(),
            stats: GlCallStats::default(),
            last_error: constants::NO_ERROR,
            lost: false,
        }
    }

    /// Resize the context.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.state.viewport = [0, 0, width as i32, height as i32];
    }

    /// Simulate `WEBGL_lose_context.loseContext()`.
    pub fn lose_context(&mut self) {
        debug!("headless context lost");
        self.lost = true;
        self.last_error = constants::CONTEXT_LOST_WEBGL;
    }

    fn set_error(&mut self, code: u32) {
        trace!(code, "gl error");
        if self.last_error == constants::NO_ERROR {
            self.last_error = code;
        }
    }

    fn bound_buffer(&self, target: u32) -> Option<GlObject> {
        match target {
            constants::ARRAY_BUFFER => self.state.current_array_buffer,
            constants::ELEMENT_ARRAY_BUFFER => self.state.current_element_buffer,
            _ => None,
        }
    }

    fn bound_texture_mut(&mut self) -> Option<&mut TextureData> {
        let unit = self.state.active_texture as usize;
        let texture = self.state.texture_units.get(unit).copied().flatten()?;
        self.textures.get_mut(&texture)
    }

    fn enabled_attribs(&self) -> Vec<(u32, VertexAttribPointer)> {
        self.state
            .vertex_attribs
            .iter()
            .enumerate()
            .filter(|(_, pointer)| pointer.enabled)
            .map(|(index, pointer)| (index as u32, pointer.clone()))
            .collect()
    }

    // ==================== Output ====================

    /// Get draw calls and clear them.
    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draw_calls)
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn stats(&self) -> GlCallStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = GlCallStats::default();
    }

    pub fn state(&self) -> &WebGLState {
        &self.state
    }

    /// Texture bound to a unit (`0` for `TEXTURE0`).
    pub fn bound_texture(&self, unit: u32) -> Option<GlObject> {
        self.state.texture_units.get(unit as usize).copied().flatten()
    }

    pub fn buffer(&self, buffer: GlObject) -> Option<&BufferData> {
        self.buffers.get(&buffer)
    }

    pub fn texture(&self, texture: GlObject) -> Option<&TextureData> {
        self.textures.get(&texture)
    }

    pub fn shader(&self, shader: GlObject) -> Option<&ShaderData> {
        self.shaders.get(&shader)
    }

    pub fn program(&self, program: GlObject) -> Option<&ProgramData> {
        self.programs.get(&program)
    }

    pub fn uniform_value(&self, location: GlObject) -> Option<&UniformValue> {
        self.uniform_values.get(&location)
    }

    /// Value of a named uniform in a program.
    pub fn uniform_by_name(&self, program: GlObject, name: &str) -> Option<&UniformValue> {
        let location = self.programs.get(&program)?.uniforms.get(name)?;
        self.uniform_values.get(location)
    }
}

impl GlContext for HeadlessGl {
    fn is_context_lost(&self) -> bool {
        self.lost
    }

    fn get_error(&mut self) -> u32 {
        let err = self.last_error;
        self.last_error = constants::NO_ERROR;
        err
    }

    // ==================== State ====================

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.state.clear_color = [r, g, b, a];
    }

    fn clear(&mut self, mask: u32) {
        self.stats.clear += 1;
        if self.lost {
            return;
        }
        self.draw_calls.push(DrawCall::Clear {
            mask,
            color: self.state.clear_color,
        });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        self.state.viewport = [x, y, width, height];
    }

    // ==================== Shaders ====================

    fn create_shader(&mut self, shader_type: u32) -> GlObject {
        let shader = GlObject::new();
        self.shaders.insert(shader, ShaderData::new(shader_type));
        shader
    }

    fn shader_source(&mut self, shader: GlObject, source: &str) {
        if let Some(data) = self.shaders.get_mut(&shader) {
            data.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: GlObject) {
        if let Some(data) = self.shaders.get_mut(&shader) {
            let issues = validate::check_source(&data.source);
            data.compiled = issues.is_empty();
            data.info_log = validate::info_log(&issues);
            if !data.compiled {
                debug!(shader = shader.id(), issues = issues.len(), "shader rejected");
            }
        }
    }

    fn get_shader_parameter(&self, shader: GlObject, pname: u32) -> Option<i32> {
        let data = self.shaders.get(&shader)?;
        match pname {
            constants::COMPILE_STATUS => Some(i32::from(data.compiled)),
            constants::DELETE_STATUS => Some(0),
            _ => None,
        }
    }

    fn get_shader_info_log(&self, shader: GlObject) -> String {
        self.shaders
            .get(&shader)
            .map(|d| d.info_log.clone())
            .unwrap_or_default()
    }

    // ==================== Programs ====================

    fn create_program(&mut self) -> GlObject {
        let program = GlObject::new();
        self.programs.insert(program, ProgramData::default());
        program
    }

    fn attach_shader(&mut self, program: GlObject, shader: GlObject) {
        if let Some(program_data) = self.programs.get_mut(&program) {
            if let Some(shader_data) = self.shaders.get(&shader) {
                match shader_data.shader_type {
                    constants::VERTEX_SHADER => program_data.vertex_shader = Some(shader),
                    constants::FRAGMENT_SHADER => program_data.fragment_shader = Some(shader),
                    _ => {}
                }
            }
        }
    }

    fn link_program(&mut self, program: GlObject) {
        let Some(data) = self.programs.get_mut(&program) else {
            self.last_error = constants::INVALID_VALUE;
            return;
        };

        let vertex = data.vertex_shader.and_then(|s| self.shaders.get(&s));
        let fragment = data.fragment_shader.and_then(|s| self.shaders.get(&s));

        let (vertex, fragment) = match (vertex, fragment) {
            (Some(v), Some(f)) if v.compiled && f.compiled => (v, f),
            _ => {
                data.linked = false;
                data.info_log = "Failed to link: missing or uncompiled shaders".to_string();
                return;
            }
        };

        data.attributes = validate::declared_names(&vertex.source, "attribute")
            .into_iter()
            .enumerate()
            .map(|(location, name)| (name, location as i32))
            .collect();

        let mut uniforms = validate::declared_names(&vertex.source, "uniform");
        for name in validate::declared_names(&fragment.source, "uniform") {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        data.uniforms = uniforms
            .into_iter()
            .map(|name| (name, GlObject::new()))
            .collect();

        data.linked = true;
        data.info_log.clear();
    }

    fn get_program_parameter(&self, program: GlObject, pname: u32) -> Option<i32> {
        let data = self.programs.get(&program)?;
        match pname {
            constants::LINK_STATUS => Some(i32::from(data.linked)),
            constants::DELETE_STATUS => Some(0),
            _ => None,
        }
    }

    fn get_program_info_log(&self, program: GlObject) -> String {
        self.programs
            .get(&program)
            .map(|d| d.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<GlObject>) {
        self.stats.use_program += 1;
        if let Some(p) = program {
            if !self.programs.get(&p).is_some_and(|d| d.linked) {
                self.set_error(constants::INVALID_OPERATION);
                return;
            }
        }
        self.state.current_program = program;
    }

    fn get_attrib_location(&mut self, program: GlObject, name: &str) -> i32 {
        match self.programs.get(&program) {
            Some(data) if data.linked => data.attributes.get(name).copied().unwrap_or(-1),
            _ => {
                self.set_error(constants::INVALID_OPERATION);
                -1
            }
        }
    }

    fn get_uniform_location(&mut self, program: GlObject, name: &str) -> Option<GlObject> {
        match self.programs.get(&program) {
            Some(data) if data.linked => {
                let base = name.split('[').next().unwrap_or(name);
                data.uniforms.get(base).copied()
            }
            _ => {
                self.set_error(constants::INVALID_OPERATION);
                None
            }
        }
    }

    // ==================== Uniforms ====================

    fn uniform1f(&mut self, location: GlObject, x: f32) {
        self.stats.uniform += 1;
        self.uniform_values.insert(location, UniformValue::Float(x));
    }

    fn uniform1i(&mut self, location: GlObject, x: i32) {
        self.stats.uniform += 1;
        self.uniform_values.insert(location, UniformValue::Int(x));
    }

    fn uniform_fv(&mut self, location: GlObject, arity: usize, value: &[f32]) {
        self.stats.uniform += 1;
        if arity == 0 || value.is_empty() || value.len() % arity != 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        self.uniform_values.insert(
            location,
            UniformValue::FloatVec {
                arity,
                data: value.to_vec(),
            },
        );
    }

    fn uniform_iv(&mut self, location: GlObject, arity: usize, value: &[i32]) {
        self.stats.uniform += 1;
        if arity == 0 || value.is_empty() || value.len() % arity != 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        self.uniform_values.insert(
            location,
            UniformValue::IntVec {
                arity,
                data: value.to_vec(),
            },
        );
    }

    fn uniform_matrix_fv(&mut self, location: GlObject, order: usize, transpose: bool, value: &[f32]) {
        self.stats.uniform += 1;
        let cells = order * order;
        // WebGL 1 rejects transposed uploads
        if transpose || cells == 0 || value.is_empty() || value.len() % cells != 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        self.uniform_values.insert(
            location,
            UniformValue::Matrix {
                order,
                data: value.to_vec(),
            },
        );
    }

    // ==================== Buffers ====================

    fn create_buffer(&mut self) -> GlObject {
        let buffer = GlObject::new();
        self.buffers.insert(buffer, BufferData::default());
        buffer
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<GlObject>) {
        self.stats.bind_buffer += 1;
        match target {
            constants::ARRAY_BUFFER => self.state.current_array_buffer = buffer,
            constants::ELEMENT_ARRAY_BUFFER => self.state.current_element_buffer = buffer,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32) {
        self.stats.buffer_data += 1;
        let Some(buf) = self.bound_buffer(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };

        if let Some(buf_data) = self.buffers.get_mut(&buf) {
            buf_data.target = target;
            buf_data.usage = usage;
            buf_data.data = data.to_vec();
        }
    }

    fn buffer_sub_data(&mut self, target: u32, offset: usize, data: &[u8]) {
        self.stats.buffer_sub_data += 1;
        let Some(buf) = self.bound_buffer(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };

        let fits = self
            .buffers
            .get(&buf)
            .is_some_and(|b| offset + data.len() <= b.data.len());
        if !fits {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        if let Some(buf_data) = self.buffers.get_mut(&buf) {
            buf_data.data[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    fn read_buffer_data(&self, buffer: GlObject) -> Option<Vec<u8>> {
        self.buffers.get(&buffer).map(|b| b.data.clone())
    }

    // ==================== Vertex Attributes ====================

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.stats.vertex_attrib_pointer += 1;
        if index as usize >= self.state.vertex_attribs.len() || !(1..=4).contains(&size) {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        if self.state.current_array_buffer.is_none() {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }

        let slot = &mut self.state.vertex_attribs[index as usize];
        *slot = VertexAttribPointer {
            enabled: slot.enabled,
            size,
            type_,
            normalized,
            stride,
            offset,
            buffer: self.state.current_array_buffer,
        };
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.stats.enable_vertex_attrib_array += 1;
        match self.state.vertex_attribs.get_mut(index as usize) {
            Some(pointer) => pointer.enabled = true,
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        match self.state.vertex_attribs.get_mut(index as usize) {
            Some(pointer) => pointer.enabled = false,
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    // ==================== Textures ====================

    fn create_texture(&mut self) -> GlObject {
        let texture = GlObject::new();
        self.textures.insert(texture, TextureData::default());
        texture
    }

    fn active_texture(&mut self, texture: u32) {
        self.stats.active_texture += 1;
        match texture.checked_sub(constants::TEXTURE0) {
            Some(unit) if (unit as usize) < self.state.texture_units.len() => {
                self.state.active_texture = unit;
            }
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn bind_texture(&mut self, target: u32, texture: Option<GlObject>) {
        self.stats.bind_texture += 1;
        if target != constants::TEXTURE_2D && target != constants::TEXTURE_CUBE_MAP {
            self.set_error(constants::INVALID_ENUM);
            return;
        }
        let unit = self.state.active_texture as usize;
        if let Some(slot) = self.state.texture_units.get_mut(unit) {
            *slot = texture;
        }
    }

    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32) {
        self.stats.tex_parameter += 1;
        let Some(tex_data) = self.bound_texture_mut() else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        tex_data.target = target;
        match pname {
            constants::TEXTURE_MAG_FILTER => tex_data.mag_filter = param as u32,
            constants::TEXTURE_MIN_FILTER => tex_data.min_filter = param as u32,
            constants::TEXTURE_WRAP_S => tex_data.wrap_s = param as u32,
            constants::TEXTURE_WRAP_T => tex_data.wrap_t = param as u32,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        _level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        _border: i32,
        format: u32,
        _type_: u32,
        pixels: Option<&[u8]>,
    ) {
        self.stats.tex_image_2d += 1;
        if width < 0 || height < 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(tex_data) = self.bound_texture_mut() else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };

        tex_data.target = target;
        tex_data.width = width as u32;
        tex_data.height = height as u32;
        tex_data.format = format;
        tex_data.has_mipmaps = false;
        tex_data.data = match pixels {
            Some(d) => d.to_vec(),
            None => vec![0; width as usize * height as usize * 4],
        };
    }

    fn generate_mipmap(&mut self, _target: u32) {
        self.stats.generate_mipmap += 1;
        let Some(tex_data) = self.bound_texture_mut() else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if tex_data.is_power_of_two() {
            tex_data.has_mipmaps = true;
        } else {
            self.set_error(constants::INVALID_OPERATION);
        }
    }

    // ==================== Drawing ====================

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        self.stats.draw_arrays += 1;
        if self.lost {
            return;
        }
        let Some(program) = self.state.current_program else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };

        let attribs = self.enabled_attribs();
        self.draw_calls.push(DrawCall::DrawArrays {
            mode,
            first,
            count,
            program,
            attribs,
        });
    }

    fn draw_elements(&mut self, mode: u32, count: i32, type_: u32, offset: i32) {
        self.stats.draw_elements += 1;
        if self.lost {
            return;
        }
        let (Some(program), Some(element_buffer)) =
            (self.state.current_program, self.state.current_element_buffer)
        else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };

        let attribs = self.enabled_attribs();
        self.draw_calls.push(DrawCall::DrawElements {
            mode,
            count,
            type_,
            offset,
            program,
            element_buffer,
            attribs,
        });
    }
}
