//! Shader programs and draw assembly.

use justdraw_common::{DrawError, OptionExt, Result};
use justdraw_gl::{constants, GlContext, GlObject};
use tracing::{debug, error, trace};

use super::diagnostics::{compile_shader, ShaderStage};
use super::{AttributeId, BufferId, BufferOptions, BufferTarget, DrawMode, ProgramId, UniformId};
use crate::Renderer3D;

/// Parameters of one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawOptions {
    pub mode: DrawMode,
    /// First vertex, or first index when the program has an index buffer.
    pub offset: usize,
    /// Vertices or indices to draw; derived from the buffers when `None`.
    pub count: Option<usize>,
}

impl DrawOptions {
    pub fn new(mode: DrawMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl From<DrawMode> for DrawOptions {
    fn from(mode: DrawMode) -> Self {
        Self::new(mode)
    }
}

/// A linked vertex and fragment shader pair with the attributes,
/// uniforms and index buffer registered on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    id: ProgramId,
    handle: GlObject,
    pub(crate) attributes: Vec<AttributeId>,
    pub(crate) uniforms: Vec<UniformId>,
    pub(crate) index_buffer: Option<BufferId>,
    pub(crate) vertex_size: usize,
}

impl Program {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn handle(&self) -> GlObject {
        self.handle
    }

    /// Attributes in registration order.
    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[UniformId] {
        &self.uniforms
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.index_buffer
    }

    /// Bytes per vertex over all attributes.
    pub fn stride(&self) -> usize {
        self.vertex_size
    }
}

impl<G: GlContext> Renderer3D<G> {
    pub fn program(&self, id: ProgramId) -> Result<&Program> {
        self.programs.get(id.0).ok_or_unknown(ProgramId::KIND, id.0)
    }

    pub(crate) fn program_mut(&mut self, id: ProgramId) -> Result<&mut Program> {
        self.programs
            .get_mut(id.0)
            .ok_or_unknown(ProgramId::KIND, id.0)
    }

    /// Compile both stages and link them.
    ///
    /// A compile failure carries an annotated excerpt of the failing
    /// source; a link failure carries the program info log.
    pub fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        let vertex = compile_shader(&mut self.gl, ShaderStage::Vertex, vertex_source)?;
        let fragment = compile_shader(&mut self.gl, ShaderStage::Fragment, fragment_source)?;

        let handle = self.gl.create_program();
        self.gl.attach_shader(handle, vertex);
        self.gl.attach_shader(handle, fragment);
        self.gl.link_program(handle);

        if self.gl.get_program_parameter(handle, constants::LINK_STATUS) != Some(1) {
            let log = self.gl.get_program_info_log(handle);
            error!(program = handle.id(), "program link failed: {log}");
            return Err(DrawError::ProgramLink(log));
        }

        let id = ProgramId(self.programs.len());
        self.programs.push(Program {
            id,
            handle,
            attributes: Vec::new(),
            uniforms: Vec::new(),
            index_buffer: None,
            vertex_size: 0,
        });
        debug!(program = %id, "program linked");
        Ok(id)
    }

    /// Make `id` the current program unless it already is, or with `force`.
    pub fn bind_program(&mut self, id: ProgramId, force: bool) -> Result<()> {
        let handle = self.program(id)?.handle;
        if self.cache.program.acquire(id, force) {
            trace!(program = %id, "use program");
            self.gl.use_program(Some(handle));
        }
        Ok(())
    }

    /// Create the program's index buffer, replacing any previous one. The
    /// target is always the element array and the data type must be an
    /// unsigned integer.
    pub fn add_index_buffer(&mut self, program: ProgramId, options: BufferOptions) -> Result<BufferId> {
        if !options.data_type.is_index_type() {
            return Err(DrawError::InvalidIndexType(format!("{:?}", options.data_type)));
        }
        self.bind_program(program, false)?;
        let buffer = self.create_buffer(options.with_target(BufferTarget::ElementArray))?;
        self.program_mut(program)?.index_buffer = Some(buffer);
        Ok(buffer)
    }

    /// Draw with every attribute of `program`.
    ///
    /// Without attributes nothing is drawn. The count defaults to the index
    /// buffer length, or to the vertices in the first attribute's buffer.
    pub fn draw(&mut self, program: ProgramId, options: impl Into<DrawOptions>) -> Result<()> {
        let options = options.into();
        let (attributes, index_buffer) = {
            let program = self.program(program)?;
            (program.attributes.clone(), program.index_buffer)
        };
        let Some(&first) = attributes.first() else {
            return Ok(());
        };

        self.bind_program(program, false)?;

        let count = match (options.count, index_buffer) {
            (Some(count), _) => count,
            (None, Some(indices)) => self.buffer(indices)?.len(),
            (None, None) => {
                let attribute = self.attribute(first)?;
                let size = attribute.size() as usize;
                self.buffer(attribute.buffer())?.len() / size
            }
        };

        for &attribute in &attributes {
            self.use_attribute(attribute)?;
        }

        let mode = options.mode.gl_enum();
        match index_buffer {
            Some(indices) => {
                let data_type = self.buffer(indices)?.data_type();
                self.bind_buffer(indices, false)?;
                let offset = options.offset * data_type.byte_width();
                trace!(program = %program, count, offset, "draw elements");
                self.gl
                    .draw_elements(mode, count as i32, data_type.gl_enum(), offset as i32);
            }
            None => {
                trace!(program = %program, count, offset = options.offset, "draw arrays");
                self.gl.draw_arrays(mode, options.offset as i32, count as i32);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::webgl::{AttributeOptions, DataType};
    use justdraw_common::RendererOptions;
    use justdraw_gl::DrawCall;

    pub(crate) const VERTEX: &str = "attribute vec2 position;\nattribute vec3 color;\nuniform mat4 model;\nvoid main() {\n    gl_Position = model * vec4(position, 0.0, 1.0);\n}\n";
    pub(crate) const FRAGMENT: &str = "precision mediump float;\nuniform vec4 tint;\nvoid main() {\n    gl_FragColor = tint;\n}\n";

    pub(crate) fn renderer() -> Renderer3D {
        Renderer3D::headless(RendererOptions::sized(16, 16)).unwrap()
    }

    pub(crate) fn program(r: &mut Renderer3D) -> ProgramId {
        r.create_program(VERTEX, FRAGMENT).unwrap()
    }

    fn triangle(r: &mut Renderer3D, p: ProgramId) {
        r.add_attribute(
            p,
            AttributeOptions::new("position", DataType::Float32, 2)
                .with_data([0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        )
        .unwrap();
        r.add_attribute(
            p,
            AttributeOptions::new("color", DataType::Uint8, 3)
                .with_data([255.0; 9])
                .normalized(true),
        )
        .unwrap();
    }

    #[test]
    fn test_create_program() {
        let mut r = renderer();
        let p = program(&mut r);
        let handle = r.program(p).unwrap().handle();
        assert!(r.gl().program(handle).unwrap().linked);
        assert_eq!(r.program(p).unwrap().stride(), 0);
    }

    #[test]
    fn test_compile_error_is_fatal() {
        let mut r = renderer();
        let err = r
            .create_program("void main() {\n", FRAGMENT)
            .unwrap_err();
        assert!(matches!(err, DrawError::ShaderCompile { stage: "vertex", .. }));
        assert!(r.program(ProgramId(0)).is_err());
    }

    #[test]
    fn test_fragment_compile_error() {
        let mut r = renderer();
        let err = r.create_program(VERTEX, "#error unsupported\nvoid main() {}\n").unwrap_err();
        match err {
            DrawError::ShaderCompile { stage, excerpt, .. } => {
                assert_eq!(stage, "fragment");
                assert!(excerpt.unwrap().starts_with("> 1 | #error unsupported\n"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bind_program_cached() {
        let mut r = renderer();
        let a = program(&mut r);
        let b = program(&mut r);
        r.gl_mut().reset_stats();

        r.bind_program(a, false).unwrap();
        r.bind_program(a, false).unwrap();
        r.bind_program(b, false).unwrap();
        r.bind_program(b, true).unwrap();
        assert_eq!(r.gl().stats().use_program, 3);
        let handle = r.program(b).unwrap().handle();
        assert_eq!(r.gl().state().current_program, Some(handle));
    }

    #[test]
    fn test_draw_without_attributes() {
        let mut r = renderer();
        let p = program(&mut r);
        r.draw(p, DrawMode::Triangles).unwrap();

        let stats = r.gl().stats();
        assert_eq!(stats.draw_arrays + stats.draw_elements, 0);
        assert!(r.gl().draw_calls().is_empty());
    }

    #[test]
    fn test_draw_arrays_count() {
        let mut r = renderer();
        let p = program(&mut r);
        triangle(&mut r, p);
        r.draw(p, DrawOptions::default()).unwrap();

        let handle = r.program(p).unwrap().handle();
        match r.gl().draw_calls() {
            [DrawCall::DrawArrays {
                mode,
                first,
                count,
                program,
                attribs,
            }] => {
                assert_eq!(*mode, constants::TRIANGLES);
                assert_eq!((*first, *count), (0, 3));
                assert_eq!(*program, handle);
                assert_eq!(attribs.len(), 2);
                assert_eq!(attribs[1].1.type_, constants::UNSIGNED_BYTE);
                assert!(attribs[1].1.normalized);
            }
            calls => panic!("unexpected draw calls {calls:?}"),
        }
    }

    #[test]
    fn test_draw_explicit_count() {
        let mut r = renderer();
        let p = program(&mut r);
        triangle(&mut r, p);
        r.draw(p, DrawOptions::new(DrawMode::Points).with_offset(1).with_count(2))
            .unwrap();

        assert!(matches!(
            r.gl().draw_calls(),
            [DrawCall::DrawArrays {
                mode: constants::POINTS,
                first: 1,
                count: 2,
                ..
            }]
        ));
    }

    #[test]
    fn test_draw_elements() {
        let mut r = renderer();
        let p = program(&mut r);
        triangle(&mut r, p);
        let indices = r
            .add_index_buffer(p, BufferOptions::new(DataType::Uint16, [0.0, 1.0, 2.0, 2.0, 1.0, 0.0]))
            .unwrap();
        assert_eq!(r.buffer(indices).unwrap().target(), BufferTarget::ElementArray);
        assert_eq!(r.program(p).unwrap().index_buffer(), Some(indices));

        r.draw(p, DrawOptions::new(DrawMode::TriangleStrip).with_offset(3))
            .unwrap();

        let element_handle = r.buffer(indices).unwrap().handle();
        match r.gl().draw_calls() {
            [DrawCall::DrawElements {
                mode,
                count,
                type_,
                offset,
                element_buffer,
                ..
            }] => {
                assert_eq!(*mode, constants::TRIANGLE_STRIP);
                assert_eq!(*count, 6);
                assert_eq!(*type_, constants::UNSIGNED_SHORT);
                assert_eq!(*offset, 6);
                assert_eq!(*element_buffer, element_handle);
            }
            calls => panic!("unexpected draw calls {calls:?}"),
        }
    }

    #[test]
    fn test_index_buffer_rejects_non_index_types() {
        let mut r = renderer();
        let p = program(&mut r);
        for data_type in [DataType::Float32, DataType::Int8, DataType::Int16, DataType::Int32] {
            let err = r
                .add_index_buffer(p, BufferOptions::new(data_type, [0.0, 1.0, 2.0]))
                .unwrap_err();
            assert!(matches!(err, DrawError::InvalidIndexType(_)));
        }
        assert_eq!(r.program(p).unwrap().index_buffer(), None);

        let err = r
            .add_index_buffer(p, BufferOptions::new(DataType::Float32, [0.0]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Float32 is not a valid index data type, expected Uint8, Uint16 or Uint32"
        );
        for data_type in [DataType::Uint8, DataType::Uint32] {
            assert!(r.add_index_buffer(p, BufferOptions::new(data_type, [0.0])).is_ok());
        }
    }

    #[test]
    fn test_repeated_draws_skip_program_bind() {
        let mut r = renderer();
        let p = program(&mut r);
        triangle(&mut r, p);
        r.draw(p, DrawMode::Triangles).unwrap();
        let before = r.gl().stats().use_program;
        r.draw(p, DrawMode::Triangles).unwrap();
        assert_eq!(r.gl().stats().use_program, before);
        assert_eq!(r.gl().stats().draw_arrays, 2);
    }

    #[test]
    fn test_draw_unknown_program() {
        let mut r = renderer();
        assert!(matches!(
            r.draw(ProgramId(4), DrawMode::Lines),
            Err(DrawError::UnknownResource { kind: "program", id: 4 })
        ));
    }
}
