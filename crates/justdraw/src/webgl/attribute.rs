//! Vertex attributes.

use justdraw_common::{DrawError, OptionExt, Result};
use justdraw_gl::GlContext;
use tracing::{debug, trace, warn};

use super::{AttributeId, BufferId, BufferOptions, BufferUsage, DataType, ProgramId};
use crate::Renderer3D;

/// Creation options of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeOptions {
    /// Name of the attribute in the vertex shader.
    pub name: String,
    pub data_type: DataType,
    /// Components per vertex, 1 to 4.
    pub size: u8,
    pub data: Vec<f64>,
    /// Map integer data to `[0, 1]` / `[-1, 1]` when read by the shader.
    pub normalize: bool,
    pub usage: BufferUsage,
    pub clamped: bool,
}

impl AttributeOptions {
    pub fn new(name: impl Into<String>, data_type: DataType, size: u8) -> Self {
        Self {
            name: name.into(),
            data_type,
            size,
            data: Vec::new(),
            normalize: false,
            usage: BufferUsage::StaticDraw,
            clamped: false,
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<f64>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn normalized(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn clamped(mut self, clamped: bool) -> Self {
        self.clamped = clamped;
        self
    }
}

/// A vertex shader input fed from its own array buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    id: AttributeId,
    program: ProgramId,
    name: String,
    location: i32,
    size: u8,
    data_type: DataType,
    normalize: bool,
    buffer: BufferId,
    enabled: bool,
}

impl Attribute {
    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location in the linked program, `-1` when the shader has no active
    /// attribute of this name.
    pub fn location(&self) -> i32 {
        self.location
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_normalized(&self) -> bool {
        self.normalize
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bytes one vertex takes in this attribute's buffer.
    pub fn vertex_bytes(&self) -> usize {
        self.size as usize * self.data_type.byte_width()
    }

    fn index(&self) -> Option<u32> {
        u32::try_from(self.location).ok()
    }
}

impl<G: GlContext> Renderer3D<G> {
    pub fn attribute(&self, id: AttributeId) -> Result<&Attribute> {
        self.attributes.get(id.0).ok_or_unknown(AttributeId::KIND, id.0)
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Result<&mut Attribute> {
        self.attributes
            .get_mut(id.0)
            .ok_or_unknown(AttributeId::KIND, id.0)
    }

    /// Create the attribute's array buffer, look up its location in
    /// `program` and enable it. The program's stride grows by the
    /// attribute's per-vertex size.
    pub fn add_attribute(&mut self, program: ProgramId, options: AttributeOptions) -> Result<AttributeId> {
        if !(1..=4).contains(&options.size) {
            return Err(DrawError::InvalidAttributeSize {
                name: options.name,
                size: options.size,
            });
        }
        let handle = self.program(program)?.handle();

        let buffer = self.create_buffer(
            BufferOptions::new(options.data_type, options.data)
                .with_usage(options.usage)
                .clamped(options.clamped),
        )?;

        self.bind_program(program, false)?;
        let location = self.gl.get_attrib_location(handle, &options.name);
        if location < 0 {
            warn!(
                program = %program,
                attribute = %options.name,
                "attribute is not active in the program"
            );
        }

        let id = AttributeId(self.attributes.len());
        let attribute = Attribute {
            id,
            program,
            name: options.name,
            location,
            size: options.size,
            data_type: options.data_type,
            normalize: options.normalize,
            buffer,
            enabled: false,
        };
        let vertex_bytes = attribute.vertex_bytes();
        debug!(
            attribute = %attribute.name,
            location,
            size = attribute.size,
            "attribute created"
        );
        self.attributes.push(attribute);

        let program = self.program_mut(program)?;
        program.attributes.push(id);
        program.vertex_size += vertex_bytes;

        self.enable_attribute(id, false)?;
        Ok(id)
    }

    /// Enable the vertex array unless it already is, or with `force`.
    pub fn enable_attribute(&mut self, id: AttributeId, force: bool) -> Result<()> {
        let attribute = self.attribute_mut(id)?;
        if attribute.enabled && !force {
            return Ok(());
        }
        attribute.enabled = true;
        if let Some(index) = attribute.index() {
            self.gl.enable_vertex_attrib_array(index);
        }
        Ok(())
    }

    pub fn disable_attribute(&mut self, id: AttributeId, force: bool) -> Result<()> {
        let attribute = self.attribute_mut(id)?;
        if !attribute.enabled && !force {
            return Ok(());
        }
        attribute.enabled = false;
        if let Some(index) = attribute.index() {
            self.gl.disable_vertex_attrib_array(index);
        }
        Ok(())
    }

    /// Point the attribute at its buffer: enable, bind the program and the
    /// buffer, then set the vertex attribute pointer (tightly packed,
    /// offset 0).
    pub fn use_attribute(&mut self, id: AttributeId) -> Result<()> {
        self.enable_attribute(id, false)?;
        let attribute = self.attribute(id)?;
        let (program, buffer) = (attribute.program, attribute.buffer);
        let index = attribute.index();
        let (size, data_type, normalize) = (attribute.size, attribute.data_type, attribute.normalize);

        self.bind_program(program, false)?;
        self.bind_buffer(buffer, false)?;
        if let Some(index) = index {
            trace!(attribute = %id, index, "vertex attrib pointer");
            self.gl
                .vertex_attrib_pointer(index, size as i32, data_type.gl_enum(), normalize, 0, 0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webgl::program::tests::{program, renderer};
    use proptest::prelude::*;

    #[test]
    fn test_add_attribute() {
        let mut r = renderer();
        let p = program(&mut r);
        let id = r
            .add_attribute(
                p,
                AttributeOptions::new("color", DataType::Uint8, 3)
                    .with_data([255.0, 0.0, 0.0])
                    .normalized(true),
            )
            .unwrap();

        let attribute = r.attribute(id).unwrap();
        assert_eq!(attribute.location(), 1);
        assert!(attribute.is_enabled());
        assert_eq!(r.buffer(attribute.buffer()).unwrap().len(), 3);
        assert!(r.gl().state().vertex_attribs[1].enabled);
        assert_eq!(r.program(p).unwrap().stride(), 3);
        assert_eq!(r.program(p).unwrap().attributes(), &[id]);
    }

    #[test]
    fn test_invalid_size() {
        let mut r = renderer();
        let p = program(&mut r);
        for size in [0, 5] {
            let err = r
                .add_attribute(p, AttributeOptions::new("position", DataType::Float32, size))
                .unwrap_err();
            assert!(matches!(err, DrawError::InvalidAttributeSize { .. }));
        }
        assert_eq!(r.program(p).unwrap().stride(), 0);
    }

    #[test]
    fn test_inactive_attribute() {
        let mut r = renderer();
        let p = program(&mut r);
        let id = r
            .add_attribute(p, AttributeOptions::new("normal", DataType::Float32, 3))
            .unwrap();
        assert_eq!(r.attribute(id).unwrap().location(), -1);

        r.use_attribute(id).unwrap();
        assert_eq!(r.gl_mut().get_error(), justdraw_gl::constants::NO_ERROR);
    }

    #[test]
    fn test_enable_disable_guarded() {
        let mut r = renderer();
        let p = program(&mut r);
        let id = r
            .add_attribute(p, AttributeOptions::new("position", DataType::Float32, 2))
            .unwrap();
        r.gl_mut().reset_stats();

        r.enable_attribute(id, false).unwrap();
        assert_eq!(r.gl().stats().enable_vertex_attrib_array, 0);
        r.enable_attribute(id, true).unwrap();
        assert_eq!(r.gl().stats().enable_vertex_attrib_array, 1);

        r.disable_attribute(id, false).unwrap();
        assert!(!r.gl().state().vertex_attribs[0].enabled);
        assert!(!r.attribute(id).unwrap().is_enabled());
        r.disable_attribute(id, false).unwrap();

        r.enable_attribute(id, false).unwrap();
        assert!(r.gl().state().vertex_attribs[0].enabled);
    }

    #[test]
    fn test_use_sets_pointer() {
        let mut r = renderer();
        let p = program(&mut r);
        let id = r
            .add_attribute(
                p,
                AttributeOptions::new("position", DataType::Int16, 2).with_data([0.0; 6]),
            )
            .unwrap();
        r.use_attribute(id).unwrap();

        let buffer = r.buffer(r.attribute(id).unwrap().buffer()).unwrap().handle();
        let pointer = &r.gl().state().vertex_attribs[0];
        assert_eq!(pointer.size, 2);
        assert_eq!(pointer.type_, justdraw_gl::constants::SHORT);
        assert_eq!(pointer.buffer, Some(buffer));
        assert_eq!((pointer.stride, pointer.offset), (0, 0));
    }

    fn data_type() -> impl Strategy<Value = DataType> {
        prop_oneof![
            Just(DataType::Int8),
            Just(DataType::Int16),
            Just(DataType::Int32),
            Just(DataType::Uint8),
            Just(DataType::Uint16),
            Just(DataType::Uint32),
            Just(DataType::Float32),
        ]
    }

    proptest! {
        #[test]
        fn test_stride_is_sum_of_attributes(
            attrs in prop::collection::vec((data_type(), 1u8..=4), 0..6)
        ) {
            let mut r = renderer();
            let p = program(&mut r);
            for (i, (data_type, size)) in attrs.iter().enumerate() {
                r.add_attribute(p, AttributeOptions::new(format!("a{i}"), *data_type, *size))
                    .unwrap();
            }

            let expected: usize = attrs
                .iter()
                .map(|(data_type, size)| *size as usize * data_type.byte_width())
                .sum();
            prop_assert_eq!(r.program(p).unwrap().stride(), expected);
        }
    }
}
