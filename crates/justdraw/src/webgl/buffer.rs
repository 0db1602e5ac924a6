//! Vertex and index buffers.

use justdraw_common::{DrawError, OptionExt, Result};
use justdraw_gl::{GlContext, GlObject};
use tracing::{debug, trace};

use super::{BufferId, BufferTarget, BufferUsage, DataType};
use crate::Renderer3D;

/// Creation options of a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferOptions {
    pub data_type: DataType,
    /// Initial contents; the length fixes the buffer's size.
    pub data: Vec<f64>,
    pub target: BufferTarget,
    pub usage: BufferUsage,
    /// Saturate instead of wrapping; only meaningful for `Uint8`.
    pub clamped: bool,
}

impl BufferOptions {
    pub fn new(data_type: DataType, data: impl Into<Vec<f64>>) -> Self {
        Self {
            data_type,
            data: data.into(),
            target: BufferTarget::Array,
            usage: BufferUsage::StaticDraw,
            clamped: false,
        }
    }

    /// Index buffer options.
    pub fn indices(data_type: DataType, data: impl Into<Vec<f64>>) -> Self {
        Self::new(data_type, data).with_target(BufferTarget::ElementArray)
    }

    pub fn with_target(mut self, target: BufferTarget) -> Self {
        self.target = target;
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

/// A GPU buffer of typed elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    id: BufferId,
    handle: GlObject,
    data_type: DataType,
    target: BufferTarget,
    usage: BufferUsage,
    clamped: bool,
    len: usize,
}

impl Buffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn handle(&self) -> GlObject {
        self.handle
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn is_clamped(&self) -> bool {
        self.clamped
    }

    /// Number of elements, fixed at creation.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len * self.data_type.byte_width()
    }
}

impl<G: GlContext> Renderer3D<G> {
    pub fn buffer(&self, id: BufferId) -> Result<&Buffer> {
        self.buffers.get(id.0).ok_or_unknown(BufferId::KIND, id.0)
    }

    /// Create a buffer, bind it and upload the initial data.
    pub fn create_buffer(&mut self, options: BufferOptions) -> Result<BufferId> {
        let id = BufferId(self.buffers.len());
        let handle = self.gl.create_buffer();
        self.buffers.push(Buffer {
            id,
            handle,
            data_type: options.data_type,
            target: options.target,
            usage: options.usage,
            clamped: options.clamped,
            len: options.data.len(),
        });

        self.bind_buffer(id, false)?;
        let bytes = options.data_type.encode(&options.data, options.clamped);
        self.gl
            .buffer_data(options.target.gl_enum(), &bytes, options.usage.gl_enum());

        debug!(
            buffer = %id,
            data_type = ?options.data_type,
            len = options.data.len(),
            "buffer created"
        );
        Ok(id)
    }

    /// Bind to the buffer's target unless it is already the bound buffer.
    pub fn bind_buffer(&mut self, id: BufferId, force: bool) -> Result<()> {
        let buffer = self.buffer(id)?;
        let (target, handle) = (buffer.target.gl_enum(), buffer.handle);
        if self.cache.buffer.acquire(id, force) {
            trace!(buffer = %id, "bind buffer");
            self.gl.bind_buffer(target, Some(handle));
        }
        Ok(())
    }

    /// Bind the null buffer if `id` is the bound buffer, or with `force`.
    pub fn unbind_buffer(&mut self, id: BufferId, force: bool) -> Result<()> {
        let target = self.buffer(id)?.target.gl_enum();
        if self.cache.buffer.release(id, force) {
            trace!(buffer = %id, "unbind buffer");
            self.gl.bind_buffer(target, None);
        }
        Ok(())
    }

    /// Overwrite elements starting at element `offset`.
    pub fn update_buffer(&mut self, id: BufferId, data: &[f64], offset: usize) -> Result<()> {
        let buffer = self.buffer(id)?;
        if offset.checked_add(data.len()).map_or(true, |end| end > buffer.len) {
            return Err(DrawError::BufferOverflow {
                offset,
                len: data.len(),
                capacity: buffer.len,
            });
        }
        let (data_type, clamped, target) = (buffer.data_type, buffer.clamped, buffer.target);

        self.bind_buffer(id, false)?;
        let bytes = data_type.encode(data, clamped);
        self.gl
            .buffer_sub_data(target.gl_enum(), offset * data_type.byte_width(), &bytes);
        trace!(buffer = %id, offset, len = data.len(), "buffer updated");
        Ok(())
    }

    /// Decode the native store, when the context supports reading it back.
    pub fn read_buffer(&self, id: BufferId) -> Result<Option<Vec<f64>>> {
        let buffer = self.buffer(id)?;
        Ok(self
            .gl
            .read_buffer_data(buffer.handle)
            .map(|bytes| buffer.data_type.decode(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use justdraw_common::RendererOptions;
    use proptest::prelude::*;

    fn renderer() -> Renderer3D {
        Renderer3D::headless(RendererOptions::sized(16, 16)).unwrap()
    }

    #[test]
    fn test_create_uploads_data() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::new(DataType::Float32, [1.5, 2.0]))
            .unwrap();

        let buffer = r.buffer(id).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.byte_len(), 8);
        assert_eq!(r.read_buffer(id).unwrap(), Some(vec![1.5, 2.0]));
        assert_eq!(r.gl().state().current_array_buffer, Some(buffer.handle()));
        assert_eq!(r.cache().buffer.current(), Some(id));
    }

    #[test]
    fn test_int8_casts_on_update() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::new(DataType::Int8, [0.0, 0.0]))
            .unwrap();
        r.update_buffer(id, &[300.0], 1).unwrap();
        assert_eq!(r.read_buffer(id).unwrap(), Some(vec![0.0, 44.0]));
    }

    #[test]
    fn test_update_offset_in_elements() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::new(DataType::Uint16, vec![0.0; 4]))
            .unwrap();
        r.update_buffer(id, &[7.0, 8.0], 2).unwrap();
        assert_eq!(r.read_buffer(id).unwrap(), Some(vec![0.0, 0.0, 7.0, 8.0]));
    }

    #[test]
    fn test_update_past_end() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::new(DataType::Float32, [0.0, 0.0]))
            .unwrap();
        let err = r.update_buffer(id, &[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(
            err,
            DrawError::BufferOverflow {
                offset: 1,
                len: 2,
                capacity: 2
            }
        ));
        assert_eq!(r.gl().stats().buffer_sub_data, 0);
    }

    #[test]
    fn test_clamped_uint8() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::new(DataType::Uint8, [300.0, -2.0, 0.5]).clamped(true))
            .unwrap();
        assert_eq!(r.read_buffer(id).unwrap(), Some(vec![255.0, 0.0, 0.0]));
    }

    #[test]
    fn test_repeated_bind_is_cached() {
        let mut r = renderer();
        let a = r.create_buffer(BufferOptions::new(DataType::Float32, [0.0])).unwrap();
        let b = r.create_buffer(BufferOptions::new(DataType::Float32, [0.0])).unwrap();
        r.gl_mut().reset_stats();

        // gl_mut reset the cache, so the first bind reaches the context
        r.bind_buffer(b, false).unwrap();
        r.bind_buffer(b, false).unwrap();
        r.bind_buffer(a, false).unwrap();
        r.bind_buffer(a, true).unwrap();
        assert_eq!(r.gl().stats().bind_buffer, 3);
    }

    #[test]
    fn test_unbind() {
        let mut r = renderer();
        let a = r.create_buffer(BufferOptions::new(DataType::Float32, [0.0])).unwrap();
        let b = r.create_buffer(BufferOptions::new(DataType::Float32, [0.0])).unwrap();

        // `a` is not bound, nothing happens
        r.unbind_buffer(a, false).unwrap();
        assert!(r.gl().state().current_array_buffer.is_some());

        r.unbind_buffer(b, false).unwrap();
        assert_eq!(r.gl().state().current_array_buffer, None);
        assert_eq!(r.cache().buffer.current(), None);
    }

    #[test]
    fn test_index_buffer_target() {
        let mut r = renderer();
        let id = r
            .create_buffer(BufferOptions::indices(DataType::Uint16, [0.0, 1.0, 2.0]))
            .unwrap();
        let handle = r.buffer(id).unwrap().handle();
        assert_eq!(r.gl().state().current_element_buffer, Some(handle));
        assert_eq!(r.gl().state().current_array_buffer, None);
    }

    #[test]
    fn test_unknown_buffer() {
        let mut r = renderer();
        assert!(matches!(
            r.bind_buffer(BufferId(9), false),
            Err(DrawError::UnknownResource { kind: "buffer", id: 9 })
        ));
    }

    proptest! {
        #[test]
        fn test_bind_runs(picks in prop::collection::vec(0usize..3, 1..40)) {
            let mut r = renderer();
            let ids: Vec<BufferId> = (0..3)
                .map(|_| r.create_buffer(BufferOptions::new(DataType::Float32, [0.0])).unwrap())
                .collect();
            r.gl_mut().reset_stats();

            for &p in &picks {
                r.bind_buffer(ids[p], false).unwrap();
            }
            let runs = 1 + picks.windows(2).filter(|w| w[0] != w[1]).count();
            prop_assert_eq!(r.gl().stats().bind_buffer, runs);
        }
    }
}
