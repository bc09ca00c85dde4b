//! GPU buffers kept alive by the [`GpuBufferContainer`] resource.
//!
//! Each implementation owns its backing [`BufferHandle`] and knows how to
//! fill it from the engine state. Creation hooks insert buffers under an
//! entity-derived id; per-frame systems call [`GpuBuffer::update`].

use squared_core::ResourceManager;
use squared_ecs::Core;

use crate::backend::BufferHandle;
use crate::context::GraphicContext;
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage};

/// Every GPU buffer by name.
pub type GpuBufferContainer = ResourceManager<Box<dyn GpuBuffer>>;

/// Minimal contract of a buffer living in the [`GpuBufferContainer`].
///
/// `core` is shared so that an update system may hold the container
/// mutably while buffers read other resources through
/// [`Core::resource`].
pub trait GpuBuffer: 'static {
    /// Allocates the GPU buffer and uploads its initial contents.
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError>;

    /// Releases the GPU buffer. Calling it twice is harmless.
    fn destroy(&mut self);

    fn is_created(&self) -> bool;

    /// Uploads the current contents into the already created buffer.
    fn update(&mut self, core: &Core) -> Result<(), GraphicsError>;

    /// # Errors
    ///
    /// [`GraphicsError::InvalidParameter`] when the buffer was not created yet.
    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError>;
}

impl std::fmt::Debug for dyn GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("created", &self.is_created())
            .finish_non_exhaustive()
    }
}

/// Error for [`GpuBuffer::get_buffer`] on a buffer that has no GPU side.
pub fn not_created(label: &str) -> GraphicsError {
    GraphicsError::InvalidParameter(format!("buffer `{label}` is not created"))
}

/// A buffer holding a fixed byte payload, such as vertex or index data that
/// never changes after upload.
#[derive(Debug)]
pub struct StaticBuffer {
    label: String,
    usage: BufferUsage,
    data: Vec<u8>,
    buffer: Option<BufferHandle>,
}

impl StaticBuffer {
    pub fn new(label: impl Into<String>, usage: BufferUsage, data: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            usage,
            data: data.into(),
            buffer: None,
        }
    }

    /// A buffer with the bytes of `values`.
    pub fn from_pod<T: bytemuck::Pod>(
        label: impl Into<String>,
        usage: BufferUsage,
        values: &[T],
    ) -> Self {
        Self::new(label, usage, bytemuck::cast_slice(values).to_vec())
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Replaces the payload; the next [`update`](GpuBuffer::update) uploads it.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) -> Result<(), GraphicsError> {
        let data = data.into();
        if self.buffer.is_some() && data.len() != self.data.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer `{}` is {} bytes, got {}",
                self.label,
                self.data.len(),
                data.len()
            )));
        }
        self.data = data;
        Ok(())
    }
}

impl GpuBuffer for StaticBuffer {
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError> {
        let context = core.resource::<GraphicContext>()?;
        let descriptor = BufferDescriptor::new(self.size(), self.usage | BufferUsage::COPY_DST)
            .with_label(self.label.as_str());
        self.buffer = Some(context.create_buffer_init(&descriptor, &self.data)?);
        Ok(())
    }

    fn destroy(&mut self) {
        self.buffer = None;
    }

    fn is_created(&self) -> bool {
        self.buffer.is_some()
    }

    fn update(&mut self, core: &Core) -> Result<(), GraphicsError> {
        let buffer = self.buffer.as_ref().ok_or_else(|| not_created(&self.label))?;
        core.resource::<GraphicContext>()?
            .write_buffer(buffer, 0, &self.data)
    }

    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError> {
        self.buffer.as_ref().ok_or_else(|| not_created(&self.label))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::dummy::DummyBackend;

    fn core() -> Core {
        let mut core = Core::new();
        core.register_resource(GraphicContext::with_backend(Arc::new(DummyBackend::new())))
            .unwrap();
        core
    }

    #[test]
    fn test_lifecycle() {
        let core = core();
        let mut buffer = StaticBuffer::from_pod("points", BufferUsage::VERTEX, &[1.0f32, 2.0, 3.0]);
        assert!(!buffer.is_created());
        assert!(buffer.get_buffer().is_err());

        buffer.create(&core).unwrap();
        assert_eq!(buffer.get_buffer().unwrap().size(), 12);

        buffer.set_data(vec![0u8; 12]).unwrap();
        buffer.update(&core).unwrap();
        let handle = buffer.get_buffer().unwrap().dummy().unwrap().clone();
        assert_eq!(handle.contents(), vec![0u8; 12]);

        buffer.destroy();
        buffer.destroy();
        assert!(!buffer.is_created());
    }

    #[test]
    fn test_resize_after_create_is_rejected() {
        let core = core();
        let mut buffer = StaticBuffer::new("indices", BufferUsage::INDEX, vec![0u8; 4]);
        buffer.create(&core).unwrap();
        assert!(buffer.set_data(vec![0u8; 8]).is_err());
    }

    #[test]
    fn test_create_without_context() {
        let core = Core::new();
        let mut buffer = StaticBuffer::new("orphan", BufferUsage::UNIFORM, vec![0u8; 4]);
        assert!(matches!(buffer.create(&core), Err(GraphicsError::Ecs(_))));
    }

    #[test]
    fn test_container_stores_trait_objects() {
        let core = core();
        let mut container = GpuBufferContainer::new();
        container.add("a", Box::new(StaticBuffer::new("a", BufferUsage::UNIFORM, vec![1u8; 16])));
        container.get_mut("a").unwrap().create(&core).unwrap();
        assert!(container.get("a").unwrap().is_created());
    }
}
