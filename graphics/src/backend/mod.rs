//! GPU backend abstraction layer.
//!
//! Every backend implements [`GpuBackend`] for resource creation and
//! submission, plus [`EncoderBackend`] / [`PassBackend`] for command
//! recording. Resources are returned as cheap, clonable handle enums with
//! one variant per compiled-in backend.
//!
//! # Available Backends
//!
//! - `dummy` (always available): records every command instead of talking
//!   to a GPU, for tests and headless runs
//! - `wgpu-backend`: cross-platform backend using wgpu

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::ops::Range;
use std::sync::Arc;

use crate::context::{BackendSelection, GraphicSettings};
use crate::error::GraphicsError;
use crate::shader::ShaderDescriptor;
use crate::types::{
    BindGroupLayoutDescriptor, BufferDescriptor, Color, IndexFormat, LoadOp, SamplerDescriptor,
    StoreOp, TextureDescriptor,
};

use dummy::{DummyBuffer, DummyObject};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $dummy:ty, $wgpu:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub enum $name {
            /// Dummy backend object
            Dummy(Arc<$dummy>),
            /// wgpu backend object
            #[cfg(feature = "wgpu-backend")]
            Wgpu(Arc<$wgpu>),
        }

        impl $name {
            /// Name of the backend that created the handle.
            pub fn backend_name(&self) -> &'static str {
                match self {
                    Self::Dummy(_) => dummy::BACKEND_NAME,
                    #[cfg(feature = "wgpu-backend")]
                    Self::Wgpu(_) => wgpu_backend::BACKEND_NAME,
                }
            }

            /// The dummy backend object, e.g. to inspect labels or buffer
            /// contents in tests.
            pub fn dummy(&self) -> Result<&Arc<$dummy>, GraphicsError> {
                match self {
                    Self::Dummy(object) => Ok(object),
                    #[cfg(feature = "wgpu-backend")]
                    Self::Wgpu(_) => Err(GraphicsError::BackendMismatch {
                        expected: dummy::BACKEND_NAME,
                        found: wgpu_backend::BACKEND_NAME,
                    }),
                }
            }

            #[cfg(feature = "wgpu-backend")]
            pub(crate) fn wgpu(&self) -> Result<&Arc<$wgpu>, GraphicsError> {
                match self {
                    Self::Wgpu(object) => Ok(object),
                    Self::Dummy(_) => Err(GraphicsError::BackendMismatch {
                        expected: wgpu_backend::BACKEND_NAME,
                        found: dummy::BACKEND_NAME,
                    }),
                }
            }
        }
    };
}

gpu_handle! {
    /// Handle to a GPU buffer.
    BufferHandle, DummyBuffer, wgpu::Buffer
}

gpu_handle! {
    /// Handle to a GPU texture.
    TextureHandle, DummyObject, wgpu::Texture
}

gpu_handle! {
    /// Handle to a view over a GPU texture.
    TextureViewHandle, DummyObject, wgpu::TextureView
}

gpu_handle! {
    /// Handle to a GPU sampler.
    SamplerHandle, DummyObject, wgpu::Sampler
}

gpu_handle! {
    /// Handle to a compiled render pipeline.
    PipelineHandle, DummyObject, wgpu::RenderPipeline
}

gpu_handle! {
    /// Handle to a bind group layout.
    BindGroupLayoutHandle, DummyObject, wgpu::BindGroupLayout
}

gpu_handle! {
    /// Handle to a bind group.
    BindGroupHandle, DummyObject, wgpu::BindGroup
}

impl BufferHandle {
    /// Size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Self::Dummy(buffer) => buffer.size(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => buffer.size(),
        }
    }
}

/// A finished, not yet submitted list of commands.
#[derive(Debug)]
pub enum CommandBuffer {
    Dummy { label: String },
    #[cfg(feature = "wgpu-backend")]
    Wgpu(wgpu::CommandBuffer),
}

/// A resource bound at one slot of a bind group.
#[derive(Debug, Clone)]
pub enum BindingResource {
    /// A buffer range; `size: None` binds the rest of the buffer.
    Buffer {
        buffer: BufferHandle,
        offset: u64,
        size: Option<u64>,
    },
    TextureView(TextureViewHandle),
    Sampler(SamplerHandle),
}

#[derive(Debug, Clone)]
pub struct BindGroupEntry {
    pub binding: u32,
    pub resource: BindingResource,
}

/// A color target of a render pass.
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub view: TextureViewHandle,
    /// Multisample resolve target.
    pub resolve_target: Option<TextureViewHandle>,
    pub load: LoadOp<Color>,
    pub store: StoreOp,
}

/// The depth target of a render pass.
#[derive(Debug, Clone)]
pub struct DepthAttachment {
    pub view: TextureViewHandle,
    pub load: LoadOp<f32>,
    pub store: StoreOp,
}

/// Everything needed to begin a render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor {
    pub label: String,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_attachment: Option<DepthAttachment>,
}

/// Backend side of a command encoder.
///
/// Used through [`CommandEncoder`](crate::CommandEncoder), which guarantees
/// that the encoder is either finished or released.
pub trait EncoderBackend {
    /// Begins a render pass. The encoder stays borrowed until the pass ends.
    fn begin_render_pass<'e>(
        &'e mut self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<Box<dyn PassBackend + 'e>, GraphicsError>;

    /// Closes the encoder and returns the recorded commands.
    fn finish(self: Box<Self>, label: &str) -> Result<CommandBuffer, GraphicsError>;

    /// Drops the encoder without producing a command buffer.
    fn release(self: Box<Self>);
}

/// Backend side of a render pass encoder.
pub trait PassBackend {
    fn set_pipeline(&mut self, pipeline: &PipelineHandle) -> Result<(), GraphicsError>;

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupHandle)
    -> Result<(), GraphicsError>;

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferHandle) -> Result<(), GraphicsError>;

    fn set_index_buffer(
        &mut self,
        buffer: &BufferHandle,
        format: IndexFormat,
    ) -> Result<(), GraphicsError>;

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);

    /// Called once, right before the pass is dropped.
    fn end(&mut self);
}

/// Resource creation and submission for one GPU device.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError>;

    /// Uploads `data` at `offset` through the queue.
    fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Replaces the whole first mip level of `texture`, tightly packed rows.
    fn write_texture(
        &self,
        texture: &TextureHandle,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Creates a texture together with its default view.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<(TextureHandle, TextureViewHandle), GraphicsError>;

    fn create_sampler(&self, descriptor: &SamplerDescriptor)
    -> Result<SamplerHandle, GraphicsError>;

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutHandle, GraphicsError>;

    /// Compiles the shader and builds its render pipeline over `layouts`.
    fn create_render_pipeline(
        &self,
        descriptor: &ShaderDescriptor,
        layouts: &[BindGroupLayoutHandle],
    ) -> Result<PipelineHandle, GraphicsError>;

    fn create_bind_group(
        &self,
        label: &str,
        layout: &BindGroupLayoutHandle,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, GraphicsError>;

    fn create_command_encoder(&self, label: &str)
    -> Result<Box<dyn EncoderBackend>, GraphicsError>;

    fn submit(&self, command_buffers: Vec<CommandBuffer>) -> Result<(), GraphicsError>;
}

/// Creates the backend requested by `settings`.
///
/// [`BackendSelection::Auto`] tries wgpu first when it is compiled in and
/// falls back to the dummy backend.
pub fn create_backend(settings: &GraphicSettings) -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    match settings.backend {
        BackendSelection::Dummy => {
            log::info!("Using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
        BackendSelection::Wgpu => {
            #[cfg(feature = "wgpu-backend")]
            {
                let backend = wgpu_backend::WgpuBackend::new(settings)?;
                log::info!("Using wgpu backend");
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "wgpu-backend"))]
            {
                Err(GraphicsError::InitializationFailed(
                    "the wgpu backend is not compiled in (enable the `wgpu-backend` feature)"
                        .into(),
                ))
            }
        }
        BackendSelection::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_backend::WgpuBackend::new(settings) {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(Arc::new(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }

            log::info!("Using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
    }
}

/// Check if a real GPU backend is compiled in.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dummy_backend() {
        let settings = GraphicSettings {
            backend: BackendSelection::Dummy,
            ..Default::default()
        };
        let backend = create_backend(&settings).unwrap();
        assert_eq!(backend.name(), dummy::BACKEND_NAME);
    }

    #[test]
    fn test_auto_always_succeeds() {
        let backend = create_backend(&GraphicSettings::default()).unwrap();
        if !has_gpu_backend() {
            assert_eq!(backend.name(), dummy::BACKEND_NAME);
        }
    }

    #[cfg(not(feature = "wgpu-backend"))]
    #[test]
    fn test_explicit_wgpu_without_feature_fails() {
        let settings = GraphicSettings {
            backend: BackendSelection::Wgpu,
            ..Default::default()
        };
        assert!(matches!(
            create_backend(&settings),
            Err(GraphicsError::InitializationFailed(_))
        ));
    }
}
