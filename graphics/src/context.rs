//! The graphic context resource and its settings.

use std::sync::Arc;

use crate::backend::{
    BindGroupEntry, BindGroupHandle, BindGroupLayoutHandle, BufferHandle, CommandBuffer,
    GpuBackend, PipelineHandle, SamplerHandle, TextureHandle, TextureViewHandle, create_backend,
};
use crate::encoder::CommandEncoder;
use crate::error::GraphicsError;
use crate::shader::ShaderDescriptor;
use crate::types::{
    BindGroupLayoutDescriptor, BufferDescriptor, Color, SamplerDescriptor, TextureDescriptor,
};

/// Which backend [`GraphicContext::new`] creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendSelection {
    /// wgpu when compiled in and an adapter is found, dummy otherwise.
    #[default]
    Auto,
    Wgpu,
    Dummy,
}

/// Adapter preference forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerPreference {
    None,
    LowPower,
    #[default]
    HighPerformance,
}

/// Configuration read when the graphic context is created.
///
/// Register it before the first tick to override the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicSettings {
    pub backend: BackendSelection,
    pub power_preference: PowerPreference,
    /// Device features by name, e.g. `"DEPTH_CLIP_CONTROL"`.
    pub required_features: Vec<String>,
    /// Clear color of the default render pass.
    pub clear_color: Color,
}

impl Default for GraphicSettings {
    fn default() -> Self {
        Self {
            backend: BackendSelection::Auto,
            power_preference: PowerPreference::HighPerformance,
            required_features: Vec::new(),
            clear_color: Color::new(0.1, 0.1, 0.1, 1.0),
        }
    }
}

impl GraphicSettings {
    pub fn with_backend(mut self, backend: BackendSelection) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_power_preference(mut self, preference: PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    pub fn with_required_feature(mut self, feature: impl Into<String>) -> Self {
        self.required_features.push(feature.into());
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Device and queue access for every GPU operation of the engine.
#[derive(Clone)]
pub struct GraphicContext {
    backend: Arc<dyn GpuBackend>,
}

impl std::fmt::Debug for GraphicContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicContext")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl GraphicContext {
    /// Creates the backend selected by `settings`.
    pub fn new(settings: &GraphicSettings) -> Result<Self, GraphicsError> {
        Ok(Self {
            backend: create_backend(settings)?,
        })
    }

    /// Wraps an existing backend.
    pub fn with_backend(backend: Arc<dyn GpuBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError> {
        self.backend.create_buffer(descriptor)
    }

    /// Creates a buffer sized to `data` and uploads it.
    pub fn create_buffer_init(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferHandle, GraphicsError> {
        let descriptor = BufferDescriptor {
            size: data.len() as u64,
            ..descriptor.clone()
        };
        let buffer = self.backend.create_buffer(&descriptor)?;
        self.backend.write_buffer(&buffer, 0, data)?;
        Ok(buffer)
    }

    pub fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        self.backend.write_buffer(buffer, offset, data)
    }

    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<(TextureHandle, TextureViewHandle), GraphicsError> {
        self.backend.create_texture(descriptor)
    }

    pub fn write_texture(
        &self,
        texture: &TextureHandle,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        self.backend.write_texture(texture, descriptor, data)
    }

    pub fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<SamplerHandle, GraphicsError> {
        self.backend.create_sampler(descriptor)
    }

    pub fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutHandle, GraphicsError> {
        self.backend.create_bind_group_layout(descriptor)
    }

    pub fn create_render_pipeline(
        &self,
        descriptor: &ShaderDescriptor,
        layouts: &[BindGroupLayoutHandle],
    ) -> Result<PipelineHandle, GraphicsError> {
        self.backend.create_render_pipeline(descriptor, layouts)
    }

    pub fn create_bind_group(
        &self,
        label: &str,
        layout: &BindGroupLayoutHandle,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, GraphicsError> {
        self.backend.create_bind_group(label, layout, entries)
    }

    /// Starts recording commands. The encoder is released if it is dropped
    /// before [`CommandEncoder::finish`].
    pub fn create_command_encoder(&self, label: &str) -> Result<CommandEncoder, GraphicsError> {
        let inner = self
            .backend
            .create_command_encoder(label)
            .map_err(|e| match e {
                GraphicsError::CommandEncoderCreation(_) => e,
                other => GraphicsError::CommandEncoderCreation(other.to_string()),
            })?;
        Ok(CommandEncoder::new(label, inner))
    }

    /// Submits finished command buffers to the queue.
    pub fn submit(
        &self,
        command_buffers: impl IntoIterator<Item = CommandBuffer>,
    ) -> Result<(), GraphicsError> {
        self.backend.submit(command_buffers.into_iter().collect())
    }
}
