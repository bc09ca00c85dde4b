//! Dummy GPU backend for testing and headless runs.
//!
//! No GPU is involved. Buffers keep their contents in memory so uploads can
//! be read back, and every encoder and pass command is appended to a shared
//! [`RecordedCommand`] log in the order it was issued.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::shader::ShaderDescriptor;
use crate::types::{
    BindGroupLayoutDescriptor, BufferDescriptor, Color, IndexFormat, LoadOp, SamplerDescriptor,
    StoreOp, TextureDescriptor,
};

use super::{
    BindGroupEntry, BindGroupHandle, BindGroupLayoutHandle, BufferHandle, CommandBuffer,
    EncoderBackend, GpuBackend, PassBackend, PipelineHandle, RenderPassDescriptor, SamplerHandle,
    TextureHandle, TextureViewHandle,
};

pub(crate) const BACKEND_NAME: &str = "Dummy Backend";

/// A labelled placeholder for a GPU object.
#[derive(Debug)]
pub struct DummyObject {
    id: u64,
    label: String,
}

impl DummyObject {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A buffer backed by host memory.
#[derive(Debug)]
pub struct DummyBuffer {
    object: DummyObject,
    data: Mutex<Vec<u8>>,
}

impl DummyBuffer {
    pub fn label(&self) -> &str {
        self.object.label()
    }

    pub fn size(&self) -> u64 {
        self.data.lock().len() as u64
    }

    /// Copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

/// Color attachment as seen by the dummy backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedColorAttachment {
    pub view: String,
    pub resolve_target: Option<String>,
    pub load: LoadOp<Color>,
    pub store: StoreOp,
}

/// Depth attachment as seen by the dummy backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDepthAttachment {
    pub view: String,
    pub load: LoadOp<f32>,
    pub store: StoreOp,
}

/// One encoder, pass or queue operation, identified by object labels.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    CreateEncoder {
        label: String,
    },
    BeginRenderPass {
        label: String,
        color_attachments: Vec<RecordedColorAttachment>,
        depth_attachment: Option<RecordedDepthAttachment>,
    },
    SetPipeline {
        pipeline: String,
    },
    SetBindGroup {
        index: u32,
        bind_group: String,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: String,
    },
    SetIndexBuffer {
        buffer: String,
        format: IndexFormat,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    EndRenderPass,
    /// The encoder was finished into a command buffer.
    Finish {
        label: String,
    },
    /// The encoder was dropped without being finished.
    Release {
        label: String,
    },
    Submit {
        command_buffers: Vec<String>,
    },
}

type CommandLog = Arc<Mutex<Vec<RecordedCommand>>>;

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_id: AtomicU64,
    log: CommandLog,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command recorded so far.
    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.log.lock().clone()
    }

    /// Returns the recorded commands and clears the log.
    pub fn take_recorded(&self) -> Vec<RecordedCommand> {
        std::mem::take(&mut *self.log.lock())
    }

    fn object(&self, kind: &str, label: Option<&str>) -> DummyObject {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        DummyObject {
            id,
            label: label.map_or_else(|| format!("{kind}#{id}"), str::to_owned),
        }
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let size = usize::try_from(descriptor.size).map_err(|_| {
            GraphicsError::ResourceCreationFailed(format!(
                "buffer size {} does not fit in host memory",
                descriptor.size
            ))
        })?;
        Ok(BufferHandle::Dummy(Arc::new(DummyBuffer {
            object: self.object("buffer", descriptor.label.as_deref()),
            data: Mutex::new(vec![0; size]),
        })))
    }

    fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let buffer = buffer.dummy()?;
        let mut contents = buffer.data.lock();
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {offset} overflows buffer `{}` ({} bytes)",
                data.len(),
                buffer.label(),
                contents.len()
            )));
        }
        contents[start..end].copy_from_slice(data);
        Ok(())
    }

    fn write_texture(
        &self,
        texture: &TextureHandle,
        _descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let texture = texture.dummy()?;
        log::trace!(
            "DummyBackend: writing {} bytes to texture `{}`",
            data.len(),
            texture.label()
        );
        Ok(())
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<(TextureHandle, TextureViewHandle), GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height
        );
        let texture = self.object("texture", descriptor.label.as_deref());
        let view = DummyObject {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            label: texture.label.clone(),
        };
        Ok((
            TextureHandle::Dummy(Arc::new(texture)),
            TextureViewHandle::Dummy(Arc::new(view)),
        ))
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<SamplerHandle, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {:?}", descriptor.label);
        Ok(SamplerHandle::Dummy(Arc::new(
            self.object("sampler", descriptor.label.as_deref()),
        )))
    }

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutHandle, GraphicsError> {
        Ok(BindGroupLayoutHandle::Dummy(Arc::new(
            self.object("bind_group_layout", descriptor.label.as_deref()),
        )))
    }

    fn create_render_pipeline(
        &self,
        descriptor: &ShaderDescriptor,
        layouts: &[BindGroupLayoutHandle],
    ) -> Result<PipelineHandle, GraphicsError> {
        for layout in layouts {
            layout.dummy()?;
        }
        log::trace!("DummyBackend: creating pipeline {}", descriptor.label);
        Ok(PipelineHandle::Dummy(Arc::new(
            self.object("pipeline", Some(descriptor.label.as_str())),
        )))
    }

    fn create_bind_group(
        &self,
        label: &str,
        layout: &BindGroupLayoutHandle,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, GraphicsError> {
        layout.dummy()?;
        log::trace!(
            "DummyBackend: creating bind group {} ({} entries)",
            label,
            entries.len()
        );
        Ok(BindGroupHandle::Dummy(Arc::new(
            self.object("bind_group", Some(label)),
        )))
    }

    fn create_command_encoder(
        &self,
        label: &str,
    ) -> Result<Box<dyn EncoderBackend>, GraphicsError> {
        self.log.lock().push(RecordedCommand::CreateEncoder {
            label: label.to_owned(),
        });
        Ok(Box::new(DummyEncoder {
            label: label.to_owned(),
            log: self.log.clone(),
        }))
    }

    fn submit(&self, command_buffers: Vec<CommandBuffer>) -> Result<(), GraphicsError> {
        let mut labels = Vec::with_capacity(command_buffers.len());
        for buffer in command_buffers {
            match buffer {
                CommandBuffer::Dummy { label } => labels.push(label),
                #[cfg(feature = "wgpu-backend")]
                CommandBuffer::Wgpu(_) => {
                    return Err(GraphicsError::BackendMismatch {
                        expected: BACKEND_NAME,
                        found: super::wgpu_backend::BACKEND_NAME,
                    });
                }
            }
        }
        self.log.lock().push(RecordedCommand::Submit {
            command_buffers: labels,
        });
        Ok(())
    }
}

struct DummyEncoder {
    label: String,
    log: CommandLog,
}

impl EncoderBackend for DummyEncoder {
    fn begin_render_pass<'e>(
        &'e mut self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<Box<dyn PassBackend + 'e>, GraphicsError> {
        let mut color_attachments = Vec::with_capacity(descriptor.color_attachments.len());
        for attachment in &descriptor.color_attachments {
            color_attachments.push(RecordedColorAttachment {
                view: attachment.view.dummy()?.label().to_owned(),
                resolve_target: match &attachment.resolve_target {
                    Some(target) => Some(target.dummy()?.label().to_owned()),
                    None => None,
                },
                load: attachment.load,
                store: attachment.store,
            });
        }
        let depth_attachment = match &descriptor.depth_attachment {
            Some(depth) => Some(RecordedDepthAttachment {
                view: depth.view.dummy()?.label().to_owned(),
                load: depth.load,
                store: depth.store,
            }),
            None => None,
        };

        self.log.lock().push(RecordedCommand::BeginRenderPass {
            label: descriptor.label.clone(),
            color_attachments,
            depth_attachment,
        });
        Ok(Box::new(DummyPass {
            log: self.log.clone(),
        }))
    }

    fn finish(self: Box<Self>, label: &str) -> Result<CommandBuffer, GraphicsError> {
        self.log.lock().push(RecordedCommand::Finish {
            label: label.to_owned(),
        });
        Ok(CommandBuffer::Dummy {
            label: label.to_owned(),
        })
    }

    fn release(self: Box<Self>) {
        let Self { label, log } = *self;
        log.lock().push(RecordedCommand::Release { label });
    }
}

struct DummyPass {
    log: CommandLog,
}

impl DummyPass {
    fn record(&self, command: RecordedCommand) {
        self.log.lock().push(command);
    }
}

impl PassBackend for DummyPass {
    fn set_pipeline(&mut self, pipeline: &PipelineHandle) -> Result<(), GraphicsError> {
        let pipeline = pipeline.dummy()?.label().to_owned();
        self.record(RecordedCommand::SetPipeline { pipeline });
        Ok(())
    }

    fn set_bind_group(
        &mut self,
        index: u32,
        bind_group: &BindGroupHandle,
    ) -> Result<(), GraphicsError> {
        let bind_group = bind_group.dummy()?.label().to_owned();
        self.record(RecordedCommand::SetBindGroup { index, bind_group });
        Ok(())
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferHandle) -> Result<(), GraphicsError> {
        let buffer = buffer.dummy()?.label().to_owned();
        self.record(RecordedCommand::SetVertexBuffer { slot, buffer });
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: &BufferHandle,
        format: IndexFormat,
    ) -> Result<(), GraphicsError> {
        let buffer = buffer.dummy()?.label().to_owned();
        self.record(RecordedCommand::SetIndexBuffer { buffer, format });
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.record(RecordedCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.record(RecordedCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }

    fn end(&mut self) {
        self.record(RecordedCommand::EndRenderPass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    #[test]
    fn test_buffer_contents_follow_writes() {
        let backend = DummyBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor::new(8, BufferUsage::UNIFORM).with_label("b"))
            .unwrap();
        backend.write_buffer(&buffer, 4, &[1, 2, 3, 4]).unwrap();
        let BufferHandle::Dummy(inner) = &buffer else {
            panic!("expected a dummy buffer");
        };
        assert_eq!(inner.contents(), [0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(buffer.size(), 8);
    }

    #[test]
    fn test_write_overflow_is_rejected() {
        let backend = DummyBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor::new(4, BufferUsage::UNIFORM))
            .unwrap();
        assert!(matches!(
            backend.write_buffer(&buffer, 2, &[0; 4]),
            Err(GraphicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unlabelled_objects_get_unique_labels() {
        let backend = DummyBackend::new();
        let a = backend.create_sampler(&SamplerDescriptor::new()).unwrap();
        let b = backend.create_sampler(&SamplerDescriptor::new()).unwrap();
        let (SamplerHandle::Dummy(a), SamplerHandle::Dummy(b)) = (a, b) else {
            panic!("expected dummy samplers");
        };
        assert_ne!(a.label(), b.label());
        assert!(a.label().starts_with("sampler#"));
    }

    #[test]
    fn test_released_encoder_is_recorded() {
        let backend = DummyBackend::new();
        let encoder = backend.create_command_encoder("frame").unwrap();
        encoder.release();
        assert_eq!(
            backend.take_recorded(),
            [
                RecordedCommand::CreateEncoder {
                    label: "frame".into()
                },
                RecordedCommand::Release {
                    label: "frame".into()
                },
            ]
        );
        assert!(backend.recorded().is_empty());
    }
}
