//! Scoped command and render pass encoders.
//!
//! A [`CommandEncoder`] is either finished into a [`CommandBuffer`] or
//! released when dropped, and a [`RenderPassEncoder`] always ends its pass,
//! so an early return through `?` never leaves GPU recording half open.

use std::ops::Range;

use crate::backend::{
    BindGroupHandle, BufferHandle, CommandBuffer, EncoderBackend, PassBackend, PipelineHandle,
    RenderPassDescriptor,
};
use crate::error::GraphicsError;
use crate::types::IndexFormat;

/// Records GPU commands for one submission.
pub struct CommandEncoder {
    label: String,
    inner: Option<Box<dyn EncoderBackend>>,
}

impl CommandEncoder {
    pub(crate) fn new(label: &str, inner: Box<dyn EncoderBackend>) -> Self {
        Self {
            label: label.to_owned(),
            inner: Some(inner),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Begins a render pass; the encoder is borrowed until the pass ends.
    pub fn begin_render_pass(
        &mut self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPassEncoder<'_>, GraphicsError> {
        let inner = self.inner.as_mut().ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("encoder `{}` is already closed", self.label))
        })?;
        let pass = inner.begin_render_pass(descriptor)?;
        Ok(RenderPassEncoder { inner: pass })
    }

    /// Closes the encoder into a command buffer labelled like the encoder.
    pub fn finish(mut self) -> Result<CommandBuffer, GraphicsError> {
        let inner = self.inner.take().ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("encoder `{}` is already closed", self.label))
        })?;
        inner.finish(&self.label)
    }
}

impl Drop for CommandEncoder {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            log::debug!("Command encoder `{}` dropped without finish", self.label);
            inner.release();
        }
    }
}

/// Records draw commands inside one render pass.
pub struct RenderPassEncoder<'e> {
    inner: Box<dyn PassBackend + 'e>,
}

impl<'e> RenderPassEncoder<'e> {
    fn pass(&mut self) -> &mut (dyn PassBackend + 'e) {
        self.inner.as_mut()
    }

    pub fn set_pipeline(&mut self, pipeline: &PipelineHandle) -> Result<(), GraphicsError> {
        self.pass().set_pipeline(pipeline)
    }

    pub fn set_bind_group(
        &mut self,
        index: u32,
        bind_group: &BindGroupHandle,
    ) -> Result<(), GraphicsError> {
        self.pass().set_bind_group(index, bind_group)
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferHandle) -> Result<(), GraphicsError> {
        self.pass().set_vertex_buffer(slot, buffer)
    }

    pub fn set_index_buffer(
        &mut self,
        buffer: &BufferHandle,
        format: IndexFormat,
    ) -> Result<(), GraphicsError> {
        self.pass().set_index_buffer(buffer, format)
    }

    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass().draw(vertices, instances);
    }

    pub fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass().draw_indexed(indices, base_vertex, instances);
    }

    /// Ends the pass. Dropping the encoder does the same.
    pub fn end(self) {}
}

impl Drop for RenderPassEncoder<'_> {
    fn drop(&mut self) {
        self.inner.end();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::GpuBackend;
    use crate::backend::dummy::{DummyBackend, RecordedCommand};
    use crate::context::GraphicContext;

    fn context() -> (Arc<DummyBackend>, GraphicContext) {
        let backend = Arc::new(DummyBackend::new());
        let context = GraphicContext::with_backend(backend.clone() as Arc<dyn GpuBackend>);
        (backend, context)
    }

    #[test]
    fn test_finish_and_submit() {
        let (backend, context) = context();
        let mut encoder = context.create_command_encoder("frame").unwrap();
        {
            let mut pass = encoder
                .begin_render_pass(&RenderPassDescriptor {
                    label: "frame".into(),
                    ..Default::default()
                })
                .unwrap();
            pass.draw(0..3, 0..1);
            pass.end();
        }
        let buffer = encoder.finish().unwrap();
        context.submit([buffer]).unwrap();

        let recorded = backend.recorded();
        assert_eq!(recorded.len(), 6);
        assert_eq!(recorded[2], RecordedCommand::Draw {
            vertices: 0..3,
            instances: 0..1
        });
        assert_eq!(recorded[3], RecordedCommand::EndRenderPass);
        assert_eq!(recorded[4], RecordedCommand::Finish {
            label: "frame".into()
        });
        assert_eq!(recorded[5], RecordedCommand::Submit {
            command_buffers: vec!["frame".into()]
        });
    }

    #[test]
    fn test_dropped_guards_end_and_release() {
        let (backend, context) = context();
        {
            let mut encoder = context.create_command_encoder("aborted").unwrap();
            let _pass = encoder
                .begin_render_pass(&RenderPassDescriptor::default())
                .unwrap();
        }
        let recorded = backend.recorded();
        assert_eq!(recorded[recorded.len() - 2], RecordedCommand::EndRenderPass);
        assert_eq!(recorded[recorded.len() - 1], RecordedCommand::Release {
            label: "aborted".into()
        });
    }
}
