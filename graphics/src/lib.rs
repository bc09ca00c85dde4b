//! # Squared Graphics
//!
//! GPU resources, render passes and the render graph of the Squared engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicContext`] - Resource wrapping the GPU backend (wgpu, or the
//!   recording dummy backend for tests and headless runs)
//! - Resource containers keyed by [`HashedStr`](squared_core::HashedStr):
//!   [`ShaderContainer`], [`TextureContainer`], [`SamplerContainer`],
//!   [`GpuBufferContainer`], [`BindGroupContainer`], [`RenderGraphContainer`]
//! - [`RenderPass`] - Shared pass configuration with single and multiple execution
//! - [`RenderGraph`] - Passes executed in dependency order
//! - [`GraphicPlugin`] - Wires all of the above into a [`Core`](squared_ecs::Core)
//!
//! ## Example
//!
//! ```
//! use squared_ecs::Core;
//! use squared_graphics::{BackendSelection, GraphicContext, GraphicPlugin, GraphicSettings};
//!
//! let mut core = Core::new();
//! core.register_resource(GraphicSettings::default().with_backend(BackendSelection::Dummy))
//!     .unwrap();
//! core.add_plugins::<(GraphicPlugin,)>().unwrap();
//! core.run_systems().unwrap();
//! assert!(core.has_resource::<GraphicContext>());
//! ```

pub mod backend;
pub mod bind_group;
pub mod context;
pub mod encoder;
pub mod error;
pub mod gpu_buffer;
pub mod plugin;
pub mod render_graph;
pub mod render_pass;
pub mod rendering_pipeline;
pub mod sampler;
pub mod shader;
pub mod texture;
pub mod types;

pub use backend::dummy::{DummyBackend, RecordedCommand};
pub use backend::{
    BindGroupHandle, BindGroupLayoutHandle, BufferHandle, CommandBuffer, GpuBackend,
    PipelineHandle, SamplerHandle, TextureHandle, TextureViewHandle, has_gpu_backend,
};
pub use bind_group::{BindGroup, BindGroupAsset, BindGroupContainer};
pub use context::{BackendSelection, GraphicContext, GraphicSettings, PowerPreference};
pub use encoder::{CommandEncoder, RenderPassEncoder};
pub use error::GraphicsError;
pub use gpu_buffer::{GpuBuffer, GpuBufferContainer, StaticBuffer};
pub use plugin::GraphicPlugin;
pub use render_graph::{
    DEFAULT_RENDER_GRAPH, RenderGraph, RenderGraphContainer, execute_render_graph,
};
pub use render_pass::{
    ColorOutput, DepthOutput, DepthTarget, MultipleExecution, RenderPass, RenderPassBase,
    execute_multiple, execute_single,
};
pub use rendering_pipeline::RenderingPipelinePlugin;
pub use sampler::{Sampler, SamplerContainer};
pub use shader::{Severity, Shader, ShaderContainer, ShaderDescriptor, ValidationError};
pub use texture::{Texture, TextureContainer};
pub use types::{
    AddressMode, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BufferDescriptor,
    BufferUsage, Color, CompareFunction, Extent3d, FilterMode, IndexFormat, LoadOp,
    PrimitiveTopology, SamplerDescriptor, ShaderStages, StoreOp, TextureDescriptor, TextureFormat,
    TextureUsage, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the crate version and the compiled-in backends.
pub fn init() {
    log::info!(
        "Squared Graphics v{} initialized (wgpu backend: {})",
        VERSION,
        has_gpu_backend()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_graph_is_empty() {
        let graph = RenderGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.execution_order().unwrap(), Vec::<&str>::new());
    }
}
