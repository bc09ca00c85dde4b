//! The graphic plugin: GPU context creation, resource containers and the
//! default render graph.

use squared_ecs::{Core, EcsError, Plugin, Rendering, Shutdown};

use crate::bind_group::BindGroupContainer;
use crate::context::{GraphicContext, GraphicSettings};
use crate::error::GraphicsError;
use crate::gpu_buffer::GpuBufferContainer;
use crate::render_graph::{DEFAULT_RENDER_GRAPH, RenderGraph, RenderGraphContainer, execute_render_graph};
use crate::rendering_pipeline::{RenderingPipelinePlugin, Setup};
use crate::sampler::SamplerContainer;
use crate::shader::ShaderContainer;
use crate::texture::TextureContainer;

/// Installs everything GPU rendering needs.
///
/// - the [`RenderingPipelinePlugin`] stage schedulers
/// - [`GraphicSettings`] (unless already registered) and one container per
///   GPU resource kind, with an empty [`DEFAULT_RENDER_GRAPH`]
/// - a [`Setup`] system creating the [`GraphicContext`]
/// - a [`Rendering`] system executing the default render graph
/// - a [`Shutdown`] system releasing every GPU resource
#[derive(Debug, Default)]
pub struct GraphicPlugin;

fn register_if_absent<T: 'static>(core: &mut Core, make: impl FnOnce() -> T) -> Result<(), EcsError> {
    if !core.has_resource::<T>() {
        core.register_resource(make())?;
    }
    Ok(())
}

impl Plugin for GraphicPlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.add_plugins::<(RenderingPipelinePlugin,)>()?;

        register_if_absent(core, GraphicSettings::default)?;
        register_if_absent(core, ShaderContainer::new)?;
        register_if_absent(core, TextureContainer::new)?;
        register_if_absent(core, SamplerContainer::new)?;
        register_if_absent(core, GpuBufferContainer::new)?;
        register_if_absent(core, BindGroupContainer::new)?;
        register_if_absent(core, RenderGraphContainer::new)?;

        let graphs = core.get_resource::<RenderGraphContainer>()?;
        if !graphs.contains(&DEFAULT_RENDER_GRAPH) {
            graphs.add(DEFAULT_RENDER_GRAPH, RenderGraph::new());
        }

        core.register_system::<Setup, _>(create_graphic_context);
        core.register_system::<Rendering, _>(render_default_graph);
        core.register_system::<Shutdown, _>(release_gpu_resources);
        Ok(())
    }
}

/// Creates the [`GraphicContext`] from the [`GraphicSettings`] resource.
///
/// A context registered beforehand (e.g. around a test backend) is kept.
pub fn create_graphic_context(core: &mut Core) -> Result<(), GraphicsError> {
    if core.has_resource::<GraphicContext>() {
        log::debug!("Graphic context already registered, keeping it");
        return Ok(());
    }
    let settings = core.get_resource::<GraphicSettings>()?.clone();
    let context = GraphicContext::new(&settings)?;
    log::info!("Graphic context created on {}", context.backend_name());
    core.register_resource(context)?;
    Ok(())
}

pub fn render_default_graph(core: &mut Core) -> Result<(), GraphicsError> {
    execute_render_graph(core, DEFAULT_RENDER_GRAPH)
}

/// Drops every GPU object, users before what they use.
pub fn release_gpu_resources(core: &mut Core) {
    if let Ok(graphs) = core.get_resource::<RenderGraphContainer>() {
        graphs.clear();
    }
    if let Ok(bind_groups) = core.get_resource::<BindGroupContainer>() {
        bind_groups.clear();
    }
    if let Ok(buffers) = core.get_resource::<GpuBufferContainer>() {
        for (_, buffer) in buffers.iter_mut() {
            buffer.destroy();
        }
        buffers.clear();
    }
    if let Ok(samplers) = core.get_resource::<SamplerContainer>() {
        samplers.clear();
    }
    if let Ok(textures) = core.get_resource::<TextureContainer>() {
        textures.clear();
    }
    if let Ok(shaders) = core.get_resource::<ShaderContainer>() {
        shaders.clear();
    }
    if core.delete_resource::<GraphicContext>().is_some() {
        log::debug!("Graphic context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BackendSelection;

    fn core() -> Core {
        let mut core = Core::new();
        core.register_resource(GraphicSettings::default().with_backend(BackendSelection::Dummy))
            .unwrap();
        core.add_plugins::<(GraphicPlugin,)>().unwrap();
        core
    }

    #[test]
    fn test_bind_registers_containers() {
        let mut core = core();
        assert!(core.has_plugin::<RenderingPipelinePlugin>());
        assert!(core.has_resource::<ShaderContainer>());
        assert!(core.has_resource::<GpuBufferContainer>());
        assert!(!core.has_resource::<GraphicContext>());
        assert!(
            core.get_resource::<RenderGraphContainer>()
                .unwrap()
                .contains(&DEFAULT_RENDER_GRAPH)
        );
    }

    #[test]
    fn test_first_tick_creates_context() {
        let mut core = core();
        core.run_systems().unwrap();
        assert_eq!(
            core.get_resource::<GraphicContext>().unwrap().backend_name(),
            "Dummy Backend"
        );
        core.run_systems().unwrap();
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut core = core();
        core.run_systems().unwrap();
        core.shutdown().unwrap();
        assert!(!core.has_resource::<GraphicContext>());
        assert!(core.get_resource::<RenderGraphContainer>().unwrap().is_empty());
    }
}
