//! The default forward pass: every mesh of the scene, lit, into the end
//! render texture.

use squared_core::HashedStr;
use squared_ecs::{Core, Entity};
use squared_graphics::{
    BindGroupContainer, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, Color,
    ColorOutput, DEFAULT_RENDER_GRAPH, DepthOutput, GpuBufferContainer, GraphicSettings,
    GraphicsError, IndexFormat, RenderPass, RenderPassBase, RenderPassEncoder, ShaderDescriptor,
    ShaderStages, TextureFormat, VertexBufferLayout, VertexFormat,
};

use crate::components::{Camera, GpuCamera, GpuMaterial, GpuMesh, GpuTransform};
use crate::resources::{
    DEFAULT_MATERIAL_BIND_GROUP_ID, DEPTH_TEXTURE_ID, END_RENDER_TEXTURE_ID, FORWARD_PASS_ID,
    FORWARD_SHADER_ID, LIGHTS_BIND_GROUP_ID, group,
};

const FORWARD_WGSL: &str = include_str!("shaders/forward.wgsl");

/// Builds the forward shader: camera, transform, material and lights bind
/// groups, one packed vertex buffer and a `Depth32Float` depth test.
pub fn forward_shader_descriptor(color_format: TextureFormat) -> ShaderDescriptor {
    let uniform = |binding| BindGroupLayoutEntry::new(binding, BindingType::UniformBuffer);
    let all_stages = ShaderStages::VERTEX | ShaderStages::FRAGMENT;

    ShaderDescriptor::new(FORWARD_SHADER_ID.as_str(), FORWARD_WGSL)
        .with_bind_group_layout(
            BindGroupLayoutDescriptor::new([uniform(0).with_visibility(all_stages)])
                .with_label("camera"),
        )
        .with_bind_group_layout(
            BindGroupLayoutDescriptor::new([uniform(0).with_visibility(ShaderStages::VERTEX)])
                .with_label("transform"),
        )
        .with_bind_group_layout(
            BindGroupLayoutDescriptor::new([
                uniform(0).with_visibility(ShaderStages::FRAGMENT),
                BindGroupLayoutEntry::new(1, BindingType::Texture)
                    .with_visibility(ShaderStages::FRAGMENT),
                BindGroupLayoutEntry::new(2, BindingType::Sampler)
                    .with_visibility(ShaderStages::FRAGMENT),
            ])
            .with_label("material"),
        )
        .with_bind_group_layout(
            BindGroupLayoutDescriptor::new([
                uniform(0).with_visibility(ShaderStages::FRAGMENT),
                uniform(1).with_visibility(ShaderStages::FRAGMENT),
            ])
            .with_label("lights"),
        )
        .with_vertex_buffer(VertexBufferLayout::packed(0, &[
            VertexFormat::Float32x3,
            VertexFormat::Float32x3,
            VertexFormat::Float32x2,
        ]))
        .with_color_target(color_format)
        .with_depth_format(TextureFormat::Depth32Float)
}

/// Draws every entity carrying a [`GpuMesh`] and a [`GpuTransform`], seen
/// from the first camera attached to the default render graph.
///
/// Entities without a material use the default one.
pub struct ForwardPass {
    base: RenderPassBase,
}

impl ForwardPass {
    pub fn new() -> Self {
        let mut base = RenderPassBase::new(FORWARD_PASS_ID.as_str());
        base.bind_shader(FORWARD_SHADER_ID)
            .add_output(
                0,
                ColorOutput::new(END_RENDER_TEXTURE_ID).with_clear_color(clear_from_settings),
            )
            .add_depth_output(DepthOutput::new(DEPTH_TEXTURE_ID).cleared_to(1.0))
            .add_input(group::LIGHTS, LIGHTS_BIND_GROUP_ID);
        Self { base }
    }
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self::new()
    }
}

fn clear_from_settings(core: &mut Core, color: &mut Color) -> bool {
    *color = core
        .resource::<GraphicSettings>()
        .map(|settings| settings.clear_color)
        .unwrap_or(Color::BLACK);
    true
}

/// The camera rendering into `graph`, lowest entity first.
fn active_camera(core: &Core, graph: &HashedStr) -> Option<(Entity, HashedStr)> {
    core.registry()
        .view::<(Camera, GpuCamera)>()
        .find(|(_, (_, gpu))| gpu.render_graph == *graph)
        .map(|(entity, (_, gpu))| (entity, gpu.bind_group.clone()))
}

impl RenderPass for ForwardPass {
    fn base(&self) -> &RenderPassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderPassBase {
        &mut self.base
    }

    fn unique_render_callback(
        &mut self,
        render_pass: &mut RenderPassEncoder<'_>,
        core: &mut Core,
    ) -> Result<(), GraphicsError> {
        let Some((camera, camera_bind_group)) = active_camera(core, &DEFAULT_RENDER_GRAPH) else {
            log::trace!("No camera on the default render graph, nothing drawn");
            return Ok(());
        };
        log::trace!("Forward pass seen from camera {camera}");

        let bind_groups = core.resource::<BindGroupContainer>()?;
        let buffers = core.resource::<GpuBufferContainer>()?;
        let find_group = |id: &HashedStr| {
            bind_groups
                .get(id)
                .map_err(|e| GraphicsError::not_found("bind group", e))
        };
        let find_buffer = |id: &HashedStr| {
            buffers
                .get(id)
                .map_err(|e| GraphicsError::not_found("buffer", e))
        };

        render_pass.set_bind_group(group::CAMERA, find_group(&camera_bind_group)?.handle())?;

        let default_material = DEFAULT_MATERIAL_BIND_GROUP_ID;
        let registry = core.registry();
        for (entity, (mesh, transform)) in registry.view::<(GpuMesh, GpuTransform)>() {
            if mesh.index_count == 0 {
                continue;
            }
            let material = registry
                .try_get::<GpuMaterial>(entity)
                .map_or(&default_material, |material| &material.bind_group);

            render_pass.set_bind_group(group::TRANSFORM, find_group(&transform.bind_group)?.handle())?;
            render_pass.set_bind_group(group::MATERIAL, find_group(material)?.handle())?;
            render_pass.set_vertex_buffer(0, find_buffer(&mesh.point_buffer)?.get_buffer()?)?;
            render_pass.set_index_buffer(
                find_buffer(&mesh.index_buffer)?.get_buffer()?,
                IndexFormat::Uint32,
            )?;
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Vertex;

    #[test]
    fn test_forward_shader_is_valid() {
        let descriptor = forward_shader_descriptor(TextureFormat::Bgra8UnormSrgb);
        let problems = descriptor.validate();
        assert!(problems.iter().all(|p| !p.is_error()), "{problems:?}");
    }

    #[test]
    fn test_vertex_layout_matches_vertex() {
        let descriptor = forward_shader_descriptor(TextureFormat::Rgba8Unorm);
        let layout = &descriptor.vertex_buffers[0];
        assert_eq!(layout.array_stride, std::mem::size_of::<Vertex>() as u64);
        assert_eq!(descriptor.bind_group_layouts.len(), 4);
    }

    #[test]
    fn test_pass_wiring() {
        let pass = ForwardPass::new();
        let base = pass.base();
        assert_eq!(base.shader(), Some(&FORWARD_SHADER_ID));
        assert_eq!(base.inputs().get(&group::LIGHTS), Some(&LIGHTS_BIND_GROUP_ID));
        assert!(base.outputs().contains_key(&0));
        assert!(base.depth_output().is_some());
    }
}
