//! Setup systems creating the pipeline's shared GPU objects, and the
//! preparation systems uploading component data every frame.

use squared_core::HashedStr;
use squared_ecs::Core;
use squared_graphics::{
    BindGroup, BindGroupAsset, BindGroupContainer, BufferUsage, DEFAULT_RENDER_GRAPH, GpuBuffer,
    GpuBufferContainer, GraphicContext, GraphicsError, RenderGraphContainer, Sampler,
    SamplerContainer, SamplerDescriptor, Shader, ShaderContainer, StaticBuffer, Texture,
    TextureContainer, TextureFormat,
};

use crate::buffers::{
    AmbientLightBuffer, MaterialGpuBuffer, MaterialUniform, PointLightsBuffer,
};
use crate::components::{Camera, GpuCamera, GpuMaterial, GpuMesh, GpuTransform, Material, Mesh};
use crate::forward_pass::{ForwardPass, forward_shader_descriptor};
use crate::resources::{
    AMBIENT_LIGHT_BUFFER_ID, DEFAULT_MATERIAL_BIND_GROUP_ID, DEFAULT_MATERIAL_BUFFER_ID,
    DEFAULT_SAMPLER_ID, DEFAULT_TEXTURE_ID, DefaultPipelineSettings, DEPTH_TEXTURE_ID,
    END_RENDER_TEXTURE_ID, FORWARD_PASS_ID, FORWARD_SHADER_ID, LIGHTS_BIND_GROUP_ID,
    POINT_LIGHTS_BUFFER_ID, group,
};

fn context(core: &Core) -> Result<GraphicContext, GraphicsError> {
    Ok(core.resource::<GraphicContext>()?.clone())
}

// ---- Setup ----

/// Creates the color and depth targets of the forward pass, unless
/// textures with those ids were provided beforehand.
pub fn create_render_targets(core: &mut Core) -> Result<(), GraphicsError> {
    let context = context(core)?;
    let settings = *core.get_resource::<DefaultPipelineSettings>()?;
    let textures = core.get_resource::<TextureContainer>()?;

    for (id, format) in [
        (END_RENDER_TEXTURE_ID, settings.color_format),
        (DEPTH_TEXTURE_ID, TextureFormat::Depth32Float),
    ] {
        if textures.contains(&id) {
            log::debug!("Render target `{id}` already exists, keeping it");
            continue;
        }
        let texture =
            Texture::render_target(&context, id.as_str(), settings.width, settings.height, format)?;
        textures.add(id, texture);
    }
    log::debug!(
        "Render targets ready ({}x{}, {:?})",
        settings.width,
        settings.height,
        settings.color_format
    );
    Ok(())
}

pub fn create_forward_shader(core: &mut Core) -> Result<(), GraphicsError> {
    let context = context(core)?;
    let color_format = core.get_resource::<DefaultPipelineSettings>()?.color_format;
    let shader = Shader::create(&context, forward_shader_descriptor(color_format))?;
    core.get_resource::<ShaderContainer>()?
        .add(FORWARD_SHADER_ID, shader);
    Ok(())
}

/// The material of meshes without one: white 1x1 texture, linear sampler,
/// default colors.
pub fn create_default_material(core: &mut Core) -> Result<(), GraphicsError> {
    let context = context(core)?;

    let texture = Texture::from_pixels(
        &context,
        DEFAULT_TEXTURE_ID.as_str(),
        1,
        1,
        TextureFormat::Rgba8Unorm,
        &[255, 255, 255, 255],
    )?;
    core.get_resource::<TextureContainer>()?
        .add(DEFAULT_TEXTURE_ID, texture);

    let sampler = Sampler::new(
        &context,
        SamplerDescriptor::linear().with_label(DEFAULT_SAMPLER_ID.as_str()),
    )?;
    core.get_resource::<SamplerContainer>()?
        .add(DEFAULT_SAMPLER_ID, sampler);

    let uniform = MaterialUniform::from(&Material::default());
    let mut buffer = StaticBuffer::from_pod(
        DEFAULT_MATERIAL_BUFFER_ID.as_str(),
        BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        &[uniform],
    );
    buffer.create(core)?;
    core.get_resource::<GpuBufferContainer>()?
        .add(DEFAULT_MATERIAL_BUFFER_ID, Box::new(buffer));

    let bind_group = BindGroup::new(
        core,
        DEFAULT_MATERIAL_BIND_GROUP_ID.as_str(),
        FORWARD_SHADER_ID,
        group::MATERIAL,
        vec![
            BindGroupAsset::buffer(0, DEFAULT_MATERIAL_BUFFER_ID, MaterialGpuBuffer::SIZE),
            BindGroupAsset::texture(1, DEFAULT_TEXTURE_ID),
            BindGroupAsset::sampler(2, DEFAULT_SAMPLER_ID),
        ],
    )?;
    core.get_resource::<BindGroupContainer>()?
        .add(DEFAULT_MATERIAL_BIND_GROUP_ID, bind_group);
    Ok(())
}

/// Ambient and point light buffers, bound together as the lights group.
pub fn create_lights(core: &mut Core) -> Result<(), GraphicsError> {
    let mut ambient = AmbientLightBuffer::new();
    ambient.create(core)?;
    let mut point_lights = PointLightsBuffer::new();
    point_lights.create(core)?;
    {
        let buffers = core.get_resource::<GpuBufferContainer>()?;
        buffers.add(AMBIENT_LIGHT_BUFFER_ID, Box::new(ambient));
        buffers.add(POINT_LIGHTS_BUFFER_ID, Box::new(point_lights));
    }

    let bind_group = BindGroup::new(
        core,
        LIGHTS_BIND_GROUP_ID.as_str(),
        FORWARD_SHADER_ID,
        group::LIGHTS,
        vec![
            BindGroupAsset::buffer(0, AMBIENT_LIGHT_BUFFER_ID, AmbientLightBuffer::SIZE),
            BindGroupAsset::buffer(1, POINT_LIGHTS_BUFFER_ID, PointLightsBuffer::SIZE),
        ],
    )?;
    core.get_resource::<BindGroupContainer>()?
        .add(LIGHTS_BIND_GROUP_ID, bind_group);
    Ok(())
}

pub fn create_forward_graph(core: &mut Core) -> Result<(), GraphicsError> {
    let graph = core
        .get_resource::<RenderGraphContainer>()?
        .get_mut(DEFAULT_RENDER_GRAPH)
        .map_err(|e| GraphicsError::not_found("render graph", e))?;
    graph.add(FORWARD_PASS_ID, ForwardPass::new());
    log::debug!("Forward pass added to `{DEFAULT_RENDER_GRAPH}`");
    Ok(())
}

// ---- Preparation ----

/// Uploads the buffers `ids`. Unknown ids are skipped with a warning.
fn update_buffers(
    core: &Core,
    ids: impl IntoIterator<Item = HashedStr>,
) -> Result<(), GraphicsError> {
    let mut buffers = core.resource_mut::<GpuBufferContainer>()?;
    for id in ids {
        match buffers.get_mut(&id) {
            Ok(buffer) => buffer.update(core)?,
            Err(_) => log::warn!("GPU buffer `{id}` not found, skipping its update"),
        }
    }
    Ok(())
}

pub fn update_gpu_transforms(core: &mut Core) -> Result<(), GraphicsError> {
    let ids: Vec<HashedStr> = core
        .registry()
        .iter::<GpuTransform>()
        .map(|(_, gpu)| gpu.buffer.clone())
        .collect();
    update_buffers(core, ids)
}

pub fn update_gpu_cameras(core: &mut Core) -> Result<(), GraphicsError> {
    let ids: Vec<HashedStr> = core
        .registry()
        .view::<(Camera, GpuCamera)>()
        .map(|(_, (_, gpu))| gpu.buffer.clone())
        .collect();
    update_buffers(core, ids)
}

pub fn update_gpu_materials(core: &mut Core) -> Result<(), GraphicsError> {
    let ids: Vec<HashedStr> = core
        .registry()
        .view::<(Material, GpuMaterial)>()
        .map(|(_, (_, gpu))| gpu.buffer.clone())
        .collect();
    update_buffers(core, ids)
}

/// Uploads vertices and indices, then records the index count the forward
/// pass draws.
pub fn update_gpu_meshes(core: &mut Core) -> Result<(), GraphicsError> {
    let ids: Vec<HashedStr> = core
        .registry()
        .view::<(Mesh, GpuMesh)>()
        .flat_map(|(_, (_, gpu))| [gpu.point_buffer.clone(), gpu.index_buffer.clone()])
        .collect();
    update_buffers(core, ids)?;

    core.registry_mut()
        .for_each_mut::<(Mesh, GpuMesh)>(|_, (mesh, gpu)| gpu.index_count = mesh.index_count())?;
    Ok(())
}

pub fn update_ambient_light(core: &mut Core) -> Result<(), GraphicsError> {
    update_buffers(core, [AMBIENT_LIGHT_BUFFER_ID])
}

pub fn update_point_lights(core: &mut Core) -> Result<(), GraphicsError> {
    update_buffers(core, [POINT_LIGHTS_BUFFER_ID])
}
