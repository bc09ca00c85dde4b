//! Construct and destroy hooks creating the GPU side of logical components.
//!
//! A creation hook allocates the buffers of its entity, registers them in
//! the [`GpuBufferContainer`], builds the bind groups the forward shader
//! expects and attaches the GPU counterpart holding every id. Destroying the
//! logical component detaches the counterpart, whose own destroy hook
//! releases whatever is still registered.
//!
//! Components added before the pipeline resources exist (no context or no
//! forward shader yet) are picked up by [`attach_pending_gpu_components`]
//! during `Setup`.

use squared_core::HashedStr;
use squared_ecs::{Core, EcsError, Entity};
use squared_graphics::{
    BindGroup, BindGroupAsset, BindGroupContainer, DEFAULT_RENDER_GRAPH, GpuBuffer,
    GpuBufferContainer, GraphicContext, GraphicsError, ShaderContainer, TextureContainer,
};

use crate::buffers::{
    CameraGpuBuffer, DirectionalLightGpuBuffer, MaterialGpuBuffer, MeshData, MeshGpuBuffer,
    TransformGpuBuffer,
};
use crate::components::{
    Camera, DirectionalLight, GpuCamera, GpuDirectionalLight, GpuMaterial, GpuMesh, GpuTransform,
    Material, Mesh, Transform,
};
use crate::resources::{
    DEFAULT_SAMPLER_ID, DEFAULT_TEXTURE_ID, FORWARD_SHADER_ID, entity_id, group,
};

/// Wires the hooks of every logical component.
pub fn register_hooks(core: &mut Core) {
    core.on_construct::<Mesh, _>(on_mesh_creation);
    core.on_destroy::<Mesh, _>(detach::<GpuMesh>);
    core.on_destroy::<GpuMesh, _>(on_mesh_destruction);

    core.on_construct::<Transform, _>(on_transform_creation);
    core.on_destroy::<Transform, _>(detach::<GpuTransform>);
    core.on_destroy::<GpuTransform, _>(on_transform_destruction);

    core.on_construct::<Camera, _>(on_camera_creation);
    core.on_destroy::<Camera, _>(detach::<GpuCamera>);
    core.on_destroy::<GpuCamera, _>(on_camera_destruction);

    core.on_construct::<Material, _>(on_material_creation);
    core.on_destroy::<Material, _>(detach::<GpuMaterial>);
    core.on_destroy::<GpuMaterial, _>(on_material_destruction);

    core.on_construct::<DirectionalLight, _>(on_directional_light_creation);
    core.on_destroy::<DirectionalLight, _>(detach::<GpuDirectionalLight>);
    core.on_destroy::<GpuDirectionalLight, _>(on_directional_light_destruction);
}

/// Whether GPU counterparts can be created right now.
fn pipeline_ready(core: &Core) -> bool {
    core.has_resource::<GraphicContext>()
        && core
            .resource::<ShaderContainer>()
            .is_ok_and(|shaders| shaders.contains(&FORWARD_SHADER_ID))
}

/// Common guard of the creation hooks: `true` when `G` must be created now.
fn should_create<G: 'static>(core: &Core, entity: Entity, what: &str) -> bool {
    if core.registry().has::<G>(entity) {
        return false;
    }
    if !pipeline_ready(core) {
        log::debug!("GPU {what} of entity {entity} deferred until the pipeline is set up");
        return false;
    }
    true
}

fn insert_buffer(
    core: &mut Core,
    id: &HashedStr,
    mut buffer: impl GpuBuffer + 'static,
) -> Result<(), GraphicsError> {
    buffer.create(core)?;
    core.get_resource::<GpuBufferContainer>()?
        .add(id, Box::new(buffer));
    Ok(())
}

fn insert_bind_group(
    core: &mut Core,
    id: &HashedStr,
    layout_index: u32,
    assets: Vec<BindGroupAsset>,
) -> Result<(), GraphicsError> {
    let bind_group = BindGroup::new(core, id.as_str(), FORWARD_SHADER_ID, layout_index, assets)?;
    core.get_resource::<BindGroupContainer>()?
        .add(id, bind_group);
    Ok(())
}

fn release_buffer(core: &mut Core, id: &HashedStr) {
    if let Ok(buffers) = core.get_resource::<GpuBufferContainer>() {
        if let Some(mut buffer) = buffers.remove(id) {
            buffer.destroy();
        }
    }
}

fn release_bind_group(core: &mut Core, id: &HashedStr) {
    if let Ok(bind_groups) = core.get_resource::<BindGroupContainer>() {
        bind_groups.remove(id);
    }
}

/// Runs `create`, releasing the listed objects again when it fails so that
/// no GPU object outlives a counterpart that was never attached.
fn create_or_release(
    core: &mut Core,
    buffers: &[&HashedStr],
    bind_groups: &[&HashedStr],
    create: impl FnOnce(&mut Core) -> Result<(), GraphicsError>,
) -> Result<(), GraphicsError> {
    let result = create(core);
    if result.is_err() {
        for id in bind_groups {
            release_bind_group(core, id);
        }
        for id in buffers {
            release_buffer(core, id);
        }
    }
    result
}

fn detach<G: 'static>(core: &mut Core, entity: Entity) -> Result<(), EcsError> {
    core.remove_component::<G>(entity)
}

// ---- Mesh ----

pub fn on_mesh_creation(core: &mut Core, entity: Entity) -> Result<(), GraphicsError> {
    if !should_create::<GpuMesh>(core, entity, "mesh") {
        return Ok(());
    }
    let point_buffer = MeshGpuBuffer::id(entity, MeshData::Points);
    let index_buffer = MeshGpuBuffer::id(entity, MeshData::Indices);
    create_or_release(core, &[&point_buffer, &index_buffer], &[], |core| {
        insert_buffer(core, &point_buffer, MeshGpuBuffer::new(entity, MeshData::Points))?;
        insert_buffer(core, &index_buffer, MeshGpuBuffer::new(entity, MeshData::Indices))?;

        let index_count = core.registry().get::<Mesh>(entity)?.index_count();
        core.add_component(entity, GpuMesh {
            point_buffer: point_buffer.clone(),
            index_buffer: index_buffer.clone(),
            index_count,
        })?;
        Ok(())
    })
}

pub fn on_mesh_destruction(core: &mut Core, entity: Entity) {
    let Some(gpu) = core.registry().try_get::<GpuMesh>(entity).cloned() else {
        return;
    };
    release_buffer(core, &gpu.point_buffer);
    release_buffer(core, &gpu.index_buffer);
}

// ---- Transform ----

pub fn on_transform_creation(core: &mut Core, entity: Entity) -> Result<(), GraphicsError> {
    if !should_create::<GpuTransform>(core, entity, "transform") {
        return Ok(());
    }
    let buffer = TransformGpuBuffer::id(entity);
    let bind_group = entity_id("TRANSFORM_BIND_GROUP", entity);
    create_or_release(core, &[&buffer], &[&bind_group], |core| {
        insert_buffer(core, &buffer, TransformGpuBuffer::new(entity))?;
        insert_bind_group(core, &bind_group, group::TRANSFORM, vec![BindGroupAsset::buffer(
            0,
            &buffer,
            TransformGpuBuffer::SIZE,
        )])?;
        core.add_component(entity, GpuTransform {
            buffer: buffer.clone(),
            bind_group: bind_group.clone(),
        })?;
        Ok(())
    })
}

pub fn on_transform_destruction(core: &mut Core, entity: Entity) {
    let Some(gpu) = core.registry().try_get::<GpuTransform>(entity).cloned() else {
        return;
    };
    release_bind_group(core, &gpu.bind_group);
    release_buffer(core, &gpu.buffer);
}

// ---- Camera ----

pub fn on_camera_creation(core: &mut Core, entity: Entity) -> Result<(), GraphicsError> {
    if !should_create::<GpuCamera>(core, entity, "camera") {
        return Ok(());
    }
    let buffer = CameraGpuBuffer::id(entity);
    let bind_group = entity_id("CAMERA_BIND_GROUP", entity);
    create_or_release(core, &[&buffer], &[&bind_group], |core| {
        insert_buffer(core, &buffer, CameraGpuBuffer::new(entity))?;
        insert_bind_group(core, &bind_group, group::CAMERA, vec![BindGroupAsset::buffer(
            0,
            &buffer,
            CameraGpuBuffer::SIZE,
        )])?;
        core.add_component(entity, GpuCamera {
            buffer: buffer.clone(),
            bind_group: bind_group.clone(),
            render_graph: DEFAULT_RENDER_GRAPH,
        })?;
        Ok(())
    })
}

pub fn on_camera_destruction(core: &mut Core, entity: Entity) {
    let Some(gpu) = core.registry().try_get::<GpuCamera>(entity).cloned() else {
        return;
    };
    release_bind_group(core, &gpu.bind_group);
    release_buffer(core, &gpu.buffer);
}

// ---- Material ----

/// The material texture when it names a known texture, the white default
/// otherwise.
fn material_texture(core: &Core, texture: Option<String>) -> Result<HashedStr, GraphicsError> {
    let Some(name) = texture.filter(|name| !name.is_empty()) else {
        return Ok(DEFAULT_TEXTURE_ID);
    };
    let id = HashedStr::owned(name.clone());
    if core.resource::<TextureContainer>()?.contains(&id) {
        Ok(id)
    } else {
        log::warn!("Texture `{name}` not found in the texture container, using the default");
        Ok(DEFAULT_TEXTURE_ID)
    }
}

pub fn on_material_creation(core: &mut Core, entity: Entity) -> Result<(), GraphicsError> {
    if !should_create::<GpuMaterial>(core, entity, "material") {
        return Ok(());
    }
    let named = core.registry().get::<Material>(entity)?.ambient_texture.clone();
    let texture = material_texture(core, named)?;
    let sampler = DEFAULT_SAMPLER_ID;

    let buffer = MaterialGpuBuffer::id(entity);
    let bind_group = entity_id("MATERIAL_BIND_GROUP", entity);
    create_or_release(core, &[&buffer], &[&bind_group], |core| {
        insert_buffer(core, &buffer, MaterialGpuBuffer::new(entity))?;
        insert_bind_group(core, &bind_group, group::MATERIAL, vec![
            BindGroupAsset::buffer(0, &buffer, MaterialGpuBuffer::SIZE),
            BindGroupAsset::texture(1, &texture),
            BindGroupAsset::sampler(2, &sampler),
        ])?;
        core.add_component(entity, GpuMaterial {
            buffer: buffer.clone(),
            bind_group: bind_group.clone(),
            texture,
            sampler,
        })?;
        Ok(())
    })
}

/// Textures and samplers are shared, only the entity's own objects go.
pub fn on_material_destruction(core: &mut Core, entity: Entity) {
    let Some(gpu) = core.registry().try_get::<GpuMaterial>(entity).cloned() else {
        return;
    };
    release_bind_group(core, &gpu.bind_group);
    release_buffer(core, &gpu.buffer);
}

// ---- Directional light ----

pub fn on_directional_light_creation(core: &mut Core, entity: Entity) -> Result<(), GraphicsError> {
    if !should_create::<GpuDirectionalLight>(core, entity, "directional light") {
        return Ok(());
    }
    let buffer = DirectionalLightGpuBuffer::id(entity);
    create_or_release(core, &[&buffer], &[], |core| {
        insert_buffer(core, &buffer, DirectionalLightGpuBuffer::new(entity))?;
        core.add_component(entity, GpuDirectionalLight {
            buffer: buffer.clone(),
        })?;
        Ok(())
    })
}

pub fn on_directional_light_destruction(core: &mut Core, entity: Entity) {
    let Some(gpu) = core.registry().try_get::<GpuDirectionalLight>(entity).cloned() else {
        return;
    };
    release_buffer(core, &gpu.buffer);
}

/// Runs the creation hooks for logical components added before the
/// pipeline was ready.
pub fn attach_pending_gpu_components(core: &mut Core) -> Result<(), GraphicsError> {
    fn pending<C: 'static, G: 'static>(core: &Core) -> Vec<Entity> {
        core.registry()
            .iter::<C>()
            .map(|(entity, _)| entity)
            .filter(|entity| !core.registry().has::<G>(*entity))
            .collect()
    }

    for entity in pending::<Transform, GpuTransform>(core) {
        on_transform_creation(core, entity)?;
    }
    for entity in pending::<Mesh, GpuMesh>(core) {
        on_mesh_creation(core, entity)?;
    }
    for entity in pending::<Material, GpuMaterial>(core) {
        on_material_creation(core, entity)?;
    }
    for entity in pending::<Camera, GpuCamera>(core) {
        on_camera_creation(core, entity)?;
    }
    for entity in pending::<DirectionalLight, GpuDirectionalLight>(core) {
        on_directional_light_creation(core, entity)?;
    }
    Ok(())
}
