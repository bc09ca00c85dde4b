//! GPU buffers of the default pipeline.
//!
//! Layouts are `#[repr(C)]` and padded by hand to match the WGSL uniform
//! rules of `shaders/forward.wgsl` (vec3 fields take 16 bytes).

use std::marker::PhantomData;

use glam::Vec3;
use squared_core::HashedStr;
use squared_ecs::{Core, Entity};
use squared_graphics::gpu_buffer::not_created;
use squared_graphics::{
    BufferDescriptor, BufferHandle, BufferUsage, GpuBuffer, GraphicContext, GraphicsError,
};

use crate::components::{Camera, DirectionalLight, Material, Mesh, PointLight, Transform, Vertex};
use crate::resources::{AmbientLight, entity_id};

/// Maximum number of point lights the forward shader reads.
pub const MAX_POINT_LIGHTS: usize = 64;

/// Allocation shared by every buffer below.
#[derive(Debug)]
struct RawBuffer {
    label: String,
    usage: BufferUsage,
    handle: Option<BufferHandle>,
    size: u64,
}

impl RawBuffer {
    fn new(label: String, usage: BufferUsage) -> Self {
        Self {
            label,
            usage,
            handle: None,
            size: 0,
        }
    }

    fn create(&mut self, core: &Core, data: &[u8]) -> Result<(), GraphicsError> {
        let descriptor = BufferDescriptor::new(data.len() as u64, self.usage | BufferUsage::COPY_DST)
            .with_label(self.label.as_str());
        let handle = core.resource::<GraphicContext>()?.create_buffer_init(&descriptor, data)?;
        self.handle = Some(handle);
        self.size = data.len() as u64;
        Ok(())
    }

    /// Writes `data`, reallocating when its size changed.
    fn write(&mut self, core: &Core, data: &[u8]) -> Result<(), GraphicsError> {
        let handle = self.handle()?;
        if data.len() as u64 != self.size {
            log::debug!(
                "Buffer `{}` resized from {} to {} bytes",
                self.label,
                self.size,
                data.len()
            );
            return self.create(core, data);
        }
        core.resource::<GraphicContext>()?.write_buffer(handle, 0, data)
    }

    fn handle(&self) -> Result<&BufferHandle, GraphicsError> {
        self.handle.as_ref().ok_or_else(|| not_created(&self.label))
    }
}

// ---------------------------------------------------------------------------
// Per-entity uniforms
// ---------------------------------------------------------------------------

/// A uniform block computed from the components of one entity.
pub trait EntityUniform: bytemuck::Pod {
    /// Prefix of the buffer id, completed with `_{entity}`.
    const PREFIX: &'static str;

    fn gather(core: &Core, entity: Entity) -> Result<Self, GraphicsError>;
}

/// Uniform buffer refreshed from one entity on every update.
#[derive(Debug)]
pub struct EntityUniformBuffer<U> {
    entity: Entity,
    raw: RawBuffer,
    _uniform: PhantomData<fn() -> U>,
}

impl<U: EntityUniform> EntityUniformBuffer<U> {
    pub const SIZE: u64 = std::mem::size_of::<U>() as u64;

    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            raw: RawBuffer::new(Self::id(entity).as_str().to_owned(), BufferUsage::UNIFORM),
            _uniform: PhantomData,
        }
    }

    /// Container id of the buffer of `entity`.
    pub fn id(entity: Entity) -> HashedStr {
        entity_id(U::PREFIX, entity)
    }
}

impl<U: EntityUniform> GpuBuffer for EntityUniformBuffer<U> {
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError> {
        let uniform = U::gather(core, self.entity)?;
        self.raw.create(core, bytemuck::bytes_of(&uniform))
    }

    fn destroy(&mut self) {
        self.raw.handle = None;
    }

    fn is_created(&self) -> bool {
        self.raw.handle.is_some()
    }

    fn update(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.handle()?;
        if !core.is_entity_valid(self.entity) {
            return Ok(());
        }
        let uniform = U::gather(core, self.entity)?;
        self.raw.write(core, bytemuck::bytes_of(&uniform))
    }

    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError> {
        self.raw.handle()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl From<&Transform> for TransformUniform {
    fn from(transform: &Transform) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            normal: transform.normal_matrix().to_cols_array_2d(),
        }
    }
}

impl EntityUniform for TransformUniform {
    const PREFIX: &'static str = "TRANSFORM_BUFFER";

    fn gather(core: &Core, entity: Entity) -> Result<Self, GraphicsError> {
        Ok(core.registry().get::<Transform>(entity)?.into())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    pub inverse_view_projection: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn new(camera: &Camera, transform: &Transform) -> Self {
        let view_projection = camera.view_projection(transform);
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            inverse_view_projection: view_projection.inverse().to_cols_array_2d(),
            position: transform.position.to_array(),
            _padding: 0.0,
        }
    }
}

impl EntityUniform for CameraUniform {
    const PREFIX: &'static str = "CAMERA_BUFFER";

    /// A camera without a [`Transform`] sits at the origin looking down -Z.
    fn gather(core: &Core, entity: Entity) -> Result<Self, GraphicsError> {
        let registry = core.registry();
        let camera = registry.get::<Camera>(entity)?;
        let transform = registry.try_get::<Transform>(entity).copied().unwrap_or_default();
        Ok(Self::new(camera, &transform))
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 3],
    pub _padding: f32,
    pub diffuse: [f32; 3],
    pub shininess: f32,
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        Self {
            ambient: material.ambient.to_array(),
            _padding: 0.0,
            diffuse: material.diffuse.to_array(),
            shininess: material.shininess,
        }
    }
}

impl EntityUniform for MaterialUniform {
    const PREFIX: &'static str = "MATERIAL_BUFFER";

    fn gather(core: &Core, entity: Entity) -> Result<Self, GraphicsError> {
        Ok(core.registry().get::<Material>(entity)?.into())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightUniform {
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _padding: f32,
}

impl EntityUniform for DirectionalLightUniform {
    const PREFIX: &'static str = "DIRECTIONAL_LIGHT_BUFFER";

    fn gather(core: &Core, entity: Entity) -> Result<Self, GraphicsError> {
        let registry = core.registry();
        let light = registry.get::<DirectionalLight>(entity)?;
        let direction = registry
            .try_get::<Transform>(entity)
            .map_or(Vec3::NEG_Z, Transform::forward);
        Ok(Self {
            direction: direction.normalize_or_zero().to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            _padding: 0.0,
        })
    }
}

pub type TransformGpuBuffer = EntityUniformBuffer<TransformUniform>;
pub type CameraGpuBuffer = EntityUniformBuffer<CameraUniform>;
pub type MaterialGpuBuffer = EntityUniformBuffer<MaterialUniform>;
pub type DirectionalLightGpuBuffer = EntityUniformBuffer<DirectionalLightUniform>;

// ---------------------------------------------------------------------------
// Mesh geometry
// ---------------------------------------------------------------------------

/// Which half of a [`Mesh`] a [`MeshGpuBuffer`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshData {
    /// Interleaved [`Vertex`] data.
    Points,
    /// `u32` indices.
    Indices,
}

impl MeshData {
    fn prefix(self) -> &'static str {
        match self {
            Self::Points => "POINT_BUFFER",
            Self::Indices => "INDEX_BUFFER",
        }
    }

    fn usage(self) -> BufferUsage {
        match self {
            Self::Points => BufferUsage::VERTEX,
            Self::Indices => BufferUsage::INDEX,
        }
    }
}

/// Vertex or index data of the [`Mesh`] of one entity. A mesh whose size
/// changed is reallocated on update.
#[derive(Debug)]
pub struct MeshGpuBuffer {
    entity: Entity,
    data: MeshData,
    raw: RawBuffer,
}

impl MeshGpuBuffer {
    pub fn new(entity: Entity, data: MeshData) -> Self {
        Self {
            entity,
            data,
            raw: RawBuffer::new(Self::id(entity, data).as_str().to_owned(), data.usage()),
        }
    }

    pub fn id(entity: Entity, data: MeshData) -> HashedStr {
        entity_id(data.prefix(), entity)
    }

    fn bytes(&self, core: &Core) -> Result<Vec<u8>, GraphicsError> {
        let mesh = core.registry().get::<Mesh>(self.entity)?;
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(GraphicsError::InvalidParameter(format!(
                "mesh of entity {} has no geometry",
                self.entity
            )));
        }
        Ok(match self.data {
            MeshData::Points => bytemuck::cast_slice::<Vertex, u8>(&mesh.vertex_data()).to_vec(),
            MeshData::Indices => bytemuck::cast_slice::<u32, u8>(&mesh.indices).to_vec(),
        })
    }
}

impl GpuBuffer for MeshGpuBuffer {
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError> {
        let bytes = self.bytes(core)?;
        self.raw.create(core, &bytes)
    }

    fn destroy(&mut self) {
        self.raw.handle = None;
    }

    fn is_created(&self) -> bool {
        self.raw.handle.is_some()
    }

    fn update(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.handle()?;
        if !core.is_entity_valid(self.entity) {
            return Ok(());
        }
        let bytes = self.bytes(core)?;
        self.raw.write(core, &bytes)
    }

    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError> {
        self.raw.handle()
    }
}

// ---------------------------------------------------------------------------
// Lights
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AmbientLightUniform {
    pub color: [f32; 3],
    pub _padding: f32,
}

/// The [`AmbientLight`] resource.
#[derive(Debug)]
pub struct AmbientLightBuffer {
    raw: RawBuffer,
}

impl AmbientLightBuffer {
    pub const SIZE: u64 = std::mem::size_of::<AmbientLightUniform>() as u64;

    pub fn new() -> Self {
        Self {
            raw: RawBuffer::new("AMBIENT_LIGHT_BUFFER".into(), BufferUsage::UNIFORM),
        }
    }

    fn uniform(core: &Core) -> AmbientLightUniform {
        let color = core
            .resource::<AmbientLight>()
            .map(|light| light.color)
            .unwrap_or(Vec3::ZERO);
        AmbientLightUniform {
            color: color.to_array(),
            _padding: 0.0,
        }
    }
}

impl Default for AmbientLightBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBuffer for AmbientLightBuffer {
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.create(core, bytemuck::bytes_of(&Self::uniform(core)))
    }

    fn destroy(&mut self) {
        self.raw.handle = None;
    }

    fn is_created(&self) -> bool {
        self.raw.handle.is_some()
    }

    fn update(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.write(core, bytemuck::bytes_of(&Self::uniform(core)))
    }

    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError> {
        self.raw.handle()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub radius: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightsUniform {
    pub lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub count: u32,
    pub _padding: [u32; 3],
}

impl PointLightsUniform {
    /// Every entity with a [`PointLight`] and a [`Transform`], in view
    /// order. Lights past [`MAX_POINT_LIGHTS`] are dropped.
    pub fn gather(core: &Core) -> Self {
        let mut uniform: Self = bytemuck::Zeroable::zeroed();
        let mut skipped = 0usize;
        for (_, (transform, light)) in core.registry().view::<(Transform, PointLight)>() {
            let Some(slot) = uniform.lights.get_mut(uniform.count as usize) else {
                skipped += 1;
                continue;
            };
            *slot = PointLightUniform {
                position: transform.position.to_array(),
                intensity: light.intensity,
                color: light.color.to_array(),
                radius: light.radius,
            };
            uniform.count += 1;
        }
        if skipped > 0 {
            log::warn!("{skipped} point lights ignored, at most {MAX_POINT_LIGHTS} are supported");
        }
        uniform
    }
}

/// Every point light of the registry, gathered on each update.
#[derive(Debug)]
pub struct PointLightsBuffer {
    raw: RawBuffer,
}

impl PointLightsBuffer {
    pub const SIZE: u64 = std::mem::size_of::<PointLightsUniform>() as u64;

    pub fn new() -> Self {
        Self {
            raw: RawBuffer::new("POINT_LIGHTS_BUFFER".into(), BufferUsage::UNIFORM),
        }
    }
}

impl Default for PointLightsBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBuffer for PointLightsBuffer {
    fn create(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.create(core, bytemuck::bytes_of(&PointLightsUniform::gather(core)))
    }

    fn destroy(&mut self) {
        self.raw.handle = None;
    }

    fn is_created(&self) -> bool {
        self.raw.handle.is_some()
    }

    fn update(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.raw.write(core, bytemuck::bytes_of(&PointLightsUniform::gather(core)))
    }

    fn get_buffer(&self) -> Result<&BufferHandle, GraphicsError> {
        self.raw.handle()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use squared_graphics::DummyBackend;

    use super::*;

    fn core() -> Core {
        let mut core = Core::new();
        core.register_resource(GraphicContext::with_backend(Arc::new(DummyBackend::new())))
            .unwrap();
        core
    }

    fn contents(buffer: &dyn GpuBuffer) -> Vec<u8> {
        buffer.get_buffer().unwrap().dummy().unwrap().contents()
    }

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 128);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
        assert_eq!(std::mem::size_of::<AmbientLightUniform>(), 16);
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 32);
        assert_eq!(std::mem::size_of::<PointLightsUniform>(), 32 * MAX_POINT_LIGHTS + 16);
    }

    #[test]
    fn test_transform_buffer_follows_component() {
        let mut core = core();
        let entity = core.create_entity();
        core.add_component(entity, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();

        let mut buffer = TransformGpuBuffer::new(entity);
        assert_eq!(TransformGpuBuffer::id(entity).as_str(), format!("TRANSFORM_BUFFER_{entity}"));
        assert!(buffer.update(&core).is_err());
        buffer.create(&core).unwrap();

        let uniform: TransformUniform = bytemuck::pod_read_unaligned(&contents(&buffer));
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);

        core.registry_mut()
            .get_mut::<Transform>(entity)
            .unwrap()
            .position = Vec3::new(4.0, 5.0, 6.0);
        buffer.update(&core).unwrap();
        let uniform: TransformUniform = bytemuck::pod_read_unaligned(&contents(&buffer));
        assert_eq!(uniform.model[3], [4.0, 5.0, 6.0, 1.0]);

        buffer.destroy();
        assert!(!buffer.is_created());
    }

    #[test]
    fn test_missing_component_fails_creation() {
        let mut core = core();
        let entity = core.create_entity();
        let mut buffer = MaterialGpuBuffer::new(entity);
        assert!(matches!(buffer.create(&core), Err(GraphicsError::Ecs(_))));
        assert!(!buffer.is_created());
    }

    #[test]
    fn test_mesh_buffer_reallocates_on_resize() {
        let mut core = core();
        let entity = core.create_entity();
        core.add_component(entity, Mesh::triangle()).unwrap();

        let mut points = MeshGpuBuffer::new(entity, MeshData::Points);
        let mut indices = MeshGpuBuffer::new(entity, MeshData::Indices);
        points.create(&core).unwrap();
        indices.create(&core).unwrap();
        assert_eq!(contents(&points).len(), 3 * 32);
        assert_eq!(contents(&indices), bytemuck::cast_slice::<u32, u8>(&[0, 1, 2]));

        *core.registry_mut().get_mut::<Mesh>(entity).unwrap() = Mesh::cube(1.0);
        points.update(&core).unwrap();
        indices.update(&core).unwrap();
        assert_eq!(contents(&points).len(), 24 * 32);
        assert_eq!(contents(&indices).len(), 36 * 4);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let mut core = core();
        let entity = core.create_entity();
        core.add_component(entity, Mesh::default()).unwrap();
        let mut points = MeshGpuBuffer::new(entity, MeshData::Points);
        assert!(matches!(points.create(&core), Err(GraphicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_point_lights_are_capped() {
        let mut core = core();
        for i in 0..MAX_POINT_LIGHTS + 3 {
            let entity = core.create_entity();
            core.add_component(entity, Transform::from_position(Vec3::X * i as f32))
                .unwrap();
            core.add_component(entity, PointLight::default()).unwrap();
        }
        let uniform = PointLightsUniform::gather(&core);
        assert_eq!(uniform.count as usize, MAX_POINT_LIGHTS);
        assert_eq!(uniform.lights[2].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ambient_light_reads_resource() {
        let mut core = core();
        core.register_resource(AmbientLight {
            color: Vec3::new(0.5, 0.25, 0.0),
        })
        .unwrap();
        let mut buffer = AmbientLightBuffer::new();
        buffer.create(&core).unwrap();
        let uniform: AmbientLightUniform = bytemuck::pod_read_unaligned(&contents(&buffer));
        assert_eq!(uniform.color, [0.5, 0.25, 0.0]);
    }
}
