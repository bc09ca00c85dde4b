//! # Squared Default Pipeline
//!
//! Forward rendering on top of `squared-graphics`.
//!
//! Gameplay code only attaches logical components ([`Transform`], [`Mesh`],
//! [`Material`], [`Camera`], [`PointLight`], [`DirectionalLight`]). Hooks
//! create the GPU side of each one and attach a `Gpu*` counterpart holding
//! the ids of what was created; removing the component or killing the
//! entity releases it again.
//!
//! ```
//! use squared_default_pipeline::{Camera, DefaultPipelinePlugin, Material, Mesh, Transform};
//! use squared_ecs::Core;
//! use squared_graphics::{BackendSelection, GraphicSettings};
//!
//! let mut core = Core::new();
//! core.register_resource(GraphicSettings::default().with_backend(BackendSelection::Dummy))
//!     .unwrap();
//! core.add_plugins::<(DefaultPipelinePlugin,)>().unwrap();
//!
//! let cube = core.create_entity();
//! core.add_component(cube, Transform::default()).unwrap();
//! core.add_component(cube, Mesh::cube(1.0)).unwrap();
//! core.add_component(cube, Material::default()).unwrap();
//!
//! let camera = core.create_entity();
//! core.add_component(camera, Transform::from_position(glam::Vec3::new(0.0, 0.0, 5.0))).unwrap();
//! core.add_component(camera, Camera::default()).unwrap();
//!
//! core.run_systems().unwrap();
//! ```

pub mod buffers;
pub mod components;
pub mod forward_pass;
pub mod hooks;
pub mod plugin;
pub mod resources;
pub mod systems;

pub use buffers::{
    CameraGpuBuffer, DirectionalLightGpuBuffer, MAX_POINT_LIGHTS, MaterialGpuBuffer, MeshData,
    MeshGpuBuffer, TransformGpuBuffer,
};
pub use components::{
    Camera, DirectionalLight, GpuCamera, GpuDirectionalLight, GpuMaterial, GpuMesh, GpuTransform,
    Material, Mesh, PointLight, Transform, Vertex,
};
pub use forward_pass::{ForwardPass, forward_shader_descriptor};
pub use plugin::DefaultPipelinePlugin;
pub use resources::{AmbientLight, DefaultPipelineSettings};
