//! Logical components edited by gameplay code, and the GPU counterparts the
//! pipeline attaches next to them.

mod camera;
mod gpu;
mod light;
mod material;
mod mesh;
mod transform;

pub use camera::Camera;
pub use gpu::{GpuCamera, GpuDirectionalLight, GpuMaterial, GpuMesh, GpuTransform};
pub use light::{DirectionalLight, PointLight};
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use transform::Transform;
