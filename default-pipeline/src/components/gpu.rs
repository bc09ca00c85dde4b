//! GPU counterparts attached by the construct hooks.
//!
//! Each one only stores the ids of what was created for its entity, so the
//! destroy hooks can find and release it.

use squared_core::HashedStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMesh {
    pub point_buffer: HashedStr,
    pub index_buffer: HashedStr,
    pub index_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuTransform {
    pub buffer: HashedStr,
    pub bind_group: HashedStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuCamera {
    pub buffer: HashedStr,
    pub bind_group: HashedStr,
    /// Render graph drawing through this camera.
    pub render_graph: HashedStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMaterial {
    pub buffer: HashedStr,
    pub bind_group: HashedStr,
    pub texture: HashedStr,
    pub sampler: HashedStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDirectionalLight {
    pub buffer: HashedStr,
}
