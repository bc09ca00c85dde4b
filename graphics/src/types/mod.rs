//! Plain-data descriptors for GPU resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! shared by the backends and the resource containers.

mod binding;
mod buffer;
mod common;
mod sampler;
mod texture;
mod vertex;

pub use binding::{BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, ShaderStages};
pub use buffer::{BufferDescriptor, BufferUsage, IndexFormat};
pub use common::{Color, Extent3d, LoadOp, StoreOp};
pub use sampler::{AddressMode, CompareFunction, FilterMode, SamplerDescriptor};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
pub use vertex::{
    PrimitiveTopology, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode,
};
