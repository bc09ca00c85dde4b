//! Pipeline-wide resources and the fixed ids of what the pipeline creates.

use glam::Vec3;
use squared_core::HashedStr;
use squared_graphics::TextureFormat;

pub const FORWARD_SHADER_ID: HashedStr = HashedStr::new("DEFAULT_FORWARD_SHADER");
pub const FORWARD_PASS_ID: HashedStr = HashedStr::new("DEFAULT_FORWARD_PASS");
/// Color target of the forward pass.
pub const END_RENDER_TEXTURE_ID: HashedStr = HashedStr::new("END_RENDER_TEXTURE");
pub const DEPTH_TEXTURE_ID: HashedStr = HashedStr::new("DEFAULT_DEPTH_TEXTURE");

pub const DEFAULT_TEXTURE_ID: HashedStr = HashedStr::new("DEFAULT_TEXTURE");
pub const DEFAULT_SAMPLER_ID: HashedStr = HashedStr::new("DEFAULT_SAMPLER");
pub const DEFAULT_MATERIAL_BUFFER_ID: HashedStr = HashedStr::new("DEFAULT_MATERIAL_BUFFER");
pub const DEFAULT_MATERIAL_BIND_GROUP_ID: HashedStr = HashedStr::new("DEFAULT_MATERIAL_BIND_GROUP");

pub const AMBIENT_LIGHT_BUFFER_ID: HashedStr = HashedStr::new("AMBIENT_LIGHT_BUFFER");
pub const POINT_LIGHTS_BUFFER_ID: HashedStr = HashedStr::new("POINT_LIGHTS_BUFFER");
pub const LIGHTS_BIND_GROUP_ID: HashedStr = HashedStr::new("LIGHTS_BIND_GROUP");

/// Bind group indices of the forward shader.
pub mod group {
    pub const CAMERA: u32 = 0;
    pub const TRANSFORM: u32 = 1;
    pub const MATERIAL: u32 = 2;
    pub const LIGHTS: u32 = 3;
}

/// Size and format of the render targets. Read once, when they are created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultPipelineSettings {
    pub width: u32,
    pub height: u32,
    pub color_format: TextureFormat,
}

impl Default for DefaultPipelineSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            color_format: TextureFormat::Rgba8Unorm,
        }
    }
}

/// Light added to every surface regardless of position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::splat(0.1),
        }
    }
}

/// `{prefix}_{entity}`, the id of something created for one entity.
pub(crate) fn entity_id(prefix: &str, entity: squared_ecs::Entity) -> HashedStr {
    HashedStr::owned(format!("{prefix}_{entity}"))
}
