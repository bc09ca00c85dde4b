use glam::Vec3;

/// Surface parameters of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub shininess: f32,
    /// Id of a texture in the [`TextureContainer`](squared_graphics::TextureContainer),
    /// multiplied with the diffuse color. The default white texture is used
    /// when absent or unknown.
    pub ambient_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.8),
            shininess: 32.0,
            ambient_texture: None,
        }
    }
}

impl Material {
    pub fn from_color(diffuse: Vec3) -> Self {
        Self {
            ambient: diffuse * 0.1,
            diffuse,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture_id: impl Into<String>) -> Self {
        self.ambient_texture = Some(texture_id.into());
        self
    }
}
