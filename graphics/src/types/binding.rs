//! Shader-visible binding layouts.

use bitflags::bitflags;

bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Fragment stage.
        const FRAGMENT = 1 << 1;
        /// Both graphics stages.
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

impl Default for ShaderStages {
    fn default() -> Self {
        Self::VERTEX_FRAGMENT
    }
}

/// Kind of resource bound at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    UniformBuffer,
    /// Read-only storage buffer.
    StorageBuffer,
    /// Filterable 2D float texture.
    Texture,
    /// 2D depth texture.
    DepthTexture,
    Sampler,
    /// Comparison sampler for depth textures.
    ComparisonSampler,
}

impl BindingType {
    pub fn is_buffer(self) -> bool {
        matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }

    pub fn is_texture(self) -> bool {
        matches!(self, Self::Texture | Self::DepthTexture)
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, Self::Sampler | Self::ComparisonSampler)
    }
}

/// One slot of a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStages,
    pub ty: BindingType,
}

impl BindGroupLayoutEntry {
    pub fn new(binding: u32, ty: BindingType) -> Self {
        Self {
            binding,
            visibility: ShaderStages::default(),
            ty,
        }
    }

    pub fn with_visibility(mut self, visibility: ShaderStages) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Layout of the bind group expected at one index of a shader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BindGroupLayoutDescriptor {
    /// Debug label for the layout.
    pub label: Option<String>,
    pub entries: Vec<BindGroupLayoutEntry>,
}

impl BindGroupLayoutDescriptor {
    pub fn new(entries: impl IntoIterator<Item = BindGroupLayoutEntry>) -> Self {
        Self {
            label: None,
            entries: entries.into_iter().collect(),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The entry declared for `binding`, if any.
    pub fn entry(&self, binding: u32) -> Option<&BindGroupLayoutEntry> {
        self.entries.iter().find(|entry| entry.binding == binding)
    }
}
