//! Texture formats, usages and descriptors.

use bitflags::bitflags;

use super::Extent3d;

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 32-bit float red channel.
    R32Float,
    /// RGBA, 8 bits per channel, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// RGBA, 8 bits per channel, sRGB encoded.
    Rgba8UnormSrgb,
    /// BGRA, 8 bits per channel, unsigned normalized. Common swapchain format.
    Bgra8Unorm,
    /// BGRA, 8 bits per channel, sRGB encoded.
    Bgra8UnormSrgb,
    /// RGBA, 16-bit float per channel.
    Rgba16Float,
    /// RGBA, 32-bit float per channel.
    Rgba32Float,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Whether the format holds depth (and possibly stencil) values.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24PlusStencil8)
    }

    /// Size of one texel in bytes.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R32Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth32Float
            | Self::Depth24PlusStencil8 => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 3;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a 2D texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    pub size: Extent3d,
    /// Sample count for multisampling.
    pub sample_count: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            sample_count: 1,
            format,
            usage,
        }
    }

    /// A render attachment that can also be sampled.
    pub fn render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self::new_2d(
            width,
            height,
            format,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the sample count for multisampling.
    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            size: Extent3d::default(),
            sample_count: 1,
            format: TextureFormat::default(),
            usage: TextureUsage::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_formats() {
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(!TextureFormat::Bgra8Unorm.is_depth());
    }

    #[test]
    fn test_render_target_usage() {
        let desc = TextureDescriptor::render_target(64, 32, TextureFormat::Rgba16Float)
            .with_label("hdr");
        assert!(desc.usage.contains(TextureUsage::RENDER_ATTACHMENT));
        assert_eq!(desc.size.width, 64);
        assert_eq!(desc.size.height, 32);
        assert_eq!(desc.format.block_size(), 8);
    }
}
