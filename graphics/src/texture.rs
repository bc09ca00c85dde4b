//! Textures owned by the [`TextureContainer`] resource.

use squared_core::ResourceManager;

use crate::backend::{TextureHandle, TextureViewHandle};
use crate::context::GraphicContext;
use crate::error::GraphicsError;
use crate::types::{Extent3d, TextureDescriptor, TextureFormat, TextureUsage};

/// Every texture by name. Render pass outputs are resolved here.
pub type TextureContainer = ResourceManager<Texture>;

/// A GPU texture together with its default view.
#[derive(Debug, Clone)]
pub struct Texture {
    descriptor: TextureDescriptor,
    handle: TextureHandle,
    view: TextureViewHandle,
}

impl Texture {
    pub fn new(context: &GraphicContext, descriptor: TextureDescriptor) -> Result<Self, GraphicsError> {
        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {:?} has a zero-sized extent",
                descriptor.label
            )));
        }
        let (handle, view) = context.create_texture(&descriptor)?;
        Ok(Self {
            descriptor,
            handle,
            view,
        })
    }

    /// A 2D texture usable as a color or depth attachment.
    pub fn render_target(
        context: &GraphicContext,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<Self, GraphicsError> {
        Self::new(
            context,
            TextureDescriptor::render_target(width, height, format).with_label(label),
        )
    }

    /// A sampled texture filled with `pixels` (rows of `width` texels).
    pub fn from_pixels(
        context: &GraphicContext,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixels: &[u8],
    ) -> Result<Self, GraphicsError> {
        let descriptor = TextureDescriptor::new_2d(
            width,
            height,
            format,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )
        .with_label(label);
        let texture = Self::new(context, descriptor)?;
        texture.write(context, pixels)?;
        Ok(texture)
    }

    /// Uploads a full image. `pixels` must hold exactly one texel per
    /// position of the extent.
    pub fn write(&self, context: &GraphicContext, pixels: &[u8]) -> Result<(), GraphicsError> {
        let size = self.descriptor.size;
        let expected = u64::from(size.width)
            * u64::from(size.height)
            * u64::from(size.depth)
            * u64::from(self.descriptor.format.block_size());
        if pixels.len() as u64 != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {:?} expects {expected} bytes, got {}",
                self.descriptor.label,
                pixels.len()
            )));
        }
        context.write_texture(&self.handle, &self.descriptor, pixels)
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn size(&self) -> Extent3d {
        self.descriptor.size
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn handle(&self) -> &TextureHandle {
        &self.handle
    }

    pub fn view(&self) -> &TextureViewHandle {
        &self.view
    }
}
