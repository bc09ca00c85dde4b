//! Bind groups built from named buffers, textures and samplers.

use squared_core::{HashedStr, ResourceManager};
use squared_ecs::Core;

use crate::backend::{BindGroupEntry, BindGroupHandle, BindingResource};
use crate::context::GraphicContext;
use crate::error::GraphicsError;
use crate::gpu_buffer::GpuBufferContainer;
use crate::sampler::SamplerContainer;
use crate::shader::ShaderContainer;
use crate::texture::TextureContainer;
use crate::types::BindingType;

pub type BindGroupContainer = ResourceManager<BindGroup>;

/// One resource of a bind group, named by its container id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindGroupAsset {
    /// The first `size` bytes of a buffer in the [`GpuBufferContainer`].
    Buffer {
        binding: u32,
        id: HashedStr,
        size: u64,
    },
    /// The default view of a texture in the [`TextureContainer`].
    Texture { binding: u32, id: HashedStr },
    Sampler { binding: u32, id: HashedStr },
}

impl BindGroupAsset {
    pub fn buffer(binding: u32, id: impl Into<HashedStr>, size: u64) -> Self {
        Self::Buffer {
            binding,
            id: id.into(),
            size,
        }
    }

    pub fn texture(binding: u32, id: impl Into<HashedStr>) -> Self {
        Self::Texture {
            binding,
            id: id.into(),
        }
    }

    pub fn sampler(binding: u32, id: impl Into<HashedStr>) -> Self {
        Self::Sampler {
            binding,
            id: id.into(),
        }
    }

    pub fn binding(&self) -> u32 {
        match self {
            Self::Buffer { binding, .. }
            | Self::Texture { binding, .. }
            | Self::Sampler { binding, .. } => *binding,
        }
    }

    fn id(&self) -> &HashedStr {
        match self {
            Self::Buffer { id, .. } | Self::Texture { id, .. } | Self::Sampler { id, .. } => id,
        }
    }

    fn matches(&self, ty: BindingType) -> bool {
        match self {
            Self::Buffer { .. } => ty.is_buffer(),
            Self::Texture { .. } => ty.is_texture(),
            Self::Sampler { .. } => ty.is_sampler(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Buffer { .. } => "buffer",
            Self::Texture { .. } => "texture",
            Self::Sampler { .. } => "sampler",
        }
    }
}

/// A bind group created against one layout of a shader.
#[derive(Debug)]
pub struct BindGroup {
    name: String,
    shader_id: HashedStr,
    layout_index: u32,
    assets: Vec<BindGroupAsset>,
    handle: BindGroupHandle,
}

impl BindGroup {
    /// Resolves every asset through its container and creates the bind
    /// group against layout `layout_index` of shader `shader_id`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceNotFound`] for an unknown shader, layout or
    /// asset, [`GraphicsError::InvalidParameter`] when an asset does not fit
    /// the layout entry at its binding.
    pub fn new(
        core: &Core,
        name: impl Into<String>,
        shader_id: impl Into<HashedStr>,
        layout_index: u32,
        assets: Vec<BindGroupAsset>,
    ) -> Result<Self, GraphicsError> {
        let name = name.into();
        let shader_id = shader_id.into();
        let handle = create_handle(core, &name, &shader_id, layout_index, &assets)?;
        log::trace!("Bind group `{name}` created for shader `{shader_id}`");
        Ok(Self {
            name,
            shader_id,
            layout_index,
            assets,
            handle,
        })
    }

    /// Rebuilds the bind group, picking up buffers or textures that were
    /// replaced in their containers.
    pub fn refresh(&mut self, core: &Core) -> Result<(), GraphicsError> {
        self.handle = create_handle(
            core,
            &self.name,
            &self.shader_id,
            self.layout_index,
            &self.assets,
        )?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader_id(&self) -> &HashedStr {
        &self.shader_id
    }

    pub fn layout_index(&self) -> u32 {
        self.layout_index
    }

    pub fn assets(&self) -> &[BindGroupAsset] {
        &self.assets
    }

    pub fn handle(&self) -> &BindGroupHandle {
        &self.handle
    }
}

fn create_handle(
    core: &Core,
    name: &str,
    shader_id: &HashedStr,
    layout_index: u32,
    assets: &[BindGroupAsset],
) -> Result<BindGroupHandle, GraphicsError> {
    let shaders = core.resource::<ShaderContainer>()?;
    let shader = shaders
        .get(shader_id)
        .map_err(|e| GraphicsError::not_found("shader", e))?;
    let (layout, description) =
        shader
            .bind_group_layout(layout_index)
            .ok_or_else(|| GraphicsError::ResourceNotFound {
                kind: "bind group layout",
                id: format!("{shader_id}[{layout_index}]"),
            })?;

    let mut entries = Vec::with_capacity(assets.len());
    for asset in assets {
        let binding = asset.binding();
        let entry = description.entry(binding).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "bind group `{name}`: layout {layout_index} of shader `{shader_id}` has no binding {binding}"
            ))
        })?;
        if !asset.matches(entry.ty) {
            return Err(GraphicsError::InvalidParameter(format!(
                "bind group `{name}`: binding {binding} expects {:?}, got a {}",
                entry.ty,
                asset.kind()
            )));
        }
        entries.push(BindGroupEntry {
            binding,
            resource: resolve(core, asset)?,
        });
    }
    if entries.len() < description.entries.len() {
        log::warn!(
            "Bind group `{name}` fills {} of {} bindings of shader `{shader_id}` layout {layout_index}",
            entries.len(),
            description.entries.len()
        );
    }

    core.resource::<GraphicContext>()?
        .create_bind_group(name, layout, &entries)
}

fn resolve(core: &Core, asset: &BindGroupAsset) -> Result<BindingResource, GraphicsError> {
    let id = asset.id();
    Ok(match asset {
        BindGroupAsset::Buffer { size, .. } => {
            let buffers = core.resource::<GpuBufferContainer>()?;
            let buffer = buffers
                .get(id)
                .map_err(|e| GraphicsError::not_found("buffer", e))?
                .get_buffer()?;
            BindingResource::Buffer {
                buffer: buffer.clone(),
                offset: 0,
                size: Some(*size),
            }
        }
        BindGroupAsset::Texture { .. } => {
            let textures = core.resource::<TextureContainer>()?;
            let texture = textures
                .get(id)
                .map_err(|e| GraphicsError::not_found("texture", e))?;
            BindingResource::TextureView(texture.view().clone())
        }
        BindGroupAsset::Sampler { .. } => {
            let samplers = core.resource::<SamplerContainer>()?;
            let sampler = samplers
                .get(id)
                .map_err(|e| GraphicsError::not_found("sampler", e))?;
            BindingResource::Sampler(sampler.handle().clone())
        }
    })
}
