//! Samplers owned by the [`SamplerContainer`] resource.

use squared_core::ResourceManager;

use crate::backend::SamplerHandle;
use crate::context::GraphicContext;
use crate::error::GraphicsError;
use crate::types::SamplerDescriptor;

pub type SamplerContainer = ResourceManager<Sampler>;

#[derive(Debug, Clone)]
pub struct Sampler {
    descriptor: SamplerDescriptor,
    handle: SamplerHandle,
}

impl Sampler {
    pub fn new(context: &GraphicContext, descriptor: SamplerDescriptor) -> Result<Self, GraphicsError> {
        let handle = context.create_sampler(&descriptor)?;
        Ok(Self { descriptor, handle })
    }

    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    pub fn handle(&self) -> &SamplerHandle {
        &self.handle
    }
}
